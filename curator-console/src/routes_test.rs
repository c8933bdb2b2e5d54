//! Tests for route flattening, normalization and matching.

use crate::routes::{
    AppRoute, RouteDef, RouteTable, RouteTableError, console_routes, normalize_path,
};
use std::str::FromStr;
use strum::IntoEnumIterator;

fn console_table() -> RouteTable {
    RouteTable::new(console_routes("/login")).unwrap()
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path("//characters///7/"), "/characters/7");
    assert_eq!(normalize_path("/banners?page=2#top"), "/banners");
    assert_eq!(normalize_path("cv#section"), "/cv");
}

#[test]
fn test_console_routes_layout() {
    let table = console_table();
    let listed: Vec<_> = table
        .entries()
        .iter()
        .map(|entry| (entry.name(), entry.pattern(), entry.requires_auth()))
        .collect();

    assert_eq!(
        listed,
        [
            ("login", "/login".to_string(), false),
            ("dashboard", "/".to_string(), true),
            ("characters", "/characters".to_string(), true),
            ("character", "/characters/:id".to_string(), true),
            ("banners", "/banners".to_string(), true),
            ("banner", "/banners/:id".to_string(), true),
            ("cv", "/cv".to_string(), true),
        ]
    );
}

#[test]
fn test_leaf_inherits_requirement_from_ancestor() {
    let table = console_table();
    let matched = table.resolve("/characters/42").unwrap();

    assert_eq!(matched.name, "character");
    assert_eq!(matched.chain, ["dashboard", "character"]);
    assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));
    assert!(matched.requires_auth);
    assert!(table.requires_auth("/cv"));
}

#[test]
fn test_login_and_unmatched_paths_are_public() {
    let table = console_table();

    let login = table.resolve("/login?next=/cv").unwrap();
    assert_eq!(login.name, "login");
    assert_eq!(login.path, "/login");
    assert!(!login.requires_auth);

    assert!(table.resolve("/nowhere").is_none());
    assert!(!table.requires_auth("/nowhere"));
}

#[test]
fn test_static_beats_param_beats_wildcard() {
    let table = RouteTable::new(vec![
        RouteDef::new("/files/*", "files-any"),
        RouteDef::new("/files/:id", "file"),
        RouteDef::new("/files/new", "file-new"),
    ])
    .unwrap();

    assert_eq!(table.resolve("/files/new").unwrap().name, "file-new");
    assert_eq!(table.resolve("/files/9").unwrap().name, "file");

    let deep = table.resolve("/files/a/b").unwrap();
    assert_eq!(deep.name, "files-any");
    assert_eq!(deep.params.get("*").map(String::as_str), Some("a/b"));
}

#[test]
fn test_static_route_beats_its_trailing_wildcard() {
    let table = RouteTable::new(vec![
        RouteDef::new("/files", "files"),
        RouteDef::new("/files/*", "files-any"),
    ])
    .unwrap();

    assert_eq!(table.resolve("/files").unwrap().name, "files");
    assert_eq!(table.resolve("/files/").unwrap().name, "files");
    assert_eq!(table.resolve("/files/a").unwrap().name, "files-any");
}

#[test]
fn test_wildcard_matches_bare_prefix_when_alone() {
    let table = RouteTable::new(vec![RouteDef::new("/files/*", "files-any")]).unwrap();

    let matched = table.resolve("/files").unwrap();
    assert_eq!(matched.name, "files-any");
    assert_eq!(matched.params.get("*").map(String::as_str), Some(""));
}

#[test]
fn test_ties_resolve_by_declaration_order() {
    let table = RouteTable::new(vec![
        RouteDef::new("/items/:id", "first"),
        RouteDef::new("/items/:slug", "second"),
    ])
    .unwrap();

    let matched = table.resolve("/items/x").unwrap();
    assert_eq!(matched.name, "first");
    assert!(matched.params.contains_key("id"));
}

#[test]
fn test_unflagged_chain_never_requires_auth() {
    let table = RouteTable::new(vec![
        RouteDef::new("/docs", "docs").children([RouteDef::new("intro", "intro")]),
    ])
    .unwrap();

    let matched = table.resolve("/docs/intro").unwrap();
    assert_eq!(matched.chain, ["docs", "intro"]);
    assert!(!matched.requires_auth);
}

#[test]
fn test_duplicate_names_are_rejected() {
    let result = RouteTable::new(vec![
        RouteDef::new("/a", "same"),
        RouteDef::new("/b", "other").children([RouteDef::new("c", "same")]),
    ]);
    assert_eq!(
        result.unwrap_err(),
        RouteTableError::DuplicateName("same".to_string())
    );
}

#[test]
fn test_wildcard_must_be_last() {
    let result = RouteTable::new(vec![RouteDef::new("/a/*/b", "broken")]);
    assert!(matches!(
        result,
        Err(RouteTableError::MisplacedWildcard { .. })
    ));
}

#[test]
fn test_custom_login_path() {
    let table = RouteTable::new(console_routes("/sign-in")).unwrap();
    assert_eq!(table.resolve("/sign-in").unwrap().name, "login");
    assert!(table.resolve("/login").is_none());
}

#[test]
fn test_app_route_names_round_trip() {
    for route in AppRoute::iter() {
        assert_eq!(AppRoute::from_str(route.name()).unwrap(), route);
        assert!(console_table().get(route.name()).is_some());
    }
    assert!(AppRoute::from_str("missing").is_err());
}
