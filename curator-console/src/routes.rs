//! Console route table: a tree of route definitions flattened once into
//! matchable entries, each carrying its ancestor chain and whether any
//! record in that chain requires authentication.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

/// Errors raised while building a [`RouteTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("duplicate route name '{0}'")]
    DuplicateName(String),

    #[error("route '{name}': wildcard must be the last segment of '{path}'")]
    MisplacedWildcard { name: String, path: String },
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            Self::Wildcard
        } else if let Some(name) = raw.strip_prefix(':') {
            Self::Param(name.to_string())
        } else {
            Self::Static(raw.to_string())
        }
    }

    /// Static beats param beats wildcard.
    fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 2,
            Self::Param(_) => 1,
            Self::Wildcard => 0,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.write_str(value),
            Self::Param(name) => write!(f, ":{name}"),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Normalize a navigation target: drop the query string and fragment,
/// collapse duplicate and trailing slashes.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let joined = split_path(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

/// A route definition node. Child paths are relative to their parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    path: String,
    name: String,
    requires_auth: bool,
    children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            requires_auth: false,
            children: Vec::new(),
        }
    }

    /// Mark this record, and therefore every descendant, as gated.
    #[must_use]
    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = RouteDef>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A flattened route with its inherited requirement precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    name: String,
    segments: Vec<Segment>,
    chain: Vec<String>,
    requires_auth: bool,
}

impl RouteEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full pattern, e.g. `/characters/:id`.
    #[must_use]
    pub fn pattern(&self) -> String {
        let joined = self
            .segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        format!("/{joined}")
    }

    /// Names of the matched records, outermost first.
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    params.insert("*".to_string(), parts.get(index..)?.join("/"));
                    return Some(params);
                }
                Segment::Static(value) => {
                    if parts.get(index) != Some(&value.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*parts.get(index)?).to_string());
                }
            }
        }
        (parts.len() == self.segments.len()).then_some(params)
    }

    /// Exact patterns outrank wildcard patterns, then segment ranks compare
    /// left to right.
    fn specificity(&self) -> (bool, Vec<u8>) {
        let exact = !self.segments.contains(&Segment::Wildcard);
        (exact, self.segments.iter().map(Segment::rank).collect())
    }
}

type Candidate<'a> = ((bool, Vec<u8>), &'a RouteEntry, BTreeMap<String, String>);

/// Result of resolving a path against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: String,
    /// Normalized path that was matched.
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub chain: Vec<String>,
    pub requires_auth: bool,
}

/// Immutable, flattened route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// # Errors
    /// Returns [`RouteTableError`] on duplicate names or a wildcard that is
    /// not the final segment.
    pub fn new(defs: Vec<RouteDef>) -> Result<Self, RouteTableError> {
        let mut entries = Vec::new();
        for def in defs {
            flatten(def, &[], &[], false, &mut entries)?;
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(RouteTableError::DuplicateName(entry.name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Entries in declaration order (parents before children).
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Most specific entry matching `path`, if any.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let normalized = normalize_path(path);
        let parts: Vec<&str> = split_path(&normalized).collect();

        let mut best: Option<Candidate<'_>> = None;
        for entry in &self.entries {
            let Some(params) = entry.matches(&parts) else {
                continue;
            };
            let rank = entry.specificity();
            if best.as_ref().is_none_or(|(current, _, _)| rank > *current) {
                best = Some((rank, entry, params));
            }
        }

        best.map(|(_, entry, params)| RouteMatch {
            name: entry.name.clone(),
            path: normalized,
            params,
            chain: entry.chain.clone(),
            requires_auth: entry.requires_auth,
        })
    }

    /// Whether navigating to `path` needs a signed-in session. Unmatched
    /// paths do not.
    #[must_use]
    pub fn requires_auth(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|matched| matched.requires_auth)
    }
}

fn flatten(
    def: RouteDef,
    parent_segments: &[Segment],
    parent_chain: &[String],
    parent_requires_auth: bool,
    out: &mut Vec<RouteEntry>,
) -> Result<(), RouteTableError> {
    let mut segments = parent_segments.to_vec();
    segments.extend(split_path(&def.path).map(Segment::parse));

    let wildcard_at = segments.iter().position(|s| *s == Segment::Wildcard);
    let has_trailing_children = wildcard_at.is_some() && !def.children.is_empty();
    if wildcard_at.is_some_and(|index| index + 1 != segments.len()) || has_trailing_children {
        return Err(RouteTableError::MisplacedWildcard {
            name: def.name,
            path: def.path,
        });
    }

    let mut chain = parent_chain.to_vec();
    chain.push(def.name.clone());
    let requires_auth = parent_requires_auth || def.requires_auth;

    out.push(RouteEntry {
        name: def.name,
        segments: segments.clone(),
        chain: chain.clone(),
        requires_auth,
    });

    for child in def.children {
        flatten(child, &segments, &chain, requires_auth, out)?;
    }
    Ok(())
}

/// Named console routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AppRoute {
    Login,
    Dashboard,
    Characters,
    Character,
    Banners,
    Banner,
    Cv,
}

impl AppRoute {
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Pattern relative to the dashboard for its children.
    fn relative_path(self, login_path: &str) -> String {
        match self {
            Self::Login => login_path.to_string(),
            Self::Dashboard => "/".to_string(),
            Self::Characters => "characters".to_string(),
            Self::Character => "characters/:id".to_string(),
            Self::Banners => "banners".to_string(),
            Self::Banner => "banners/:id".to_string(),
            Self::Cv => "cv".to_string(),
        }
    }

    fn def(self, login_path: &str) -> RouteDef {
        RouteDef::new(self.relative_path(login_path), self.name())
    }
}

/// The shipped console routes: a public login page and a gated dashboard
/// whose children inherit the requirement.
#[must_use]
pub fn console_routes(login_path: &str) -> Vec<RouteDef> {
    let children = AppRoute::iter()
        .filter(|route| !matches!(route, AppRoute::Login | AppRoute::Dashboard))
        .map(|route| route.def(login_path));

    vec![
        AppRoute::Login.def(login_path),
        AppRoute::Dashboard
            .def(login_path)
            .requires_auth()
            .children(children),
    ]
}
