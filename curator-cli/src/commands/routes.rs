use anyhow::Result;
use console::RouteTable;
use console::routes::console_routes;
use shared::config::Config;

/// Prints the console route table, one route per line.
///
/// # Errors
/// Returns an error if the route table cannot be built.
pub fn list_routes(config: &Config) -> Result<()> {
    let table = RouteTable::new(console_routes(&config.login_path))?;
    for entry in table.entries() {
        let access = if entry.requires_auth() { "auth" } else { "public" };
        println!(
            "{:<18} {:<6} {:<12} {}",
            entry.pattern(),
            access,
            entry.name(),
            entry.chain().join(" > ")
        );
    }
    Ok(())
}
