//! Commands that drive the console: login, logout, status and navigate.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::Args;
use console::{Console, Navigation};
use rpassword::prompt_password;
use shared::{config::Config, models::Credentials};
use tracing::debug;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Keep the session on disk so later commands stay signed in
    #[arg(long, short)]
    pub remember: bool,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Target path, e.g. `/characters/42`
    pub path: String,
}

/// Build the console and wait for every backend's initial load.
async fn start_console(config: &Config) -> Result<Console> {
    let console = Console::from_config(config)?;
    let restored = console
        .start()
        .await
        .context("initial session load did not complete")?;
    for (backend, session) in &restored {
        debug!(backend = %backend, signed_in = session.is_some(), "restored");
    }
    Ok(console)
}

pub async fn login(config: &Config, args: LoginArgs) -> Result<()> {
    let console = start_console(config).await?;

    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = if args.password_stdin {
        read_stdin_line()?
    } else {
        prompt_password("Password: ")?
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }

    match console
        .submit_login(Credentials::new(email, password, args.remember))
        .await
    {
        Ok(_) => {
            let names: Vec<_> = console
                .store()
                .backends()
                .iter()
                .map(|backend| backend.name.as_str())
                .collect();
            println!("Signed in to {}", names.join(", "));
            println!("Location: {}", console.current_location());
            if !args.remember {
                println!("Session not remembered; pass --remember to stay signed in.");
            }
            Ok(())
        }
        Err(failure) => bail!("{}", failure.message),
    }
}

pub async fn logout(config: &Config) -> Result<()> {
    let console = start_console(config).await?;
    let failed = console.logout().await;
    if !failed.is_empty() {
        bail!("failed to sign out of {}", failed.join(", "));
    }
    println!("Signed out of all backends");
    Ok(())
}

pub async fn status(config: &Config, args: StatusArgs) -> Result<()> {
    let console = start_console(config).await?;
    let status = console.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    for backend in &status.backends {
        match (&backend.email, backend.expires_at) {
            (Some(email), Some(expires_at)) => println!(
                "{} ({}): signed in as {email} until {}",
                backend.name,
                backend.project_id,
                expires_at.to_rfc3339()
            ),
            _ => println!("{} ({}): signed out", backend.name, backend.project_id),
        }
    }
    Ok(())
}

pub async fn navigate(config: &Config, args: NavigateArgs) -> Result<()> {
    let console = start_console(config).await?;

    match console.navigate(&args.path).await {
        Navigation::Allow { matched: Some(matched) } => {
            println!("allow {} ({})", matched.path, matched.name);
            for (name, value) in &matched.params {
                println!("  {name} = {value}");
            }
        }
        Navigation::Allow { matched: None } => {
            println!("allow {} (no matching route)", console.current_location());
        }
        Navigation::Redirect { to } => println!("redirect {to}"),
    }
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let input = read_stdin_line()?;
    if input.is_empty() {
        bail!("input must not be empty");
    }
    Ok(input)
}

fn read_stdin_line() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("failed to read from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
