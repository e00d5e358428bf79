//! portal - terminal front-end for the product/user backend.
//!
//! Reads configuration from the environment (or a `.env` file), builds the
//! application shell once, then runs a small command loop: log in, look at
//! the current user, move between routes, log out.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portal_core::auth::LoginCredentials;
use portal_core::config::Preferences;
use portal_core::notify::ToastKind;
use portal_core::router::Route;
use portal_core::{AppConfig, Shell, SubmitError};

const HELP: &str = "\
Commands:
  login [email]   log in (prompts for anything missing)
  me              show the current user
  logout          clear the session and cached data
  go <path>       navigate to a route (/, /dashboard, /cek/)
  route           show the current route
  cache           list cached queries
  help            show this help
  quit            exit";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let shell = Shell::new(config)?;
    info!("portal starting");

    println!("portal ({}) - type 'help' for commands", shell.config().environment);
    let result = run(&shell).await;

    info!("portal shutting down");
    result
}

async fn run(shell: &Shell) -> Result<()> {
    loop {
        print!("{}> ", shell.router().current());
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();

        match words.next() {
            None => {}
            Some("login") => login(shell, words.next()).await,
            Some("me") => match shell.current_user().await {
                Ok(me) => println!(
                    "{} ({}) id={}",
                    me.email.as_deref().unwrap_or("-"),
                    me.role.as_deref().unwrap_or("-"),
                    me.user_id.as_deref().unwrap_or("-"),
                ),
                Err(e) => println!("{}", e),
            },
            Some("logout") => shell.logout(),
            Some("go") => match words.next().and_then(Route::from_path) {
                Some(route) => {
                    let entered = shell.go(route);
                    if entered != route {
                        println!("{} requires login, stayed on {}", route, entered);
                    }
                }
                None => println!("Unknown route"),
            },
            Some("route") => println!("{}", shell.router().current()),
            Some("cache") => {
                let rows = shell.cache().summary();
                if rows.is_empty() {
                    println!("(empty)");
                }
                for (key, stale, age) in rows {
                    println!("{:<24} {:<6} {}", key, if stale { "stale" } else { "fresh" }, age);
                }
            }
            Some("help") => println!("{}", HELP),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("Unknown command '{}', try 'help'", other),
        }

        print_toasts(shell);
    }

    Ok(())
}

async fn login(shell: &Shell, email_arg: Option<&str>) {
    let mut prefs = Preferences::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load preferences, using defaults");
        Preferences::default()
    });

    let form = match read_form(email_arg, prefs.last_email.as_deref()) {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "Login prompt failed");
            println!("Login cancelled: {:#}", e);
            return;
        }
    };

    match shell.submit_login(&form).await {
        Ok(_) => {
            prefs.last_email = Some(form.email.clone());
            if let Err(e) = prefs.save() {
                warn!(error = %e, "Failed to save preferences");
            }
        }
        Err(SubmitError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                println!("  {}: {}", field.name(), message);
            }
        }
        // Already surfaced as a notification
        Err(SubmitError::Auth(_)) => {}
    }
}

fn read_form(email_arg: Option<&str>, last: Option<&str>) -> Result<LoginCredentials> {
    let email = match email_arg {
        Some(email) => email.to_string(),
        None => prompt_email(&mut io::stdin().lock(), &mut io::stdout(), last)?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    Ok(LoginCredentials::new(email, password))
}

fn prompt_email(
    input: &mut impl BufRead,
    output: &mut impl Write,
    last: Option<&str>,
) -> Result<String> {
    match last {
        Some(last) => write!(output, "Email [{}]: ", last)?,
        None => write!(output, "Email: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read email")? == 0 {
        bail!("No email entered");
    }
    let line = line.trim();

    Ok(match (line.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => line.to_string(),
    })
}

fn print_toasts(shell: &Shell) {
    for toast in shell.toaster().drain() {
        let marker = match toast.kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Loading => "...",
        };
        println!("[{}] {}", marker, toast.message);
    }
}
