//! Saleso CLI - Session and backend tools for the Saleso admin dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from SALESO_PASSWORD or stdin)
//! saleso login -e seller@example.com
//!
//! # Show the signed-in user
//! saleso whoami --remote
//!
//! # Call any backend endpoint through the authenticated gateway
//! saleso request GET /user/user-detail
//! saleso request POST /category --body '{"name":"Shoes"}'
//!
//! # Print the category tree
//! saleso categories
//!
//! # Dashboard theme preference
//! saleso theme set dark
//! ```
//!
//! # Environment Variables
//!
//! - `SALESO_API_BASE_URL` - Backend base URL (required)
//! - `SENTRY_DSN` - Enables Sentry error reporting (optional)
//! - `RUST_LOG` - Log filter (default: `saleso_cli=info,saleso_client=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "saleso")]
#[command(author, version, about = "Saleso admin dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password; read from stdin when omitted
        #[arg(long, env = "SALESO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the backend instead of the stored record
        #[arg(long)]
        remote: bool,
    },
    /// Send an authenticated request and print the JSON response
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to the API base URL, e.g. `/product?page=2`
        path: String,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Print the category tree
    Categories {
        /// Print only the breadcrumb to this category
        #[arg(long)]
        path_to: Option<String>,
    },
    /// Read or change the dashboard theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the stored theme
    Get,
    /// Store a theme (`light` or `dark`)
    Set { mode: String },
    /// Switch between light and dark
    Toggle,
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Sentry must be initialized before the subscriber
    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "saleso_cli=info,saleso_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if sentry_guard.is_some() {
        tracing::debug!("Sentry initialized");
    }

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&email, password).await?,
        Commands::Logout => commands::auth::logout().await?,
        Commands::Whoami { remote } => commands::auth::whoami(remote).await?,
        Commands::Request { method, path, body } => {
            commands::request::send(&method, &path, body.as_deref()).await?;
        }
        Commands::Categories { path_to } => {
            commands::catalog::categories(path_to.as_deref()).await?;
        }
        Commands::Theme { action } => match action {
            ThemeAction::Get => commands::theme::get()?,
            ThemeAction::Set { mode } => commands::theme::set(&mode)?,
            ThemeAction::Toggle => commands::theme::toggle()?,
        },
    }
    Ok(())
}
