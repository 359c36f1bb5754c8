use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use navguard::config::{ConfigError, GuardConfig};
use navguard::identity::{Identity, Role};
use navguard::navigator::{NavError, Navigation, Navigator};
use navguard::resolver::{HttpSessionResolver, SessionResolver, StaticResolver};
use navguard::routes::RouteTable;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Navigation(#[from] NavError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "navguard", about = "Check quiz client navigation against the route guard")]
struct Cli {
    /// Identity provider origin; overrides `NAVGUARD_API_BASE_URL`.
    #[arg(long)]
    api_base_url: Option<String>,

    /// Cookie header sent to `/api/me`; overrides `NAVGUARD_SESSION_COOKIE`.
    #[arg(long)]
    session_cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Navigate to a path and print where the caller ends up.
    Check {
        path: String,
        #[arg(long)]
        from: Option<String>,
        /// Skip the identity provider and assume this identity.
        #[arg(long = "as", value_enum)]
        assume: Option<AssumedIdentity>,
        #[arg(long)]
        json: bool,
    },
    /// Resolve and print the current identity.
    Whoami,
    /// Print the route table.
    Routes {
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AssumedIdentity {
    Absent,
    User,
    Admin,
}

impl From<AssumedIdentity> for Identity {
    fn from(value: AssumedIdentity) -> Self {
        match value {
            AssumedIdentity::Absent => Self::Absent,
            AssumedIdentity::User => Self::with_role(Role::User),
            AssumedIdentity::Admin => Self::with_role(Role::Admin),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "navguard failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = GuardConfig::from_env()?;
    if let Some(url) = &cli.api_base_url {
        config = config.with_api_base_url(url)?;
    }
    if let Some(cookie) = cli.session_cookie {
        config = config.with_session_cookie(cookie);
    }

    match cli.command {
        Command::Check { path, from, assume, json } => {
            let navigator = match assume {
                Some(identity) => Navigator::new(RouteTable::quiz_app(), StaticResolver::new(identity.into())),
                None => Navigator::new(RouteTable::quiz_app(), HttpSessionResolver::new(&config)?),
            }
            .with_max_redirects(config.max_redirects);

            let navigation = navigator.navigate(&path, from.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&navigation)?);
            } else {
                print_navigation(&navigation);
            }
        }
        Command::Whoami => {
            let resolver = HttpSessionResolver::new(&config)?;
            let identity = resolver.resolve().await;
            match identity {
                Identity::Absent => println!("absent ({})", resolver.me_url()),
                Identity::Present(user) => {
                    println!("{} {}", user.role, user.email.as_deref().unwrap_or("<no email>"));
                }
            }
        }
        Command::Routes { json } => {
            let table = RouteTable::quiz_app();
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                for spec in table.iter() {
                    let access = match (spec.admin_only, spec.requires_auth) {
                        (true, _) => "admin",
                        (false, true) => "auth",
                        (false, false) => "public",
                    };
                    let alias = spec.redirect.as_deref().map(|t| format!(" -> {t}")).unwrap_or_default();
                    println!("{:<34} {access:<6}{alias}", spec.path);
                }
            }
        }
    }
    Ok(())
}

fn print_navigation(navigation: &Navigation) {
    for hop in &navigation.hops {
        println!("{:<34} {:<18} {}", hop.path, hop.rule, hop.verdict);
    }
    if navigation.was_redirected() {
        println!("=> {} (requested {})", navigation.destination, navigation.requested);
    } else {
        println!("=> {}", navigation.destination);
    }
}
