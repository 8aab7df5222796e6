use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use taskboard_core::{Db, SessionAuthenticator};
use taskboard_server::config::{DEFAULT_ADDR, DEFAULT_SESSION_COOKIE, resolve_database_url};
use taskboard_server::{ServerConfig, serve};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "taskboard=info,taskboard_core=info,taskboard_server=info";

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Multi-tenant task board API")]
struct Cli {
    /// SQLite URL; defaults to a database under the user state directory
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "TASKBOARD_ADDR", default_value = DEFAULT_ADDR)]
        addr: String,
        /// Cookie that carries the session token
        #[arg(long, env = "TASKBOARD_SESSION_COOKIE", default_value = DEFAULT_SESSION_COOKIE)]
        session_cookie: String,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user and print a session token for it
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Session lifetime in days
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr, session_cookie } => {
            let config = ServerConfig::resolve(cli.database_url, &addr, &session_cookie)?;
            serve(config).await?;
        }
        Command::Migrate => {
            let url = resolve_database_url(cli.database_url)?;
            let db = Db::connect(&url).await?;
            db.close().await;
            println!("Database is up to date");
        }
        Command::User {
            command: UserCommand::Create { name, email, days },
        } => {
            let ttl = session_ttl(days)?;
            let url = resolve_database_url(cli.database_url)?;
            let db = Db::connect(&url).await?;
            let auth = SessionAuthenticator::new(db.clone());
            let (user, session) = auth.create_user_session(&name, &email, ttl).await?;
            db.close().await;

            println!("Created user {} <{}> ({})", user.name, user.email, user.id);
            println!("Session token (expires {}):", session.expires_at.to_rfc3339());
            println!("{}", session.token);
        }
    }

    Ok(())
}

fn session_ttl(days: i64) -> anyhow::Result<Duration> {
    anyhow::ensure!(days > 0, "--days must be positive");
    Duration::try_days(days)
        .with_context(|| format!("--days {days} is too large for a session lifetime"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_user_create() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "--database-url",
            "sqlite::memory:",
            "user",
            "create",
            "--name",
            "Alex",
            "--email",
            "alex@example.com",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        match cli.command {
            Command::User {
                command: UserCommand::Create { name, email, days },
            } => {
                assert_eq!(name, "Alex");
                assert_eq!(email, "alex@example.com");
                assert_eq!(days, 7);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["taskboard", "serve"]).unwrap();
        match cli.command {
            Command::Serve { addr, session_cookie } => {
                let database_url = Some("sqlite::memory:".into());
                assert!(ServerConfig::resolve(database_url, &addr, &session_cookie).is_ok());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn session_ttl_rejects_out_of_range_days() {
        assert_eq!(session_ttl(7).unwrap(), Duration::days(7));
        assert!(session_ttl(0).is_err());
        assert!(session_ttl(-3).is_err());
        assert!(session_ttl(i64::MAX).is_err());
    }
}
