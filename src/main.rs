use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use groundwork::auth::password;
use groundwork::config::Config;
use groundwork::db;

#[derive(Parser)]
#[command(name = "groundwork", about = "Web application scaffold")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// User administration.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a new user to the database.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Create the account already activated.
        #[arg(long)]
        active: bool,
    },
    /// Activate an account so it becomes loginable.
    Activate { username: String },
    /// Replace a user's password.
    SetPassword {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Add a role to a given user, creating the role if needed.
    AddRole { username: String, role: String },
    /// Remove a role from a given user.
    RemoveRole { username: String, role: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::User { command } => match command {
            UserCommand::Create {
                username,
                email,
                password,
                active,
            } => create_user(&pool, &username, &email, &password, active).await,
            UserCommand::Activate { username } => activate(&pool, &username).await,
            UserCommand::SetPassword { username, password } => {
                set_password(&pool, &username, &password).await
            }
            UserCommand::AddRole { username, role } => add_role(&pool, &username, &role).await,
            UserCommand::RemoveRole { username, role } => {
                remove_role(&pool, &username, &role).await
            }
        },
    }
}

async fn serve(pool: PgPool, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Groundwork");

    let addr = SocketAddr::new(config.host, config.port);
    let app = groundwork::build_app(pool, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let password_hash = password::hash(password)?;

    match db::users::create(pool, username, email, &password_hash, active).await {
        Ok(user) => {
            println!("User {} created", user.username);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error creating user, make sure username and email are unique: {e}");
            std::process::exit(1);
        }
    }
}

async fn activate(pool: &PgPool, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(user) = db::users::find_by_username(pool, username).await? else {
        eprintln!("User does not exist");
        std::process::exit(1);
    };

    db::users::set_active(pool, user.id, true).await?;
    println!("User {} activated", user.username);
    Ok(())
}

async fn set_password(
    pool: &PgPool,
    username: &str,
    new_password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(user) = db::users::find_by_username(pool, username).await? else {
        eprintln!("User does not exist");
        std::process::exit(1);
    };

    let password_hash = password::hash(new_password)?;
    db::users::update_password(pool, user.id, &password_hash).await?;
    println!("Password updated for {}", user.username);
    Ok(())
}

async fn add_role(
    pool: &PgPool,
    username: &str,
    role_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(user) = db::users::find_by_username(pool, username).await? else {
        eprintln!("User does not exist");
        std::process::exit(1);
    };

    let role = match db::roles::find_by_name(pool, role_name).await? {
        Some(role) => role,
        None => db::roles::create(pool, role_name).await?,
    };

    if db::roles::grant(pool, user.id, role.id).await? {
        println!("Roles updated");
    } else {
        println!("User already has that role");
    }

    Ok(())
}

async fn remove_role(
    pool: &PgPool,
    username: &str,
    role_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(user) = db::users::find_by_username(pool, username).await? else {
        eprintln!("User does not exist");
        std::process::exit(1);
    };

    let Some(role) = db::roles::find_by_name(pool, role_name).await? else {
        eprintln!("Role does not exist");
        std::process::exit(1);
    };

    db::roles::revoke(pool, user.id, role.id).await?;
    println!("Roles updated");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
