use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use halaltrack::ai::Analyzer;
use halaltrack::config::Config;
use halaltrack::models::{CreateUserInput, Role};
use halaltrack::state::{reduce, Action, AppState};
use halaltrack::{api, db, mcp, views, workflow};

#[derive(Parser)]
#[command(name = "htrack")]
#[command(about = "Halal certification workflow tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HalalTrack HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Print the Kanban board
    Board {
        /// Filter by product or company name
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Print all tasks as a table
    Table {
        /// Filter by product or company name
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Print pipeline statistics
    Stats,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create an account
    Add {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// superadmin, admin or user
        #[arg(short, long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },
    /// List accounts
    List,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_str(s).ok_or_else(|| format!("unknown role '{}': expected superadmin, admin or user", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for MCP and printed views.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "halaltrack=debug,halaltrack_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let db = db::Database::open(&config.db_path)?;
    db.migrate()?;

    match cli.command.unwrap_or(Commands::Serve { port: 3000 }) {
        Commands::Serve { port } => {
            tracing::info!("Starting HalalTrack server on port {}", port);

            let analyzer = Analyzer::new(config.ai.clone());
            let app = api::create_router(db, analyzer);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("HalalTrack server listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::Mcp => {
            mcp::run_stdio_server(db).await?;
        }
        Commands::User { command } => match command {
            UserCommands::Add { username, password, role } => {
                let account = db.sign_up(CreateUserInput { username, password, role })?;
                println!("Created {} '{}' ({})", account.role.as_str(), account.username, account.id);
            }
            UserCommands::List => {
                for user in db.list_users()? {
                    println!(
                        "{}  {:<24} {:<10} {}",
                        user.id,
                        user.username,
                        user.role.as_str(),
                        user.created_at.format("%Y-%m-%d")
                    );
                }
            }
        },
        Commands::Board { search } => {
            let state = load_state(&db, search)?;
            print!("{}", views::render_board(&state, Utc::now()));
        }
        Commands::Table { search } => {
            let state = load_state(&db, search)?;
            print!("{}", views::render_table(&state, Utc::now()));
        }
        Commands::Stats => {
            let tasks = db.get_all_tasks()?;
            let sla = db.get_sla_config()?;
            print!("{}", views::render_stats(&workflow::stats(&tasks, &sla, Utc::now())));
        }
    }

    Ok(())
}

fn load_state(db: &db::Database, search: String) -> anyhow::Result<AppState> {
    let mut state = AppState::default();
    reduce(
        &mut state,
        Action::Loaded {
            tasks: db.get_all_tasks()?,
            sla: db.get_sla_config()?,
        },
    );
    reduce(&mut state, Action::Search(search));
    Ok(state)
}
