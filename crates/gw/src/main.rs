mod config;

use clap::{Parser, Subcommand};
use config::{GatewayConfig, LogFormat};
use gw_core::types::{
    ApiKeyId, CreateTeamInput, IssueKeyInput, RegisterServerInput, ServerId, ServerKind,
    ServerStatus, TeamId, TeamPlan,
};
use gw_core::{Gateway, GatewayError, StoreProvider};
use gw_db::DbProvider;
use owo_colors::OwoColorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gw", version, about = "Multi-tenant tool gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or upgrade the database schema.
    Migrate,
    /// Print the OpenAPI document.
    Openapi,
    #[command(subcommand)]
    Team(TeamCommand),
    #[command(subcommand)]
    Server(ServerCommand),
    #[command(subcommand)]
    Key(KeyCommand),
}

#[derive(Subcommand)]
enum TeamCommand {
    /// Create a team and print its first API key.
    Create {
        name: String,
        #[arg(long, default_value = "free")]
        plan: String,
    },
    List,
    Delete { id: String },
}

#[derive(Subcommand)]
enum ServerCommand {
    Add {
        #[arg(long)]
        team: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: String,
        /// Backend credentials as a JSON object.
        #[arg(long, default_value = "{}")]
        config: String,
    },
    List {
        #[arg(long)]
        team: String,
    },
    Enable { id: String },
    Disable { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum KeyCommand {
    Issue {
        #[arg(long)]
        team: String,
        #[arg(long, default_value = "cli")]
        label: String,
    },
    List {
        #[arg(long)]
        team: String,
    },
    Revoke { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };
    init_tracing(config.log_format);

    let result = match cli.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Migrate => open_provider(&config).map(|provider| {
            println!("{} {}", "migrated".green(), provider.path().display());
        }),
        Command::Openapi => match serde_json::to_string_pretty(&gw_serve::openapi::document()) {
            Ok(json) => {
                println!("{json}");
                Ok(())
            }
            Err(err) => Err(GatewayError::internal(err)),
        },
        Command::Team(command) => open_provider(&config).and_then(|p| team(&p, command)),
        Command::Server(command) => open_provider(&config).and_then(|p| server(&p, command)),
        Command::Key(command) => open_provider(&config).and_then(|p| key(&p, command)),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if installed.is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn fail(err: &dyn std::fmt::Display) -> ExitCode {
    eprintln!("{} {err}", "error:".red().bold());
    ExitCode::FAILURE
}

fn open_provider(config: &GatewayConfig) -> Result<DbProvider, GatewayError> {
    if let Some(parent) = config.db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(GatewayError::internal)?;
    }
    DbProvider::init(&config.db_path)
}

async fn serve(config: GatewayConfig, port: Option<u16>) -> Result<(), GatewayError> {
    let provider = open_provider(&config)?;
    let backends =
        gw_backends::default_registry(config.backend_timeout).map_err(GatewayError::internal)?;
    let mut addr = config.addr();
    if let Some(port) = port {
        addr.set_port(port);
    }
    tracing::info!(db = %provider.path().display(), kinds = ?backends.kinds(), "starting gateway");
    let state = gw_serve::AppState::new(provider, backends, config.feed);
    gw_serve::serve(state, addr)
        .await
        .map_err(GatewayError::internal)
}

fn gateway(provider: &DbProvider) -> Result<Gateway<gw_db::DbStore>, GatewayError> {
    Ok(Gateway::new(provider.open()?))
}

fn parse_id<T: std::str::FromStr<Err = gw_events::IdError>>(
    value: &str,
) -> Result<T, GatewayError> {
    value.parse().map_err(|err: gw_events::IdError| invalid_input(err.to_string()))
}

fn team(provider: &DbProvider, command: TeamCommand) -> Result<(), GatewayError> {
    let gateway = gateway(provider)?;
    match command {
        TeamCommand::Create { name, plan } => {
            let plan = plan.parse::<TeamPlan>().map_err(invalid_input)?;
            let (team, issued) = gateway.teams().create(CreateTeamInput { name, plan })?;
            println!("{} {} ({})", "created".green(), team.id, team.name);
            println!("{} {}", "api key:".yellow(), issued.secret.bold());
            println!("{}", "store this key now; it is not shown again".dimmed());
        }
        TeamCommand::List => {
            for team in gateway.teams().list()? {
                println!("{}  {}  {}", team.id, team.name.bold(), team.plan);
            }
        }
        TeamCommand::Delete { id } => {
            gateway.teams().delete(&parse_id::<TeamId>(&id)?)?;
            println!("{} {id}", "deleted".green());
        }
    }
    Ok(())
}

fn server(provider: &DbProvider, command: ServerCommand) -> Result<(), GatewayError> {
    let gateway = gateway(provider)?;
    match command {
        ServerCommand::Add {
            team,
            name,
            kind,
            config,
        } => {
            let kind = kind
                .parse::<ServerKind>()
                .map_err(invalid_input)?;
            let config = serde_json::from_str(&config)
                .map_err(|err| invalid_input(format!("config is not valid JSON: {err}")))?;
            let server = gateway.servers().register(RegisterServerInput {
                team_id: parse_id(&team)?,
                name,
                kind,
                config,
            })?;
            println!("{} {} ({})", "registered".green(), server.id, server.kind);
        }
        ServerCommand::List { team } => {
            for server in gateway.servers().list(&parse_id(&team)?)? {
                println!(
                    "{}  {}  {}  {}",
                    server.id,
                    server.name.bold(),
                    server.kind,
                    server.status
                );
            }
        }
        ServerCommand::Enable { id } => set_status(&gateway, &id, ServerStatus::Active)?,
        ServerCommand::Disable { id } => set_status(&gateway, &id, ServerStatus::Inactive)?,
        ServerCommand::Remove { id } => {
            gateway.servers().delete(&parse_id::<ServerId>(&id)?)?;
            println!("{} {id}", "removed".green());
        }
    }
    Ok(())
}

fn set_status(
    gateway: &Gateway<gw_db::DbStore>,
    id: &str,
    status: ServerStatus,
) -> Result<(), GatewayError> {
    let server = gateway.servers().set_status(&parse_id(id)?, status)?;
    println!("{} {} is {}", "updated".green(), server.id, server.status);
    Ok(())
}

fn key(provider: &DbProvider, command: KeyCommand) -> Result<(), GatewayError> {
    let gateway = gateway(provider)?;
    match command {
        KeyCommand::Issue { team, label } => {
            let issued = gateway.keys().issue(IssueKeyInput {
                team_id: parse_id(&team)?,
                label,
            })?;
            println!("{} {}", "issued".green(), issued.key.id);
            println!("{} {}", "api key:".yellow(), issued.secret.bold());
        }
        KeyCommand::List { team } => {
            for key in gateway.keys().list(&parse_id(&team)?)? {
                let state = if key.is_revoked() { "revoked" } else { "active" };
                println!("{}  {}  {}", key.id, key.label.bold(), state);
            }
        }
        KeyCommand::Revoke { id } => {
            let key = gateway.keys().revoke(&parse_id::<ApiKeyId>(&id)?)?;
            println!("{} {}", "revoked".green(), key.id);
        }
    }
    Ok(())
}

fn invalid_input(message: String) -> GatewayError {
    gw_core::error::TeamError::InvalidInput { message }.into()
}
