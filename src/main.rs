use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trustbite::commands::{
    self, CommandContext, complaint::ComplaintArgs, report::ReportArgs,
};
use trustbite::complaint::ComplaintStatus;
use trustbite::config::PortalConfig;
use trustbite::devserver::{self, Fixtures};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $TRUSTBITE_CONFIG, then the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the validity of an FSSAI license number
    Check {
        /// FSSAI license number
        identifier: String,
        /// Exit with an error unless the license is valid and not misused
        #[arg(long)]
        strict: bool,
    },
    /// Report a missing, invalid or misused FSSAI license
    Report(ReportArgs),
    /// Submit a food safety complaint
    Complaint(ComplaintArgs),
    /// List complaint categories and concern types
    Categories,
    /// Show the status of your complaints
    Status,
    /// Review and resolve complaints
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run a local development API with sample data
    DevServer {
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// JSON file with `licenses` and `complaints` arrays
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List all complaints
    List {
        /// Only show complaints in this status (e.g. under-review)
        #[arg(long)]
        status: Option<ComplaintStatus>,
    },
    /// Move a complaint to a new status
    Update {
        /// Complaint ID
        id: String,
        /// New status: under-review, investigating, resolved or rejected
        #[arg(long)]
        status: ComplaintStatus,
        /// Resolution note (required when resolving)
        #[arg(long)]
        resolution: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let signed_in = || -> Result<CommandContext> {
        CommandContext::signed_in(PortalConfig::load(config_path)?)
    };

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                commands::config::execute_config_init(config_path, force).map(|_| ())
            }
            ConfigAction::Show => commands::config::execute_config_show(config_path),
        },
        Commands::Categories => {
            commands::complaint::execute_list_categories();
            Ok(())
        }
        Commands::DevServer { port, fixtures } => {
            let fixtures = match fixtures {
                Some(path) => Fixtures::load(&path)?,
                None => Fixtures::sample(),
            };
            devserver::main(port, fixtures).await
        }
        Commands::Check { identifier, strict } => {
            commands::check::execute_check(&signed_in()?, &identifier, strict).await
        }
        Commands::Report(args) => commands::report::execute_report(&signed_in()?, &args).await,
        Commands::Complaint(args) => {
            commands::complaint::execute_complaint(&signed_in()?, &args).await
        }
        Commands::Status => commands::status::execute_status(&signed_in()?).await,
        Commands::Admin { action } => {
            let context = signed_in()?;
            match action {
                AdminAction::List { status } => {
                    commands::admin::execute_admin_list(&context, status).await
                }
                AdminAction::Update {
                    id,
                    status,
                    resolution,
                } => commands::admin::execute_admin_update(&context, &id, status, resolution).await,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    trustbite::logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    Ok(())
}
