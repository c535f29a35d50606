use aidiary::application::init::init;
use aidiary::application::{ConfigService, DiaryController, EntryRepository, SubmissionOutcome};
use aidiary::cli::{Cli, Commands, QuietPresenter, TerminalPresenter};
use aidiary::domain::date_label;
use aidiary::error::DiaryError;
use aidiary::infrastructure::config::ENV_API_KEY;
use aidiary::infrastructure::{DiaryWorkspace, TransformationClient};
use chrono::Local;
use clap::Parser;
use log::warn;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(_) => std::process::exit(0),
        // Empty input is dropped without a message
        Err(e @ DiaryError::EmptyInput) => std::process::exit(e.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), DiaryError> {
    match cli.command {
        Commands::Init { path } => {
            init(&path)?;
            println!("Initialized aidiary at {}", path.display());
            Ok(())
        }
        Commands::List => {
            let workspace = DiaryWorkspace::discover()?;
            workspace.load_config()?;
            let today = date_label(Local::now().date_naive());

            let mut controller = DiaryController::<_, TransformationClient, _>::read_only(
                EntryRepository::new(workspace.entry_store()),
                TerminalPresenter::new(today.clone()),
                today,
            );
            controller.start();
            Ok(())
        }
        Commands::Write { text } => {
            if text.is_empty() {
                return Err(DiaryError::EmptyInput);
            }

            let workspace = DiaryWorkspace::discover()?;
            let config = workspace.load_config()?.transform_config();
            if config.credential.is_empty() {
                warn!("No API key configured; set {} or 'aidiary config api_key'", ENV_API_KEY);
            }
            let client = TransformationClient::new(config)?;
            let today = date_label(Local::now().date_naive());

            let mut controller = DiaryController::new(
                EntryRepository::new(workspace.entry_store()),
                client,
                QuietPresenter::new(today.clone()),
                today,
            );
            let index = controller.start();
            controller.submit(index, &text)?;

            match controller.next_completion().await {
                Some(SubmissionOutcome::Failed { failure, .. }) => Err(DiaryError::Transform(failure)),
                _ => Ok(()),
            }
        }
        Commands::Config { key, value, list } => {
            let service = ConfigService::new(DiaryWorkspace::discover()?);

            if list {
                for (key, value) in service.list()? {
                    println!("{} = {}", key, value);
                }
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    if k == "api_key" {
                        println!("Set api_key");
                    } else {
                        println!("Set {} = {}", k, v);
                    }
                } else {
                    println!("{}", service.get(&k)?);
                }
            } else {
                println!("Usage: aidiary config [--list | <key> [<value>]]");
                println!("Valid keys: endpoint, max_tokens, connect_timeout_secs, read_timeout_secs, write_timeout_secs, api_key");
            }
            Ok(())
        }
    }
}
