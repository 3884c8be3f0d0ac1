//! Command line front end for the CRM records API.

use std::env;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use thiserror::Error;

use crm_records::api::ApiError;
use crm_records::domain::record::{Record, RecordFormData};
use crm_records::domain::types::{RecordId, TypeConstraintError};
use crm_records::forms::FormError;
use crm_records::forms::record::RecordForm;
use crm_records::models::config::load_config;
use crm_records::query::RecordsCoordinator;
use crm_records::services::normalizer::{DataSource, FetchIssue};

#[derive(Debug)]
enum Command {
    List(Option<String>),
    Options,
    Create(PathBuf),
    Update(String, PathBuf),
    Delete(String),
}

#[derive(Debug, Error)]
enum CliError {
    #[error(
        "usage: crm-records <list [search] | options | create <file.json> | update <id> <file.json> | delete <id>>"
    )]
    Usage,
    #[error("Cannot read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid record id: {0}")]
    Id(#[from] TypeConstraintError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Cannot load {0}: {1}")]
    Fetch(&'static str, FetchIssue),
}

fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["list"] => Ok(Command::List(None)),
        ["list", terms @ ..] => Ok(Command::List(Some(terms.join(" ")))),
        ["options"] => Ok(Command::Options),
        ["create", file] => Ok(Command::Create(PathBuf::from(file))),
        ["update", id, file] => Ok(Command::Update(id.to_string(), PathBuf::from(file))),
        ["delete", id] => Ok(Command::Delete(id.to_string())),
        _ => Err(CliError::Usage),
    }
}

fn read_form_data(path: &Path) -> Result<RecordFormData, CliError> {
    let contents =
        std::fs::read_to_string(path).map_err(|err| CliError::Read(path.to_path_buf(), err))?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_record(record: &Record) {
    let data = &record.data;
    println!(
        "{}\t{}\t{}\t{}\t{}\t{:.2}\t{}",
        record.id,
        data.razao_social,
        data.cnpj,
        data.consultor,
        data.plano,
        data.valor_do_plano,
        data.status
    );
}

async fn submit_form(coordinator: &RecordsCoordinator, form: RecordForm) -> Result<(), CliError> {
    let config = coordinator.fetch_config().await;
    if let Some(issue) = &config.error {
        log::warn!("Form options not loaded from the API: {issue}");
    }

    let submission = form.rederive(config.data.as_deref()).submit()?;
    match coordinator.save(&submission).await? {
        Some(record) => print_record(&record),
        None => println!("Saved"),
    }
    Ok(())
}

async fn run(coordinator: &RecordsCoordinator, command: Command) -> Result<(), CliError> {
    match command {
        Command::List(search) => {
            let view = coordinator.mount().await;
            if let Some(issue) = view.records_error.clone() {
                return Err(CliError::Fetch("records", issue));
            }
            if view.records_source == Some(DataSource::Fallback) {
                eprintln!("API unavailable, showing sample records");
            }
            for record in view.search(search.as_deref().unwrap_or_default()) {
                print_record(record);
            }
        }
        Command::Options => {
            coordinator.fetch_config().await;
            let view = coordinator.view();
            if let Some(issue) = view.config_error {
                return Err(CliError::Fetch("form options", issue));
            }
            if view.config_source == Some(DataSource::Fallback) {
                eprintln!("API unavailable, showing built-in form options");
            }
            if let Some(options) = view.form_options {
                println!("{}", serde_json::to_string_pretty(options.as_ref())?);
            }
        }
        Command::Create(path) => {
            let form = RecordForm::from_data(read_form_data(&path)?);
            submit_form(coordinator, form).await?;
        }
        Command::Update(id, path) => {
            let form = RecordForm {
                data: read_form_data(&path)?,
                editing: Some(RecordId::new(id)?),
            };
            submit_form(coordinator, form).await?;
        }
        Command::Delete(id) => {
            let id = RecordId::new(id)?;
            coordinator.delete_record(&id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let command = match parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let client_config = match load_config(&app_env) {
        Ok(client_config) => client_config,
        Err(err) => {
            log::error!("Error loading client config: {}", err);
            std::process::exit(1);
        }
    };

    let coordinator = match RecordsCoordinator::connect(&client_config) {
        Ok(coordinator) => coordinator,
        Err(err) => {
            log::error!("Error creating records client: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&coordinator, command).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}
