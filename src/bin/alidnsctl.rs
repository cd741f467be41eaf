mod cli;
mod output;

use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info};
use thiserror::Error;

use alidnsctl::{
    executor::{Executor, ExecutorError},
    provider::{AliyunProvider, AliyunProviderConfig, Provider, ProviderError},
};

use cli::{Cli, Command, DomainsCommand, RecordsCommand};
use output::Output;

#[derive(Error, Debug)]
enum AppError {
    #[error("unable to create provider: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("unable to render output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();

    Builder::new().filter_level(cli.loglevel.into()).init();

    match run(&cli) {
        Ok(()) => debug!("Completed"),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn get_provider(cli: &Cli) -> Result<Box<dyn Provider>, ProviderError> {
    AliyunProvider::from_config(&AliyunProviderConfig {
        access_key_id: cli.access_key_id.as_str(),
        access_key_secret: cli.access_key_secret.as_str(),
        endpoint: cli.endpoint.as_str(),
    })
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let provider = get_provider(cli)?;
    info!("Created provider");
    let executor = Executor::new(provider.as_ref(), cli.dry_run);

    if let Some(output) = dispatch(&executor, &cli.command)? {
        println!("{}", output.render(cli.output)?);
    }
    Ok(())
}

fn dispatch(executor: &Executor, command: &Command) -> Result<Option<Output>, ExecutorError> {
    let output = match command {
        Command::Get {
            record_type,
            hostname,
        } => Output::Records(executor.list_records(hostname, record_type.as_deref())?),
        Command::Set {
            record_type,
            ttl,
            hostname,
            values,
        } => Output::Report(executor.set_records(
            hostname,
            record_type.as_deref(),
            values,
            *ttl,
        )?),
        Command::Del {
            all: true,
            record_type,
            hostname,
            ..
        } => Output::Report(executor.delete_all(hostname, record_type.as_deref())?),
        Command::Del {
            record_type,
            hostname,
            values,
            ..
        } => Output::Report(executor.delete_values(hostname, record_type.as_deref(), values)?),
        Command::Domains(DomainsCommand::List) => Output::Domains(executor.list_domains()?),
        Command::Domains(DomainsCommand::Info { domain }) => {
            Output::DomainInfo(executor.domain_info(domain)?)
        }
        Command::Records(RecordsCommand::Get { id }) => Output::Record(executor.record(id)?),
        Command::Records(RecordsCommand::Enable { id }) => {
            executor.set_status(id, false)?;
            return Ok(None);
        }
        Command::Records(RecordsCommand::Disable { id }) => {
            executor.set_status(id, true)?;
            return Ok(None);
        }
        Command::Records(RecordsCommand::Remove { id }) => {
            executor.delete_record(id)?;
            return Ok(None);
        }
    };
    Ok(Some(output))
}
