use alidnsctl::{
    executor::Report,
    provider::{Domain, DomainInfo, DomainRecord},
};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Result of a command, printed once the command has completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Records(Vec<DomainRecord>),
    Record(DomainRecord),
    Domains(Vec<Domain>),
    DomainInfo(DomainInfo),
    Report(Report),
}

impl Output {
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}
