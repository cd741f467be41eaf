use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{detect_common_type, type_or_detect, RecordName},
    plan::{Action, Plan},
    provider::{
        Domain, DomainInfo, DomainRecord, Page, Provider, ProviderError, RecordQuery, RecordSpec,
    },
};

/// Page size used when walking through paged listings
pub const PAGE_SIZE: u32 = 100;

/// An executor performs the operations requested by the user against a [`Provider`]
pub struct Executor<'a> {
    provider: &'a dyn Provider,
    dry_run: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// A change could not be applied. Changes applied before it are not rolled back
    #[error("failed to {action}: {source}")]
    Action {
        action: Action,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Outcome of a command that changes records
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Report {
    pub dry_run: bool,
    /// Values of newly created records
    pub created: Vec<Created>,
    pub updated: Vec<Updated>,
    pub deleted: Vec<DomainRecord>,
    pub unchanged: Vec<DomainRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    /// Empty in dry-run mode
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Updated {
    pub id: String,
    pub from: String,
    pub to: String,
}

impl<'a> Executor<'a> {
    pub fn new(provider: &'a dyn Provider, dry_run: bool) -> Executor<'a> {
        if dry_run {
            info!("Running in dry-run mode, no changes to the DNS provider will be made");
        }
        Executor { provider, dry_run }
    }

    /// Make the records of `hostname` with the given type hold exactly `values`.
    ///
    /// Existing records are reused where possible: records that already hold a desired value are kept,
    /// stale ones are updated in place and only the surplus is deleted or created.
    /// If no type is given, it is detected from the values. If they don't share a single detectable type,
    /// records of all types are considered and the type of each new value is detected on its own.
    ///
    /// A list without any non-empty value is a no-op. Use [`Executor::delete_all()`] to remove all records.
    pub fn set_records(
        &self,
        hostname: &str,
        record_type: Option<&str>,
        values: &[String],
        ttl: Option<u32>,
    ) -> Result<Report, ExecutorError> {
        if values.iter().all(String::is_empty) {
            info!("No values given for {}, nothing to do", hostname);
            return Ok(self.report());
        }
        let name = RecordName::from_hostname(hostname);
        let record_type = record_type.or_else(|| detect_common_type(values));
        let existing = self.all_records(&self.mutation_query(&name, record_type))?;
        debug!("Existing records for {}: {:?}", name, existing);

        let plan = Plan::generate(&existing, values);
        self.apply(&name, record_type, ttl, plan)
    }

    /// Delete the records of `hostname` with the given type that hold one of `values`
    pub fn delete_values(
        &self,
        hostname: &str,
        record_type: Option<&str>,
        values: &[String],
    ) -> Result<Report, ExecutorError> {
        let name = RecordName::from_hostname(hostname);
        let record_type = record_type.or_else(|| detect_common_type(values));
        let existing = self.all_records(&self.mutation_query(&name, record_type))?;

        let plan = Plan::removal(&existing, values);
        self.apply(&name, record_type, None, plan)
    }

    /// Delete every record of `hostname` with the given type (or all types) in a single call
    pub fn delete_all(
        &self,
        hostname: &str,
        record_type: Option<&str>,
    ) -> Result<Report, ExecutorError> {
        let name = RecordName::from_hostname(hostname);
        info!(
            "Deleting all {} records of {}",
            record_type.unwrap_or("*"),
            name
        );
        if !self.dry_run {
            self.provider.delete_records(
                &name.domain,
                name.rr_or_apex(),
                record_type.map(str::to_owned),
            )?;
        }
        Ok(self.report())
    }

    /// List the records of `hostname`. If the hostname is a registered domain, the whole zone is listed
    pub fn list_records(
        &self,
        hostname: &str,
        record_type: Option<&str>,
    ) -> Result<Vec<DomainRecord>, ExecutorError> {
        let name = RecordName::from_hostname(hostname);
        let query = RecordQuery {
            domain: name.domain.to_owned(),
            rr: name.rr_filter().map(str::to_owned),
            record_type: record_type.map(str::to_owned),
        };
        Ok(self.all_records(&query)?)
    }

    /// List all domains of the account
    pub fn list_domains(&self) -> Result<Vec<Domain>, ExecutorError> {
        Ok(collect_pages(|page| {
            self.provider.list_domains(page, PAGE_SIZE)
        })?)
    }

    pub fn domain_info(&self, domain: &str) -> Result<DomainInfo, ExecutorError> {
        Ok(self.provider.domain_info(domain)?)
    }

    pub fn record(&self, id: &str) -> Result<DomainRecord, ExecutorError> {
        Ok(self.provider.record(id)?)
    }

    /// Enable or disable a single record by id
    pub fn set_status(&self, id: &str, disabled: bool) -> Result<(), ExecutorError> {
        info!(
            "{} record {}",
            if disabled { "Disabling" } else { "Enabling" },
            id
        );
        if !self.dry_run {
            self.provider.set_record_status(id, !disabled)?;
        }
        Ok(())
    }

    /// Delete a single record by id
    pub fn delete_record(&self, id: &str) -> Result<(), ExecutorError> {
        info!("Deleting record {}", id);
        if !self.dry_run {
            self.provider.delete_record(id)?;
        }
        Ok(())
    }

    fn report(&self) -> Report {
        Report {
            dry_run: self.dry_run,
            ..Default::default()
        }
    }

    // Records of a name are always addressed by their exact relative name when changing them
    fn mutation_query(&self, name: &RecordName, record_type: Option<&str>) -> RecordQuery {
        RecordQuery {
            domain: name.domain.to_owned(),
            rr: Some(name.rr_or_apex().to_owned()),
            record_type: record_type.map(str::to_owned),
        }
    }

    fn all_records(&self, query: &RecordQuery) -> Result<Vec<DomainRecord>, ProviderError> {
        collect_pages(|page| self.provider.list_records(query, page, PAGE_SIZE))
    }

    // Apply all actions of a plan in order, stopping at the first failure
    fn apply(
        &self,
        name: &RecordName,
        record_type: Option<&str>,
        ttl: Option<u32>,
        plan: Plan,
    ) -> Result<Report, ExecutorError> {
        let mut report = self.report();
        report.unchanged = plan.unchanged;
        if plan.actions.is_empty() {
            info!("Records of {} are up to date", name);
            return Ok(report);
        }

        for action in plan.actions {
            info!("Applying: {}", action);
            match &action {
                Action::Create(value) => {
                    let spec = self.spec(name, record_type, value, ttl);
                    let id = if self.dry_run {
                        String::new()
                    } else {
                        self.provider
                            .create_record(&name.domain, &spec)
                            .map_err(|source| ExecutorError::Action {
                                action: action.clone(),
                                source,
                            })?
                    };
                    report.created.push(Created {
                        id,
                        value: value.to_owned(),
                    });
                }
                Action::Update { record, value } => {
                    let spec = self.spec(name, record_type, value, ttl.or(record.ttl));
                    if !self.dry_run {
                        match self.provider.update_record(&record.id, &spec) {
                            Ok(_) => {}
                            Err(e) if self.provider.is_idempotent_noop(&e) => {
                                warn!("Record {} already holds {}, skipping", record.id, value);
                            }
                            Err(source) => {
                                return Err(ExecutorError::Action {
                                    action: action.clone(),
                                    source,
                                })
                            }
                        }
                    }
                    report.updated.push(Updated {
                        id: record.id.to_owned(),
                        from: record.value.to_owned(),
                        to: value.to_owned(),
                    });
                }
                Action::Delete(record) => {
                    if !self.dry_run {
                        self.provider
                            .delete_record(&record.id)
                            .map_err(|source| ExecutorError::Action {
                                action: action.clone(),
                                source,
                            })?;
                    }
                    report.deleted.push(record.clone());
                }
            }
        }
        Ok(report)
    }

    fn spec(
        &self,
        name: &RecordName,
        record_type: Option<&str>,
        value: &str,
        ttl: Option<u32>,
    ) -> RecordSpec {
        let record_type = type_or_detect(record_type, value);
        if record_type.is_none() {
            warn!("Could not detect a record type for {}, please set one", value);
        }
        RecordSpec {
            rr: name.rr_or_apex().to_owned(),
            record_type,
            value: value.to_owned(),
            ttl,
        }
    }
}

// Walk through a paged listing until the provider reports no more pages
fn collect_pages<T>(
    mut request: impl FnMut(u32) -> Result<Page<T>, ProviderError>,
) -> Result<Vec<T>, ProviderError> {
    let mut page = 1;
    let mut items = Vec::new();
    loop {
        let mut response = request(page)?;
        items.append(&mut response.items);
        if !response.has_more {
            return Ok(items);
        }
        page += 1;
    }
}
