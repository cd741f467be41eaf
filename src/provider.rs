//! DNS providers, such as Alibaba Cloud DNS, that ultimately serve the DNS records.
//!
//! Each provider implements the [`Provider`] trait, which exposes the remote record store
//! as a set of blocking calls. Providers are thin wrappers around the remote API:
//! they do not cache anything and every call maps to a single request.

mod aliyun;

// Re-exports for convenience
pub use self::aliyun::{AliyunProvider, AliyunProviderConfig, DEFAULT_ENDPOINT};

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

/// A provider is any DNS service provider that stores records for our domains.
/// They implement a few basic methods to access and modify DNS records.
#[cfg_attr(test, mockall::automock)]
pub trait Provider {
    /// List a single page of the domains registered with this account.
    /// Pages start at 1.
    fn list_domains(&self, page: u32, page_size: u32) -> Result<Page<Domain>, ProviderError>;

    /// Get detailed information about a single domain
    fn domain_info(&self, domain: &str) -> Result<DomainInfo, ProviderError>;

    /// List a single page of records matching the query.
    /// Pages start at 1.
    fn list_records(
        &self,
        query: &RecordQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<DomainRecord>, ProviderError>;

    /// Get a single record by its id
    fn record(&self, id: &str) -> Result<DomainRecord, ProviderError>;

    /// Create a new record in a domain, returning the id of the new record
    fn create_record(&self, domain: &str, spec: &RecordSpec) -> Result<String, ProviderError>;

    /// Replace the contents of an existing record, returning its id
    fn update_record(&self, id: &str, spec: &RecordSpec) -> Result<String, ProviderError>;

    /// Delete a single record by its id
    fn delete_record(&self, id: &str) -> Result<(), ProviderError>;

    /// Delete all records with the given relative name (and type, if set) in one call
    fn delete_records(
        &self,
        domain: &str,
        rr: &str,
        record_type: Option<String>,
    ) -> Result<(), ProviderError>;

    /// Enable or disable a single record
    fn set_record_status(&self, id: &str, enabled: bool) -> Result<(), ProviderError>;

    /// Whether the error returned by [`Provider::update_record()`] only signals that the record is already up to date
    fn is_idempotent_noop(&self, err: &ProviderError) -> bool;
}

/// Generic error returned by a provider action
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderError {
    /// The remote API rejected the request
    #[error("{code}: {message} (request id: {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },
    #[error("http request failed: {0}")]
    Http(String),
    #[error("could not parse response: {0}")]
    Parse(String),
    #[error("could not sign request: {0}")]
    Signing(String),
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// A single page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Whether more pages are available after this one
    pub has_more: bool,
}

/// Whether a record is served or not
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    Enable,
    Disable,
}

impl Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Enable => write!(f, "ENABLE"),
            RecordStatus::Disable => write!(f, "DISABLE"),
        }
    }
}

/// A DNS record as known to the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DomainRecord {
    /// Provider assigned id. This is the only stable handle on a record
    pub id: String,
    /// Relative name, `@` for the zone apex
    pub rr: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    pub locked: bool,
}

impl Display for DomainRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} {} {} ({})",
            self.rr, self.domain, self.record_type, self.value, self.id
        )
    }
}

/// A domain (zone) registered with the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punycode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Detailed information about a single domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DomainInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punycode: Option<String>,
    pub dns_servers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Selects records from a domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordQuery {
    pub domain: String,
    /// Only return records with exactly this relative name
    pub rr: Option<String>,
    /// Only return records of this type
    pub record_type: Option<String>,
}

/// Desired contents of a record to create or update
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordSpec {
    pub rr: String,
    /// Record type. If unset, the provider is left to reject the request
    pub record_type: Option<String>,
    pub value: String,
    /// Time to live in seconds. The provider default is used if unset
    pub ttl: Option<u32>,
}

impl Display for RecordSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.rr,
            self.record_type.as_deref().unwrap_or("?"),
            self.value
        )
    }
}
