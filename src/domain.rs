//! Helpers for turning user supplied hostnames and record values into the pieces the DNS provider works with.
//!
//! - [`split_domain()`] separates a hostname into its relative record name and registered domain
//! - [`detect_type()`] guesses a record type (A, AAAA or CNAME) from the shape of a record value

use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr},
};

use lazy_static::lazy_static;
use regex::Regex;

/// Relative name used by providers to address the zone apex
pub const APEX: &str = "@";

lazy_static! {
    // One or more dot separated labels made of alphanumerics, underscores and inner hyphens.
    // A single trailing dot is allowed.
    static ref HOSTNAME_RE: Regex = Regex::new(
        r"^(?:[A-Za-z0-9_](?:[A-Za-z0-9_-]*[A-Za-z0-9_])?\.)*[A-Za-z0-9_](?:[A-Za-z0-9_-]*[A-Za-z0-9_])?\.?$"
    )
    .unwrap();
}

/// Split a fully qualified hostname into `(relative name, registered domain)`.
///
/// The registered domain is always the last two labels of the name, a single trailing dot is ignored.
/// If the name has less than three labels, the relative name is empty and the whole name is returned as the domain.
///
/// Note that public suffixes spanning more than one label are not known to this function:
/// `www.example.co.uk` is split into `www.example` and `co.uk`.
pub fn split_domain(full: &str) -> (String, String) {
    let full = full.strip_suffix('.').unwrap_or(full);
    match full.rmatch_indices('.').nth(1) {
        Some((i, _)) => (full[..i].to_owned(), full[i + 1..].to_owned()),
        None => (String::new(), full.to_owned()),
    }
}

/// Infer a record type from a record value.
///
/// IPv4 addresses (including IPv4-mapped IPv6 addresses) yield `A`, other IPv6 addresses yield `AAAA`
/// and anything that looks like a hostname yields `CNAME`.
/// Returns [`None`] if no type could be inferred.
pub fn detect_type(value: &str) -> Option<&'static str> {
    if value.parse::<Ipv4Addr>().is_ok() {
        return Some("A");
    }
    if let Ok(v6) = value.parse::<Ipv6Addr>() {
        return match v6.to_ipv4_mapped() {
            Some(_) => Some("A"),
            None => Some("AAAA"),
        };
    }
    if HOSTNAME_RE.is_match(value) {
        return Some("CNAME");
    }
    None
}

/// Returns the explicitly requested type if there is one, otherwise tries to detect it from the value
pub fn type_or_detect(explicit: Option<&str>, value: &str) -> Option<String> {
    match explicit {
        Some(t) if !t.is_empty() => Some(t.to_owned()),
        _ => detect_type(value).map(str::to_owned),
    }
}

/// Returns the type detected for all non-empty values, if they agree on one
pub fn detect_common_type(values: &[String]) -> Option<&'static str> {
    let mut types = values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| detect_type(v));
    let first = types.next()??;
    types.all(|t| t == Some(first)).then_some(first)
}

/// A hostname split into the parts used by the provider API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordName {
    /// Relative record name, empty for names with less than three labels
    pub rr: String,
    /// Registered domain (zone) the record lives in
    pub domain: String,
}

impl RecordName {
    pub fn from_hostname(hostname: &str) -> Self {
        let (rr, domain) = split_domain(hostname);
        RecordName { rr, domain }
    }

    /// Relative name to use when creating or modifying records.
    /// An empty relative name addresses the zone apex.
    pub fn rr_or_apex(&self) -> &str {
        if self.rr.is_empty() {
            APEX
        } else {
            self.rr.as_str()
        }
    }

    /// Relative name to filter listings with. An empty relative name lists the whole zone
    pub fn rr_filter(&self) -> Option<&str> {
        if self.rr.is_empty() {
            None
        } else {
            Some(self.rr.as_str())
        }
    }
}

impl Display for RecordName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.rr.is_empty() {
            write!(f, "{}", self.domain)
        } else {
            write!(f, "{}.{}", self.rr, self.domain)
        }
    }
}
