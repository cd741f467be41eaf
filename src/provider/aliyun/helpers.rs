use crate::provider::{Domain, DomainInfo, DomainRecord, ProviderError, RecordStatus};

use super::types::{AliyunDomain, AliyunRecord, ApiErrorBody, DescribeDomainInfoResponse};

impl From<ApiErrorBody> for ProviderError {
    fn from(e: ApiErrorBody) -> Self {
        ProviderError::Api {
            code: e.code,
            message: e.message,
            request_id: e.request_id,
        }
    }
}

impl From<AliyunRecord> for DomainRecord {
    fn from(r: AliyunRecord) -> Self {
        let status = match r.status.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("disable") => RecordStatus::Disable,
            _ => RecordStatus::Enable,
        };
        DomainRecord {
            id: r.record_id,
            rr: r.rr,
            domain: r.domain_name,
            record_type: r.record_type,
            value: r.value,
            status,
            ttl: r.ttl,
            priority: r.priority,
            line: r.line,
            locked: r.locked,
        }
    }
}

impl From<AliyunDomain> for Domain {
    fn from(d: AliyunDomain) -> Self {
        Domain {
            id: d.domain_id,
            name: d.domain_name,
            punycode: d.puny_code,
            record_count: d.record_count,
            created_at: d.create_time,
        }
    }
}

impl From<DescribeDomainInfoResponse> for DomainInfo {
    fn from(d: DescribeDomainInfoResponse) -> Self {
        DomainInfo {
            id: d.domain_id,
            name: d.domain_name,
            punycode: d.puny_code,
            dns_servers: d.dns_servers.dns_server,
            version: d.version_name,
            group: d.group_name,
            min_ttl: d.min_ttl,
            remark: d.remark,
            created_at: d.create_time,
        }
    }
}

// Whether there are pages left after the current one.
// Prefers the total count reported by the API and falls back to checking for a full page.
pub fn has_more(page: u32, page_size: u32, total: Option<u64>, received: usize) -> bool {
    if received == 0 {
        return false;
    }
    match total {
        Some(total) => u64::from(page) * u64::from(page_size) < total,
        None => received >= page_size as usize,
    }
}
