//! Request and response bodies of the Alibaba Cloud DNS API (version 2015-01-09)

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainsRequest {
    pub page_number: u32,
    pub page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainsResponse {
    pub total_count: Option<u64>,
    #[serde(default)]
    pub domains: DomainList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainList {
    #[serde(default)]
    pub domain: Vec<AliyunDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliyunDomain {
    pub domain_id: String,
    pub domain_name: String,
    pub puny_code: Option<String>,
    pub record_count: Option<u64>,
    pub create_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainInfoRequest {
    pub domain_name: String,
    pub need_detail_attributes: bool,
}

// Only the fields we report on. The record line tree in particular is large and not useful here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainInfoResponse {
    pub domain_id: String,
    pub domain_name: String,
    pub puny_code: Option<String>,
    #[serde(default)]
    pub dns_servers: DnsServerList,
    pub version_name: Option<String>,
    pub group_name: Option<String>,
    pub min_ttl: Option<u32>,
    pub remark: Option<String>,
    pub create_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsServerList {
    #[serde(default)]
    pub dns_server: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsRequest {
    pub domain_name: String,
    pub page_number: u32,
    pub page_size: u32,
    /// Keyword match on the relative name, not an exact filter
    #[serde(rename = "RRKeyWord", skip_serializing_if = "Option::is_none")]
    pub rr_keyword: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsResponse {
    pub total_count: Option<u64>,
    #[serde(default)]
    pub domain_records: RecordList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordList {
    #[serde(default)]
    pub record: Vec<AliyunRecord>,
}

/// A record as returned by `DescribeDomainRecords` and `DescribeDomainRecordInfo`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliyunRecord {
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    pub domain_name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
    pub priority: Option<u32>,
    pub line: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordIdRequest {
    pub record_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddDomainRecordRequest {
    pub domain_name: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    pub value: String,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainRecordRequest {
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    pub value: String,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordIdResponse {
    pub record_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteSubDomainRecordsRequest {
    pub domain_name: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetDomainRecordStatusRequest {
    pub record_id: String,
    /// `Enable` or `Disable`
    pub status: &'static str,
}

/// Response of calls that only acknowledge the request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AckResponse {
    #[allow(dead_code)]
    pub request_id: Option<String>,
}
