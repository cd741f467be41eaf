mod helpers;
mod types;
mod wrapper;

use log::{debug, trace};

use self::{
    helpers::has_more,
    types::{
        AckResponse, AddDomainRecordRequest, AliyunRecord, DeleteSubDomainRecordsRequest,
        DescribeDomainInfoRequest, DescribeDomainInfoResponse, DescribeDomainRecordsRequest,
        DescribeDomainRecordsResponse, DescribeDomainsRequest, DescribeDomainsResponse,
        RecordIdRequest, RecordIdResponse, SetDomainRecordStatusRequest,
        UpdateDomainRecordRequest,
    },
    wrapper::AliyunWrapper,
};
use super::{
    Domain, DomainInfo, DomainRecord, Page, Provider, ProviderError, RecordQuery, RecordSpec,
};

/// Public API endpoint of Alibaba Cloud DNS
pub const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com";

// Largest page size accepted by the API
const ALIYUN_PAGE_SIZE_MAX: u32 = 100;

// Error code returned when an update would not change the record
const DUPLICATE_RECORD_CODE: &str = "DomainRecordDuplicate";

/// A [`Provider`] connecting to the Alibaba Cloud DNS API for managing domains and records.
///
/// To create a provider, use the [`AliyunProvider::from_config()`] function.
#[derive(Debug)]
#[non_exhaustive]
pub struct AliyunProvider {
    api: AliyunWrapper,
}

/// Configuration object for an [`AliyunProvider`]. Must be supplied when creating a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliyunProviderConfig<'a> {
    /// AccessKey id to authenticate with
    pub access_key_id: &'a str,
    /// AccessKey secret matching the id. Never logged
    pub access_key_secret: &'a str,
    /// Base URL of the API, usually [`DEFAULT_ENDPOINT`]
    pub endpoint: &'a str,
}

impl AliyunProvider {
    pub fn from_config(config: &AliyunProviderConfig) -> Result<Box<dyn Provider>, ProviderError> {
        let api = AliyunWrapper::try_new(
            config.endpoint,
            config.access_key_id,
            config.access_key_secret,
        )?;
        debug!("Using Alibaba Cloud DNS endpoint {}", config.endpoint);
        Ok(Box::new(AliyunProvider { api }))
    }
}

impl Provider for AliyunProvider {
    fn list_domains(&self, page: u32, page_size: u32) -> Result<Page<Domain>, ProviderError> {
        let page_size = page_size.min(ALIYUN_PAGE_SIZE_MAX);
        let resp: DescribeDomainsResponse = self.api.request(
            "DescribeDomains",
            &DescribeDomainsRequest {
                page_number: page,
                page_size,
            },
        )?;

        let received = resp.domains.domain.len();
        Ok(Page {
            items: resp.domains.domain.into_iter().map(Domain::from).collect(),
            has_more: has_more(page, page_size, resp.total_count, received),
        })
    }

    fn domain_info(&self, domain: &str) -> Result<DomainInfo, ProviderError> {
        let resp: DescribeDomainInfoResponse = self.api.request(
            "DescribeDomainInfo",
            &DescribeDomainInfoRequest {
                domain_name: domain.to_owned(),
                need_detail_attributes: true,
            },
        )?;
        Ok(resp.into())
    }

    fn list_records(
        &self,
        query: &RecordQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<DomainRecord>, ProviderError> {
        let page_size = page_size.min(ALIYUN_PAGE_SIZE_MAX);
        let resp: DescribeDomainRecordsResponse = self.api.request(
            "DescribeDomainRecords",
            &DescribeDomainRecordsRequest {
                domain_name: query.domain.to_owned(),
                page_number: page,
                page_size,
                rr_keyword: query.rr.to_owned(),
                record_type: query.record_type.to_owned(),
            },
        )?;

        let received = resp.domain_records.record.len();
        // The keyword filter also returns records whose name merely contains the keyword
        let items = resp
            .domain_records
            .record
            .into_iter()
            .filter(|r| query.rr.as_ref().map_or(true, |rr| &r.rr == rr))
            .map(DomainRecord::from)
            .collect::<Vec<_>>();
        trace!("Page {} of {:?}: {:?}", page, query, items);

        Ok(Page {
            items,
            has_more: has_more(page, page_size, resp.total_count, received),
        })
    }

    fn record(&self, id: &str) -> Result<DomainRecord, ProviderError> {
        let resp: AliyunRecord = self.api.request(
            "DescribeDomainRecordInfo",
            &RecordIdRequest {
                record_id: id.to_owned(),
            },
        )?;
        Ok(resp.into())
    }

    fn create_record(&self, domain: &str, spec: &RecordSpec) -> Result<String, ProviderError> {
        let resp: RecordIdResponse = self.api.request(
            "AddDomainRecord",
            &AddDomainRecordRequest {
                domain_name: domain.to_owned(),
                rr: spec.rr.to_owned(),
                record_type: spec.record_type.to_owned(),
                value: spec.value.to_owned(),
                ttl: spec.ttl,
            },
        )?;
        debug!("Created record {} in {} with id {}", spec, domain, resp.record_id);
        Ok(resp.record_id)
    }

    fn update_record(&self, id: &str, spec: &RecordSpec) -> Result<String, ProviderError> {
        let resp: RecordIdResponse = self.api.request(
            "UpdateDomainRecord",
            &UpdateDomainRecordRequest {
                record_id: id.to_owned(),
                rr: spec.rr.to_owned(),
                record_type: spec.record_type.to_owned(),
                value: spec.value.to_owned(),
                ttl: spec.ttl,
            },
        )?;
        debug!("Updated record {} to {}", id, spec);
        Ok(resp.record_id)
    }

    fn delete_record(&self, id: &str) -> Result<(), ProviderError> {
        let _: RecordIdResponse = self.api.request(
            "DeleteDomainRecord",
            &RecordIdRequest {
                record_id: id.to_owned(),
            },
        )?;
        debug!("Deleted record {}", id);
        Ok(())
    }

    fn delete_records(
        &self,
        domain: &str,
        rr: &str,
        record_type: Option<String>,
    ) -> Result<(), ProviderError> {
        let _: AckResponse = self.api.request(
            "DeleteSubDomainRecords",
            &DeleteSubDomainRecordsRequest {
                domain_name: domain.to_owned(),
                rr: rr.to_owned(),
                record_type,
            },
        )?;
        debug!("Deleted all records of {} in {}", rr, domain);
        Ok(())
    }

    fn set_record_status(&self, id: &str, enabled: bool) -> Result<(), ProviderError> {
        let _: AckResponse = self.api.request(
            "SetDomainRecordStatus",
            &SetDomainRecordStatusRequest {
                record_id: id.to_owned(),
                status: if enabled { "Enable" } else { "Disable" },
            },
        )?;
        debug!("Set status of record {} to enabled={}", id, enabled);
        Ok(())
    }

    fn is_idempotent_noop(&self, err: &ProviderError) -> bool {
        matches!(err, ProviderError::Api { code, .. } if code == DUPLICATE_RECORD_CODE)
    }
}
