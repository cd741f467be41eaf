use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use chrono::Utc;
use hmac::{Hmac, Mac};
use log::{debug, trace};
use reqwest::{blocking::Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

use super::types::ApiErrorBody;
use crate::provider::ProviderError;

const API_VERSION: &str = "2015-01-09";
const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";
// RPC style requests carry all parameters in the query string, the body is always empty
const EMPTY_BODY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type HmacSha256 = Hmac<Sha256>;

/// Internal wrapper around the Alibaba Cloud DNS API. Takes care of signing and error decoding
pub struct AliyunWrapper {
    client: Client,
    url: Url,
    host: String,
    access_key_id: String,
    access_key_secret: String,
}

impl Debug for AliyunWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunWrapper")
            .field("url", &self.url.as_str())
            .field("access_key_id", &"<REDACTED>")
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

impl AliyunWrapper {
    pub fn try_new(
        endpoint: &str,
        access_key_id: &str,
        access_key_secret: &str,
    ) -> Result<AliyunWrapper, ProviderError> {
        if access_key_id.is_empty() || access_key_secret.is_empty() {
            return Err(ProviderError::InvalidConfig(
                "access key id and secret must not be empty".to_owned(),
            ));
        }
        let url = Url::parse(endpoint)
            .map_err(|e| ProviderError::InvalidConfig(format!("endpoint {}: {}", endpoint, e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_owned(),
            (None, _) => {
                return Err(ProviderError::InvalidConfig(format!(
                    "endpoint {} has no host",
                    endpoint
                )))
            }
        };
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(AliyunWrapper {
            client,
            url,
            host,
            access_key_id: access_key_id.to_owned(),
            access_key_secret: access_key_secret.to_owned(),
        })
    }

    /// Perform a single API call and decode its response.
    /// Error responses are returned as [`ProviderError::Api`]
    pub fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        action: &str,
        params: &P,
    ) -> Result<R, ProviderError> {
        let query = query_string(params)?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let authorization = self.sign(action, &query, &timestamp, &nonce)?;

        let mut url = self.url.clone();
        url.set_path("/");
        url.set_query(if query.is_empty() {
            None
        } else {
            Some(&query)
        });

        debug!("Calling {} with {}", action, query);
        let response = self
            .client
            .post(url)
            .header("host", &self.host)
            .header("x-acs-action", action)
            .header("x-acs-version", API_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", EMPTY_BODY_SHA256)
            .header("authorization", authorization)
            .send()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        trace!("{} returned [{}] {}", action, status, body);

        // Errors are reported through Code/Message, some of them with a success status
        let api_error = serde_json::from_str::<ApiErrorBody>(&body).ok();
        if !status.is_success() {
            return Err(match api_error {
                Some(err) => err.into(),
                None => ProviderError::Http(format!("[{}] {}", status, body)),
            });
        }
        if let Some(err) = api_error {
            return Err(err.into());
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Parse(format!("{}: {}", action, e)))
    }

    // Build the ACS3-HMAC-SHA256 authorization header for a request.
    // See https://www.alibabacloud.com/help/en/sdk/product-overview/v3-request-structure-and-signature
    fn sign(
        &self,
        action: &str,
        query: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String, ProviderError> {
        let canonical_headers = format!(
            "host:{}\nx-acs-action:{}\nx-acs-content-sha256:{}\nx-acs-date:{}\nx-acs-signature-nonce:{}\nx-acs-version:{}\n",
            self.host, action, EMPTY_BODY_SHA256, timestamp, nonce, API_VERSION
        );
        let canonical_request = format!(
            "POST\n/\n{}\n{}\n{}\n{}",
            query, canonical_headers, SIGNED_HEADERS, EMPTY_BODY_SHA256
        );
        trace!("Canonical request:\n{}", canonical_request);

        let string_to_sign = format!(
            "{}\n{}",
            SIGNATURE_ALGORITHM,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let mut mac = HmacSha256::new_from_slice(self.access_key_secret.as_bytes())
            .map_err(|e| ProviderError::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            SIGNATURE_ALGORITHM, self.access_key_id, SIGNED_HEADERS, signature
        ))
    }
}

/// Serialize flat request parameters into a sorted, RFC 3986 encoded query string
pub fn query_string<P: Serialize>(params: &P) -> Result<String, ProviderError> {
    let value = serde_json::to_value(params).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let serde_json::Value::Object(map) = value else {
        return Err(ProviderError::Parse(
            "request parameters must serialize to an object".to_owned(),
        ));
    };

    let mut sorted = BTreeMap::new();
    for (k, v) in map {
        let v = match v {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(ProviderError::Parse(format!(
                    "unsupported value for parameter {}: {}",
                    k, other
                )))
            }
        };
        sorted.insert(k, v);
    }

    Ok(sorted
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    fn wrapper(id: &str, secret: &str) -> AliyunWrapper {
        AliyunWrapper::try_new("https://alidns.aliyuncs.com", id, secret).unwrap()
    }

    fn signature(auth: &str) -> &str {
        auth.split("Signature=").nth(1).unwrap()
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Params {
        domain_name: String,
        #[serde(rename = "RR")]
        rr: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        ttl: Option<u32>,
        page_size: u32,
    }

    #[test]
    fn should_sort_and_encode_query() {
        let q = query_string(&Params {
            domain_name: "example.com".to_owned(),
            rr: "*.6 x/y".to_owned(),
            ttl: None,
            page_size: 100,
        })
        .unwrap();
        assert_eq!(q, "DomainName=example.com&PageSize=100&RR=%2A.6%20x%2Fy");
    }

    #[test]
    fn should_reject_nested_params() {
        let nested = serde_json::json!({"a": {"b": 1}});
        assert!(matches!(query_string(&nested), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn should_reject_empty_credentials() {
        let err = AliyunWrapper::try_new("https://alidns.aliyuncs.com", "", "secret").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn should_reject_invalid_endpoint() {
        let err = AliyunWrapper::try_new("not a url", "id", "secret").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn should_keep_port_in_host() {
        let w = AliyunWrapper::try_new("http://127.0.0.1:8080", "id", "secret").unwrap();
        assert_eq!(w.host, "127.0.0.1:8080");
    }

    #[test]
    fn should_not_leak_secrets_in_debug() {
        let out = format!("{:?}", wrapper("my-key-id", "my-secret"));
        assert!(!out.contains("my-key-id"));
        assert!(!out.contains("my-secret"));
    }

    #[test]
    fn should_format_authorization() {
        let auth = wrapper("LTAI5tTestKeyId", "secret")
            .sign(
                "DescribeDomains",
                "PageNumber=1",
                "2024-01-01T00:00:00Z",
                "nonce",
            )
            .unwrap();
        assert!(auth.starts_with(
            "ACS3-HMAC-SHA256 Credential=LTAI5tTestKeyId,SignedHeaders=host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,Signature="
        ));
        let sig = signature(&auth);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn should_sign_deterministically() {
        let w = wrapper("id", "secret");
        let a = w.sign("DescribeDomains", "", "2024-01-01T00:00:00Z", "n").unwrap();
        let b = w.sign("DescribeDomains", "", "2024-01-01T00:00:00Z", "n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn should_change_signature_with_inputs() {
        let w = wrapper("id", "secret");
        let base = w.sign("DescribeDomains", "", "2024-01-01T00:00:00Z", "n").unwrap();
        let other_action = w
            .sign("DescribeDomainRecords", "", "2024-01-01T00:00:00Z", "n")
            .unwrap();
        let other_nonce = w.sign("DescribeDomains", "", "2024-01-01T00:00:00Z", "m").unwrap();
        let other_secret = wrapper("id", "other")
            .sign("DescribeDomains", "", "2024-01-01T00:00:00Z", "n")
            .unwrap();

        assert_ne!(signature(&base), signature(&other_action));
        assert_ne!(signature(&base), signature(&other_nonce));
        assert_ne!(signature(&base), signature(&other_secret));
    }
}
