use alidnsctl::{
    executor::Executor,
    provider::{
        AliyunProvider, AliyunProviderConfig, Provider, ProviderError, RecordQuery, RecordSpec,
        RecordStatus,
    },
};
use mockito::{Matcher, Server};

fn provider(server: &Server) -> Box<dyn Provider> {
    AliyunProvider::from_config(&AliyunProviderConfig {
        access_key_id: "test-id",
        access_key_secret: "test-secret",
        endpoint: &server.url(),
    })
    .unwrap()
}

const RECORDS: &str = r#"{
    "RequestId": "536E9CAD-DB30-4647-AC87-AA5CC38C5382",
    "TotalCount": 3,
    "PageNumber": 1,
    "PageSize": 100,
    "DomainRecords": {
        "Record": [
            {"RecordId": "1", "RR": "www", "DomainName": "example.com", "Type": "A", "Value": "192.0.2.1", "TTL": 600, "Line": "default", "Status": "ENABLE", "Locked": false},
            {"RecordId": "2", "RR": "www2", "DomainName": "example.com", "Type": "A", "Value": "192.0.2.2", "TTL": 600, "Line": "default", "Status": "ENABLE", "Locked": false},
            {"RecordId": "3", "RR": "www", "DomainName": "example.com", "Type": "A", "Value": "192.0.2.3", "TTL": 600, "Line": "default", "Status": "DISABLE", "Locked": false}
        ]
    }
}"#;

const DUPLICATE_ERROR: &str = r#"{
    "RequestId": "0B5C1A2E",
    "Code": "DomainRecordDuplicate",
    "Message": "The DNS record already exists."
}"#;

fn spec(value: &str) -> RecordSpec {
    RecordSpec {
        rr: "www".to_owned(),
        record_type: Some("A".to_owned()),
        value: value.to_owned(),
        ttl: None,
    }
}

#[test]
fn should_list_records_with_exact_name() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/")
        .match_header("x-acs-action", "DescribeDomainRecords")
        .match_header("x-acs-version", "2015-01-09")
        .match_header(
            "authorization",
            Matcher::Regex(
                "^ACS3-HMAC-SHA256 Credential=test-id,SignedHeaders=host;".to_owned(),
            ),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("DomainName".to_owned(), "example.com".to_owned()),
            Matcher::UrlEncoded("RRKeyWord".to_owned(), "www".to_owned()),
            Matcher::UrlEncoded("Type".to_owned(), "A".to_owned()),
            Matcher::UrlEncoded("PageNumber".to_owned(), "1".to_owned()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RECORDS)
        .create();

    let page = provider(&server)
        .list_records(
            &RecordQuery {
                domain: "example.com".to_owned(),
                rr: Some("www".to_owned()),
                record_type: Some("A".to_owned()),
            },
            1,
            100,
        )
        .unwrap();

    mock.assert();
    assert!(!page.has_more);
    assert_eq!(
        page.items.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["1", "3"]
    );
    assert_eq!(page.items[1].status, RecordStatus::Disable);
}

#[test]
fn should_decode_api_errors() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/")
        .match_header("x-acs-action", "UpdateDomainRecord")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(DUPLICATE_ERROR)
        .create();

    let provider = provider(&server);
    let err = provider.update_record("1", &spec("192.0.2.1")).unwrap_err();

    mock.assert();
    assert_eq!(
        err,
        ProviderError::Api {
            code: "DomainRecordDuplicate".to_owned(),
            message: "The DNS record already exists.".to_owned(),
            request_id: "0B5C1A2E".to_owned(),
        }
    );
    assert!(provider.is_idempotent_noop(&err));
}

#[test]
fn should_decode_api_errors_with_success_status() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/")
        .match_header("x-acs-action", "UpdateDomainRecord")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DUPLICATE_ERROR)
        .create();

    let provider = provider(&server);
    let err = provider.update_record("1", &spec("192.0.2.1")).unwrap_err();

    mock.assert();
    assert!(matches!(&err, ProviderError::Api { code, .. } if code == "DomainRecordDuplicate"));
    assert!(provider.is_idempotent_noop(&err));
}

#[test]
fn should_report_unparseable_errors_as_http() {
    let mut server = Server::new();
    server
        .mock("POST", "/")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway")
        .create();

    let err = provider(&server).delete_record("1").unwrap_err();
    assert!(matches!(err, ProviderError::Http(msg) if msg.contains("bad gateway")));
}

#[test]
fn should_converge_records_through_api() {
    let mut server = Server::new();
    let list = server
        .mock("POST", "/")
        .match_header("x-acs-action", "DescribeDomainRecords")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(RECORDS)
        .create();
    let update = server
        .mock("POST", "/")
        .match_header("x-acs-action", "UpdateDomainRecord")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("RecordId".to_owned(), "3".to_owned()),
            Matcher::UrlEncoded("RR".to_owned(), "www".to_owned()),
            Matcher::UrlEncoded("Value".to_owned(), "192.0.2.9".to_owned()),
            Matcher::UrlEncoded("TTL".to_owned(), "600".to_owned()),
        ]))
        .with_status(200)
        .with_body(r#"{"RequestId": "A", "RecordId": "3"}"#)
        .expect(1)
        .create();
    let create = server
        .mock("POST", "/")
        .match_header("x-acs-action", "AddDomainRecord")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("DomainName".to_owned(), "example.com".to_owned()),
            Matcher::UrlEncoded("Type".to_owned(), "A".to_owned()),
            Matcher::UrlEncoded("Value".to_owned(), "192.0.2.10".to_owned()),
        ]))
        .with_status(200)
        .with_body(r#"{"RequestId": "B", "RecordId": "4"}"#)
        .expect(1)
        .create();

    let provider = provider(&server);
    let executor = Executor::new(provider.as_ref(), false);
    let values = ["192.0.2.1", "192.0.2.9", "192.0.2.10"].map(str::to_owned);
    let report = executor
        .set_records("www.example.com", None, &values, None)
        .unwrap();

    list.assert();
    update.assert();
    create.assert();
    assert_eq!(report.unchanged.len(), 1);
    assert_eq!(report.updated[0].id, "3");
    assert_eq!(report.created[0].id, "4");
    assert!(report.deleted.is_empty());
}
