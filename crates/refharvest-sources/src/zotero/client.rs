use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, info};

use refharvest_core::{HarvestParameters, RecordSet, Snapshot, ZoteroParameters, ZoteroSettings};

use crate::error::{HarvestError, Result};
use crate::http::{ReqwestTransport, RetryPolicy, RetryingClient};
use crate::page::{PageSource, RawPage, RawRecord};
use crate::zotero::normalize::normalize_item;
use crate::zotero::scan::ExhaustiveScan;

const KEY_ENDPOINT: &str = "zotero_key_lookup";
const ITEMS_ENDPOINT: &str = "zotero_items";
const API_VERSION: &str = "3";
const USER_AGENT: &str = "refharvest/0.1";

pub struct ZoteroClient {
    http: RetryingClient,
    base_url: String,
    api_key: String,
    headers: HeaderMap,
    skip_types: Vec<String>,
}

impl ZoteroClient {
    pub fn new(settings: &ZoteroSettings, api_key: String, policy: RetryPolicy) -> Result<Self> {
        let transport =
            ReqwestTransport::new(USER_AGENT, Duration::from_secs(settings.timeout_secs))?;
        Self::with_client(RetryingClient::new(transport, policy), settings, api_key)
    }

    pub fn with_client(
        http: RetryingClient,
        settings: &ZoteroSettings,
        api_key: String,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&api_key).map_err(|_| {
            HarvestError::Configuration("Zotero API key contains invalid characters".to_string())
        })?;
        headers.insert(HeaderName::from_static("zotero-api-key"), key);
        headers.insert(
            HeaderName::from_static("zotero-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            headers,
            skip_types: settings.skip_types.clone(),
        })
    }

    /// Look up the user id owning the API key.
    pub async fn resolve_user_id(&self) -> Result<u64> {
        let url = format!(
            "{}/keys/{}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        let payload: Value = self.http.get_json(KEY_ENDPOINT, &url, &self.headers).await?;
        let user_id = extract_user_id(&payload).ok_or_else(|| {
            HarvestError::Configuration(
                "could not resolve userID from Zotero key metadata; \
                 use a user library key with read permission"
                    .to_string(),
            )
        })?;
        debug!(user_id, "resolved Zotero user id");
        Ok(user_id)
    }

    /// Items listing of one user library, as a [`PageSource`].
    pub fn library(&self, user_id: u64) -> ZoteroLibrary<'_> {
        ZoteroLibrary {
            client: self,
            user_id,
        }
    }

    /// Fetch and normalize every readable item of a user library.
    ///
    /// Without an explicit `user_id` the id is resolved from the API key.
    pub async fn harvest_library(
        &self,
        user_id: Option<u64>,
        page_size: usize,
    ) -> Result<Snapshot> {
        let user_id = match user_id {
            Some(id) => id,
            None => self.resolve_user_id().await?,
        };
        info!(user_id, page_size, "harvesting Zotero library");

        let outcome = ExhaustiveScan::new(page_size)
            .run(&self.library(user_id))
            .await?;
        let scanned = outcome.records.len();

        let items: RecordSet = outcome
            .records
            .iter()
            .filter_map(|raw| normalize_item(raw, &self.skip_types))
            .collect();
        info!(scanned, retained = items.len(), "Zotero library harvested");

        let parameters = HarvestParameters::Zotero(ZoteroParameters { user_id, page_size });
        Ok(Snapshot::new(parameters, scanned, items.into_vec()))
    }
}

pub struct ZoteroLibrary<'a> {
    client: &'a ZoteroClient,
    user_id: u64,
}

impl ZoteroLibrary<'_> {
    fn page_url(&self, start: usize, size: usize) -> String {
        format!(
            "{}/users/{}/items?format=json&limit={size}&start={start}\
             &sort=dateModified&direction=desc&include=data",
            self.client.base_url, self.user_id
        )
    }
}

#[async_trait]
impl PageSource for ZoteroLibrary<'_> {
    async fn fetch_page(&self, start: usize, size: usize) -> Result<RawPage> {
        let url = self.page_url(start, size);
        let payload: Value = self
            .client
            .http
            .get_json(ITEMS_ENDPOINT, &url, &self.client.headers)
            .await?;
        let Value::Array(items) = payload else {
            return Err(HarvestError::Parse(format!(
                "expected a JSON array from {ITEMS_ENDPOINT}"
            )));
        };
        // Non-object elements stay in the page so short-page detection sees
        // the upstream length.
        let records = items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map,
                _ => RawRecord::new(),
            })
            .collect();
        Ok(RawPage::new(records))
    }
}

/// First integer under a key named `userID` (any case), searched depth first.
pub fn extract_user_id(payload: &Value) -> Option<u64> {
    match payload {
        Value::Object(map) => map.iter().find_map(|(key, value)| {
            if key.eq_ignore_ascii_case("userid")
                && let Some(id) = value.as_u64()
            {
                return Some(id);
            }
            extract_user_id(value)
        }),
        Value::Array(values) => values.iter().find_map(extract_user_id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::http::testing::ScriptedTransport;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn settings(base_url: &str) -> ZoteroSettings {
        ZoteroSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..ZoteroSettings::default()
        }
    }

    fn item(key: &str, item_type: &str, title: &str) -> Value {
        json!({
            "key": key,
            "version": 1,
            "data": {"key": key, "itemType": item_type, "title": title}
        })
    }

    fn scripted(
        responses: Vec<Result<HttpResponse>>,
    ) -> (std::sync::Arc<ScriptedTransport>, ZoteroClient) {
        let transport = ScriptedTransport::new(responses);
        let http = RetryingClient::new(transport.clone(), RetryPolicy::default());
        let client =
            ZoteroClient::with_client(http, &settings("https://zotero.test"), "secret".into())
                .unwrap();
        (transport, client)
    }

    #[test]
    fn user_id_found_depth_first_case_insensitive() {
        let payload = json!({
            "key": "secret",
            "access": {"user": {"library": true}},
            "nested": [{"UserId": "not a number"}, {"meta": {"USERID": 4242}}],
            "userID": 1
        });
        assert_eq!(extract_user_id(&payload), Some(4242));
        assert_eq!(extract_user_id(&json!({"userID": 7})), Some(7));
        assert_eq!(extract_user_id(&json!([{"x": 1}, {"userid": 9}])), Some(9));
        assert_eq!(extract_user_id(&json!({"username": "x"})), None);
        assert_eq!(extract_user_id(&json!({"userID": -3})), None);
    }

    #[test]
    fn user_id_search_follows_document_order() {
        let top_first: Value =
            serde_json::from_str(r#"{"userID": 1, "access": {"userID": 2}}"#).unwrap();
        let nested_first: Value =
            serde_json::from_str(r#"{"access": {"userID": 2}, "userID": 1}"#).unwrap();
        assert_eq!(extract_user_id(&top_first), Some(1));
        assert_eq!(extract_user_id(&nested_first), Some(2));
    }

    #[tokio::test]
    async fn unresolvable_user_id_is_a_configuration_error() {
        let (_, client) = scripted(vec![Ok(HttpResponse::new(200, r#"{"key":"secret"}"#))]);
        let err = client.resolve_user_id().await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn non_array_listing_is_fatal() {
        let (_, client) = scripted(vec![Ok(HttpResponse::new(200, r#"{"items": []}"#))]);
        let err = client.harvest_library(Some(1), 100).await.unwrap_err();
        assert!(matches!(err, HarvestError::Parse(_)));
    }

    #[tokio::test]
    async fn duplicate_keys_keep_position_and_take_later_value() {
        let first = json!([
            item("A", "book", "Alpha"),
            item("B", "note", "A note"),
            item("A", "book", "Alpha, second edition"),
            "junk"
        ]);
        let (transport, client) = scripted(vec![
            Ok(HttpResponse::new(200, first.to_string())),
            Ok(HttpResponse::new(200, json!([item("C", "thesis", "Gamma")]).to_string())),
        ]);

        let snapshot = client.harvest_library(Some(5), 4).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(snapshot.stats.total_scanned, 5);
        let titles: Vec<_> = snapshot.items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha, second edition", "Gamma"]);
        assert!(transport.urls()[1].contains("start=4"));
    }

    #[tokio::test]
    async fn harvests_against_live_server() {
        let mut server = Server::new_async().await;
        let key_mock = server
            .mock("GET", "/keys/secret")
            .match_header("zotero-api-key", "secret")
            .match_header("zotero-api-version", "3")
            .with_status(200)
            .with_body(r#"{"key":"secret","userID":31337,"access":{"user":{"library":true}}}"#)
            .expect(1)
            .create_async()
            .await;
        let page_one: Vec<Value> = (0..2)
            .map(|i| item(&format!("K{i}"), "journalArticle", &format!("Paper {i}")))
            .collect();
        let items_p1 = server
            .mock("GET", "/users/31337/items")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("sort".into(), "dateModified".into()),
                Matcher::UrlEncoded("direction".into(), "desc".into()),
                Matcher::UrlEncoded("include".into(), "data".into()),
            ]))
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(Value::Array(page_one).to_string())
            .expect(1)
            .create_async()
            .await;
        let items_p2 = server
            .mock("GET", "/users/31337/items")
            .match_query(Matcher::UrlEncoded("start".into(), "2".into()))
            .with_status(200)
            .with_body(json!([item("K2", "attachment", "scan.pdf")]).to_string())
            .expect(1)
            .create_async()
            .await;

        let client =
            ZoteroClient::new(&settings(&server.url()), "secret".into(), RetryPolicy::default())
                .unwrap();
        let snapshot = client.harvest_library(None, 2).await.unwrap();

        key_mock.assert_async().await;
        items_p1.assert_async().await;
        items_p2.assert_async().await;
        assert_eq!(snapshot.stats.total_scanned, 3);
        assert_eq!(snapshot.stats.total_retained, 2);
        assert_eq!(
            snapshot.parameters,
            HarvestParameters::Zotero(ZoteroParameters {
                user_id: 31337,
                page_size: 2
            })
        );
    }
}
