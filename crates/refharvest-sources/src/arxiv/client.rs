use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use reqwest::header::HeaderMap;
use tracing::info;

use refharvest_core::{ArxivParameters, ArxivSettings, HarvestParameters, Snapshot};

use crate::arxiv::parser::parse_feed;
use crate::arxiv::query::{category_query, page_url};
use crate::arxiv::scan::WindowedScan;
use crate::error::{HarvestError, Result};
use crate::http::{ReqwestTransport, RetryPolicy, RetryingClient};
use crate::page::{PageSource, RawPage};

const ENDPOINT: &str = "arxiv_query";

/// Per-run knobs of a recent-submissions harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentRequest {
    pub lookback_days: u32,
    pub batch_size: usize,
    pub max_scan: usize,
}

impl Default for RecentRequest {
    fn default() -> Self {
        Self {
            lookback_days: 2,
            batch_size: 200,
            max_scan: 2000,
        }
    }
}

pub struct ArxivClient {
    http: RetryingClient,
    base_url: String,
    label: String,
    categories: Vec<String>,
    search_query: String,
}

impl ArxivClient {
    pub fn new(settings: &ArxivSettings, policy: RetryPolicy) -> Result<Self> {
        let transport = ReqwestTransport::new(
            &settings.user_agent,
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::with_client(
            RetryingClient::new(transport, policy),
            settings,
        ))
    }

    pub fn with_client(http: RetryingClient, settings: &ArxivSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.clone(),
            label: settings.label.clone(),
            categories: settings.categories.clone(),
            search_query: category_query(&settings.categories),
        }
    }

    /// Collect every entry submitted in the last `lookback_days` before `now`.
    pub async fn harvest_recent(
        &self,
        request: &RecentRequest,
        now: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let cutoff = chrono::Duration::try_days(i64::from(request.lookback_days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                HarvestError::Configuration(format!(
                    "lookback of {} days is out of range",
                    request.lookback_days
                ))
            })?;
        info!(
            label = %self.label,
            %cutoff,
            batch_size = request.batch_size,
            max_scan = request.max_scan,
            "harvesting recent arXiv submissions"
        );

        let outcome = WindowedScan::new(cutoff, request.batch_size, request.max_scan)
            .run(self)
            .await?;

        let parameters = HarvestParameters::Arxiv(ArxivParameters {
            label: self.label.clone(),
            lookback_days: request.lookback_days,
            cutoff_utc: cutoff.trunc_subsecs(0),
            categories: self.categories.clone(),
            query: self.search_query.clone(),
            batch_size: request.batch_size,
            max_scan: request.max_scan,
        });
        Ok(Snapshot::at(now, parameters, outcome.scanned, outcome.records))
    }
}

#[async_trait]
impl PageSource for ArxivClient {
    async fn fetch_page(&self, start: usize, size: usize) -> Result<RawPage> {
        let url = page_url(&self.base_url, &self.search_query, start, size);
        let xml = self.http.get_text(ENDPOINT, &url, &HeaderMap::new()).await?;
        parse_feed(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arxiv::parser::tests::ASTRO_FEED_XML;
    use crate::http::HttpResponse;
    use crate::http::testing::{RecordingSleeper, ScriptedTransport};
    use chrono::TimeZone;
    use mockito::{Matcher, Server};

    fn settings(base_url: &str) -> ArxivSettings {
        ArxivSettings {
            base_url: base_url.to_string(),
            categories: vec!["astro-ph".to_string(), "astro-ph.GA".to_string()],
            timeout_secs: 5,
            ..ArxivSettings::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn harvests_window_from_live_feed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "search_query".into(),
                    "cat:astro-ph OR cat:astro-ph.GA".into(),
                ),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "50".into()),
                Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
                Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            ]))
            .match_header("user-agent", "refharvest/0.1")
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(ASTRO_FEED_XML)
            .expect(1)
            .create_async()
            .await;

        let client = ArxivClient::new(
            &settings(&format!("{}/api/query", server.url())),
            RetryPolicy::default(),
        )
        .unwrap();
        let request = RecentRequest {
            lookback_days: 2,
            batch_size: 50,
            max_scan: 2000,
        };
        let snapshot = client.harvest_recent(&request, now()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.stats.total_scanned, 2);
        assert_eq!(snapshot.stats.total_retained, 1);
        assert_eq!(snapshot.items[0].id, "2610.01234v2");
        match &snapshot.parameters {
            HarvestParameters::Arxiv(params) => {
                assert_eq!(params.label, "astro-ph");
                assert_eq!(params.lookback_days, 2);
                assert_eq!(
                    params.cutoff_utc,
                    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
                );
                assert_eq!(params.query, "cat:astro-ph OR cat:astro-ph.GA");
            }
            other => panic!("unexpected parameters: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_rate_limited_pages() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpResponse::new(503, "busy").with_header("Retry-After", "1")),
            Ok(HttpResponse::new(200, ASTRO_FEED_XML)),
        ]);
        let sleeper = RecordingSleeper::new();
        let http = RetryingClient::new(transport.clone(), RetryPolicy::default())
            .with_sleeper(sleeper.clone());
        let client = ArxivClient::with_client(http, &settings("http://arxiv.test/api/query"));

        let page = client.fetch_page(0, 200).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(transport.calls(), 2);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
        assert!(transport.urls()[0].starts_with("http://arxiv.test/api/query?search_query="));
    }

    #[tokio::test]
    async fn forbidden_response_is_fatal() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(403, "nope"))]);
        let http = RetryingClient::new(transport.clone(), RetryPolicy::default());
        let client = ArxivClient::with_client(http, &settings("http://arxiv.test/api/query"));

        let err = client
            .harvest_recent(&RecentRequest::default(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Api { status: 403, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn oversized_lookback_is_rejected_before_fetching() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, ASTRO_FEED_XML))]);
        let http = RetryingClient::new(transport.clone(), RetryPolicy::default());
        let client = ArxivClient::with_client(http, &settings("http://arxiv.test/api/query"));
        let request = RecentRequest {
            lookback_days: u32::MAX,
            ..RecentRequest::default()
        };

        let err = client.harvest_recent(&request, now()).await.unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(transport.calls(), 0);
    }
}
