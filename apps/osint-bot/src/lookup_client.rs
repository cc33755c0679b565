use anyhow::Result;
use osint_shared::api::{value_text, LookupResponse};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::lookup::{LookupOutcome, LookupResult, NOT_AVAILABLE};
use crate::models::phone::PhoneNumber;

/// Client for the upstream phone lookup endpoint. One attempt per call, no
/// retries; the timeout covers the whole request.
#[derive(Clone)]
pub struct LookupClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl LookupClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    async fn fetch(&self, number: &PhoneNumber) -> Result<LookupResponse> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("phone", number.as_str()), ("api_key", self.api_key.as_str())],
        )?;

        // Errors must not carry the URL, it holds the API key.
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !resp.status().is_success() {
            return Err(anyhow::anyhow!("Request failed: {}", resp.status()));
        }

        Ok(resp.json().await.map_err(|e| e.without_url())?)
    }

    pub async fn lookup(&self, number: &PhoneNumber) -> LookupOutcome {
        let body = match self.fetch(number).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Lookup for {} failed: {}", number, e);
                return LookupOutcome::ApiFailure(e.to_string());
            }
        };

        if !body.is_success() {
            warn!(
                "Lookup for {} returned status {:?}",
                number,
                body.status.as_deref().unwrap_or("<missing>")
            );
            return LookupOutcome::ApiFailure("search failed".to_string());
        }

        if body.results_count.unwrap_or(0) == 0 || body.data.is_empty() {
            info!("Lookup for {} returned no results", number);
            return LookupOutcome::Empty;
        }

        LookupOutcome::Success {
            results: body.data.iter().map(LookupResult::from).collect(),
            timestamp: value_text(&body.timestamp).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> LookupClient {
        LookupClient::new(format!("{}/details", server.uri()), "secret".into(), timeout).unwrap()
    }

    fn number(s: &str) -> PhoneNumber {
        PhoneNumber::parse(s).unwrap()
    }

    #[tokio::test]
    async fn success_is_parsed_defensively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/details"))
            .and(query_param("phone", "9876543210"))
            .and(query_param("api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "results_count": 2,
                "data": [
                    {
                        "mobile": "9876543210",
                        "name": "Ravi Kumar",
                        "fname": "Suresh Kumar",
                        "address": "12 MG Road",
                        "alt": "1112223334",
                        "circle": "DL",
                        "aadhar": "123412341234",
                        "email": "ravi@example.com"
                    },
                    { "mobile": 9876543210u64, "email": "" }
                ],
                "timestamp": "2024-05-01 12:00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server, Duration::from_secs(5))
            .lookup(&number("9876543210"))
            .await;

        let LookupOutcome::Success { results, timestamp } = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(timestamp, "2024-05-01 12:00:00");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].father_name, "Suresh Kumar");
        assert_eq!(results[0].alternate.as_deref(), Some("1112223334"));
        assert_eq!(results[0].email.as_deref(), Some("ravi@example.com"));
        assert_eq!(results[1].mobile, "9876543210");
        assert_eq!(results[1].name, NOT_AVAILABLE);
        assert_eq!(results[1].email, None);
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "error", "message": "quota exceeded" })),
            )
            .mount(&server)
            .await;

        let outcome = client_for(&server, Duration::from_secs(5))
            .lookup(&number("9876543210"))
            .await;
        assert_eq!(outcome, LookupOutcome::ApiFailure("search failed".into()));
    }

    #[tokio::test]
    async fn zero_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "results_count": 0,
                "data": [],
                "timestamp": "2024-05-01 12:00:00"
            })))
            .mount(&server)
            .await;

        let outcome = client_for(&server, Duration::from_secs(5))
            .lookup(&number("9876543210"))
            .await;
        assert_eq!(outcome, LookupOutcome::Empty);
    }

    #[tokio::test]
    async fn http_error_and_bad_json_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("phone", "1111111111"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("phone", "2222222222"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        for n in ["1111111111", "2222222222"] {
            let outcome = client.lookup(&number(n)).await;
            let LookupOutcome::ApiFailure(reason) = outcome else {
                panic!("expected failure for {}, got {:?}", n, outcome);
            };
            assert!(!reason.contains("secret"), "reason leaks the key: {}", reason);
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "results_count": 0 }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let outcome = client_for(&server, Duration::from_millis(200))
            .lookup(&number("9876543210"))
            .await;
        assert!(matches!(outcome, LookupOutcome::ApiFailure(_)));
    }
}
