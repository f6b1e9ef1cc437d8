use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gym::Utilization;

/// Source of the timestamp attached to each scraped reading.
pub type Clock = fn() -> DateTime<Utc>;

/// HTTP client for the gym's occupancy endpoint.
#[derive(Debug, Clone)]
pub struct Scraper {
    http: Client,
    url: String,
    request: ScrapeRequest,
    clock: Clock,
}

#[derive(Debug, Clone, Serialize)]
struct ScrapeRequest {
    #[serde(rename = "Namespace")]
    namespace: String,
    #[serde(rename = "GymID")]
    gym_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScrapeResponse {
    people: u64,
    capacity: u64,
}

impl Scraper {
    pub fn new(http: Client, url: &str, gym_name: &str, gym_id: i64, clock: Clock) -> Self {
        Self {
            http,
            url: url.to_owned(),
            request: ScrapeRequest {
                namespace: gym_name.to_owned(),
                gym_id,
            },
            clock,
        }
    }

    /// Ask the gym for its current occupancy.
    ///
    /// The reading is timestamped with the scraper's clock once the
    /// response has been decoded. Responses reporting a zero capacity are
    /// rejected.
    pub async fn scrape(&self) -> Result<Utilization> {
        debug!(url = %self.url, "Scraping gym utilization");

        let resp = self
            .http
            .post(&self.url)
            .json(&self.request)
            .send()
            .await
            .with_context(|| format!("failed POST {}", self.url))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp
                .text()
                .await
                .with_context(|| format!("status {status}; error reading response body"))?;
            bail!("unsuccessful response: status {status}; body: {body}");
        }

        let payload = resp
            .json::<ScrapeResponse>()
            .await
            .context("decoding response")?;

        if payload.capacity == 0 {
            bail!("ignoring server response with zero capacity");
        }

        Ok(Utilization::new((self.clock)(), payload.people, payload.capacity))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    pub(crate) fn fixed_clock() -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000, 0).unwrap()
    }

    /// Serve `router` on an ephemeral local port and return the scrape URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/popularity")
    }

    /// A gym endpoint that answers only requests for gym "sputnik" / 42.
    pub(crate) fn gym_router(people: u64, capacity: u64) -> Router {
        Router::new().route(
            "/popularity",
            post(move |Json(body): Json<Value>| async move {
                if body != json!({ "Namespace": "sputnik", "GymID": 42 }) {
                    return (AxumStatus::BAD_REQUEST, Json(json!({ "error": "unknown gym" })));
                }
                (AxumStatus::OK, Json(json!({ "People": people, "Capacity": capacity })))
            }),
        )
    }

    pub(crate) fn scraper(url: &str) -> Scraper {
        Scraper::new(Client::new(), url, "sputnik", 42, fixed_clock)
    }

    #[tokio::test]
    async fn scrape_returns_timestamped_reading() {
        let url = serve(gym_router(12, 150)).await;

        let u = scraper(&url).scrape().await.unwrap();
        assert_eq!(u, Utilization::new(fixed_clock(), 12, 150));
    }

    #[tokio::test]
    async fn wrong_gym_yields_status_error_with_body() {
        let url = serve(gym_router(12, 150)).await;
        let other = Scraper::new(Client::new(), &url, "other", 1, fixed_clock);

        let err = other.scrape().await.unwrap_err().to_string();
        assert!(err.contains("400"), "{err}");
        assert!(err.contains("unknown gym"), "{err}");
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected() {
        let url = serve(gym_router(12, 0)).await;

        let err = scraper(&url).scrape().await.unwrap_err();
        assert!(err.to_string().contains("zero capacity"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let router = Router::new().route("/popularity", post(|| async { "not json" }));
        let url = serve(router).await;

        let err = scraper(&url).scrape().await.unwrap_err();
        assert!(err.to_string().contains("decoding response"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = scraper(&format!("http://{addr}/popularity"))
            .scrape()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed POST"));
    }
}
