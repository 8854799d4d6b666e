//! HTTP client for pulling a recent window of snapshots from an agent's `/view`.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::types::AgentSnapshot;

#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
}

impl AgentClient {
    /// Every request carries `timeout` so one dead agent cannot stall a poll cycle.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub async fn fetch_window(
        &self,
        base_url: &str,
        window: Duration,
    ) -> Result<Vec<AgentSnapshot>, TransportError> {
        let url = view_url(base_url, window)?;
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }
        // Older agents answer `null` for an empty window.
        let body: Option<Vec<AgentSnapshot>> =
            resp.json().await.map_err(|source| TransportError::Decode {
                url: url.to_string(),
                source,
            })?;
        Ok(body.unwrap_or_default())
    }
}

/// `{base}/view?duration=<window>`, keeping any path prefix on the base URL.
pub fn view_url(base_url: &str, window: Duration) -> Result<Url, TransportError> {
    let mut url = Url::parse(base_url.trim()).map_err(|e| TransportError::Url {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(TransportError::Url {
            url: base_url.to_string(),
            reason: "not a base URL".into(),
        });
    }
    let path = format!("{}/view", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("duration", &humantime::format_duration(window).to_string());
    Ok(url)
}
