//! Registration of "notify me when this bus reaches this stop" triggers
//! against the external notification backend.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::session::Session;

/// Recipient identity the backend routes the notification through.
const READABLE: &str = "window-grapher@takoyaki3.com";

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registration rejected with status {0}")]
    Rejected(reqwest::StatusCode),

    #[error("Payload encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// The (dataset, trip, stop) triple a trigger fires on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDetail {
    pub gtfs_id: String,
    pub trip_id: String,
    pub stop_id: String,
}

/// The wire payload the backend expects. `data` is a JSON document encoded
/// as a string, as the backend stores it opaquely.
#[derive(Debug, Serialize)]
pub struct TriggerPayload {
    pub key: String,
    pub created: String,
    pub data: String,
    pub readable: String,
}

impl TriggerPayload {
    pub fn build(
        email: &str,
        detail: &TriggerDetail,
        created: DateTime<Utc>,
    ) -> serde_json::Result<TriggerPayload> {
        let data = serde_json::to_string(&json!({
            "type": "arrivingAtTheStop",
            "triggerDetail": {
                "gtfs_id": detail.gtfs_id,
                "trip_id": detail.trip_id,
                "stop_id": detail.stop_id,
            },
        }))?;

        Ok(TriggerPayload {
            key: format!("trigger@{}", email),
            created: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
            readable: READABLE.to_string(),
        })
    }
}

/// Submits triggers over authenticated HTTP POST. In dry-run mode the
/// payload is built and logged but never sent, and reported as registered.
#[derive(Clone)]
pub struct NotifyClient {
    client: reqwest::Client,
    endpoint: Url,
    dry_run: bool,
}

impl NotifyClient {
    pub fn new(endpoint: &str, dry_run: bool, timeout: Duration) -> NotifyResult<NotifyClient> {
        let client = NotifyClient {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint: Url::parse(endpoint)?,
            dry_run,
        };

        Ok(client)
    }

    /// Registers an arrival trigger for the signed-in user. Anything other
    /// than a 200 is a failed registration; the caller may simply retry.
    pub async fn register(&self, session: &Session, detail: &TriggerDetail) -> NotifyResult<()> {
        let payload = TriggerPayload::build(&session.email, detail, Utc::now())?;

        if self.dry_run {
            log::info!(
                "Dry run, not submitting trigger: {}",
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        log::debug!("Submitting trigger {} to {}", payload.key, self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&session.token)
            .json(&payload)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(NotifyError::Rejected(response.status()));
        }

        Ok(())
    }
}
