use std::time::Duration;

use url::Url;

use super::entities::{FeedEntity, Stop, StopTime};
use super::error::ButterResult;

#[derive(serde::Deserialize)]
struct ButterResponse<T> {
    response: T,
}

/// Client for the Butter transit-data API: realtime vehicle positions plus
/// versioned GTFS schedule lookups. All network calls carry the configured
/// timeout; a timeout surfaces as an ordinary HTTP error.
#[derive(Clone)]
pub struct ButterClient {
    client: reqwest::Client,
    base: Url,
}

impl ButterClient {
    pub fn new(base_url: &str, timeout: Duration) -> ButterResult<ButterClient> {
        let client = ButterClient {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base: Url::parse(base_url)?,
        };

        Ok(client)
    }

    fn url(&self, path: &str) -> ButterResult<Url> {
        Ok(self.base.join(path)?)
    }

    async fn request<T>(&self, url: Url) -> ButterResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        log::debug!("Requesting {}", url);
        let response = self.client.get(url).send().await?;

        let data_str = response.text().await?;
        log::trace!("Response: {}", data_str);
        let data = serde_json::from_str(&data_str)?;

        Ok(data)
    }

    /// Realtime vehicle positions near a coordinate.
    pub async fn get_positions_near(&self, lat: f64, lon: f64) -> ButterResult<Vec<FeedEntity>> {
        let mut url = self.url("realtime/positions.json")?;
        url.query_pairs_mut()
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lon.to_string());

        let ButterResponse::<Vec<FeedEntity>> { response } = self.request(url).await?;
        Ok(response)
    }

    /// The current dataset version for a GTFS feed id. Schedule lookups
    /// are only valid against the version they were fetched for.
    pub async fn get_version_id(&self, gtfs_id: &str) -> ButterResult<String> {
        let url = self.url(&format!("datasets/{}/version.json", gtfs_id))?;
        let ButterResponse::<String> { response } = self.request(url).await?;
        Ok(response)
    }

    /// The raw stop-time table for one dataset version.
    pub async fn get_stop_times(
        &self,
        gtfs_id: &str,
        version_id: &str,
    ) -> ButterResult<Vec<StopTime>> {
        let url = self.url(&format!("datasets/{}/{}/stop_times.json", gtfs_id, version_id))?;
        let ButterResponse::<Vec<StopTime>> { response } = self.request(url).await?;
        Ok(response)
    }

    /// Stop metadata for one dataset version.
    pub async fn get_stops(&self, gtfs_id: &str, version_id: &str) -> ButterResult<Vec<Stop>> {
        let url = self.url(&format!("datasets/{}/{}/stops.json", gtfs_id, version_id))?;
        let ButterResponse::<Vec<Stop>> { response } = self.request(url).await?;
        Ok(response)
    }
}
