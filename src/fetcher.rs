use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::fetch_error::FetchError;
use crate::models::{HourSlot, MetricKind, Reading};
use crate::parser;

/// Source of hourly snow readings for a set of stations.
///
/// Implementations never fail: a reading that could not be obtained is
/// reported as [`Reading::NoData`], and every requested station is present
/// in the returned map.
pub trait SnowSource: Send + Sync {
    fn fetch(
        &self,
        slot: HourSlot,
        metric: MetricKind,
        stations: &[String],
    ) -> impl Future<Output = HashMap<String, Reading>> + Send;
}

/// Client for the KMA API hub `kma_snow1` endpoint
#[derive(Clone)]
pub struct KmaSnowFetcher {
    client: reqwest::Client,
    url: String,
    auth_key: String,
}

impl KmaSnowFetcher {
    pub fn new(url: String, auth_key: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            auth_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.kma_url.clone(),
            config.auth_key.clone(),
            config.request_timeout(),
        )
    }

    /// Fetch the raw text body for one hour and metric
    #[instrument(skip(self), fields(url = %self.url, tm = %slot))]
    pub async fn fetch_body(&self, slot: HourSlot, metric: MetricKind) -> Result<String, FetchError> {
        // The upstream expects minutes as well: YYYYMMDDHHMI
        let tm = format!("{}00", slot.timestamp());
        debug!("Sending HTTP request to KMA snow endpoint");

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("sd", metric.query_code()),
                ("tm", tm.as_str()),
                ("help", "0"),
                ("authKey", self.auth_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!("Received HTTP response with status: {}", status);
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        debug!("Retrieved text content, size: {} bytes", body.len());
        Ok(body)
    }
}

impl SnowSource for KmaSnowFetcher {
    async fn fetch(
        &self,
        slot: HourSlot,
        metric: MetricKind,
        stations: &[String],
    ) -> HashMap<String, Reading> {
        let mut values = match self.fetch_body(slot, metric).await {
            Ok(body) => parser::parse_station_values(&body, stations),
            Err(e) => {
                warn!(tm = %slot, metric = %metric, "Snow fetch failed, using no-data: {}", e);
                HashMap::new()
            }
        };

        stations
            .iter()
            .map(|code| {
                let reading = values
                    .remove(code)
                    .map(Reading::Value)
                    .unwrap_or_default();
                (code.clone(), reading)
            })
            .collect()
    }
}
