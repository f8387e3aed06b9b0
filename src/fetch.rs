//! Lazy loading of remote GeoJSON layer sources.
//!
//! At most one fetch is in flight per layer id. Spawning a fetch for an id
//! that already has one aborts the superseded task first, so a stale
//! response can never land on a layer whose configuration has changed.

use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::geometry::{self, Feature};

/// Completed fetch for one layer.
#[derive(Debug)]
pub struct FetchedLayer {
    pub layer_id: String,
    pub features: Vec<Feature>,
}

pub struct RemoteFetcher {
    client: reqwest::Client,
    inflight: HashMap<String, JoinHandle<()>>,
}

impl RemoteFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            inflight: HashMap::new(),
        }
    }

    /// Start fetching `url` for `layer_id`, cancelling any fetch already in
    /// flight for that id. Parsed features are delivered on `results`; a
    /// failed fetch is logged and delivers nothing.
    pub fn spawn(&mut self, layer_id: &str, url: String, results: UnboundedSender<FetchedLayer>) {
        // Drop handles of fetches that already ran to completion so the map
        // tracks live work, not every layer id ever seen.
        self.inflight.retain(|_, handle| !handle.is_finished());
        self.cancel(layer_id);

        let client = self.client.clone();
        let id = layer_id.to_string();
        let handle = tokio::spawn(async move {
            match fetch_features(&client, &url).await {
                Ok(features) => {
                    debug!("Fetched {} features for layer {id}", features.len());
                    let _ = results.send(FetchedLayer {
                        layer_id: id,
                        features,
                    });
                }
                Err(e) => warn!("Failed to fetch GeoJSON for layer {id} from {url}: {e}"),
            }
        });

        self.inflight.insert(layer_id.to_string(), handle);
    }

    /// Abort the in-flight fetch for a layer id, if any.
    pub fn cancel(&mut self, layer_id: &str) {
        if let Some(handle) = self.inflight.remove(layer_id) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.inflight.drain() {
            handle.abort();
        }
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

impl Default for RemoteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot fetch and parse, used directly by the CLI's eager mode.
pub async fn fetch_features(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<Feature>, Box<dyn std::error::Error + Send + Sync>> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(geometry::features_from_geojson_str(&body))
}
