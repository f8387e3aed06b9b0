use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use std::path::PathBuf;

use maplayers::config::{MapFormData, QueryData};
use maplayers::fetch;
use maplayers::layer::{self, LayerSource, PassOutcome, RenderableLayer};

/// Translate chart layer configuration (plus optional query rows) into a
/// renderable-layer manifest.
#[derive(Parser, Debug)]
struct Args {
    /// Chart form data JSON: layer list, column hints, map options
    #[arg(long)]
    form_data: PathBuf,

    /// Query result rows as a JSON array of objects
    #[arg(long)]
    rows: Option<PathBuf>,

    /// Write the manifest to this path instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Eagerly resolve remote GeoJSON sources into features
    #[arg(long, default_value_t = false)]
    resolve_remote: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let form: MapFormData = serde_json::from_str(&std::fs::read_to_string(&args.form_data)?)?;

    let mut query = QueryData::default();
    if let Some(rows_path) = &args.rows {
        query.data = serde_json::from_str(&std::fs::read_to_string(rows_path)?)?;
        info!("Loaded {} rows from {:?}", query.data.len(), rows_path);
    }

    let mut layers = match layer::translate_pass(&form, std::slice::from_ref(&query)) {
        PassOutcome::QueryError(message) => {
            return Err(format!("Upstream query failed: {message}").into());
        }
        PassOutcome::NoLayers => {
            warn!("No layers configured");
            Vec::new()
        }
        PassOutcome::Layers(layers) => layers,
    };

    if args.resolve_remote {
        resolve_remote_layers(&mut layers).await;
    }

    for layer in &layers {
        match layer.feature_count() {
            Some(count) => info!("Layer {}: {} features (z={})", layer.id, count, layer.z_index),
            None => info!("Layer {}: tile/remote source (z={})", layer.id, layer.z_index),
        }
    }

    let manifest = serde_json::to_string_pretty(&layers)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, manifest)?;
            info!("Wrote layer manifest to {:?}", path);
        }
        None => println!("{manifest}"),
    }

    Ok(())
}

/// Replace remote GeoJSON sources with their fetched features. Fetch
/// failures leave the layer unresolved rather than failing the run.
async fn resolve_remote_layers(layers: &mut [RenderableLayer]) {
    let remote: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, l)| matches!(l.source, LayerSource::RemoteGeojson { .. }))
        .map(|(i, _)| i)
        .collect();
    if remote.is_empty() {
        return;
    }

    let pb = ProgressBar::new(remote.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_message("Fetching remote layers");

    let client = reqwest::Client::new();
    for index in remote {
        let LayerSource::RemoteGeojson { url } = &layers[index].source else {
            continue;
        };
        let url = url.clone();
        match fetch::fetch_features(&client, &url).await {
            Ok(features) => {
                layers[index].source = LayerSource::Features { features };
            }
            Err(e) => warn!("Leaving layer {} unresolved: {e}", layers[index].id),
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done fetching remote layers");
}
