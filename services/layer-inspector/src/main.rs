//! Layer inspector.
//!
//! Loads every recognized satellite file under a directory into a layer
//! document, applies sidecar metadata read in the background, optionally
//! builds a true color loop, and reports the resulting layer sets.

mod report;
mod scan;
mod sidecar;
mod workspace;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use layer_document::{
    ChannelAssignment, Document, DocumentConfig, DocumentEvent, ImagerGuidebook, LoopOptions,
    SiblingKey,
};
use sift_common::{BandKey, LayerId, LayerKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use sidecar::{read_sidecars, MetadataReport};
use workspace::FileWorkspace;

type InspectorDocument = Document<FileWorkspace, ImagerGuidebook>;

#[derive(Parser, Debug)]
#[command(name = "layer-inspector")]
#[command(about = "Load satellite imagery into a layer document and report its layer sets")]
struct Args {
    /// Directory to scan for satellite files
    #[arg(env = "SIFT_DATA_DIR")]
    data_dir: PathBuf,

    /// Document configuration file (YAML); environment is used otherwise
    #[arg(short, long, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum directory depth to scan
    #[arg(long, default_value = "4")]
    max_depth: usize,

    /// Build a true color composite loop from AHI bands 3, 2 and 1
    #[arg(long)]
    true_color: bool,

    /// Animate the time siblings of the top layer
    #[arg(long)]
    animate: bool,

    /// Print the layer set summary as JSON on stdout
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON
    #[arg(long, env = "SIFT_LOG_JSON")]
    json_logs: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Starting layer inspector");

    let config = match &args.config {
        Some(path) => DocumentConfig::from_yaml(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DocumentConfig::from_env(),
    };
    info!(
        layer_sets = config.layer_set_count,
        max_layer_sets = config.max_layer_sets,
        "Loaded configuration"
    );

    let mut doc = Document::with_config(FileWorkspace::new(), ImagerGuidebook::new(), config)?;
    doc.subscribe(|event: &DocumentEvent| debug!(event = event.name(), "document event"));

    let paths = scan::find_satellite_files(&args.data_dir, args.max_depth);
    info!(dir = %args.data_dir.display(), files = paths.len(), "Scanned data directory");

    let opened = open_all(&mut doc, paths);
    info!(layers = opened.len(), "Opened layers");

    apply_sidecars(&mut doc, opened).await;

    if args.true_color {
        match build_true_color(&mut doc) {
            Ok(Some(order)) => info!(frames = order.len(), "Built true color loop"),
            Ok(None) => warn!("No complete set of bands 1-3 for a true color composite"),
            Err(e) => warn!(error = %e, "Could not build true color loop"),
        }
    }

    if args.animate && !doc.is_empty() {
        let order = doc.animate_siblings(0usize)?;
        info!(frames = order.len(), "Animating top layer");
    }

    let summaries = report::summarize(&doc);
    report::log_summaries(&summaries);
    if args.summary {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    info!(
        layers = doc.catalogue().len(),
        loaded = doc.workspace().loaded(),
        "Layer inspector finished"
    );
    Ok(())
}

/// Open files in load order; failures are logged and skipped.
fn open_all(doc: &mut InspectorDocument, paths: Vec<PathBuf>) -> Vec<(LayerId, PathBuf)> {
    let results: Vec<_> = doc.open_many(paths).collect();
    results
        .into_iter()
        .filter_map(|result| match result {
            Ok((id, layer, _)) => layer.source.map(|source| (id, source)),
            Err(e) => {
                warn!(error = %e, "Could not open file");
                None
            }
        })
        .collect()
}

/// Read sidecars on a background task and apply them here as they arrive.
async fn apply_sidecars(doc: &mut InspectorDocument, layers: Vec<(LayerId, PathBuf)>) {
    let (tx, mut rx) = mpsc::channel::<MetadataReport>(64);
    let reader = tokio::spawn(read_sidecars(layers, tx));

    let mut updated = 0usize;
    while let Some(report) = rx.recv().await {
        let changed = doc.update_metadata(report.id, &report.update);
        if !changed.is_empty() {
            debug!(layer = %report.id, fields = ?changed, "Applied sidecar metadata");
            updated += 1;
        }
    }
    if let Err(e) = reader.await {
        warn!(error = %e, "Sidecar reader failed");
    }
    info!(updated, "Applied sidecar metadata");
}

/// Composite the newest time step that has AHI bands 3, 2 and 1, then loop it.
fn build_true_color(doc: &mut InspectorDocument) -> Result<Option<Vec<LayerId>>> {
    let images = doc.catalogue().building_blocks(LayerKind::Image);
    let mut reds: Vec<_> = doc
        .catalogue()
        .iter()
        .filter(|layer| layer.band() == Some(3) && layer.instrument.as_deref() == Some("AHI"))
        .map(|layer| (layer.scheduled_time, SiblingKey::of(layer), layer.id()))
        .collect();
    reds.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, key, red) in reds {
        let green = images.get(&key.with_band(BandKey::Single(2))).copied();
        let blue = images.get(&key.with_band(BandKey::Single(1))).copied();
        if green.is_none() || blue.is_none() {
            continue;
        }
        let channels = ChannelAssignment {
            red: Some(red),
            green,
            blue,
        };
        let master = doc.create_rgb_composite(channels, None)?;
        let order = doc.build_loop(master, LoopOptions::default())?;
        return Ok(Some(order));
    }
    Ok(None)
}
