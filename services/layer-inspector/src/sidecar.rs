//! Background reading of JSON metadata sidecars.
//!
//! A sidecar sits next to its data file (`<file>.json`) and holds a partial
//! [`LayerUpdate`], typically the grid and calibrated limits that the file
//! name cannot tell. Sidecars are read off the document's task and the
//! results sent back over a channel.

use std::path::{Path, PathBuf};

use sift_common::{LayerId, LayerUpdate};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Metadata for one layer, ready for `Document::update_metadata`.
#[derive(Debug, Clone)]
pub struct MetadataReport {
    pub id: LayerId,
    pub update: LayerUpdate,
}

/// Path of the sidecar for a data file.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Parse sidecar text.
pub fn parse_sidecar(text: &str) -> serde_json::Result<LayerUpdate> {
    serde_json::from_str(text)
}

/// Read sidecars for every layer and send what was found.
///
/// Missing sidecars are skipped quietly, malformed ones with a warning. Stops
/// early when the receiver is dropped.
pub async fn read_sidecars(layers: Vec<(LayerId, PathBuf)>, tx: mpsc::Sender<MetadataReport>) {
    for (id, path) in layers {
        let sidecar = sidecar_path(&path);
        let text = match tokio::fs::read_to_string(&sidecar).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(layer = %id, path = %sidecar.display(), "no sidecar");
                continue;
            }
            Err(e) => {
                warn!(layer = %id, path = %sidecar.display(), error = %e, "cannot read sidecar");
                continue;
            }
        };
        let update = match parse_sidecar(&text) {
            Ok(update) => update,
            Err(e) => {
                warn!(layer = %id, path = %sidecar.display(), error = %e, "malformed sidecar");
                continue;
            }
        };
        if update.is_empty() {
            continue;
        }
        if tx.send(MetadataReport { id, update }).await.is_err() {
            debug!("metadata receiver closed");
            return;
        }
    }
}
