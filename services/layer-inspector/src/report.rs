//! Layer set summaries.

use layer_document::{Document, Guidebook, Workspace};
use serde::Serialize;
use sift_common::{LayerId, LayerKind};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub time: String,
    pub visible: bool,
    pub valid: bool,
    pub animation_order: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSetSummary {
    pub index: usize,
    pub current: bool,
    pub entries: Vec<EntrySummary>,
    pub animation: Vec<LayerId>,
}

/// Summaries of every populated layer set, in slot order.
pub fn summarize<W: Workspace, G: Guidebook>(doc: &Document<W, G>) -> Vec<LayerSetSummary> {
    doc.layer_sets()
        .map(|(index, set)| LayerSetSummary {
            index,
            current: index == doc.current_set_index(),
            entries: set
                .iter()
                .filter_map(|p| {
                    let layer = doc.layer(p.id).ok()?;
                    Some(EntrySummary {
                        id: p.id,
                        name: layer.name.clone(),
                        kind: layer.kind(),
                        time: doc.guidebook().display_time(layer),
                        visible: p.visible,
                        valid: layer.is_valid(),
                        animation_order: p.animation_order,
                    })
                })
                .collect(),
            animation: set.animation_order(),
        })
        .collect()
}

pub fn log_summaries(summaries: &[LayerSetSummary]) {
    for set in summaries {
        info!(
            set = set.index,
            current = set.current,
            entries = set.entries.len(),
            frames = set.animation.len(),
            "layer set"
        );
        for (row, entry) in set.entries.iter().enumerate() {
            info!(
                set = set.index,
                row,
                layer = %entry.id,
                name = %entry.name,
                kind = ?entry.kind,
                time = %entry.time,
                visible = entry.visible,
                valid = entry.valid,
                animation_order = ?entry.animation_order,
                "entry"
            );
        }
    }
}
