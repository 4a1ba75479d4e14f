//! Per-layer-set presentation of a layer.

use serde::{Deserialize, Serialize};
use sift_common::{ColorLimits, ColormapRef, LayerId, LayerKind};

/// How a layer is blended with the layers under it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mixing {
    #[default]
    Normal,
    Additive,
}

/// How one layer is displayed within one layer set.
///
/// A plain value: it has no identity of its own and is addressed by its row
/// in the owning [`LayerSet`](crate::LayerSet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub id: LayerId,
    pub kind: LayerKind,
    pub visible: bool,
    /// `None` for layers that do not take part in the animation
    pub animation_order: Option<usize>,
    pub colormap: Option<ColormapRef>,
    pub clim: Option<ColorLimits>,
    pub mixing: Mixing,
}

impl Presentation {
    pub fn new(id: LayerId, kind: LayerKind) -> Self {
        Self {
            id,
            kind,
            visible: true,
            animation_order: None,
            colormap: None,
            clim: None,
            mixing: Mixing::Normal,
        }
    }

    pub fn with_visible(&self, visible: bool) -> Self {
        Self {
            visible,
            ..self.clone()
        }
    }

    /// Visible or part of the animation loop.
    pub fn is_active(&self) -> bool {
        self.visible || self.animation_order.is_some()
    }
}

/// A row or a layer identifier, used wherever callers may address entries either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRef {
    Row(usize),
    Id(LayerId),
}

impl From<usize> for LayerRef {
    fn from(row: usize) -> Self {
        LayerRef::Row(row)
    }
}

impl From<LayerId> for LayerRef {
    fn from(id: LayerId) -> Self {
        LayerRef::Id(id)
    }
}

impl From<&LayerId> for LayerRef {
    fn from(id: &LayerId) -> Self {
        LayerRef::Id(*id)
    }
}
