//! Document model for satellite imagery layers.
//!
//! A [`Document`] owns a [`Catalogue`] of layers and several [`LayerSet`]s,
//! each an independent arrangement of [`Presentation`] entries over the same
//! layers. The document keeps presentation state, animation order and RGB
//! composite dependencies consistent, and broadcasts every change through an
//! [`EventBus`].
//!
//! # Architecture
//!
//! ```text
//! Workspace::import_image(path)
//!      │
//!      ▼
//! Document::open ──► Guidebook (names, limits, colormaps)
//!      │
//!      ├─► Catalogue::insert(layer)
//!      │
//!      ├─► LayerSet::insert_entry  (visible in current set, hidden elsewhere)
//!      │
//!      └─► EventBus::emit(LayerAdded)
//! ```
//!
//! The document is single-threaded. Background importers report metadata
//! back through [`Document::update_metadata`] on the owning thread.

pub mod catalogue;
pub mod config;
pub mod document;
pub mod events;
pub mod filenames;
pub mod guidebook;
pub mod layer_set;
pub mod presentation;
pub mod workspace;

pub use catalogue::{Catalogue, SiblingKey};
pub use config::DocumentConfig;
pub use document::{ChannelLimits, Document, LayerQuery, LoopOptions};
pub use events::{
    ChannelAssignment, ClimChange, DocumentEvent, EqualizerValue, EventBus, Reading, Subscriber,
    SubscriptionId,
};
pub use guidebook::{Guidebook, ImagerGuidebook, UnitConversion, UnitTransform};
pub use layer_set::LayerSet;
pub use presentation::{LayerRef, Mixing, Presentation};
pub use workspace::{ImportedImage, Preview, Workspace};
