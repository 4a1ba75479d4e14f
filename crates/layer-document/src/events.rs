//! Change notifications broadcast by the document.
//!
//! Delivery is synchronous: `emit` calls every current subscriber, in
//! subscription order, before the triggering operation returns.

use std::collections::BTreeMap;

use sift_common::{Channel, ColorLimits, ColormapRef, LayerId};

use crate::presentation::Presentation;

/// Color limits carried by a color-limits notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ClimChange {
    /// Limits of a single-band layer presentation
    Single(ColorLimits),
    /// Per-channel limits of an RGB composite
    Channels([Option<ColorLimits>; 3]),
}

/// Sampled value reported to the equalizer display.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Converted data value of an image layer
    Scalar(f64),
    /// 0..=255 value per channel of a composite; unassigned channels are `None`
    Rgb([Option<u8>; 3]),
}

/// One equalizer bar.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerValue {
    pub reading: Reading,
    /// Position of the value within the active color limits, 0..=1
    pub bar_width: f64,
    /// Decimal places to show
    pub precision: usize,
    pub unit: String,
}

/// Channel reassignment requested for an RGB composite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelAssignment {
    pub red: Option<LayerId>,
    pub green: Option<LayerId>,
    pub blue: Option<LayerId>,
}

impl ChannelAssignment {
    pub fn get(&self, channel: Channel) -> Option<LayerId> {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    pub fn set(&mut self, channel: Channel, id: Option<LayerId>) {
        match channel {
            Channel::Red => self.red = id,
            Channel::Green => self.green = id,
            Channel::Blue => self.blue = id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_none() && self.green.is_none() && self.blue.is_none()
    }

    /// Supplied channels in R, G, B order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, LayerId)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(|ch| self.get(ch).map(|id| (ch, id)))
    }
}

/// Everything the document announces to its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// A layer was inserted; `reordered` lists old rows in their new
    /// positions with `None` for the new slot.
    LayerAdded {
        reordered: Vec<Option<usize>>,
        id: LayerId,
        presentation: Presentation,
    },
    /// Rows were removed from the current layer set.
    LayersRemoved {
        /// Old rows that remain, in order
        remaining: Vec<usize>,
        ids: Vec<LayerId>,
        first_row: usize,
        count: usize,
    },
    /// The layer is about to leave the catalogue; drop references to it now.
    WillPurgeLayer(LayerId),
    VisibilityChanged(BTreeMap<LayerId, bool>),
    /// Old rows in their new positions, `None` for inserted rows.
    LayersReordered(Vec<Option<usize>>),
    AnimationOrderChanged(Vec<LayerId>),
    LayerRenamed { id: LayerId, name: String },
    LayerSetSwitched {
        index: usize,
        entries: Vec<Presentation>,
        animation_order: Vec<LayerId>,
    },
    ColormapChanged(BTreeMap<LayerId, Option<ColormapRef>>),
    ColorLimitsChanged(BTreeMap<LayerId, ClimChange>),
    /// Composite channels were reassigned.
    CompositionChanged {
        id: LayerId,
        presentation: Option<Presentation>,
        assignment: ChannelAssignment,
    },
    EqualizerValuesChanged(BTreeMap<LayerId, Option<EqualizerValue>>),
}

impl DocumentEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::LayerAdded { .. } => "layer_added",
            DocumentEvent::LayersRemoved { .. } => "layers_removed",
            DocumentEvent::WillPurgeLayer(_) => "will_purge_layer",
            DocumentEvent::VisibilityChanged(_) => "visibility_changed",
            DocumentEvent::LayersReordered(_) => "layers_reordered",
            DocumentEvent::AnimationOrderChanged(_) => "animation_order_changed",
            DocumentEvent::LayerRenamed { .. } => "layer_renamed",
            DocumentEvent::LayerSetSwitched { .. } => "layer_set_switched",
            DocumentEvent::ColormapChanged(_) => "colormap_changed",
            DocumentEvent::ColorLimitsChanged(_) => "color_limits_changed",
            DocumentEvent::CompositionChanged { .. } => "composition_changed",
            DocumentEvent::EqualizerValuesChanged(_) => "equalizer_values_changed",
        }
    }
}

/// Receives document notifications.
pub trait Subscriber {
    fn notify(&mut self, event: &DocumentEvent);
}

impl<F> Subscriber for F
where
    F: FnMut(&DocumentEvent),
{
    fn notify(&mut self, event: &DocumentEvent) {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer registry owned by the document.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn emit(&mut self, event: DocumentEvent) {
        tracing::trace!(event = event.name(), subscribers = self.subscribers.len(), "emit");
        for (_, subscriber) in &mut self.subscribers {
            subscriber.notify(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_all_subscribers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&log);
        bus.subscribe(move |e: &DocumentEvent| first.borrow_mut().push(("first", e.name())));
        let second = Rc::clone(&log);
        bus.subscribe(move |e: &DocumentEvent| second.borrow_mut().push(("second", e.name())));

        bus.emit(DocumentEvent::WillPurgeLayer(LayerId::new()));
        assert_eq!(
            *log.borrow(),
            vec![("first", "will_purge_layer"), ("second", "will_purge_layer")]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_: &DocumentEvent| *c.borrow_mut() += 1);

        bus.emit(DocumentEvent::AnimationOrderChanged(vec![]));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(DocumentEvent::AnimationOrderChanged(vec![]));
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_channel_assignment() {
        let r = LayerId::new();
        let b = LayerId::new();
        let assignment = ChannelAssignment {
            red: Some(r),
            green: None,
            blue: Some(b),
        };
        let supplied: Vec<_> = assignment.iter().collect();
        assert_eq!(supplied, vec![(Channel::Red, r), (Channel::Blue, b)]);
        assert!(ChannelAssignment::default().is_empty());
    }
}
