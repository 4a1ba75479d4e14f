//! Subscriber that records every document event.

use std::cell::RefCell;
use std::rc::Rc;

use layer_document::{DocumentEvent, Subscriber};

/// Shared event log.
///
/// Clone it, hand one clone to `Document::subscribe`, and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubscriber {
    events: Rc<RefCell<Vec<DocumentEvent>>>,
}

impl RecordingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DocumentEvent> {
        self.events.borrow().clone()
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(DocumentEvent::name).collect()
    }

    /// How many events named `name` were seen.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    pub fn last(&self) -> Option<DocumentEvent> {
        self.events.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Subscriber for RecordingSubscriber {
    fn notify(&mut self, event: &DocumentEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
