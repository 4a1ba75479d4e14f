//! Shared test utilities for the layer document workspace.
//!
//! This crate provides common testing infrastructure including:
//! - An in-memory [`MemoryWorkspace`] standing in for the import collaborator
//! - A [`RecordingSubscriber`] that captures document events
//! - Satellite file name fixtures the imager guidebook recognizes
//! - Preview data generators
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures::ahi, MemoryWorkspace, RecordingSubscriber};
//! ```

pub mod fixtures;
pub mod generators;
pub mod recorder;
pub mod workspace;

// Re-export commonly used items at the crate root
pub use fixtures::{ahi_time, data_path, full_disk_grid};
pub use generators::*;
pub use recorder::RecordingSubscriber;
pub use workspace::MemoryWorkspace;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro asserting that a document event with the given name was recorded.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_event;
///
/// assert_event!(recorder, "layer_added");
/// assert_event!(recorder, "visibility_changed", 1); // exactly once
/// ```
#[macro_export]
macro_rules! assert_event {
    ($recorder:expr, $name:expr) => {{
        let names = $recorder.names();
        if !names.contains(&$name) {
            panic!("expected event `{}`, recorded: {:?}", $name, names);
        }
    }};
    ($recorder:expr, $name:expr, $times:expr) => {{
        let seen = $recorder.count($name);
        if seen != $times {
            panic!(
                "expected event `{}` {} time(s), saw {}: {:?}",
                $name,
                $times,
                seen,
                $recorder.names()
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_event() {
        use layer_document::{DocumentEvent, Subscriber};

        let recorder = RecordingSubscriber::new();
        let mut sink = recorder.clone();
        sink.notify(&DocumentEvent::AnimationOrderChanged(vec![]));
        assert_event!(recorder, "animation_order_changed");
        assert_event!(recorder, "animation_order_changed", 1);
        assert_event!(recorder, "layer_added", 0);
    }
}
