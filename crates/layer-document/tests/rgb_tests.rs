//! Integration tests for RGB composites, sibling propagation and loops.

use layer_document::{ChannelAssignment, ClimChange, Document, DocumentEvent, LoopOptions};
use sift_common::{Channel, ColorLimits, DocumentError, LayerId, LayerKind, LayerUpdate};
use test_utils::fixtures::ahi;
use test_utils::{assert_event, data_path, MemoryWorkspace, RecordingSubscriber};

fn new_document() -> (Document<MemoryWorkspace>, RecordingSubscriber) {
    let mut doc = Document::new(MemoryWorkspace::new());
    let recorder = RecordingSubscriber::new();
    doc.subscribe(recorder.clone());
    (doc, recorder)
}

fn open(doc: &mut Document<MemoryWorkspace>, name: &str) -> LayerId {
    doc.open(&data_path(name)).unwrap().0
}

/// Red, green and blue components of a true color composite.
fn true_color(doc: &mut Document<MemoryWorkspace>, r: &str, g: &str, b: &str) -> ChannelAssignment {
    ChannelAssignment {
        red: Some(open(doc, r)),
        green: Some(open(doc, g)),
        blue: Some(open(doc, b)),
    }
}

fn reflectance() -> ColorLimits {
    ColorLimits::new(-0.012, 1.192)
}

fn composites(doc: &Document<MemoryWorkspace>) -> usize {
    doc.catalogue()
        .iter()
        .filter(|l| l.kind() == LayerKind::Rgb)
        .count()
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_composite() {
    let (mut doc, recorder) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    recorder.clear();

    let id = doc.create_rgb_composite(channels.clone(), None).unwrap();

    assert_eq!(doc.id_for_row(0).unwrap(), id);
    assert!(doc.is_layer_visible(0).unwrap());
    for (_, component) in channels.iter() {
        assert!(!doc.presentation(component).unwrap().visible);
    }

    let layer = doc.layer(id).unwrap();
    let rgb = layer.as_rgb().unwrap();
    assert_eq!(
        rgb.channels,
        [channels.red, channels.green, channels.blue]
    );
    assert_eq!(rgb.bands, [Some(3), Some(2), Some(1)]);
    assert_eq!(rgb.clims, [Some(reflectance()); 3]);
    assert_eq!(layer.name, "R:B03 G:B02 B:B01");
    assert_eq!(layer.platform.as_deref(), Some("Himawari-8"));
    assert!(layer.is_valid());

    assert_event!(recorder, "layer_added", 1);
    assert_event!(recorder, "composition_changed", 1);
    assert_event!(recorder, "visibility_changed", 1);
}

#[test]
fn test_create_composite_with_limits() {
    let (mut doc, _) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let forced = [Some(ColorLimits::new(0.0, 0.8)), None, Some(reflectance())];

    let id = doc.create_rgb_composite(channels, Some(forced)).unwrap();
    assert_eq!(doc.layer(id).unwrap().as_rgb().unwrap().clims, forced);
}

#[test]
fn test_create_incomplete_composite() {
    let (mut doc, recorder) = new_document();
    let red = open(&mut doc, ahi::B03_0030);
    recorder.clear();

    let empty = doc
        .create_rgb_composite(ChannelAssignment::default(), None)
        .unwrap();
    assert!(!doc.layer(empty).unwrap().is_valid());
    assert_eq!(recorder.names(), vec!["layer_added"]);

    let partial = ChannelAssignment {
        red: Some(red),
        ..Default::default()
    };
    let id = doc.create_rgb_composite(partial, None).unwrap();
    let layer = doc.layer(id).unwrap();
    assert_eq!(layer.name, "R:B03 G:--- B:---");
    assert!(!layer.is_valid());
}

#[test]
fn test_create_composite_unknown_component() {
    let (mut doc, _) = new_document();
    let channels = ChannelAssignment {
        red: Some(LayerId::new()),
        ..Default::default()
    };
    assert!(matches!(
        doc.create_rgb_composite(channels, None),
        Err(DocumentError::NotFound(_))
    ));
    assert!(doc.is_empty());
}

// ============================================================================
// Channel assignment and propagation
// ============================================================================

#[test]
fn test_assign_channels_rejects_images() {
    let (mut doc, _) = new_document();
    let image = open(&mut doc, ahi::B13_0030);
    let assignment = ChannelAssignment {
        red: Some(image),
        ..Default::default()
    };
    assert!(matches!(
        doc.assign_channels(image, &assignment, true),
        Err(DocumentError::NotComposite(id)) if id == image
    ));
}

#[test]
fn test_components_must_be_images() {
    let (mut doc, recorder) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let id = doc.create_rgb_composite(channels.clone(), None).unwrap();
    let other = doc.create_rgb_composite(ChannelAssignment::default(), None).unwrap();
    recorder.clear();

    // a composite cannot feed its own channel
    let own = ChannelAssignment {
        red: Some(id),
        ..Default::default()
    };
    assert_eq!(
        doc.assign_channels(id, &own, false),
        Err(DocumentError::InvalidComponent(id))
    );
    let nested = ChannelAssignment {
        green: Some(other),
        ..Default::default()
    };
    assert_eq!(
        doc.assign_channels(id, &nested, true),
        Err(DocumentError::InvalidComponent(other))
    );
    assert_eq!(doc.layer(id).unwrap().as_rgb().unwrap().channels[0], channels.red);
    assert!(recorder.events().is_empty());

    let before = composites(&doc);
    assert_eq!(
        doc.create_rgb_composite(nested, None),
        Err(DocumentError::InvalidComponent(other))
    );
    assert_eq!(composites(&doc), before);
}

#[test]
fn test_assign_same_channels_is_a_no_op() {
    let (mut doc, recorder) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let id = doc.create_rgb_composite(channels.clone(), None).unwrap();
    recorder.clear();

    assert!(!doc.assign_channels(id, &channels, true).unwrap());
    assert!(recorder.events().is_empty());
}

#[test]
fn test_reassignment_propagates_to_siblings() {
    let (mut doc, recorder) = new_document();
    let early = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let late = true_color(&mut doc, ahi::B03_0040, ahi::B02_0040, ahi::B01_0040);
    let ir_early = open(&mut doc, ahi::B13_0030);
    let ir_late = open(&mut doc, ahi::B13_0040);
    let master = doc.create_rgb_composite(early, None).unwrap();
    let sibling = doc.create_rgb_composite(late.clone(), None).unwrap();
    assert_eq!(doc.rgb_siblings(master).unwrap(), vec![master, sibling]);
    recorder.clear();

    let assignment = ChannelAssignment {
        red: Some(ir_early),
        ..Default::default()
    };
    assert!(doc.assign_channels(master, &assignment, true).unwrap());

    let rgb = doc.layer(sibling).unwrap().as_rgb().unwrap().clone();
    assert_eq!(rgb.component(Channel::Red), Some(ir_late));
    assert_eq!(rgb.component(Channel::Green), late.green);
    assert_eq!(rgb.bands, [Some(13), Some(2), Some(1)]);

    let ir_limits = doc.layer(ir_early).unwrap().clim();
    assert_eq!(rgb.clim(Channel::Red), ir_limits);
    assert_eq!(rgb.clim(Channel::Green), Some(reflectance()));
    assert_event!(recorder, "composition_changed", 2);

    // both composites now share the new band triple
    assert_eq!(doc.rgb_siblings(sibling).unwrap(), vec![master, sibling]);
}

#[test]
fn test_reassignment_without_propagation() {
    let (mut doc, _) = new_document();
    let early = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let late = true_color(&mut doc, ahi::B03_0040, ahi::B02_0040, ahi::B01_0040);
    let ir = open(&mut doc, ahi::B13_0030);
    let master = doc.create_rgb_composite(early, None).unwrap();
    let sibling = doc.create_rgb_composite(late.clone(), None).unwrap();

    let assignment = ChannelAssignment {
        red: Some(ir),
        ..Default::default()
    };
    doc.assign_channels(master, &assignment, false).unwrap();
    let rgb = doc.layer(sibling).unwrap().as_rgb().unwrap();
    assert_eq!(rgb.component(Channel::Red), late.red);
    assert_eq!(doc.rgb_siblings(master).unwrap(), vec![master]);
}

#[test]
fn test_metadata_update_refreshes_composite() {
    let (mut doc, _) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let red = channels.red.unwrap();
    let id = doc.create_rgb_composite(channels, None).unwrap();

    let update = LayerUpdate {
        band: Some(4),
        ..Default::default()
    };
    assert_eq!(doc.update_metadata(red, &update), vec!["band"]);
    let layer = doc.layer(id).unwrap();
    assert_eq!(layer.as_rgb().unwrap().bands, [Some(4), Some(2), Some(1)]);
    assert_eq!(layer.name, "R:B04 G:B02 B:B01");
}

// ============================================================================
// Color limits
// ============================================================================

#[test]
fn test_change_rgb_clims_skips_unchanged() {
    let (mut doc, recorder) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let image = channels.red.unwrap();
    let id = doc.create_rgb_composite(channels, None).unwrap();
    recorder.clear();

    let same = [Some(reflectance()); 3];
    assert!(doc.change_rgb_clims(same, &[id, image]).is_empty());
    assert_eq!(
        recorder.events(),
        vec![DocumentEvent::ColorLimitsChanged(Default::default())]
    );

    let narrow = [Some(ColorLimits::new(0.0, 0.5)); 3];
    assert_eq!(doc.change_rgb_clims(narrow, &[id, image]), vec![id]);
    let mut expected = std::collections::BTreeMap::new();
    expected.insert(id, ClimChange::Channels(narrow));
    assert_eq!(
        recorder.last(),
        Some(DocumentEvent::ColorLimitsChanged(expected))
    );
}

#[test]
fn test_set_rgb_range_reaches_siblings() {
    let (mut doc, _) = new_document();
    let early = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let late = true_color(&mut doc, ahi::B03_0040, ahi::B02_0040, ahi::B01_0040);
    let master = doc.create_rgb_composite(early, None).unwrap();
    let sibling = doc.create_rgb_composite(late, None).unwrap();

    let red = ColorLimits::new(0.1, 0.9);
    let mut changed = doc.set_rgb_range(master, Channel::Red, red).unwrap();
    changed.sort();
    let mut expected = vec![master, sibling];
    expected.sort();
    assert_eq!(changed, expected);

    let rgb = doc.layer(sibling).unwrap().as_rgb().unwrap();
    assert_eq!(rgb.clim(Channel::Red), Some(red));
    assert_eq!(rgb.clim(Channel::Blue), Some(reflectance()));
}

#[test]
fn test_change_and_propagate_without_siblings() {
    let (mut doc, _) = new_document();
    let early = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let late = true_color(&mut doc, ahi::B03_0040, ahi::B02_0040, ahi::B01_0040);
    let master = doc.create_rgb_composite(early, None).unwrap();
    let sibling = doc.create_rgb_composite(late, None).unwrap();

    let clims = [Some(ColorLimits::new(0.0, 1.0)); 3];
    let changed = doc
        .change_and_propagate_rgb_clims(master, clims, false)
        .unwrap();
    assert_eq!(changed, vec![master]);
    assert_eq!(
        doc.layer(sibling).unwrap().as_rgb().unwrap().clims,
        [Some(reflectance()); 3]
    );
}

// ============================================================================
// Loops
// ============================================================================

/// Three time steps; the last lacks the red band.
fn loop_document() -> (Document<MemoryWorkspace>, RecordingSubscriber, LayerId) {
    let (mut doc, recorder) = new_document();
    let first = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    true_color(&mut doc, ahi::B03_0040, ahi::B02_0040, ahi::B01_0040);
    open(&mut doc, ahi::B02_0050);
    open(&mut doc, ahi::B01_0050);
    let master = doc.create_rgb_composite(first, None).unwrap();
    recorder.clear();
    (doc, recorder, master)
}

#[test]
fn test_build_loop_creates_missing_composites() {
    let (mut doc, recorder, master) = loop_document();

    let order = doc.build_loop(master, LoopOptions::default()).unwrap();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0], master);
    assert_eq!(composites(&doc), 2);
    assert_eq!(doc.current_animation_order(), order);

    let built = doc.layer(order[1]).unwrap();
    assert_eq!(built.scheduled_time, Some(test_utils::ahi_time(0, 40)));
    assert_eq!(built.as_rgb().unwrap().bands, [Some(3), Some(2), Some(1)]);

    let ws = doc.workspace();
    for name in [ahi::B03_0040, ahi::B02_0040, ahi::B01_0040] {
        let id = ws.id_for(&data_path(name)).unwrap();
        assert!(!doc.presentation(id).unwrap().visible);
    }
    let incomplete = ws.id_for(&data_path(ahi::B02_0050)).unwrap();
    assert!(doc.presentation(incomplete).unwrap().visible);
    assert_event!(recorder, "animation_order_changed", 1);
}

#[test]
fn test_build_loop_reuses_existing_composites() {
    let (mut doc, _, master) = loop_document();
    let first = doc.build_loop(master, LoopOptions::default()).unwrap();
    let again = doc.build_loop(master, LoopOptions::default()).unwrap();

    assert_eq!(first, again);
    assert_eq!(composites(&doc), 2);
}

#[test]
fn test_build_loop_without_creating() {
    let (mut doc, _, master) = loop_document();
    let options = LoopOptions {
        create_missing: false,
        ..Default::default()
    };

    assert_eq!(doc.build_loop(master, options).unwrap(), vec![master]);
    assert_eq!(composites(&doc), 1);
}

#[test]
fn test_build_loop_forces_master_limits() {
    let (mut doc, _, master) = loop_document();
    let clims = [Some(ColorLimits::new(0.0, 0.6)); 3];
    doc.change_rgb_clims(clims, &[master]);

    let order = doc.build_loop(master, LoopOptions::default()).unwrap();
    for id in order {
        assert_eq!(doc.layer(id).unwrap().as_rgb().unwrap().clims, clims);
    }
}

#[test]
fn test_animate_siblings_of_composite_builds_loop() {
    let (mut doc, _, master) = loop_document();
    let order = doc.animate_siblings(master).unwrap();
    assert_eq!(order.len(), 2);
    assert_eq!(composites(&doc), 2);
}

#[test]
fn test_step_through_composites() {
    let (mut doc, _, master) = loop_document();
    let order = doc.build_loop(master, LoopOptions::default()).unwrap();

    let focus = doc.next_last_step(master, 1, false).unwrap();
    assert_eq!(focus, order[1]);
    assert!(!doc.presentation(master).unwrap().visible);
    assert!(doc.presentation(order[1]).unwrap().visible);
}

#[test]
fn test_purged_component_is_tolerated() {
    let (mut doc, _) = new_document();
    let channels = true_color(&mut doc, ahi::B03_0030, ahi::B02_0030, ahi::B01_0030);
    let red = channels.red.unwrap();
    let id = doc.create_rgb_composite(channels, None).unwrap();

    doc.remove_from_all_sets(&[red]).unwrap();
    assert!(doc.layer(red).is_err());
    assert!(doc.catalogue().contains(id));

    // the stale channel is replaced without error
    let blue = doc
        .workspace()
        .id_for(&data_path(ahi::B01_0030))
        .unwrap();
    let assignment = ChannelAssignment {
        red: Some(blue),
        ..Default::default()
    };
    assert!(doc.assign_channels(id, &assignment, true).unwrap());
    assert_eq!(doc.layer(id).unwrap().name, "R:B01 G:B02 B:B01");
}
