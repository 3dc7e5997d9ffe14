// evlayer Remap Engine Integration Tests
//
// Drive the engine with realistic key sequences and check what reaches
// the sink together with the layer stack, modifier chain and down map.
//
// Run with: cargo test --test remap_engine_test

mod common;

use std::sync::Arc;

use parking_lot::Mutex;

use common::{press, release, repeat};
use evlayer_core::{
    Binding, Key, KeyEvent, KeySink, KeyState, MemorySink, Outcome, RemapEngine, RemapTable,
    RemapWarning, SinkError,
};

const ESC: Key = Key(1);
const ENTER: Key = Key(28);
const SPACE: Key = Key(57);
const HOME: Key = Key(102);

/// root: 15 -> ESC, 57 -> SPACE, 44 -> layer{57 -> ENTER}, 45 -> layer{57 -> HOME}
fn two_layer_table() -> RemapTable {
    RemapTable::new()
        .with(15, ESC)
        .with(57, SPACE)
        .with(44, RemapTable::new().with(57, ENTER))
        .with(45, RemapTable::new().with(57, HOME))
}

fn run(engine: &mut RemapEngine, sink: &mut MemorySink, events: &[KeyEvent]) -> Vec<Outcome> {
    events
        .iter()
        .map(|event| engine.process(*event, sink).unwrap())
        .collect()
}

fn assert_idle(engine: &RemapEngine) {
    assert_eq!(engine.layer_depth(), 1);
    assert!(engine.modifier_chain().is_empty());
    assert_eq!(engine.held_count(), 0);
}

#[test]
fn test_layer_example_sequence() {
    let table = RemapTable::new()
        .with(15, ESC)
        .with(44, RemapTable::new().with(57, ENTER));
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    assert_eq!(
        engine.process(press(44), &mut sink).unwrap(),
        Outcome::LayerPushed { depth: 2 }
    );
    assert!(sink.frames().is_empty());
    assert_eq!(engine.modifier_chain(), &[Key(44)]);

    assert_eq!(
        engine.process(press(57), &mut sink).unwrap(),
        Outcome::Emitted(ENTER, KeyState::Press)
    );
    assert_eq!(
        engine.process(release(57), &mut sink).unwrap(),
        Outcome::Emitted(ENTER, KeyState::Release)
    );
    assert_eq!(
        engine.process(release(44), &mut sink).unwrap(),
        Outcome::LayerReleased { depth: 1 }
    );

    assert_eq!(
        sink.frames(),
        &[
            vec![(ENTER, KeyState::Press)],
            vec![(ENTER, KeyState::Release)],
        ]
    );
    assert_idle(&engine);
}

#[test]
fn test_plain_presses_emit_one_event_each_at_root() {
    let table = RemapTable::builtin();
    let plain: Vec<(Key, Key)> = table
        .iter()
        .filter_map(|(code, binding)| binding.as_key().map(|key| (code, key)))
        .collect();
    assert!(!plain.is_empty());

    let mut engine = RemapEngine::new(table.clone());
    let mut sink = MemorySink::new();

    for (code, key) in &plain {
        let outcome = engine.process(KeyEvent::press(*code), &mut sink).unwrap();
        assert_eq!(outcome, Outcome::Emitted(*key, KeyState::Press));
        assert_eq!(sink.frames().last(), Some(&vec![(*key, KeyState::Press)]));
        assert_eq!(engine.layer_depth(), 1);
    }
    assert_eq!(sink.frames().len(), plain.len());
    assert_eq!(engine.held_count(), plain.len());
}

#[test]
fn test_layer_then_key_released_in_press_order() {
    let mut engine = RemapEngine::new(two_layer_table());
    let mut sink = MemorySink::new();

    run(&mut engine, &mut sink, &[press(44), press(57), release(44)]);
    assert_eq!(engine.layer_depth(), 1);
    assert!(engine.is_held(Key(57)));

    let last = engine.process(release(57), &mut sink).unwrap();
    assert_eq!(last, Outcome::Emitted(ENTER, KeyState::Release));
    assert_idle(&engine);
    assert!(sink.pressed().is_empty());
}

#[test]
fn test_out_of_order_modifier_release_returns_to_root() {
    let inner = RemapTable::new().with(57, HOME);
    let table = RemapTable::new()
        .with(44, RemapTable::new().with(57, ENTER))
        .with(45, inner);
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    let outcomes = run(
        &mut engine,
        &mut sink,
        &[press(44), press(45), release(44), release(45)],
    );
    assert_eq!(
        outcomes,
        vec![
            Outcome::LayerPushed { depth: 2 },
            Outcome::LayerPushed { depth: 3 },
            Outcome::LayerReleased { depth: 2 },
            Outcome::LayerReleased { depth: 1 },
        ]
    );
    assert_idle(&engine);
    assert!(sink.frames().is_empty());
}

#[test]
fn test_replay_keeps_surviving_layer_active() {
    let mut engine = RemapEngine::new(two_layer_table());
    let mut sink = MemorySink::new();

    run(&mut engine, &mut sink, &[press(44), press(45), release(44)]);
    assert_eq!(engine.modifier_chain(), &[Key(45)]);
    assert_eq!(engine.layer_depth(), 2);

    let outcome = engine.process(press(57), &mut sink).unwrap();
    assert_eq!(outcome, Outcome::Emitted(HOME, KeyState::Press));
}

#[test]
fn test_held_key_releases_press_time_code_after_layer_change() {
    let mut engine = RemapEngine::new(two_layer_table());
    let mut sink = MemorySink::new();

    run(
        &mut engine,
        &mut sink,
        &[press(44), press(57), release(44), press(45)],
    );
    // 57 now resolves to HOME, but the held key was pressed as ENTER
    assert_eq!(engine.lookup(Key(57)).and_then(Binding::as_key), Some(HOME));

    let outcome = engine.process(release(57), &mut sink).unwrap();
    assert_eq!(outcome, Outcome::Emitted(ENTER, KeyState::Release));

    engine.process(release(45), &mut sink).unwrap();
    assert_idle(&engine);
    assert!(sink.pressed().is_empty());
}

#[test]
fn test_repeats_follow_press_time_binding() {
    let mut engine = RemapEngine::new(two_layer_table());
    let mut sink = MemorySink::new();

    let outcomes = run(
        &mut engine,
        &mut sink,
        &[press(44), repeat(44), press(57), repeat(57), repeat(44), release(44), repeat(57)],
    );
    assert_eq!(outcomes[1], Outcome::LayerHeld);
    assert_eq!(outcomes[3], Outcome::Emitted(ENTER, KeyState::Repeat));
    assert_eq!(outcomes[4], Outcome::LayerHeld);
    assert_eq!(outcomes[6], Outcome::Emitted(ENTER, KeyState::Repeat));

    assert_eq!(
        sink.events(),
        vec![
            (ENTER, KeyState::Press),
            (ENTER, KeyState::Repeat),
            (ENTER, KeyState::Repeat),
        ]
    );
}

#[test]
fn test_warnings_leave_state_untouched() {
    let mut engine = RemapEngine::new(two_layer_table());
    let mut sink = MemorySink::new();

    engine.process(press(15), &mut sink).unwrap();
    let outcomes = run(&mut engine, &mut sink, &[press(99), release(98), repeat(97)]);
    assert_eq!(
        outcomes,
        vec![
            Outcome::Ignored(RemapWarning::UnrecognizedPress(Key(99))),
            Outcome::Ignored(RemapWarning::UnmatchedRelease(Key(98))),
            Outcome::Ignored(RemapWarning::UnmatchedRepeat(Key(97))),
        ]
    );
    assert_eq!(engine.held_count(), 1);
    assert_eq!(sink.events(), vec![(ESC, KeyState::Press)]);

    // Still processing after the warnings
    engine.process(release(15), &mut sink).unwrap();
    assert_idle(&engine);
}

#[test]
fn test_failed_replay_detaches_remaining_layer_keys() {
    // 31 is a layer only inside 30's layer
    let table = RemapTable::new().with(
        30,
        RemapTable::new().with(31, RemapTable::new().with(32, ENTER)),
    );
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    run(&mut engine, &mut sink, &[press(30), press(31)]);
    assert_eq!(engine.layer_depth(), 3);

    let outcome = engine.process(release(30), &mut sink).unwrap();
    assert_eq!(
        outcome,
        Outcome::Ignored(RemapWarning::ReplayInconsistency {
            code: Key(31),
            dropped: 1
        })
    );
    assert_eq!(engine.layer_depth(), 1);
    assert!(engine.modifier_chain().is_empty());
    assert!(engine.is_held(Key(31)));

    // The detached key is absorbed without further warnings
    assert_eq!(engine.process(repeat(31), &mut sink).unwrap(), Outcome::LayerHeld);
    assert_eq!(
        engine.process(press(32), &mut sink).unwrap(),
        Outcome::Ignored(RemapWarning::UnrecognizedPress(Key(32)))
    );
    assert_eq!(
        engine.process(release(31), &mut sink).unwrap(),
        Outcome::LayerReleased { depth: 1 }
    );
    assert!(!engine.is_held(Key(31)));
    assert!(sink.frames().is_empty());
}

#[test]
fn test_action_in_layer_sees_raw_events() {
    let seen: Arc<Mutex<Vec<KeyEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let action = move |event: &KeyEvent, sink: &mut dyn KeySink| -> Result<(), SinkError> {
        recorder.lock().push(*event);
        if event.state == KeyState::Press {
            sink.emit(HOME, KeyState::Press)?;
            sink.emit(HOME, KeyState::Release)?;
            sink.flush()?;
        }
        Ok(())
    };
    let table = RemapTable::new().with(44, RemapTable::new().with(20, Binding::action(action)));
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    let outcomes = run(
        &mut engine,
        &mut sink,
        &[press(44), press(20), repeat(20), release(44), release(20)],
    );
    assert_eq!(outcomes[1], Outcome::ActionInvoked(KeyState::Press));
    assert_eq!(outcomes[2], Outcome::ActionInvoked(KeyState::Repeat));
    assert_eq!(outcomes[4], Outcome::ActionInvoked(KeyState::Release));

    assert_eq!(
        *seen.lock(),
        vec![
            KeyEvent::press(20),
            KeyEvent::repeat(20),
            KeyEvent::release(20)
        ]
    );
    assert_eq!(
        sink.frames(),
        &[vec![(HOME, KeyState::Press), (HOME, KeyState::Release)]]
    );
    assert_idle(&engine);
}

#[test]
fn test_builtin_navigation_layer() {
    let mut engine = RemapEngine::new(RemapTable::builtin());
    let mut sink = MemorySink::new();

    let outcomes = run(
        &mut engine,
        &mut sink,
        &[press(57), release(57), press(45), press(57), release(57), release(45)],
    );
    assert_eq!(outcomes[2], Outcome::LayerPushed { depth: 2 });
    assert_eq!(
        sink.events(),
        vec![
            (SPACE, KeyState::Press),
            (SPACE, KeyState::Release),
            (ENTER, KeyState::Press),
            (ENTER, KeyState::Release),
        ]
    );
    assert_idle(&engine);
}

#[test]
fn test_repress_inside_own_layer_needs_one_release_each() {
    // Inside its own layer, 44 maps to ENTER
    let table = RemapTable::new().with(44, RemapTable::new().with(44, ENTER));
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    let outcomes = run(
        &mut engine,
        &mut sink,
        &[press(44), press(44), release(44), release(44)],
    );
    assert_eq!(
        outcomes,
        vec![
            Outcome::LayerPushed { depth: 2 },
            Outcome::Emitted(ENTER, KeyState::Press),
            // The down map entry is released before the layer
            Outcome::Emitted(ENTER, KeyState::Release),
            Outcome::LayerReleased { depth: 1 },
        ]
    );
    assert!(!engine.is_held(Key(44)));
    assert_idle(&engine);
}

#[test]
fn test_layer_key_pressed_twice_needs_two_releases() {
    let table = RemapTable::new().with(44, RemapTable::new().with(57, ENTER));
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    let outcomes = run(&mut engine, &mut sink, &[press(44), press(44)]);
    assert_eq!(outcomes[1], Outcome::LayerPushed { depth: 3 });
    assert_eq!(engine.modifier_chain(), &[Key(44), Key(44)]);

    assert_eq!(
        engine.process(release(44), &mut sink).unwrap(),
        Outcome::LayerReleased { depth: 2 }
    );
    assert!(engine.is_held(Key(44)));

    assert_eq!(
        engine.process(release(44), &mut sink).unwrap(),
        Outcome::LayerReleased { depth: 1 }
    );
    assert!(!engine.is_held(Key(44)));
    assert_idle(&engine);
    assert!(sink.frames().is_empty());
}

#[test]
fn test_repressed_detached_key_is_tracked_once() {
    // 31 is a layer inside 30's layer and ESC at the root
    let table = RemapTable::new()
        .with(
            30,
            RemapTable::new().with(31, RemapTable::new().with(32, ENTER)),
        )
        .with(31, ESC);
    let mut engine = RemapEngine::new(table);
    let mut sink = MemorySink::new();

    let outcomes = run(&mut engine, &mut sink, &[press(30), press(31), release(30)]);
    assert_eq!(
        outcomes[2],
        Outcome::Ignored(RemapWarning::ReplayInconsistency {
            code: Key(31),
            dropped: 1
        })
    );
    assert!(engine.is_held(Key(31)));

    // Release of 31 was lost; the new press resolves at the root
    assert_eq!(
        engine.process(press(31), &mut sink).unwrap(),
        Outcome::Emitted(ESC, KeyState::Press)
    );
    assert_eq!(
        engine.process(release(31), &mut sink).unwrap(),
        Outcome::Emitted(ESC, KeyState::Release)
    );
    assert!(!engine.is_held(Key(31)));
    assert_idle(&engine);
}
