//! Behavioral properties of the loop engine, checked end to end through the
//! public API: wrap arithmetic, multi-wrap firing, repeating reschedule,
//! reset, snapshot round-trips, validation, and failure isolation.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]

use serde_json::json;
use timeloop_core::codec;
use timeloop_core::session::{load_game, save_game};
use timeloop_core::store::MemoryStore;
use timeloop_core::{BehaviorError, LoopEngine, Recurrence};
use timeloop_types::{EventDefinition, GameState};

type Log = Vec<String>;

const EPS: f64 = 1e-9;

fn running(duration: f64, scale: f64) -> LoopEngine<Log> {
    let mut engine = LoopEngine::new(duration, scale).unwrap();
    engine.start();
    engine
}

fn record(id: &'static str) -> impl FnMut(&mut Log) -> Result<(), BehaviorError> {
    move |log: &mut Log| {
        log.push(id.to_owned());
        Ok(())
    }
}

// =============================================================================
// Elapsed-time arithmetic
// =============================================================================

#[test]
fn elapsed_stays_within_loop_for_any_delta() {
    let deltas = [0.0, 0.016, 0.5, 3.0, 9.999, 10.0, 17.25, 35.0, 123.5];
    for scale in [0.5, 1.0, 3.0] {
        let mut engine = running(10.0, scale);
        let mut log = Log::new();
        let mut expected = 0.0_f64;
        for delta in deltas {
            expected = (expected + delta * scale).rem_euclid(10.0);
            engine.update(delta, &mut log);
            let elapsed = engine.elapsed();
            assert!((0.0..10.0).contains(&elapsed), "elapsed {elapsed} out of range");
            assert!(
                (elapsed - expected).abs() < 1e-6,
                "scale {scale} delta {delta}: {elapsed} != {expected}"
            );
        }
    }
}

#[test]
fn landing_exactly_on_the_boundary_wraps_to_zero() {
    let mut engine = running(10.0, 1.0);
    let mut log = Log::new();
    let summary = engine.update(10.0, &mut log);
    assert_eq!(summary.wraps, 1);
    assert!(engine.elapsed().abs() < EPS);
}

// =============================================================================
// Multi-wrap firing
// =============================================================================

#[test]
fn repeating_event_fires_once_per_crossed_iteration() {
    let mut engine = running(10.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event(
        "bell",
        2.0,
        record("bell"),
        Recurrence::every("bell", 10.0).unwrap(),
    );

    let summary = engine.update(35.0, &mut log);

    // Iterations 0-10, 10-20 and 20-30 each cross t=2 before their wrap;
    // the current iteration (30-35) crosses it again after the last wrap.
    assert_eq!(summary.wraps, 3);
    assert_eq!(summary.fire_count("bell"), 4);
    assert_eq!(log.len(), 4);
    assert!((engine.elapsed() - 5.0).abs() < EPS);

    let bell = engine.registry().get("bell").unwrap();
    assert!(bell.is_active());
    assert!((bell.trigger_time() - 12.0).abs() < EPS);
}

#[test]
fn wrap_passes_fire_before_current_iteration() {
    let mut engine = running(10.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event("late", 8.0, record("late"), Recurrence::Once);
    engine.schedule_event("early", 1.0, record("early"), Recurrence::Once);
    engine.update(5.0, &mut log);
    assert_eq!(log, vec!["early"]);

    // 5 -> 27: finish iteration 1 (late), full iteration 2 (late, early),
    // then the current iteration up to 7 (early).
    let summary = engine.update(22.0, &mut log);
    assert_eq!(summary.wraps, 2);
    assert_eq!(summary.fired, vec!["late", "late", "early", "early"]);
}

#[test]
fn repeating_event_reschedules_within_iteration() {
    let mut engine = running(20.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event(
        "patrol",
        5.0,
        record("patrol"),
        Recurrence::every("patrol", 10.0).unwrap(),
    );

    engine.update(12.0, &mut log);

    assert_eq!(log, vec!["patrol"]);
    let patrol = engine.registry().get("patrol").unwrap();
    assert!(patrol.is_active());
    assert!((patrol.trigger_time() - 15.0).abs() < EPS);
    assert!((patrol.original_trigger_time() - 5.0).abs() < EPS);

    engine.update(4.0, &mut log);
    assert_eq!(log.len(), 2);
    let patrol = engine.registry().get("patrol").unwrap();
    assert!((patrol.trigger_time() - 25.0).abs() < EPS);
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn reset_reactivates_one_shots_and_rewinds_repeats() {
    let mut engine = running(30.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event("shot", 2.0, record("shot"), Recurrence::Once);
    engine.schedule_event(
        "tick",
        1.0,
        record("tick"),
        Recurrence::every("tick", 4.0).unwrap(),
    );
    engine.update(10.0, &mut log);
    assert!(!engine.registry().get("shot").unwrap().is_active());

    engine.reset();

    assert!(engine.elapsed().abs() < EPS);
    assert_eq!(engine.registry().active_ids(), vec!["shot", "tick"]);
    assert!((engine.registry().get("tick").unwrap().trigger_time() - 1.0).abs() < EPS);

    log.clear();
    engine.update(2.5, &mut log);
    assert_eq!(log, vec!["shot", "tick"]);
}

// =============================================================================
// Serialization round-trips
// =============================================================================

#[test]
fn round_trip_without_events_is_exact() {
    let mut engine = running(45.0, 1.5);
    let mut log = Log::new();
    engine.update(7.0, &mut log);

    let state = engine.serialize();
    let mut restored: LoopEngine<Log> = LoopEngine::new(1.0, 1.0).unwrap();
    restored.deserialize(&state).unwrap();

    assert_eq!(restored.elapsed(), engine.elapsed());
    assert_eq!(restored.loop_duration(), engine.loop_duration());
    assert_eq!(restored.time_scale(), engine.time_scale());
    assert_eq!(restored.is_running(), engine.is_running());
    assert_eq!(restored.serialize(), state);
}

#[test]
fn round_trip_with_events_drops_behavior() {
    let mut engine = running(60.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event("spent", 1.0, record("spent"), Recurrence::Once);
    engine.schedule_event("robbery", 30.0, record("robbery"), Recurrence::Once);
    engine.schedule_event(
        "patrol",
        5.0,
        record("patrol"),
        Recurrence::every("patrol", 20.0).unwrap(),
    );
    engine.update(10.0, &mut log);

    let json = codec::encode_loop_state(&engine.serialize()).unwrap();
    let state = codec::decode_loop_state(json).unwrap();

    let mut restored: LoopEngine<Log> = LoopEngine::new(60.0, 1.0).unwrap();
    restored.deserialize(&state).unwrap();

    assert!(restored.registry().is_empty());
    assert_eq!(restored.serialized_event_ids(), vec!["robbery", "patrol"]);

    // Nothing fires until behaviors are re-attached.
    let mut restored_log = Log::new();
    restored.update(25.0, &mut restored_log);
    assert!(restored_log.is_empty());

    for id in restored.pending_ids() {
        let label = format!("reattached:{id}");
        restored
            .reattach(&id, move |log: &mut Log| {
                log.push(label.clone());
                Ok(())
            })
            .unwrap();
    }
    assert!(restored.pending_ids().is_empty());
    assert_eq!(restored.registry().active_ids(), vec!["robbery", "patrol"]);

    // elapsed 35: robbery (30) and the rescheduled patrol (25) are both due.
    restored.update(0.0, &mut restored_log);
    assert_eq!(
        restored_log,
        vec!["reattached:robbery", "reattached:patrol"]
    );
}

#[test]
fn session_save_and_load_through_store() {
    let mut engine = running(120.0, 1.0);
    let mut log = Log::new();
    let definition = EventDefinition {
        id: "crime_01".to_owned(),
        trigger_time: 50.0,
        event_type: "crime".to_owned(),
        position: None,
        metadata: Some(json!({ "suspect": "npc_02" })),
        repeat: None,
        repeat_interval: None,
    };
    engine
        .schedule_definition(definition, |log: &mut Log, def: &EventDefinition| {
            log.push(def.event_type.clone());
            Ok(())
        })
        .unwrap();
    engine.update(20.0, &mut log);

    let mut store = MemoryStore::new();
    let base = GameState::empty();
    save_game(&engine, &mut store, "autosave", &base).unwrap();

    let mut restored: LoopEngine<Log> = LoopEngine::new(120.0, 1.0).unwrap();
    let loaded = load_game(&mut restored, &store, "autosave").unwrap().unwrap();
    assert_eq!(loaded.loop_manager.event_ids(), vec!["crime_01"]);
    assert_eq!(restored.pending_ids(), vec!["crime_01"]);
    assert!((restored.elapsed() - 20.0).abs() < EPS);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn validation_accepts_minimal_state() {
    let doc = serde_json::to_value(GameState::empty()).unwrap();
    let report = codec::validate(&doc);
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn validation_rejects_missing_loop_manager() {
    let mut doc = serde_json::to_value(GameState::empty()).unwrap();
    doc.as_object_mut().unwrap().remove("loopManager");
    let report = codec::validate(&doc);
    assert!(!report.is_valid());
    assert!(!report.errors.is_empty());
}

#[test]
fn validation_rejects_non_sequence_events() {
    let mut doc = serde_json::to_value(GameState::empty()).unwrap();
    doc["loopManager"]["events"] = json!("crime_01");
    let report = codec::validate(&doc);
    assert!(!report.is_valid());
    assert!(
        report
            .errors
            .iter()
            .any(|e| e.contains("loopManager.events"))
    );
}

// =============================================================================
// Failure isolation
// =============================================================================

#[test]
fn failing_behavior_does_not_block_other_events() {
    let mut engine = running(10.0, 1.0);
    let mut log = Log::new();
    engine.schedule_event(
        "broken",
        3.0,
        |_log: &mut Log| Err(BehaviorError::failed("door asset missing")),
        Recurrence::Once,
    );
    engine.schedule_event("witness", 3.0, record("witness"), Recurrence::Once);

    let summary = engine.update(4.0, &mut log);

    assert_eq!(log, vec!["witness"]);
    assert_eq!(summary.failures, vec!["broken"]);

    // Both are spent for this iteration; the wrap re-arms them.
    let summary = engine.update(8.0, &mut log);
    assert_eq!(summary.wraps, 1);
    assert!(summary.fired.is_empty());

    // Same isolation on the wrap pass.
    let summary = engine.update(9.0, &mut log);
    assert_eq!(summary.wraps, 1);
    assert_eq!(summary.failures, vec!["broken"]);
    assert_eq!(log, vec!["witness", "witness"]);
}
