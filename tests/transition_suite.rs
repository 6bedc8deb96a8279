use fluid_pilot::blend_list::{BlendEntry, BlendKind, BlendList, BlendListError};
use fluid_pilot::command::OutboundMessage;
use fluid_pilot::params::Scalar;
use fluid_pilot::registry;
use fluid_pilot::snapshot::SettingsSnapshot;
use fluid_pilot::transition::{TransitionEngine, TransitionStep};
use std::time::{Duration, Instant};

fn snap(name: &str, speed: &str, draw_mode: &str) -> SettingsSnapshot {
    SettingsSnapshot::from_entries(
        name,
        [
            (registry::FLUID_SPEED, speed),
            (registry::DRAW_MODE, draw_mode),
        ],
    )
}

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

#[test]
fn halfway_blend_then_exact_commit() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(
        Some(snap("settings1.txt", "10", "0")),
        Some(snap("settings2.txt", "20", "2")),
        secs(4.0),
        t0,
    );
    assert!(engine.is_active());
    assert_eq!(engine.target_source(), Some("settings2.txt"));

    let step = engine.tick(t0 + secs(2.0), &mut store, &mut outbox);
    assert_eq!(step, TransitionStep::Blending { amount: 0.5 });
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(15.0));
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(0), "draw mode is not blended");
    assert_eq!(
        outbox,
        vec![OutboundMessage {
            address: "/1/speed".to_string(),
            value: Scalar::Float(15.0),
        }]
    );

    let step = engine.tick(t0 + secs(4.0), &mut store, &mut outbox);
    assert!(matches!(step, TransitionStep::Committed { .. }));
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(20.0));
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(2));
    assert!(!engine.is_active());
    assert_eq!(engine.tick(t0 + secs(5.0), &mut store, &mut outbox), TransitionStep::Idle);
}

#[test]
fn blended_values_approach_target_without_overshoot() {
    for (from, to) in [("10", "90"), ("90", "10")] {
        let mut store = registry::default_store();
        let mut outbox = Vec::new();
        let mut engine = TransitionEngine::default();
        let t0 = Instant::now();
        engine.start(Some(snap("a", from, "0")), Some(snap("b", to, "0")), secs(3.0), t0);

        let target: f32 = to.parse().expect("numeric");
        let mut prev = from.parse::<f32>().expect("numeric");
        for ms in (100..3000).step_by(100) {
            engine.tick(t0 + Duration::from_millis(ms), &mut store, &mut outbox);
            let v = store.get_f32(registry::FLUID_SPEED).expect("declared");
            let lo = prev.min(target);
            let hi = prev.max(target);
            assert!(v >= lo && v <= hi, "{v} escaped [{lo}, {hi}] at {ms}ms");
            prev = v;
        }
    }
}

#[test]
fn zero_duration_cuts_on_first_tick() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(Some(snap("a", "10", "0")), Some(snap("b", "70", "3")), Duration::ZERO, t0);
    let step = engine.tick(t0, &mut store, &mut outbox);
    assert!(matches!(step, TransitionStep::Committed { .. }));
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(70.0));
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(3));
}

#[test]
fn missing_source_commits_immediately() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(None, Some(snap("b", "55", "1")), secs(10.0), t0);
    let step = engine.tick(t0 + secs(0.1), &mut store, &mut outbox);
    assert!(matches!(step, TransitionStep::Committed { .. }));
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(55.0));
}

#[test]
fn missing_target_leaves_store_alone() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(Some(snap("a", "55", "1")), None, secs(1.0), t0);
    assert!(!engine.is_active());
    assert_eq!(engine.tick(t0 + secs(2.0), &mut store, &mut outbox), TransitionStep::Idle);
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(10.0));
}

#[test]
fn missing_target_keeps_running_transition() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(Some(snap("a", "10", "0")), Some(snap("b", "20", "2")), secs(4.0), t0);
    engine.tick(t0 + secs(2.0), &mut store, &mut outbox);
    engine.start(Some(snap("b", "20", "2")), None, secs(1.0), t0 + secs(2.0));

    assert_eq!(engine.target_source(), Some("b"));
    let step = engine.tick(t0 + secs(4.0), &mut store, &mut outbox);
    assert!(matches!(step, TransitionStep::Committed { .. }));
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(20.0));
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(2));
}

#[test]
fn clock_regression_counts_as_no_time_elapsed() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now() + secs(5.0);

    engine.start(Some(snap("a", "10", "0")), Some(snap("b", "20", "0")), secs(4.0), t0);
    let step = engine.tick(t0 - secs(1.0), &mut store, &mut outbox);
    assert_eq!(step, TransitionStep::Blending { amount: 0.0 });
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(10.0));
    assert_eq!(engine.progress(t0 - secs(1.0)), Some(0.0));
}

#[test]
fn restart_abandons_previous_transition() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(Some(snap("a", "10", "0")), Some(snap("b", "20", "0")), secs(4.0), t0);
    engine.tick(t0 + secs(1.0), &mut store, &mut outbox);
    engine.start(Some(snap("c", "50", "0")), Some(snap("d", "60", "0")), secs(2.0), t0 + secs(1.0));
    engine.tick(t0 + secs(2.0), &mut store, &mut outbox);
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(55.0));
    assert_eq!(engine.target_source(), Some("d"));
}

#[test]
fn step_entries_switch_after_halfway() {
    let blend = BlendList::new(vec![BlendEntry {
        key: registry::DRAW_MODE.to_string(),
        kind: BlendKind::Step,
        echo: None,
    }])
    .expect("valid list");
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::new(blend);
    let t0 = Instant::now();

    engine.start(Some(snap("a", "10", "1")), Some(snap("b", "20", "4")), secs(2.0), t0);
    engine.tick(t0 + secs(1.0), &mut store, &mut outbox);
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(1), "exactly halfway holds from");
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(10.0), "speed is not in this list");
    engine.tick(t0 + secs(1.5), &mut store, &mut outbox);
    assert_eq!(store.get_i32(registry::DRAW_MODE), Some(4));
    assert!(outbox.is_empty());
}

#[test]
fn non_numeric_values_are_skipped_not_fatal() {
    let mut store = registry::default_store();
    let mut outbox = Vec::new();
    let mut engine = TransitionEngine::default();
    let t0 = Instant::now();

    engine.start(Some(snap("a", "fast", "0")), Some(snap("b", "20", "0")), secs(2.0), t0);
    let step = engine.tick(t0 + secs(1.0), &mut store, &mut outbox);
    assert!(matches!(step, TransitionStep::Blending { .. }));
    assert_eq!(store.get_f32(registry::FLUID_SPEED), Some(10.0));
}

#[test]
fn builtin_blend_list_covers_the_look_parameters() {
    let list = BlendList::builtin();
    assert_eq!(list.entries().len(), 16);
    assert!(list.entries().iter().all(|e| e.kind == BlendKind::Continuous));
    assert!(list.get(registry::DRAW_MODE).is_none());
    assert_eq!(
        list.get(registry::PARTICLE_SIZE).and_then(|e| e.echo.as_deref()),
        Some("/1/particle_size")
    );
    list.validate().expect("builtin is valid");
}

#[test]
fn blend_list_text_parses_and_round_trips() {
    let text = r#"
        # look parameters
        blend settings:fluid_solver:speed continuous /1/speed
        blend settings:draw:mode step
    "#;
    let list = BlendList::parse(text).expect("parse should succeed");
    assert_eq!(list.entries().len(), 2);
    assert_eq!(list.entries()[1].kind, BlendKind::Step);
    let again = BlendList::parse(&list.to_text()).expect("to_text output parses");
    assert_eq!(again, list);
}

#[test]
fn blend_list_rejects_bad_input() {
    let err = BlendList::parse("blend a wobble\n").expect_err("unknown kind");
    assert!(matches!(err, BlendListError::Parse { line: 1, .. }));

    let err = BlendList::parse("blend a step\nblend a continuous\n").expect_err("duplicate");
    assert_eq!(err, BlendListError::DuplicateKey("a".to_string()));

    let err = BlendList::parse("# nothing\n").expect_err("empty");
    assert_eq!(err, BlendListError::Empty);

    let err = BlendList::parse("blend a step speed\n").expect_err("echo without slash");
    assert!(matches!(err, BlendListError::Parse { .. }));

    let err = BlendList::parse("route a step\n").expect_err("wrong verb");
    assert!(matches!(err, BlendListError::Parse { .. }));
}
