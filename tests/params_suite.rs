use fluid_pilot::params::{ParamError, ParameterStore, ParameterValue, Scalar, key_in_group};
use fluid_pilot::registry::{self, DrawMode, SourceMode};
use std::cell::RefCell;
use std::rc::Rc;

fn small_store() -> ParameterStore {
    let mut s = ParameterStore::new();
    s.declare("settings:fluid:speed", ParameterValue::float(10.0, 0.0, 100.0));
    s.declare("settings:fluid:cells", ParameterValue::int(2, 1, 4));
    s.declare("settings:fluid:stretch", ParameterValue::Bool(false));
    s.declare("settings:fluidity", ParameterValue::float(0.5, 0.0, 1.0));
    s
}

#[test]
fn numeric_sets_clamp_to_declared_bounds() {
    let mut s = small_store();

    assert!(s.set("settings:fluid:speed", Scalar::Float(250.0)));
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(100.0));
    assert!(s.set("settings:fluid:speed", Scalar::Float(-3.0)));
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(0.0));

    assert!(s.set("settings:fluid:cells", Scalar::Int(9)));
    assert_eq!(s.get_i32("settings:fluid:cells"), Some(4));
    assert!(s.set("settings:fluid:cells", Scalar::Float(-7.5)));
    assert_eq!(s.get_i32("settings:fluid:cells"), Some(1));
}

#[test]
fn non_finite_input_is_rejected() {
    let mut s = small_store();
    assert!(!s.set("settings:fluid:speed", Scalar::Float(f32::NAN)));
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(10.0));
}

#[test]
fn unknown_keys_are_ignored_and_get_reports_them() {
    let mut s = small_store();
    assert!(!s.set("settings:nope", Scalar::Float(1.0)));
    assert!(!s.contains("settings:nope"));

    let err = s.get("settings:nope").expect_err("absent key must fail");
    assert_eq!(err, ParamError::KeyNotFound("settings:nope".to_string()));
}

#[test]
fn raw_values_follow_the_declared_kind() {
    let mut s = small_store();

    s.set_raw("settings:fluid:speed", " 12.5 ").expect("float raw");
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(12.5));

    s.set_raw("settings:fluid:cells", "3.0").expect("int accepts float text");
    assert_eq!(s.get_i32("settings:fluid:cells"), Some(3));

    s.set_raw("settings:fluid:stretch", "1").expect("bool raw");
    assert_eq!(s.get_bool("settings:fluid:stretch"), Some(true));

    let err = s
        .set_raw("settings:fluid:stretch", "maybe")
        .expect_err("garbage bool must fail");
    assert!(matches!(err, ParamError::InvalidValue { .. }));

    let err = s.set_raw("settings:gone", "1").expect_err("unknown key");
    assert!(matches!(err, ParamError::KeyNotFound(_)));
}

#[test]
fn raw_text_round_trips_through_to_raw() {
    let s = small_store();
    let v = s.get("settings:fluid:stretch").expect("declared");
    assert_eq!(v.to_raw(), "0");
    let v = s.get("settings:fluid:speed").expect("declared");
    assert_eq!(v.to_raw(), "10");
}

#[test]
fn nudge_saturates_and_toggle_flips() {
    let mut s = small_store();

    assert!(s.nudge("settings:fluid:speed", 95.0));
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(100.0));
    assert!(s.nudge("settings:fluid:speed", -0.5));
    assert_eq!(s.get_f32("settings:fluid:speed"), Some(99.5));

    assert!(s.toggle("settings:fluid:stretch"));
    assert_eq!(s.get_bool("settings:fluid:stretch"), Some(true));
    assert!(!s.nudge("settings:missing", 1.0));
}

#[test]
fn cycle_wraps_from_max_to_min() {
    let mut s = small_store();
    let seen: Vec<i32> = (0..4)
        .map(|_| {
            s.cycle("settings:fluid:cells");
            s.get_i32("settings:fluid:cells").unwrap_or(-1)
        })
        .collect();
    assert_eq!(seen, vec![3, 4, 1, 2]);
    assert!(!s.cycle("settings:fluid:speed"), "floats do not cycle");
}

#[test]
fn group_iteration_respects_segment_boundaries() {
    let s = small_store();
    let keys: Vec<&str> = s.for_each("settings:fluid").map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            "settings:fluid:cells",
            "settings:fluid:speed",
            "settings:fluid:stretch"
        ]
    );
    assert_eq!(s.for_each("").count(), s.len());
    assert!(key_in_group("settings:fluid:speed", "settings:fluid:"));
    assert!(!key_in_group("settings:fluidity", "settings:fluid"));
}

#[test]
fn listeners_run_in_registration_order_for_their_prefix() {
    let mut s = small_store();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    let id = s.subscribe("settings:fluid", move |key, _| {
        first.borrow_mut().push(format!("a:{key}"));
    });
    let second = Rc::clone(&log);
    s.subscribe("", move |key, value| {
        second.borrow_mut().push(format!("b:{key}={value}"));
    });

    s.set("settings:fluid:cells", Scalar::Int(3));
    s.set("settings:fluidity", Scalar::Float(0.25));
    s.set("settings:unknown", Scalar::Int(1));

    assert_eq!(
        *log.borrow(),
        vec![
            "a:settings:fluid:cells".to_string(),
            "b:settings:fluid:cells=3".to_string(),
            "b:settings:fluidity=0.250".to_string(),
        ]
    );

    assert!(s.unsubscribe(id));
    assert!(!s.unsubscribe(id));
    log.borrow_mut().clear();
    s.set("settings:fluid:cells", Scalar::Int(1));
    assert_eq!(*log.borrow(), vec!["b:settings:fluid:cells=1".to_string()]);
}

#[test]
fn registry_declares_every_installation_parameter() {
    let s = registry::default_store();
    for key in [
        registry::OPTICAL_FLOW_STRENGTH,
        registry::RECOLOR_CUTOFF,
        registry::FLUID_SPEED,
        registry::PARTICLE_SIZE,
        registry::DRAW_MODE,
        registry::SOURCE_MODE,
        registry::PS_EYE_CAMERA,
        registry::TRANSITION_TIME,
        registry::JUMP_INTERVAL,
    ] {
        assert!(s.contains(key), "missing {key}");
    }
    assert_eq!(s.get_f32(registry::TRANSITION_TIME), Some(4.0));
    assert_eq!(s.get_f32(registry::JUMP_INTERVAL), Some(20.0));
    assert!(registry::is_volatile_key(registry::TRANSITION_TIME));
    assert!(registry::is_volatile_key(registry::SOURCE_MODE));
    assert!(!registry::is_volatile_key(registry::FLUID_SPEED));
}

#[test]
fn draw_and_source_modes_index_consistently() {
    for mode in DrawMode::all() {
        assert_eq!(DrawMode::from_index(mode.index()), Some(mode));
    }
    assert_eq!(DrawMode::from_index(DrawMode::COUNT as i32), None);
    assert_eq!(SourceMode::from_index(1), Some(SourceMode::Ps3Eye));

    let mut s = registry::default_store();
    s.cycle(registry::SOURCE_MODE);
    s.cycle(registry::SOURCE_MODE);
    assert_eq!(s.get_i32(registry::SOURCE_MODE), Some(SourceMode::Kinect.index()));
}
