mod common;

use larvasim_lib::model::config::{CouplingConfig, SuppressionMode};
use larvasim_lib::model::coupling::{Coupling, Effector};
use proptest::prelude::*;
use std::f64::consts::PI;

fn arb_mode() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("constant"), Just("square"), Just("phasic")]
}

fn arb_suppression() -> impl Strategy<Value = SuppressionMode> {
    prop_oneof![
        Just(SuppressionMode::Amplitude),
        Just(SuppressionMode::Oscillation),
        Just(SuppressionMode::Both)
    ]
}

proptest! {
    #[test]
    fn test_multipliers_stay_in_unit_interval(
        mode in arb_mode(),
        suppression_mode in arb_suppression(),
        attenuation in 0.0f64..=1.0,
        attenuation_max in 0.0f64..=1.0,
        peak in 0.0f64..(2.0 * PI),
        crawler in proptest::option::of(-20.0f64..20.0),
        feeder in proptest::option::of(-20.0f64..20.0),
    ) {
        let config = CouplingConfig {
            mode: mode.to_string(),
            attenuation,
            attenuation_max,
            suppression_mode,
            max_attenuation_phase: peak,
            ..Default::default()
        };
        let mut coupling = Coupling::new(&config).unwrap();
        let (osc, amp) = coupling.step(crawler, feeder);
        prop_assert!((0.0..=1.0).contains(&osc));
        prop_assert!((0.0..=1.0).contains(&amp));
        prop_assert!((0.0..=1.0).contains(&coupling.current_attenuation()));
    }
}

#[test]
fn test_gaussian_relief_peaks_at_configured_phase() {
    let config = CouplingConfig {
        mode: "phasic".to_string(),
        attenuation: 0.0,
        attenuation_max: 1.0,
        suppression_mode: SuppressionMode::Oscillation,
        max_attenuation_phase: 3.4,
        ..Default::default()
    };
    let mut coupling = Coupling::new(&config).unwrap();

    let (osc, amp) = coupling.step(Some(3.4), None);
    assert_close!(osc, 1.0, 1e-12);
    assert_eq!(amp, 1.0);

    let (osc, _) = coupling.step(Some(3.4 + PI), None);
    assert!(osc < 0.01, "oscillation multiplier {osc} half a cycle away");
    assert_close!(coupling.get(Effector::Feeder, 3.4), 1.0, 1e-12);
}

#[test]
fn test_idle_effectors_leave_turner_free() {
    let mut coupling = Coupling::new(&CouplingConfig::default()).unwrap();
    assert_eq!(coupling.step(None, None), (1.0, 1.0));
}
