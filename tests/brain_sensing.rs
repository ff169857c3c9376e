mod common;

use common::{BrokenEnvironment, LarvaBuilder, OdorArena};
use larvasim_lib::model::config::{
    BrainConfig, CouplingConfig, LocomotorConfig, SensorConfig, SimulationConfig, ToucherConfig,
};
use larvasim_lib::model::{Brain, Modality, Pose};
use proptest::prelude::*;

fn brain(config: &BrainConfig) -> Brain {
    Brain::new(
        config,
        &LocomotorConfig::default(),
        &CouplingConfig::default(),
        &SimulationConfig::default(),
        3,
    )
    .unwrap()
}

fn all_modalities() -> BrainConfig {
    BrainConfig {
        olfactor: Some(SensorConfig::olfactor()),
        toucher: Some(ToucherConfig::default()),
        thermosensor: Some(SensorConfig::thermosensor()),
        windsensor: Some(SensorConfig::windsensor()),
        memory: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_senseless_brain_never_drives(
        x in -0.05f64..0.05,
        y in -0.05f64..0.05,
        orientation in 0.0f64..6.3,
        reward in any::<bool>(),
    ) {
        let mut b = brain(&BrainConfig::senseless());
        let env = OdorArena::default();
        for i in 0..10 {
            let pose = Pose::new(x + i as f64 * 1e-3, y, orientation);
            b.step(&env, &pose, reward);
            prop_assert_eq!(b.a_in(), 0.0);
        }
    }
}

#[test]
fn test_failing_layers_fall_back_and_continue() {
    let mut b = brain(&all_modalities());
    for tick in 0..50 {
        let pose = Pose::new(0.001 * tick as f64, 0.0, 0.0);
        b.step(&BrokenEnvironment, &pose, false);
        for modality in Modality::ALL {
            assert_eq!(b.activation(modality), 0.0, "{modality} at tick {tick}");
        }
    }
    assert_eq!(b.sensing_fallbacks(), 50 * 4);
}

#[test]
fn test_larva_keeps_crawling_in_broken_world() {
    let mut larva = LarvaBuilder::new()
        .with_config(|c| c.brain = all_modalities())
        .build()
        .unwrap();
    let mut fallbacks = 0;
    for _ in 0..200 {
        let report = larva.step(&BrokenEnvironment, false).unwrap();
        fallbacks += report.sensing_fallbacks;
    }
    assert_eq!(larva.ticks(), 200);
    assert_eq!(fallbacks, 200 * 4);
    assert!(!larva.mouth_on_food(&BrokenEnvironment));
    assert!(larva.pose.x.hypot(larva.pose.y) > 0.0);
}

#[test]
fn test_odor_gradient_drives_turning() {
    let mut b = brain(&BrainConfig::default());
    let env = OdorArena::default();
    b.step(&env, &Pose::new(0.02, 0.0, 0.0), false);
    b.step(&env, &Pose::new(0.019, 0.0, 0.0), false);
    assert!(b.activation(Modality::Olfaction) > 0.0);
    assert_eq!(b.a_in(), b.activation(Modality::Olfaction));
}
