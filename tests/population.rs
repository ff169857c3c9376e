mod common;

use common::{LarvaBuilder, OdorArena};
use larvasim_lib::model::error::ErrorKind;
use larvasim_lib::model::metrics::{EMERGED, PUPATED, STARVED};
use larvasim_lib::model::sensors::EmptyEnvironment;
use larvasim_lib::model::{LifeHistory, Population, SimConfig, Stage};

/// Host and engine ticks both one minute long.
fn minute_ticks(c: &mut SimConfig) {
    c.simulation.dt = 60.0;
}

#[test]
fn test_starvation_stays_with_its_organism() {
    let starving = LarvaBuilder::new()
        .with_config(|c| {
            minute_ticks(c);
            c.energetics.f_decay = 1.0;
        })
        .build()
        .unwrap();
    let fed = LarvaBuilder::new()
        .with_config(|c| {
            minute_ticks(c);
            c.energetics.f_decay = 0.0;
        })
        .build()
        .unwrap();
    let (starving_id, fed_id) = (starving.id, fed.id);
    let mut pop = Population::from_larvae(vec![starving, fed]);

    let mut errors = Vec::new();
    for _ in 0..20_000 {
        errors.extend(pop.run(&EmptyEnvironment, 1));
        if !pop.get(starving_id).unwrap().alive() {
            break;
        }
    }

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, starving_id);
    assert_eq!(errors[0].1.kind(), ErrorKind::Died);
    assert!(!pop.get(starving_id).unwrap().alive());
    assert!(pop.get(fed_id).unwrap().alive());
    assert_eq!(pop.metrics().counter(STARVED), 1);
    assert_eq!(pop.alive(), 1);
}

#[test]
fn test_transitions_are_counted() {
    let mut pupae = Vec::new();
    for seed in 0..2 {
        pupae.push(
            LarvaBuilder::new()
                .with_seed(seed)
                .with_config(minute_ticks)
                .until_pupation()
                .build()
                .unwrap(),
        );
    }
    let mut pop = Population::from_larvae(pupae);
    let mut errors = Vec::new();
    for _ in 0..30_000 {
        errors.extend(pop.run(&EmptyEnvironment, 1));
        if pop.larvae().iter().all(|l| l.stage() == Stage::Imago) {
            break;
        }
    }
    assert!(errors.is_empty());
    assert!(pop.larvae().iter().all(|l| l.stage() == Stage::Imago));
    assert_eq!(pop.metrics().counter(EMERGED), 2);
    assert_eq!(pop.metrics().counter(PUPATED), 0);
}

#[test]
fn test_population_on_food_patch() {
    let mut config = SimConfig::default();
    config.energetics.assimilation_mode = larvasim_lib::model::AssimilationMode::Sim;
    let mut pop = Population::new(&config, &LifeHistory::default(), 4).unwrap();
    let errors = pop.run(&OdorArena::default(), 600);
    assert!(errors.is_empty());
    assert_eq!(pop.len(), 4);
    assert_eq!(pop.metrics().tick_count(), 600);
    assert!(pop
        .larvae()
        .iter()
        .any(|l| l.energetics().gut_stats().is_some_and(|g| g.feeds > 0)));
}
