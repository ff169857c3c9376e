mod common;

use common::LarvaBuilder;
use larvasim_lib::io::{load_record, load_state, save_record, save_state};
use larvasim_lib::model::sensors::EmptyEnvironment;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("larvasim_it_{}_{name}", uuid::Uuid::new_v4()))
}

#[test]
fn test_state_snapshot_resumes_identically() {
    let mut larva = LarvaBuilder::new().build().unwrap();
    for _ in 0..1200 {
        larva.step(&EmptyEnvironment, false).unwrap();
    }
    let path = temp_path("state.bin");
    save_state(larva.energetics().state(), &path).unwrap();
    let restored = load_state(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(&restored, larva.energetics().state());
}

#[test]
fn test_record_keeps_timeline_and_rows() {
    let mut engine = LarvaBuilder::new().until_pupation().engine().unwrap();
    for _ in 0..10 {
        engine.run(1.0, 0.0).unwrap();
    }
    let record = engine.finalize_record("larva_7").unwrap();
    let path = temp_path("record.json.gz");
    save_record(&record, &path).unwrap();
    let loaded = load_record(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.id, "larva_7");
    assert_eq!(loaded.timeline.pupation, record.timeline.pupation);
    assert_eq!(loaded.rows.len(), record.rows.len());
    assert_eq!(loaded.epochs, record.epochs);
}
