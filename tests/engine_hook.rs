use std::sync::{Arc, Mutex};

use digifarm::{
    catalog::Catalog,
    engine::{Action, EngineBuilder, EngineError, Outcome},
    farm::{FarmError, FarmRules},
    persistence::{FileStore, LoadSource, MemoryStore, StateStore},
};
use tempfile::tempdir;

fn catalog() -> Catalog {
    Catalog::from_json(
        r#"[{"id": "agu", "name": "Agumon"}, {"id": "gab", "name": "Gabumon"}]"#,
    )
    .expect("catalog parses")
}

#[test]
fn hook_fires_once_per_successful_mutation() {
    let days = Arc::new(Mutex::new(Vec::new()));
    let seen = days.clone();
    let store = StateStore::new(MemoryStore::new(), "digifarm_state");
    let mut engine = EngineBuilder::new(FarmRules::default(), catalog(), store)
        .with_hook(move |state| seen.lock().unwrap().push((state.day, state.bits)))
        .build();

    assert!(matches!(
        engine.apply(Action::Tap { index: 0 }),
        Err(EngineError::Farm(FarmError::NoSelection))
    ));
    engine.apply(Action::Select { id: "agu".into() }).unwrap();
    engine.apply(Action::Tap { index: 0 }).unwrap();
    engine.apply(Action::AdvanceDay).unwrap();
    engine.apply(Action::Save).unwrap();
    assert!(matches!(
        engine.apply(Action::Reset { confirmed: false }),
        Err(EngineError::ResetNotConfirmed)
    ));

    assert_eq!(
        days.lock().unwrap().as_slice(),
        &[(1, 30), (1, 20), (2, 20)]
    );
}

#[test]
fn unknown_creature_leaves_selection_alone() {
    let store = StateStore::new(MemoryStore::new(), "digifarm_state");
    let mut engine = EngineBuilder::new(FarmRules::default(), catalog(), store).build();
    engine.apply(Action::Select { id: "gab".into() }).unwrap();

    assert!(matches!(
        engine.apply(Action::Select { id: "zzz".into() }),
        Err(EngineError::UnknownCreature(_))
    ));
    assert_eq!(engine.state().selected.as_ref().unwrap().name, "Gabumon");
}

#[test]
fn saved_farm_is_restored_on_next_start() {
    let dir = tempdir().expect("tempdir");
    let rules = FarmRules::default();
    {
        let store = StateStore::new(FileStore::new(dir.path()), "digifarm_state");
        let mut engine = EngineBuilder::new(rules, catalog(), store).build();
        assert_eq!(engine.load_source(), LoadSource::FirstRun);
        engine.apply(Action::Select { id: "agu".into() }).unwrap();
        engine.apply(Action::Tap { index: 42 }).unwrap();
        let outcome = engine.apply(Action::Save).unwrap();
        assert_eq!(outcome, Outcome::Saved);
        assert_eq!(outcome.to_string(), "Saved!");
    }

    let store = StateStore::new(FileStore::new(dir.path()), "digifarm_state");
    let engine = EngineBuilder::new(rules, catalog(), store).build();
    assert_eq!(engine.load_source(), LoadSource::Saved);
    assert_eq!(engine.state().bits, 20);
    assert_eq!(engine.state().grid[42].as_ref().unwrap().name, "Agumon");
    assert_eq!(engine.state().selected.as_ref().unwrap().id, "agu");
}

#[test]
fn confirmed_reset_restores_defaults() {
    let store = StateStore::new(MemoryStore::new(), "digifarm_state");
    let mut engine = EngineBuilder::new(FarmRules::default(), catalog(), store).build();
    engine.apply(Action::Select { id: "agu".into() }).unwrap();
    engine.apply(Action::Tap { index: 3 }).unwrap();
    engine.apply(Action::AdvanceDay).unwrap();

    let outcome = engine.apply(Action::Reset { confirmed: true }).unwrap();
    assert_eq!(outcome.to_string(), "Reset complete.");
    assert_eq!(engine.state().bits, 30);
    assert_eq!(engine.state().day, 1);
    assert_eq!(engine.state().occupied(), 0);
    assert!(engine.state().selected.is_none());
}

#[test]
fn disabled_storage_reports_unavailable_on_save() {
    let mut memory = MemoryStore::new();
    memory.set_unavailable(true);
    let store = StateStore::new(memory, "digifarm_state");
    let mut engine = EngineBuilder::new(FarmRules::default(), catalog(), store).build();
    assert_eq!(engine.load_source(), LoadSource::Recovered);

    let err = engine.apply(Action::Save).unwrap_err();
    assert!(err.to_string().starts_with("storage unavailable"));
}
