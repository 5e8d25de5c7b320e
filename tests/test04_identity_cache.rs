use std::rc::Rc;
use std::time::Duration;

use tracker_sql::ManualClock;
use tracker_sql::prelude::*;
use tracker_sql::test_utils::ScriptedEngine;
use tracker_sql::test_utils::test_helpers::single_row;

static TASK: ObjectSchema = ObjectSchema {
    type_name: "Task",
    table: "tasks",
    key_column: "pk",
    columns: &["pk", "title", "fk_owner"],
    registry_table: Some("objects"),
};

fn task_engine() -> ScriptedEngine {
    ScriptedEngine::new().with_responder(|sql, kind| {
        Ok(match kind {
            StatementKind::Select if sql.contains("\"tasks\"") => ExecuteOutcome::Records(single_row(
                &["pk", "title", "fk_owner"],
                vec![SqlValue::Int(4), SqlValue::Text("Write report".into()), SqlValue::Null],
            )),
            StatementKind::Select => ExecuteOutcome::Records(RecordSet::default()),
            StatementKind::Insert => ExecuteOutcome::Inserted(Some(4)),
            StatementKind::Generic => ExecuteOutcome::Affected(1),
        })
    })
}

#[test]
fn one_live_proxy_per_oid() -> Result<(), TrackerDbError> {
    let db = Database::new(task_engine(), DatabaseConfig::default());
    let first = db.object(4, &TASK)?;
    let second = db.object(4, &TASK)?;
    let other = db.object(5, &TASK)?;
    assert!(first.same_object(&second));
    assert!(!first.same_object(&other));
    assert_eq!(db.live_object_count(), 2);

    drop(first);
    assert_eq!(db.live_object_count(), 2);
    drop(second);
    drop(other);
    assert_eq!(db.live_object_count(), 0);

    // a new proxy after all handles are gone is a fresh object with an empty cache
    let again = db.object(4, &TASK)?;
    assert_eq!(again.cached_property("title"), None);
    Ok(())
}

#[test]
fn same_oid_under_another_type_is_refused() -> Result<(), TrackerDbError> {
    static NOTE: ObjectSchema = ObjectSchema {
        type_name: "Note",
        table: "notes",
        key_column: "pk",
        columns: &["pk"],
        registry_table: None,
    };
    let db = Database::new(task_engine(), DatabaseConfig::default());
    let _task = db.object(4, &TASK)?;
    assert!(matches!(
        db.object(4, &NOTE),
        Err(TrackerDbError::ExecutionError(_))
    ));
    Ok(())
}

#[test]
fn reload_happens_once_per_ttl_window() -> Result<(), TrackerDbError> {
    let clock = Rc::new(ManualClock::new());
    let engine = task_engine();
    let log = engine.log();
    let config = DatabaseConfig::builder()
        .property_cache_ttl(Duration::from_secs(30))
        .build();
    let db = Database::with_clock(engine, config, clock.clone());
    let task = db.object(4, &TASK)?;

    for _ in 0..5 {
        assert_eq!(task.get_or_reload("title")?.as_text(), Some("Write report"));
    }
    assert_eq!(log.count_kind(StatementKind::Select), 1);
    assert_eq!(
        log.executed(),
        vec![r#"SELECT * FROM "tasks" WHERE "pk" = 4"#.to_owned()]
    );

    clock.advance(Duration::from_secs(29));
    task.get_or_reload("fk_owner")?;
    assert_eq!(log.count_kind(StatementKind::Select), 1);

    clock.advance(Duration::from_secs(1));
    assert_eq!(task.get_or_reload("fk_owner")?, SqlValue::Null);
    assert_eq!(log.count_kind(StatementKind::Select), 2);

    assert!(matches!(
        task.get_or_reload("missing"),
        Err(TrackerDbError::DoesNotExist { kind: "property", .. })
    ));
    Ok(())
}

#[test]
fn rollback_invalidates_cached_properties() -> Result<(), TrackerDbError> {
    let engine = task_engine();
    let log = engine.log();
    let db = Database::new(engine, DatabaseConfig::default());
    let task = db.object(4, &TASK)?;
    task.refresh_if_stale()?;

    db.begin_transaction()?;
    task.set_property("title", "Rewritten".into())?;
    assert_eq!(task.cached_property("title"), Some(SqlValue::Text("Rewritten".into())));
    db.rollback_transaction()?;

    assert_eq!(task.get_or_reload("title")?.as_text(), Some("Write report"));
    assert_eq!(log.count_kind(StatementKind::Select), 2);
    Ok(())
}

#[test]
fn destroyed_proxy_is_dead_for_good() -> Result<(), TrackerDbError> {
    let engine = task_engine();
    let log = engine.log();
    let db = Database::new(engine, DatabaseConfig::default());
    let task = db.object(4, &TASK)?;
    task.destroy()?;
    assert!(!task.is_live());
    assert_eq!(
        log.executed(),
        vec![
            r#"DELETE FROM "tasks" WHERE "pk" = 4"#.to_owned(),
            r#"DELETE FROM "objects" WHERE "pk" = 4"#.to_owned(),
        ]
    );

    log.clear();
    assert!(task.get_or_reload("title").unwrap_err().is_object_dead());
    assert!(task.set_property("title", "x".into()).unwrap_err().is_object_dead());
    assert!(task.destroy().unwrap_err().is_object_dead());
    assert!(log.executed().is_empty());
    Ok(())
}

#[test]
fn closing_kills_every_proxy() -> Result<(), TrackerDbError> {
    let db = Database::new(task_engine(), DatabaseConfig::default());
    let task = db.object(4, &TASK)?;
    task.refresh_if_stale()?;
    db.close()?;

    assert!(!task.is_live());
    assert!(task.get_or_reload("title").unwrap_err().is_object_dead());
    assert!(task.set_property("title", "x".into()).unwrap_err().is_object_dead());
    assert!(task.refresh_if_stale().unwrap_err().is_object_dead());
    assert!(matches!(
        db.object(4, &TASK),
        Err(TrackerDbError::DatabaseClosed)
    ));
    assert_eq!(db.live_object_count(), 0);
    Ok(())
}

#[test]
fn references_must_share_a_database() -> Result<(), TrackerDbError> {
    let db = Database::new(task_engine(), DatabaseConfig::default());
    let elsewhere = Database::new(task_engine(), DatabaseConfig::default());
    let task = db.object(4, &TASK)?;
    let owner = db.object(9, &TASK)?;
    let stranger = elsewhere.object(9, &TASK)?;

    assert!(matches!(
        task.set_reference("fk_owner", &stranger),
        Err(TrackerDbError::IncompatibleObject)
    ));
    task.set_reference("fk_owner", &owner)?;
    assert_eq!(task.cached_property("fk_owner"), Some(SqlValue::Int(9)));
    Ok(())
}
