#![cfg(feature = "sqlite")]
use tracker_sql::prelude::*;
use tracker_sql::sqlite::SqliteOptionsBuilder;

fn open_with_schema() -> Result<Database, TrackerDbError> {
    let db = Database::sqlite_in_memory()?;
    install_schema(&db)?;
    Ok(db)
}

#[test]
fn activity_type_lifecycle() -> Result<(), TrackerDbError> {
    let db = open_with_schema()?;
    let design = ActivityType::create(&db, "Design", "Sketches\n\tand diagrams")?;
    let review = ActivityType::create(&db, "O'Brien review", "")?;

    assert_eq!(design.name()?, "Design");
    assert_eq!(design.description()?, "Sketches\n\tand diagrams");
    assert_eq!(review.name()?, "O'Brien review");

    design.set_name("Drafting")?;
    assert_eq!(design.name()?, "Drafting");
    assert!(ActivityType::find(&db, "Drafting")?.object().same_object(design.object()));

    let all = ActivityType::all(&db)?;
    assert_eq!(all.len(), 2);
    assert!(all[0].object().same_object(design.object()));

    review.destroy()?;
    assert!(!review.is_live());
    assert!(review.name().unwrap_err().is_object_dead());
    assert_eq!(ActivityType::all(&db)?.len(), 1);

    let objects = db
        .create_statement("SELECT [object_type_name] FROM [objects]")?
        .execute_query()?;
    assert_eq!(objects.len(), 1);
    assert_eq!(
        objects.get(0).map(|r| r.get("object_type_name").cloned()).transpose()?,
        Some(SqlValue::Text("ActivityType".into()))
    );
    Ok(())
}

#[test]
fn rolled_back_destroy_keeps_the_proxy() -> Result<(), TrackerDbError> {
    let db = open_with_schema()?;
    let design = ActivityType::create(&db, "Design", "")?;

    db.begin_transaction()?;
    design.destroy()?;
    assert!(design.is_live());
    db.rollback_transaction()?;

    assert!(design.is_live());
    assert_eq!(design.name()?, "Design");
    assert!(ActivityType::find(&db, "Design")?.object().same_object(design.object()));

    db.transaction(|_| design.destroy())?;
    assert!(!design.is_live());
    assert!(matches!(
        ActivityType::find(&db, "Design"),
        Err(TrackerDbError::DoesNotExist { .. })
    ));
    Ok(())
}

#[test]
fn row_deleted_behind_the_proxy_marks_it_dead() -> Result<(), TrackerDbError> {
    let db = open_with_schema()?;
    let activity_type = ActivityType::create(&db, "Gone soon", "")?;
    let oid = activity_type.oid();
    activity_type.object().invalidate_property_cache();

    let mut stmt = db.create_statement("DELETE FROM [activity_types] WHERE [pk] = ?")?;
    stmt.set_int(0, Some(oid))?;
    assert_eq!(stmt.execute_update()?, 1);

    assert!(activity_type.set_description("x").unwrap_err().is_object_dead());
    assert!(!activity_type.is_live());
    Ok(())
}

#[test]
fn awkward_text_round_trips_through_sqlite() -> Result<(), TrackerDbError> {
    let db = open_with_schema()?;
    let description = "line one\nline 'two'\twith \\ backslash";
    let activity_type = ActivityType::create(&db, "Text", description)?;
    activity_type.object().invalidate_property_cache();
    assert_eq!(activity_type.description()?, description);
    Ok(())
}

#[test]
fn users_store_flags_and_addresses() -> Result<(), TrackerDbError> {
    let db = open_with_schema()?;
    let addresses = vec!["ann@example.com".to_owned(), "ann@work.example".to_owned()];
    let user = User::create(&db, "Ann", true, Some(30), &addresses)?;
    assert!(user.enabled()?);
    assert_eq!(user.inactivity_timeout()?, Some(30));
    assert_eq!(user.email_addresses()?, addresses);

    user.set_enabled(false)?;
    user.set_inactivity_timeout(None)?;
    user.set_email_addresses(&[])?;
    user.object().invalidate_property_cache();
    assert!(!user.enabled()?);
    assert_eq!(user.inactivity_timeout()?, None);
    assert!(user.email_addresses()?.is_empty());

    let raw = db
        .create_statement("SELECT [enabled] FROM [users]")?
        .execute_query()?;
    assert_eq!(
        raw.get(0).map(|r| r.get(0usize).cloned()).transpose()?,
        Some(SqlValue::Text("N".into()))
    );
    Ok(())
}

#[test]
fn file_backed_database_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tracker.db");
    let path = path.to_string_lossy().into_owned();

    let db = SqliteOptionsBuilder::new(path.clone()).create(true).build()?;
    install_schema(&db)?;
    let oid = ActivityType::create(&db, "Persisted", "kept on disk")?.oid();
    db.close()?;

    let db = Database::sqlite_builder(path.clone()).build()?;
    assert_eq!(ActivityType::get(&db, oid)?.name()?, "Persisted");
    db.close()?;

    // without `create` a missing file is an error
    let missing = dir.path().join("missing.db");
    assert!(
        SqliteOptionsBuilder::new(missing.to_string_lossy())
            .build()
            .is_err()
    );
    Ok(())
}

#[test]
fn insert_select_and_update_outcomes() -> Result<(), TrackerDbError> {
    let db = Database::sqlite_in_memory()?;
    db.execute_sql("CREATE TABLE notes (pk INTEGER PRIMARY KEY, body TEXT, score REAL)")?;

    let mut insert = db.create_statement("INSERT INTO [notes] ([body], [score]) VALUES (?, ?)")?;
    insert.set_string(0, Some("first"))?;
    insert.set_real(1, Some(1.5))?;
    assert_eq!(insert.execute_insert()?, Some(1));
    insert.set_string(0, None)?;
    assert_eq!(insert.execute_insert()?, Some(2));

    let mut update = db.create_statement("update [notes] set [score] = ? where [score] is not null")?;
    update.set_real(0, Some(2.0))?;
    assert_eq!(update.kind(), StatementKind::Generic);
    assert_eq!(update.execute_update()?, 2);

    let records = db
        .create_statement("SELECT [pk], [body], [score] FROM [notes] ORDER BY [pk]")?
        .execute_query()?;
    let bodies: Vec<SqlValue> = records
        .iter()
        .map(|r| r.get("body").cloned())
        .collect::<Result<_, _>>()?;
    assert_eq!(bodies, vec![SqlValue::Text("first".into()), SqlValue::Null]);
    let score = records.get(1).map(|r| r.get_as("score", SqlDataType::Real)).transpose()?;
    assert_eq!(score, Some(SqlValue::Float(2.0)));
    Ok(())
}
