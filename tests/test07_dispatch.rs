#![cfg(feature = "sqlite")]

use sqlgate::prelude::*;

#[test]
fn factory_picks_the_requested_backend() -> Result<(), SqlGateError> {
    let conn = connect("sqlite".parse()?, &ConnectParams::new(":memory:"))?;
    assert_eq!(conn.backend_tag(), BackendTag::Sqlite);
    assert_eq!(conn.name(), "SQLite");
    assert_eq!(format!("{conn:?}"), "SQLite");
    Ok(())
}

#[cfg(feature = "driver")]
#[test]
fn factory_reaches_the_driver_registry() -> Result<(), SqlGateError> {
    let mut conn = connect(BackendTag::DriverManager, &ConnectParams::new("sqlite::memory:"))?;
    assert_eq!(conn.name(), "Driver manager");
    assert_eq!(conn.query_json("select 'x' as v")?, "[\n{\n\"v\" : \"x\"\n}\n]\n");
    Ok(())
}

#[test]
fn unknown_backend_names_are_config_errors() {
    let err = "oracle".parse::<BackendTag>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn last_insert_id_follows_inserts() -> Result<(), SqlGateError> {
    let mut conn = connect(BackendTag::Sqlite, &ConnectParams::new(":memory:"))?;
    conn.execute("create table t(id integer primary key, v text)")?;
    conn.query_rows("insert into t(v) values (?1)", &["a"])?;
    assert_eq!(conn.last_insert_id()?, 1);
    conn.query_rows("insert into t(id, v) values (?1, ?2)", &["40", "b"])?;
    assert_eq!(conn.last_insert_id()?, 40);
    Ok(())
}

#[test]
fn statements_work_through_the_trait_object() -> Result<(), SqlGateError> {
    let mut conn = connect(BackendTag::Sqlite, &ConnectParams::new(":memory:"))?;
    conn.execute("create table t(a text); insert into t values ('one'), ('two');")?;

    let mut stmt = conn.get_statement("select a from t where a <> ?1 order by a")?;
    let rows = stmt.query_rows(&["one"])?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("a"), Some("two"));
    assert_eq!(stmt.stats(), StatementStats { builds: 1, executions: 1 });

    drop(stmt);
    conn.close()?;
    Ok(())
}

#[test]
fn calls_after_close_are_connection_errors() -> Result<(), SqlGateError> {
    let mut conn = connect(BackendTag::Sqlite, &ConnectParams::new(":memory:"))?;
    conn.query("select 1")?;
    conn.close()?;
    // closing twice is harmless
    conn.close()?;
    for err in [
        conn.query("select 1").unwrap_err(),
        conn.execute("select 1").unwrap_err(),
        conn.get_statement("select 1").unwrap_err(),
        conn.last_insert_id().unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
    Ok(())
}
