#![cfg(feature = "sqlite")]

use sqlgate::prelude::*;

#[test]
fn identical_text_is_prepared_once() -> Result<(), SqlGateError> {
    let mut conn = SqliteConnection::connect(&ConnectParams::new(":memory:"))?;
    conn.execute("create table t(a integer)")?;

    let insert = "insert into t values (?1)";
    for i in 0..10 {
        let arg = i.to_string();
        conn.query_rows(insert, &[arg.as_str()])?;
    }
    assert_eq!(
        conn.cached_statement(insert).map(PreparedStatement::stats),
        Some(StatementStats {
            builds: 1,
            executions: 10
        })
    );

    let select = "select count(*) as n from t";
    assert_eq!(conn.query_json(select)?, "[\n{\n\"n\" : \"10\"\n}\n]\n");
    conn.query_rows(select, &[])?;
    assert_eq!(conn.cached_statement(select).unwrap().stats().builds, 1);
    assert_eq!(conn.cached_statement(select).unwrap().stats().executions, 2);
    Ok(())
}

#[test]
fn differently_spelled_text_gets_its_own_entry() -> Result<(), SqlGateError> {
    let mut conn = SqliteConnection::connect(&ConnectParams::new(":memory:"))?;
    conn.query("select 1")?;
    conn.query("SELECT 1")?;
    conn.query("select 1 ")?;
    for sql in ["select 1", "SELECT 1", "select 1 "] {
        assert_eq!(conn.cached_statement(sql).unwrap().stats().builds, 1);
    }
    Ok(())
}

#[test]
fn failed_prepare_leaves_nothing_cached() -> Result<(), SqlGateError> {
    let mut conn = SqliteConnection::connect(&ConnectParams::new(":memory:"))?;
    assert!(conn.query("selec 1").is_err());
    assert!(conn.cached_statement("selec 1").is_none());

    // once the table exists the same text prepares fine
    let sql = "select * from late";
    assert!(conn.query_json(sql).is_err());
    conn.execute("create table late(x text)")?;
    assert_eq!(conn.query_json(sql)?, "[\n]\n");
    assert_eq!(conn.cached_statement(sql).unwrap().stats().builds, 1);
    Ok(())
}

#[test]
fn standalone_statements_bypass_the_cache() -> Result<(), SqlGateError> {
    let mut conn = SqliteConnection::connect(&ConnectParams::new(":memory:"))?;
    let mut stmt = conn.get_statement("select ?1 as echo")?;
    assert!(stmt.is_built());
    assert_eq!(stmt.source(), "select ?1 as echo");
    assert!(conn.cached_statement("select ?1 as echo").is_none());

    assert_eq!(stmt.query_rows(&["a"])?[0].get("echo"), Some("a"));
    assert_eq!(stmt.query_json_with(&["b"])?, "[\n{\n\"echo\" : \"b\"\n}\n]\n");
    assert_eq!(stmt.stats().executions, 2);

    // the embedded backend refuses to rebuild
    let err = stmt.build().unwrap_err();
    assert!(matches!(err, SqlGateError::AlreadyBuilt { .. }));
    assert_eq!(stmt.stats().builds, 1);
    Ok(())
}
