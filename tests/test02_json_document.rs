#![cfg(feature = "sqlite")]

use serde_json::Value;
use sqlgate::prelude::*;

fn memory() -> Result<Box<dyn DatabaseConnection>, SqlGateError> {
    connect(BackendTag::Sqlite, &ConnectParams::new(":memory:"))
}

#[test]
fn single_row_document_is_byte_exact() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    conn.execute("create table t(a integer, b text); insert into t values (1, 'x');")?;
    assert_eq!(
        conn.query_json("select a, b from t")?,
        "[\n{\n\"a\" : \"1\",\n\"b\" : \"x\"\n}\n]\n"
    );
    Ok(())
}

#[test]
fn empty_match_is_empty_array() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    conn.execute("create table t(a integer, b text); insert into t values (1, 'x');")?;
    assert_eq!(conn.query_json("select a, b from t where a = 2")?, "[\n]\n");
    assert_eq!(
        conn.query_json_with("select a, b from t where b = ?1", &["nope"])?,
        "[\n]\n"
    );
    Ok(())
}

#[test]
fn rows_keep_fetch_order_without_stray_commas() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    conn.execute(
        "create table t(n integer, s text);
         insert into t values (3, 'c'), (1, 'a'), (2, 'b');",
    )?;
    let doc = conn.query_json("select n, s from t order by n")?;
    assert_eq!(
        doc,
        "[\n{\n\"n\" : \"1\",\n\"s\" : \"a\"\n},\n{\n\"n\" : \"2\",\n\"s\" : \"b\"\n},\n{\n\"n\" : \"3\",\n\"s\" : \"c\"\n}\n]\n"
    );
    assert!(!doc.contains(",\n]"));

    let parsed: Value = serde_json::from_str(&doc).unwrap();
    let objects = parsed.as_array().unwrap();
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[2]["s"], "c");
    Ok(())
}

#[test]
fn special_characters_round_trip_through_serde_json() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    conn.execute("create table t(v text)")?;
    let nasty = "quote \" backslash \\ newline \n tab \t bell \u{7}";
    conn.query_rows("insert into t values (?1)", &[nasty])?;

    let doc = conn.query_json("select v as \"odd \"\"name\"\"\" from t")?;
    let parsed: Value = serde_json::from_str(&doc).unwrap();
    assert_eq!(parsed[0]["odd \"name\""], nasty);
    Ok(())
}

#[test]
fn null_and_empty_string_look_the_same() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    let doc = conn.query_json("select null as n, '' as e")?;
    assert_eq!(doc, "[\n{\n\"n\" : \"\",\n\"e\" : \"\"\n}\n]\n");
    let rows = conn.query_rows("select null as n, '' as e", &[])?;
    assert_eq!(rows[0].get("n"), rows[0].get("e"));
    Ok(())
}

#[test]
fn rows_and_json_agree_and_rows_serialize_in_order() -> Result<(), SqlGateError> {
    let mut conn = memory()?;
    let sql = "select 2.5 as z, 'txt' as a, 7 as m";
    let rows = conn.query_rows(sql, &[])?;
    let from_rows = serde_json::to_string(&rows).unwrap();
    assert_eq!(from_rows, r#"[{"z":"2.5","a":"txt","m":"7"}]"#);

    let doc: Value = serde_json::from_str(&conn.query_json(sql)?).unwrap();
    let rows_value: Value = serde_json::from_str(&from_rows).unwrap();
    assert_eq!(doc, rows_value);
    Ok(())
}
