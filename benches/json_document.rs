use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sqlgate::prelude::*;
use sqlgate::results::{JsonDocument, Materializer, RowCollector};

const SIZES: [usize; 3] = [10, 1_000, 10_000];

// Deterministic mixed-type rows so runs are comparable
fn generate_rows(num_rows: usize) -> Vec<Vec<NativeValue>> {
    (0..num_rows)
        .map(|i| {
            vec![
                NativeValue::I64(i as i64),
                NativeValue::Text(format!("label \"{}\"\n", i % 97)),
                NativeValue::F64(i as f64 / 7.0),
                if i % 5 == 0 {
                    NativeValue::Null
                } else {
                    NativeValue::Bool(i % 2 == 0)
                },
            ]
        })
        .collect()
}

fn column_names() -> Arc<Vec<String>> {
    Arc::new(vec!["id".into(), "label".into(), "ratio".into(), "flag".into()])
}

fn materialize<M: Materializer + Default>(rows: &[Vec<NativeValue>]) -> M::Output {
    let mut sink = M::default();
    sink.begin(column_names());
    for row in rows {
        sink.push_row(row);
    }
    sink.finish()
}

fn bench_materializers(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    for size in SIZES {
        let rows = generate_rows(size);
        group.bench_with_input(BenchmarkId::new("json_document", size), &rows, |b, rows| {
            b.iter(|| materialize::<JsonDocument>(rows));
        });
        group.bench_with_input(BenchmarkId::new("row_collector", size), &rows, |b, rows| {
            b.iter(|| materialize::<RowCollector>(rows));
        });
    }
    group.finish();
}

fn bench_sqlite_query_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite_query_json");
    for size in SIZES {
        let mut conn = SqliteConnection::connect(&ConnectParams::new(":memory:"))
            .expect("open in-memory database");
        let mut script = String::from("create table t(id integer primary key, label text, ratio real);\n");
        for i in 0..size {
            script.push_str(&format!(
                "insert into t(label, ratio) values ('row-{i}', {});\n",
                i as f64 / 3.0
            ));
        }
        conn.execute(&script).expect("seed table");

        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| conn.query_json("select id, label, ratio from t").expect("query"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_materializers, bench_sqlite_query_json);
criterion_main!(benches);
