//! Criterion comparison of draining the same result through each fetch mode,
//! with raw `rusqlite` as the baseline. The dataset lives in memory so the
//! numbers reflect shaping overhead rather than storage.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use simple_db_layer::prelude::*;

const QUERY: &str = "SELECT team, id, name, score FROM players ORDER BY id";

/// Resolve how many rows the dataset should hold.
fn row_count() -> usize {
    std::env::var("BENCH_ROWS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1000)
}

fn seed_sql(rows: usize) -> String {
    let mut sql = String::from(
        "CREATE TABLE players (id INTEGER PRIMARY KEY, team TEXT, name TEXT, score INTEGER);\n",
    );
    for id in 1..=rows {
        sql.push_str(&format!(
            "INSERT INTO players (id, team, name, score) VALUES ({id}, 'team{}', 'player{id}', {});\n",
            id % 16,
            id * 7 % 100
        ));
    }
    sql
}

fn bench_fetch_modes(c: &mut Criterion) {
    let rows = row_count();
    let seed = seed_sql(rows);

    let db = Connection::open("sqlite::memory:");
    db.execute_batch(&seed).expect("seed dataset");

    let raw = rusqlite::Connection::open_in_memory().expect("open rusqlite");
    raw.execute_batch(&seed).expect("seed rusqlite dataset");

    let mut group = c.benchmark_group("fetch_all");
    group.throughput(Throughput::Elements(rows as u64));

    group.bench_function("rusqlite_baseline", |b| {
        b.iter(|| {
            let mut stmt = raw.prepare_cached(QUERY).expect("prepare");
            let mut out = Vec::with_capacity(rows);
            let mut cursor = stmt.query([]).expect("query");
            while let Some(row) = cursor.next().expect("step") {
                let score: i64 = row.get(3).expect("score");
                out.push(score);
            }
            black_box(out)
        });
    });

    let modes = [
        ("row", FetchMode::Row),
        ("column", FetchMode::Column(3)),
        ("key_row_pair", FetchMode::KeyRowPair),
        ("group_row", FetchMode::GroupRow),
    ];
    for (label, mode) in modes {
        group.bench_with_input(BenchmarkId::new("mode", label), &mode, |b, mode| {
            b.iter(|| {
                let mut stmt = db.prepare(QUERY, ()).expect("prepare");
                stmt.set_fetch_mode(*mode);
                black_box(stmt.fetch_all().expect("fetch_all"))
            });
        });
    }

    group.bench_function("fetch_pairs_by_id", |b| {
        b.iter(|| {
            black_box(
                db.fetch_pairs(QUERY, (), Some("id"), Some("score"))
                    .expect("fetch_pairs"),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fetch_modes);
criterion_main!(benches);
