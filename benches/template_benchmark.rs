use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tracker_sql::prelude::*;

// Build a deterministic multi-row insert script
fn generate_insert_script(num_rows: usize) -> String {
    let mut script = String::with_capacity(num_rows * 96);
    for i in 0..num_rows {
        script.push_str(&format!(
            "INSERT INTO [activity_types] ([pk], [name], [description]) VALUES ({i}, 'type-{i}', 'it''s row {i}'); -- row {i}\n"
        ));
    }
    script
}

fn benchmark_compile(c: &mut Criterion) {
    let template = "UPDATE [users] SET [real_name] = ?, [enabled] = ?, [email_addresses] = ? WHERE [pk] = ? AND [note] <> 'it''s'";
    let mut group = c.benchmark_group("compile_template");
    for (name, dialect) in [
        ("default", Dialect::default()),
        ("sqlite", Dialect::sqlite()),
        ("mssql", Dialect::mssql()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &dialect, |b, dialect| {
            b.iter(|| compile_template(black_box(template), dialect));
        });
    }
    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let dialect = Dialect::sqlite();
    let compiled = compile_template(
        "INSERT INTO [users] ([pk], [enabled], [real_name], [email_addresses]) VALUES (?, ?, ?, ?)",
        &dialect,
    )
    .unwrap();
    let values = vec![
        SqlValue::Int(42),
        SqlValue::Bool(true),
        SqlValue::Text("O'Brien".into()),
        SqlValue::Text("ann@example.com\nann@work.example".into()),
    ];
    c.bench_function("render_bound_statement", |b| {
        b.iter(|| compiled.to_sql(black_box(&values), &dialect));
    });
}

fn benchmark_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_script");
    for num_rows in [10, 100, 1000] {
        let script = generate_insert_script(num_rows);
        group.bench_with_input(BenchmarkId::from_parameter(num_rows), &script, |b, script| {
            b.iter(|| split_script(black_box(script)));
        });
    }
    group.finish();
}

fn benchmark_sqlite_script(c: &mut Criterion) {
    let script = generate_insert_script(100);
    c.bench_function("sqlite_execute_script_100", |b| {
        b.iter(|| {
            let db = Database::sqlite_in_memory().unwrap();
            install_schema(&db).unwrap();
            db.execute_sql("PRAGMA foreign_keys = OFF").unwrap();
            db.execute_script(black_box(&script)).unwrap()
        });
    });
}

criterion_group!(
    benches,
    benchmark_compile,
    benchmark_render,
    benchmark_split,
    benchmark_sqlite_script
);
criterion_main!(benches);
