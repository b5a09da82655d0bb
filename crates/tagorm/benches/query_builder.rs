use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use tagorm::{Columns, FieldInfo, FromValue, OrmResult, Record, ToValue, TypeRegistry, Value, query};

/// Columns `col0..col{n}` with integer values.
fn columns(n: usize) -> Columns {
    let names: Arc<[String]> = (0..n).map(|i| format!("col{i}")).collect();
    let values = (0..n as i64).map(Value::Int).collect();
    Columns { names, values }
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/insert");

    for n in [1, 5, 10, 50, 100] {
        let cols = columns(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cols, |b, cols| {
            b.iter(|| black_box(query::insert("t", cols.clone())));
        });
    }

    group.finish();
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/upsert");

    for n in [1, 5, 10, 50, 100] {
        let cols = columns(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cols, |b, cols| {
            b.iter(|| black_box(query::upsert("t", cols.clone())));
        });
    }

    group.finish();
}

#[derive(Default)]
struct Wide {
    a: i64,
    b: String,
    c: Option<f64>,
}

impl Record for Wide {
    const TABLE: &'static str = "wide";

    fn describe() -> OrmResult<FieldInfo<Self>> {
        Self::fields()
            .field("a", |r| r.a.to_value(), |r, v| {
                r.a = FromValue::from_value(v)?;
                Ok(())
            })
            .primary_key()
            .field("b", |r| r.b.to_value(), |r, v| {
                r.b = FromValue::from_value(v)?;
                Ok(())
            })
            .field("c", |r| r.c.to_value(), |r, v| {
                r.c = FromValue::from_value(v)?;
                Ok(())
            })
            .build()
    }
}

fn bench_registry_hit(c: &mut Criterion) {
    let registry = TypeRegistry::new();
    registry.field_info::<Wide>().unwrap();
    let record = Wide {
        a: 1,
        b: "x".into(),
        c: None,
    };

    c.bench_function("registry/cached_insert", |b| {
        b.iter(|| {
            let info = registry.field_info::<Wide>().unwrap();
            let cols = Columns {
                names: info.columns().iter().cloned().collect(),
                values: info.values(&record).unwrap(),
            };
            black_box(query::insert(Wide::TABLE, cols))
        });
    });
}

criterion_group!(benches, bench_insert, bench_upsert, bench_registry_hit);
criterion_main!(benches);
