use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use frame_store::{
    Field, LogicalType, PrimaryKey, Store, Value, mapper::build_table, schema::Descriptor,
};

fn orders_descriptor() -> Descriptor {
    Descriptor::new(vec![
        Field::new("id", LogicalType::Integer),
        Field::new("ordered_at", LogicalType::Datetime),
        Field::new("amount", LogicalType::Number),
        Field::new("quantity", LogicalType::Integer),
        Field::new("status", LogicalType::String),
    ])
    .with_primary_key(PrimaryKey::Single("id".to_string()))
}

fn generate_orders(rows: usize) -> Vec<Vec<Value>> {
    (0..rows)
        .map(|i| {
            let status = match i % 3 {
                0 => "shipped",
                1 => "pending",
                _ => "processing",
            };
            let day = (i % 28) + 1;
            let hour = i % 24;
            // Every seventh quantity is missing so the column widens.
            let quantity = if i % 7 == 0 {
                String::new()
            } else {
                (i % 50).to_string()
            };
            vec![
                Value::Text(i.to_string()),
                Value::Text(format!("2024-01-{day:02}T{hour:02}:00:00Z")),
                Value::Text(format!("{}.{:02}", i % 1000, i % 100)),
                Value::Text(quantity),
                Value::from(status),
            ]
        })
        .collect()
}

fn bench_build_and_read(c: &mut Criterion) {
    let descriptor = orders_descriptor();
    let rows = generate_orders(20_000);

    let mut group = c.benchmark_group("frame_store");

    group.bench_function("build_table", |b| {
        b.iter(|| build_table(&descriptor, &rows).expect("build table"));
    });

    group.bench_function("write_then_read", |b| {
        b.iter_batched(
            || {
                let mut store = Store::new();
                store
                    .create("orders", descriptor.clone(), false)
                    .expect("create bucket");
                store
            },
            |mut store| {
                store.write("orders", &rows).expect("write rows");
                store.read_all("orders").expect("read rows").len()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_build_and_read);
criterion_main!(benches);
