mod common;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use common::{load_descriptor, load_rows};
use frame_store::{
    Field, LogicalType, PrimaryKey, Store, StorageError, Table, Value,
    catalog::StorageType,
    frame::{Column, Index},
    schema::{Constraints, Descriptor},
};

fn keyed_table() -> Table {
    Table::build(
        vec![Column::new("value", StorageType::Object, vec![Value::from("a"), Value::from("b")])
            .unwrap()],
        Some(Index::new("key", StorageType::Int64, vec![Value::Int(1), Value::Int(2)]).unwrap()),
    )
    .unwrap()
}

#[test]
fn articles_and_comments_lifecycle() {
    let articles_descriptor = load_descriptor("articles.json");
    let comments_descriptor = load_descriptor("comments.json");
    let articles_rows = load_rows("articles.csv", &articles_descriptor);
    let comments_rows = load_rows("comments.csv", &comments_descriptor);

    let mut store = Store::new();
    store
        .create("articles", articles_descriptor.clone(), false)
        .unwrap();
    store
        .create("comments", comments_descriptor.clone(), false)
        .unwrap();
    assert_eq!(store.table("articles").unwrap().shape(), (0, 0));
    assert_eq!(store.table("comments").unwrap().shape(), (0, 0));

    assert_eq!(store.write("articles", &articles_rows).unwrap(), 2);
    assert_eq!(store.write("comments", &comments_rows).unwrap(), 1);
    assert_eq!(store.table("articles").unwrap().shape(), (2, 11));
    assert_eq!(store.table("comments").unwrap().shape(), (1, 1));

    let err = store
        .create("articles", articles_descriptor.clone(), false)
        .unwrap_err();
    assert_eq!(err.to_string(), "Bucket \"articles\" already exists");

    assert!(store.to_string().starts_with("Store"));
    assert_eq!(store.buckets(), vec!["articles", "comments"]);
    assert_eq!(store.describe("articles").unwrap(), articles_descriptor);
    assert_eq!(store.describe("comments").unwrap(), comments_descriptor);

    let rows = store.read_all("articles").unwrap();
    let first = &rows[0];
    assert_eq!(first[0], Value::Int(1));
    assert_eq!(first[1], Value::Null);
    assert_eq!(first[2], Value::from("Taxes"));
    assert_eq!(first[3], Value::Bool(true));
    assert_eq!(first[4], Value::Float(9.5));
    assert_eq!(first[5], Value::Int(2015));
    assert_eq!(
        first[6],
        Value::Date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
    );
    assert_eq!(
        first[7],
        Value::Time(NaiveTime::from_hms_opt(3, 0, 0).unwrap())
    );
    assert_eq!(
        first[8],
        Value::Timestamp(
            NaiveDate::from_ymd_opt(2015, 1, 1)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap()
        )
    );
    assert_eq!(
        first[9],
        Value::Mapping(BTreeMap::from([("chars".to_string(), Value::Int(560))]))
    );
    assert_eq!(
        first[10],
        Value::Sequence(vec![Value::from("mike"), Value::from("bob")])
    );
    assert_eq!(
        first[11],
        Value::Sequence(vec![Value::Float(50.0), Value::Float(50.0)])
    );
    assert_eq!(rows[1][1], Value::Int(1));
    assert_eq!(rows[1][2], Value::from("中国人"));
    assert_eq!(rows[1][4], Value::Float(7.0));

    assert_eq!(
        store.read_all("comments").unwrap(),
        vec![vec![Value::Int(1), Value::from("good")]]
    );

    store.set_descriptor("articles", articles_descriptor.clone());
    assert_eq!(store.describe("articles").unwrap(), articles_descriptor);

    store.delete_all();
    assert!(store.buckets().is_empty());
    let err = store.delete("articles", false).unwrap_err();
    assert_eq!(err, StorageError::NotFound("articles".to_string()));
    assert!(matches!(
        store.read("comments"),
        Err(StorageError::NotFound(name)) if name == "comments"
    ));
}

#[test]
fn integer_column_with_missing_value_widens_to_float() {
    let articles_descriptor = load_descriptor("articles.json");
    let rows = load_rows("articles.csv", &articles_descriptor);
    let mut store = Store::new();
    store.create("articles", articles_descriptor, false).unwrap();
    store.write("articles", &rows).unwrap();

    let table = store.table("articles").unwrap();
    assert_eq!(table.column("parent").unwrap().storage(), StorageType::Float64);
    assert_eq!(table.column("current").unwrap().storage(), StorageType::Bool);
    assert_eq!(
        table.column("created_datetime").unwrap().storage(),
        StorageType::Timestamp
    );
}

#[test]
fn table_without_primary_key() {
    let descriptor = Descriptor::new(vec![
        Field::new("a", LogicalType::Integer),
        Field::new("b", LogicalType::String),
    ]);
    let data = vec![
        vec![Value::Int(1), Value::from("x")],
        vec![Value::Int(2), Value::from("y")],
    ];

    let mut store = Store::new();
    store.create("data", descriptor, false).unwrap();
    store.write("data", &data).unwrap();
    assert!(store.table("data").unwrap().index().is_none());
    assert_eq!(store.read_all("data").unwrap(), data);
}

#[test]
fn init_tables() {
    let table = Table::build(
        vec![
            Column::new("key", StorageType::Int64, vec![Value::Int(1), Value::Int(2)]).unwrap(),
            Column::new("value", StorageType::Object, vec![Value::from("a"), Value::from("b")])
                .unwrap(),
        ],
        None,
    )
    .unwrap();
    let store = Store::with_tables([("data", table)]);
    assert_eq!(
        store.read_all("data").unwrap(),
        vec![
            vec![Value::Int(1), Value::from("a")],
            vec![Value::Int(2), Value::from("b")],
        ]
    );
    assert_eq!(
        store.describe("data").unwrap(),
        Descriptor::new(vec![
            Field::new("key", LogicalType::Integer).required(),
            Field::new("value", LogicalType::String).required(),
        ])
    );
}

#[test]
fn restore_schema_with_primary_key() {
    let store = Store::with_tables([("data", keyed_table())]);
    assert_eq!(
        store.read_all("data").unwrap(),
        vec![
            vec![Value::Int(1), Value::from("a")],
            vec![Value::Int(2), Value::from("b")],
        ]
    );
    assert_eq!(
        store.describe("data").unwrap(),
        Descriptor::new(vec![
            Field::new("key", LogicalType::Integer).with_constraints(Constraints::required()),
            Field::new("value", LogicalType::String).required(),
        ])
        .with_primary_key(PrimaryKey::Single("key".to_string()))
    );
}

#[test]
fn read_missing_table() {
    let store = Store::new();
    let err = store.read("data").unwrap_err();
    assert_eq!(err.to_string(), "Bucket \"data\" doesn't exist");
}

#[test]
fn multiple_writes_append_without_merging_keys() {
    let mut store = Store::with_tables([("data", keyed_table())]);
    store
        .write(
            "data",
            vec![
                vec![Value::Int(2), Value::from("x")],
                vec![Value::Int(3), Value::from("y")],
            ],
        )
        .unwrap();
    assert_eq!(
        store.read_all("data").unwrap(),
        vec![
            vec![Value::Int(1), Value::from("a")],
            vec![Value::Int(2), Value::from("b")],
            vec![Value::Int(2), Value::from("x")],
            vec![Value::Int(3), Value::from("y")],
        ]
    );
}

#[test]
fn later_write_with_missing_values_widens_existing_column() {
    let descriptor = Descriptor::new(vec![
        Field::new("n", LogicalType::Integer),
        Field::new("flag", LogicalType::Boolean),
    ]);
    let mut store = Store::new();
    store.create("data", descriptor, false).unwrap();
    store
        .write("data", vec![vec![Value::Int(1), Value::Bool(true)]])
        .unwrap();
    assert_eq!(
        store.table("data").unwrap().column("n").unwrap().storage(),
        StorageType::Int64
    );

    store
        .write("data", vec![vec![Value::Null, Value::Null]])
        .unwrap();
    let table = store.table("data").unwrap();
    assert_eq!(table.column("n").unwrap().storage(), StorageType::Float64);
    assert_eq!(table.column("flag").unwrap().storage(), StorageType::Object);
    assert_eq!(
        store.read_all("data").unwrap(),
        vec![
            vec![Value::Int(1), Value::Bool(true)],
            vec![Value::Null, Value::Null],
        ]
    );
}

#[test]
fn force_create_resets_data() {
    let descriptor = load_descriptor("comments.json");
    let rows = load_rows("comments.csv", &descriptor);
    let mut store = Store::new();
    store.create("comments", descriptor.clone(), false).unwrap();
    store.write("comments", &rows).unwrap();

    store.create("comments", descriptor, true).unwrap();
    assert!(store.read_all("comments").unwrap().is_empty());
    assert_eq!(store.buckets(), vec!["comments"]);
}

#[test]
fn read_restarts_on_every_call() {
    let store = Store::with_tables([("data", keyed_table())]);
    let first: Vec<_> = store.read("data").unwrap().collect();
    let second: Vec<_> = store.read("data").unwrap().collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}
