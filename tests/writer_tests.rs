use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use typedcsv::{
    CsvError, DataType, Dialect, Field, Reader, ReaderOptions, Record, Schema, Writer, WriterOptions,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct User {
    name: String,
    age: i64,
}

#[derive(Debug, Serialize)]
struct SimpleUser {
    name: String,
}

fn user_schema() -> Schema {
    Schema::new(
        "User",
        vec![
            Field::new("name", DataType::String),
            Field::new("age", DataType::Integer),
        ],
    )
}

fn write_to_string<T: Serialize>(schema: Schema, items: Vec<T>, skip_header: bool) -> String {
    let mut writer = Writer::from_writer(Vec::new(), schema, WriterOptions::default()).unwrap();
    writer.write(items, skip_header).unwrap();
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

#[test]
fn test_create_csv() {
    let users = vec![User { name: "test".into(), age: 40 }];
    let out = write_to_string(user_schema(), users, false);
    assert_eq!(out, "name,age\r\ntest,40\r\n");
}

#[test]
fn test_skip_header() {
    let users = vec![User { name: "test".into(), age: 40 }];
    let out = write_to_string(user_schema(), users, true);
    assert_eq!(out, "test,40\r\n");
}

#[test]
fn test_written_file_reads_back() {
    let users = vec![
        User { name: "User1".into(), age: 40 },
        User { name: "User, Jr.".into(), age: 0 },
    ];
    let out = write_to_string(user_schema(), users.clone(), false);

    let reader = Reader::from_reader(out.as_bytes(), user_schema(), ReaderOptions::default()).unwrap();
    let saved: Vec<User> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(saved, users);
}

#[test]
fn test_wrong_type_items() {
    let mut writer = Writer::from_writer(Vec::new(), user_schema(), WriterOptions::default()).unwrap();
    let err = writer
        .write(vec![SimpleUser { name: "test".into() }], false)
        .unwrap_err();

    match err {
        CsvError::WriterType { item, expected } => {
            assert!(item.contains("test"));
            assert_eq!(expected, "User");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_schema() {
    let result = Writer::from_writer(Vec::new(), Schema::new("User", vec![]), WriterOptions::default());
    assert!(matches!(result, Err(CsvError::Schema(_))));
}

#[test]
fn test_mapping_is_symmetric() {
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Contact {
        name: String,
        email: String,
    }

    let schema = Schema::new(
        "Contact",
        vec![
            Field::new("name", DataType::String),
            Field::new("email", DataType::String),
        ],
    );
    let contacts = vec![Contact {
        name: "Ana".into(),
        email: "ana@example.com".into(),
    }];

    let mut writer = Writer::from_writer(Vec::new(), schema.clone(), WriterOptions::default()).unwrap();
    writer.map_property("email").to("e-mail");
    assert_eq!(writer.headers(), vec!["name", "e-mail"]);
    writer.write(contacts.iter(), false).unwrap();
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert!(out.starts_with("name,e-mail\r\n"));

    let mut reader = Reader::from_reader(out.as_bytes(), schema, ReaderOptions::default()).unwrap();
    reader.map_field("email").to("e-mail");
    let read: Vec<Contact> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(read, contacts);
}

#[test]
fn test_dates_round_trip_with_format() {
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Event {
        title: String,
        day: NaiveDate,
        note: Option<String>,
    }

    let schema = Schema::new(
        "Event",
        vec![
            Field::new("title", DataType::String),
            Field::new("day", DataType::Date),
            Field::new("note", DataType::optional(DataType::String)).with_default(Value::Null),
        ],
    )
    .with_date_format("%d/%m/%Y");

    let events = vec![Event {
        title: "Launch".into(),
        day: NaiveDate::from_ymd_opt(2018, 12, 7).unwrap(),
        note: None,
    }];

    let out = write_to_string(schema.clone(), events.clone(), false);
    assert_eq!(out, "title,day,note\r\nLaunch,07/12/2018,\r\n");

    let reader = Reader::from_reader(out.as_bytes(), schema, ReaderOptions::default()).unwrap();
    let read: Vec<Event> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(read, events);
}

#[test]
fn test_write_decoded_records() {
    let data = "name,age\nUser1,40\n";
    let records: Vec<Record> = Reader::from_reader(data.as_bytes(), user_schema(), ReaderOptions::default())
        .unwrap()
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let mut writer = Writer::from_writer(Vec::new(), user_schema(), WriterOptions::default()).unwrap();
    writer.write_records(records.clone(), false).unwrap();
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(out, "name,age\r\nUser1,40\r\n");

    let other = Schema::new(
        "Person",
        vec![
            Field::new("name", DataType::String),
            Field::new("age", DataType::Integer),
        ],
    );
    let mut writer = Writer::from_writer(Vec::new(), other, WriterOptions::default()).unwrap();
    assert!(matches!(
        writer.write_records(records, true),
        Err(CsvError::WriterType { .. })
    ));
}

#[test]
fn test_write_to_path_with_unix_dialect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.csv");

    let mut writer = Writer::from_path(&path, user_schema(), WriterOptions::new().with_dialect(Dialect::Unix)).unwrap();
    writer.write(vec![User { name: "test".into(), age: 40 }], false).unwrap();
    drop(writer);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "\"name\",\"age\"\n\"test\",\"40\"\n");

    let reader = Reader::from_path(&path, user_schema(), ReaderOptions::default()).unwrap();
    let users: Vec<User> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(users[0].age, 40);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Money {
    cents: i64,
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (units, cents) = s.split_once('.').ok_or_else(|| format!("'{}' has no cents", s))?;
        let units: i64 = units.parse().map_err(|_| format!("bad units in '{}'", s))?;
        let cents: i64 = cents.parse().map_err(|_| format!("bad cents in '{}'", s))?;
        Ok(Money { cents: units * 100 + cents })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

#[test]
fn test_custom_type_round_trip() {
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Order {
        id: i64,
        total: Money,
        tip: Option<Money>,
    }

    let schema = Schema::new(
        "Order",
        vec![
            Field::new("id", DataType::Integer),
            Field::new("total", DataType::custom::<Money>()),
            Field::new("tip", DataType::optional(DataType::custom::<Money>())).with_default(Value::Null),
        ],
    );
    let orders = vec![
        Order { id: 1, total: Money { cents: 1250 }, tip: None },
        Order { id: 2, total: Money { cents: 305 }, tip: Some(Money { cents: 50 }) },
    ];

    let out = write_to_string(schema.clone(), orders.clone(), false);
    assert_eq!(out, "id,total,tip\r\n1,12.50,\r\n2,3.05,0.50\r\n");

    let reader = Reader::from_reader(out.as_bytes(), schema, ReaderOptions::default()).unwrap();
    let read: Vec<Order> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(read, orders);
}

#[test]
fn test_integers_beyond_i64_are_rejected() {
    #[derive(Serialize)]
    struct Counter {
        hits: u64,
    }

    let schema = Schema::new("Counter", vec![Field::new("hits", DataType::Integer)]);
    let mut writer = Writer::from_writer(Vec::new(), schema, WriterOptions::default()).unwrap();
    writer.write(vec![Counter { hits: 7 }], true).unwrap();
    assert!(matches!(
        writer.write(vec![Counter { hits: u64::MAX }], true),
        Err(CsvError::WriterType { .. })
    ));

    let mut record = Record::new();
    record.set_field("hits".into(), json!(u64::MAX));
    assert!(matches!(writer.write_records(vec![record], true), Err(CsvError::WriterType { .. })));
}

#[test]
fn test_written_rows_keep_their_line_numbers() {
    let users = vec![
        User { name: "User1".into(), age: 40 },
        User { name: "User2".into(), age: 30 },
    ];
    let out = write_to_string(user_schema(), users, false);

    let lines: Vec<Option<u64>> = Reader::from_reader(out.as_bytes(), user_schema(), ReaderOptions::default())
        .unwrap()
        .into_iter()
        .map(|record| record.unwrap().line())
        .collect();
    assert_eq!(lines, vec![Some(2), Some(3)]);
}
