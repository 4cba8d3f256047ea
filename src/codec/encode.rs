use crate::codec::FieldMapping;
use crate::codec::coerce::{ISO_DATE, ISO_DATETIME};
use crate::codec::options::OptionResolver;
use crate::core::{BoxError, CsvError, DataType, Field, Record, Result, Schema};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Header row for `schema` under `mapping`.
pub fn header_row(schema: &Schema, mapping: &FieldMapping) -> Vec<String> {
    mapping.headers(schema)
}

/// Serializes `item` and encodes it as a row of `schema`.
pub fn encode_item<T: Serialize>(schema: &Schema, item: &T) -> Result<Vec<String>> {
    let record = Record::from_item(item).map_err(|_| type_mismatch(schema, item_text(item)))?;
    encode(schema, &record)
}

/// Field values of `record` in declared order.
///
/// The record must have exactly the fields of `schema`; a record decoded with
/// another schema is rejected as well.
pub fn encode(schema: &Schema, record: &Record) -> Result<Vec<String>> {
    let foreign = record.schema_name().is_some_and(|name| name != schema.name);
    if foreign || record.validate_against_schema(schema).is_err() {
        return Err(type_mismatch(schema, record_text(record)));
    }

    let options = OptionResolver::new(&schema.options);
    schema
        .fields
        .iter()
        .map(|field| {
            let value = record.get_field(&field.name).unwrap_or(&Value::Null);
            encode_value(field, value, options.date_format(field).as_deref())
                .map_err(|_| type_mismatch(schema, record_text(record)))
        })
        .collect()
}

fn encode_value(
    field: &Field,
    value: &Value,
    date_format: Option<&str>,
) -> std::result::Result<String, BoxError> {
    if let (DataType::Custom(constructor), false) = (field.data_type.effective(), value.is_null()) {
        return constructor.render(value);
    }

    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => match (field.data_type.effective(), date_format) {
            (DataType::Date | DataType::DateTime, Some(format)) => {
                format_temporal(s, format).unwrap_or_else(|| s.clone())
            }
            _ => s.clone(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

// Renders an ISO date or datetime with the field's format. Anything else is
// left as it is.
fn format_temporal(value: &str, format: &str) -> Option<String> {
    let datetime = NaiveDateTime::parse_from_str(value, ISO_DATETIME)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, ISO_DATE)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })?;

    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).ok()?;
    Some(out)
}

fn type_mismatch(schema: &Schema, item: String) -> CsvError {
    CsvError::WriterType {
        item,
        expected: schema.name.clone(),
    }
}

fn item_text<T: Serialize>(item: &T) -> String {
    serde_json::to_string(item).unwrap_or_else(|_| "<unserializable>".to_string())
}

fn record_text(record: &Record) -> String {
    serde_json::to_string(&record.data).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        name: String,
        age: Option<i64>,
        active: bool,
    }

    #[derive(Serialize)]
    struct Admin {
        name: String,
        age: Option<i64>,
        active: bool,
        level: u8,
    }

    fn schema() -> Schema {
        Schema::new(
            "User",
            vec![
                Field::new("name", DataType::String),
                Field::new("age", DataType::optional(DataType::Integer)).with_default(Value::Null),
                Field::new("active", DataType::Boolean),
            ],
        )
    }

    #[test]
    fn encodes_in_declared_order() {
        let user = User {
            name: "Ana".into(),
            age: None,
            active: true,
        };
        assert_eq!(encode_item(&schema(), &user).unwrap(), vec!["Ana", "", "true"]);
    }

    #[test]
    fn header_follows_mapping() {
        let mut mapping = FieldMapping::new();
        mapping.insert("name", "Full Name");
        assert_eq!(header_row(&schema(), &mapping), vec!["Full Name", "age", "active"]);
    }

    #[test]
    fn rejects_other_shapes() {
        let admin = Admin {
            name: "Root".into(),
            age: Some(50),
            active: true,
            level: 9,
        };
        let err = encode_item(&schema(), &admin).unwrap_err();
        match err {
            CsvError::WriterType { item, expected } => {
                assert!(item.contains("Root"));
                assert_eq!(expected, "User");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            encode_item(&schema(), &vec![1, 2, 3]),
            Err(CsvError::WriterType { .. })
        ));
    }

    #[test]
    fn rejects_records_of_another_schema() {
        let mut record = Record::new();
        record.set_field("name".into(), json!("Ana"));
        record.set_field("age".into(), json!(40));
        record.set_field("active".into(), json!(true));
        assert!(encode(&schema(), &record).is_ok());

        record.set_metadata("schema".into(), "Customer".into());
        assert!(encode(&schema(), &record).is_err());
    }

    #[test]
    fn dates_use_the_field_format() {
        let schema = Schema::new(
            "Event",
            vec![
                Field::new("day", DataType::Date),
                Field::new("at", DataType::DateTime).with_date_format("%d/%m/%Y %H:%M"),
            ],
        )
        .with_date_format("%d/%m/%Y");

        let mut record = Record::new();
        record.set_field("day".into(), json!("2018-12-07"));
        record.set_field("at".into(), json!("2018-12-07T10:30:00"));

        assert_eq!(encode(&schema, &record).unwrap(), vec!["07/12/2018", "07/12/2018 10:30"]);
    }
}
