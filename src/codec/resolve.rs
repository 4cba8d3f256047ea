use crate::codec::FieldMapping;
use crate::core::{Field, FieldError, RawRow};
use serde_json::Value;

/// Outcome of locating a field's raw value in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'r> {
    Raw(&'r str),
    Default(Value),
}

/// Finds the raw value of `field` in `row`.
///
/// The lookup key is the mapped header when one is registered, the field name
/// otherwise. Headers carrying incidental whitespace still match. A missing
/// column or an empty value yields the default for optional fields.
pub fn resolve<'r>(
    field: &Field,
    row: &'r RawRow,
    mapping: &FieldMapping,
) -> Result<Resolved<'r>, FieldError> {
    let mapped = mapping.get(&field.name);
    let key = mapped.unwrap_or(field.name.as_str());

    let Some(value) = row.get(key).or_else(|| row.get_trimmed(key)) else {
        if field.is_optional() {
            return default_of(field).map(Resolved::Default);
        }
        return Err(match mapped {
            Some(column) => FieldError::MappedColumnMissing {
                field: field.name.clone(),
                column: column.to_string(),
            },
            None => FieldError::MissingField {
                field: field.name.clone(),
            },
        });
    };

    match value {
        Some(raw) if !raw.is_empty() => Ok(Resolved::Raw(raw)),
        _ if field.is_optional() => default_of(field).map(Resolved::Default),
        _ => Err(FieldError::RequiredValue {
            field: field.name.clone(),
        }),
    }
}

fn default_of(field: &Field) -> Result<Value, FieldError> {
    field
        .default
        .as_ref()
        .map(|default| default.value())
        .ok_or_else(|| FieldError::MissingDefault {
            field: field.name.clone(),
        })
}
