use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Header error: duplicate column names {columns:?}")]
    DuplicateHeader { columns: Vec<String> },

    #[error("{source} [CSV Line number: {line}]")]
    Row {
        line: u64,
        #[source]
        source: FieldError,
    },

    #[error("Type error: the item [{item}] is not an instance of {expected}. All items must match the writer's schema")]
    WriterType { item: String, expected: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CsvError {
    /// 1-based line number of the offending row, for per-row failures.
    pub fn line(&self) -> Option<u64> {
        match self {
            CsvError::Row { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            CsvError::Row { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self.field_error(), Some(FieldError::MissingField { .. }))
    }

    pub fn is_mapped_column_missing(&self) -> bool {
        matches!(self.field_error(), Some(FieldError::MappedColumnMissing { .. }))
    }

    pub fn is_coercion(&self) -> bool {
        self.field_error().is_some_and(FieldError::is_coercion)
    }

    pub fn is_configuration(&self) -> bool {
        self.field_error().is_some_and(FieldError::is_configuration)
    }
}

/// Failure to produce the value of a single field.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("The value {field} is missing in the CSV file")]
    MissingField { field: String },

    #[error("The column {column} mapped to the field {field} is missing in the CSV file")]
    MappedColumnMissing { field: String, column: String },

    #[error("The field {field} is required. Verify if any row in the CSV file is missing this data")]
    RequiredValue { field: String },

    #[error("The field {field} is optional but declares no default value")]
    MissingDefault { field: String },

    #[error("The field {field} contains only whitespaces")]
    Whitespace { field: String },

    #[error("The field {field} is defined as {declared} but received a value of type {found}")]
    Coercion {
        field: String,
        declared: String,
        found: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid boolean value \"{value}\" for the field {field}")]
    InvalidBoolean { field: String, value: String },

    #[error("It was not possible to parse the value of the field {field} of type {declared}. Make sure to specify a date format")]
    DateFormatNotSpecified { field: String, declared: String },

    #[error("The value \"{value}\" of the field {field} does not match the date format \"{format}\"")]
    Date {
        field: String,
        value: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Could not build the record: {0}")]
    Construction(#[source] serde_json::Error),
}

impl FieldError {
    pub fn field(&self) -> Option<&str> {
        match self {
            FieldError::MissingField { field }
            | FieldError::MappedColumnMissing { field, .. }
            | FieldError::RequiredValue { field }
            | FieldError::MissingDefault { field }
            | FieldError::Whitespace { field }
            | FieldError::Coercion { field, .. }
            | FieldError::InvalidBoolean { field, .. }
            | FieldError::DateFormatNotSpecified { field, .. }
            | FieldError::Date { field, .. } => Some(field),
            FieldError::Construction(_) => None,
        }
    }

    /// Value errors: the column was found but its content is unusable.
    pub fn is_coercion(&self) -> bool {
        matches!(
            self,
            FieldError::RequiredValue { .. }
                | FieldError::Whitespace { .. }
                | FieldError::Coercion { .. }
                | FieldError::InvalidBoolean { .. }
                | FieldError::Date { .. }
                | FieldError::Construction(_)
        )
    }

    /// Errors caused by the schema configuration rather than the data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FieldError::DateFormatNotSpecified { .. } | FieldError::MissingDefault { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CsvError>;
