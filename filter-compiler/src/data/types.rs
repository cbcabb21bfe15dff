//! Field catalog types

use serde::{Deserialize, Serialize};

use crate::utils::sql::is_valid_identifier;

/// Declared type of a catalog field
///
/// Stored in the catalog as integer codes 0-7 in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    TextArea,
    CombinedText,
    List,
    Boolean,
    Date,
    Time,
    Number,
}

/// Which value column of the custom field table holds a field's data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Text,
    List,
    Boolean,
    Numeric,
}

impl FieldType {
    /// Decode the catalog's integer type code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Text),
            1 => Some(Self::TextArea),
            2 => Some(Self::CombinedText),
            3 => Some(Self::List),
            4 => Some(Self::Boolean),
            5 => Some(Self::Date),
            6 => Some(Self::Time),
            7 => Some(Self::Number),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Text => 0,
            Self::TextArea => 1,
            Self::CombinedText => 2,
            Self::List => 3,
            Self::Boolean => 4,
            Self::Date => 5,
            Self::Time => 6,
            Self::Number => 7,
        }
    }

    pub fn storage(&self) -> StorageKind {
        match self {
            Self::Text | Self::TextArea | Self::CombinedText => StorageKind::Text,
            Self::List => StorageKind::List,
            Self::Boolean => StorageKind::Boolean,
            Self::Date | Self::Time | Self::Number => StorageKind::Numeric,
        }
    }
}

/// Where a field's value lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Dedicated, table-qualified column
    Fixed(String),
    /// Row in the custom field table keyed by field id
    Custom,
}

impl ColumnRef {
    /// Place a catalog row's value
    ///
    /// A named column is fixed. Without one, scoped fields live in the custom
    /// field table, while global system fields use the column named by their
    /// code; global fields never have custom field rows.
    pub fn for_field(column_name: Option<&str>, scope_id: i64, field_code: &str) -> Self {
        match column_name.map(str::trim) {
            Some(c) if !c.is_empty() => Self::Fixed(c.to_string()),
            _ if scope_id == 0 => Self::Fixed(field_code.to_string()),
            _ => Self::Custom,
        }
    }

    /// The fixed column, if any
    pub fn fixed_column(&self) -> Option<&str> {
        match self {
            Self::Fixed(column) => Some(column),
            Self::Custom => None,
        }
    }
}

/// Raw catalog row, as stored in MySQL or a JSON catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRecord {
    pub field_id: i64,
    pub field_code: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub scope_id: i64,
    #[serde(default)]
    pub style: Option<serde_json::Value>,
}

/// Read-only snapshot of one catalog field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "FieldRecord")]
pub struct FieldDescriptor {
    pub field_code: String,
    pub field_id: i64,
    pub field_type: FieldType,
    pub column: ColumnRef,
    pub scope_id: i64,
    /// Extended style metadata, carried through untouched
    pub style: Option<serde_json::Value>,
}

impl From<FieldRecord> for FieldDescriptor {
    fn from(record: FieldRecord) -> Self {
        let column = ColumnRef::for_field(
            record.column_name.as_deref(),
            record.scope_id,
            &record.field_code,
        );
        Self {
            field_code: record.field_code,
            field_id: record.field_id,
            field_type: record.field_type,
            column,
            scope_id: record.scope_id,
            style: record.style,
        }
    }
}

impl FieldDescriptor {
    /// Whether the field is visible from `scope_id`
    pub fn visible_in(&self, scope_id: i64) -> bool {
        self.scope_id == 0 || self.scope_id == scope_id
    }

    /// Whether a fixed column is safe to splice into SQL
    pub fn has_valid_column(&self) -> bool {
        self.column.fixed_column().is_none_or(is_valid_identifier)
    }
}
