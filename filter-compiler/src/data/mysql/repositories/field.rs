//! Field catalog repository for MySQL

use sqlx::MySqlPool;

use crate::data::error::DataError;
use crate::data::types::{FieldDescriptor, FieldRecord, FieldType};
use crate::utils::sql::placeholders;

/// Raw catalog row: (field_id, field_code, field_type, column_name, scope_id, style)
type FieldRow = (i64, String, i64, Option<String>, i64, Option<String>);

/// Fetch descriptors for `codes` visible in `scope_id` in one round trip
///
/// Rows are ordered to match `codes`, global rows first within a code.
pub async fn lookup_fields(
    pool: &MySqlPool,
    table: &str,
    scope_id: i64,
    codes: &[String],
) -> Result<Vec<FieldDescriptor>, DataError> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let list = placeholders(codes.len());
    let query = format!(
        "SELECT CAST(field_id AS SIGNED), field_code, CAST(field_type AS SIGNED), column_name, \
         CAST(scope_id AS SIGNED), CAST(style AS CHAR) \
         FROM {table} \
         WHERE field_code IN ({list}) AND (scope_id = 0 OR scope_id = ?) \
         ORDER BY FIELD(field_code, {list}), scope_id"
    );

    let mut query_builder = sqlx::query_as::<_, FieldRow>(&query);
    for code in codes {
        query_builder = query_builder.bind(code);
    }
    query_builder = query_builder.bind(scope_id);
    for code in codes {
        query_builder = query_builder.bind(code);
    }

    let rows = query_builder.fetch_all(pool).await?;
    tracing::trace!(requested = codes.len(), found = rows.len(), "Field catalog rows fetched");

    Ok(rows.into_iter().filter_map(descriptor_from_row).collect())
}

/// Decode one catalog row; rows with an unknown type code or an unusable
/// column are skipped
fn descriptor_from_row(row: FieldRow) -> Option<FieldDescriptor> {
    let (field_id, field_code, type_code, column_name, scope_id, style) = row;

    let Some(field_type) = FieldType::from_code(type_code) else {
        tracing::warn!(%field_code, type_code, "Unknown field type code, skipping field");
        return None;
    };

    let style = style.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%field_code, error = %e, "Invalid style metadata, ignoring");
            None
        }
    });

    let field = FieldDescriptor::from(FieldRecord {
        field_id,
        field_code,
        field_type,
        column_name,
        scope_id,
        style,
    });
    if !field.has_valid_column() {
        tracing::warn!(
            field_code = %field.field_code,
            column = ?field.column,
            "Column is not a plain identifier, skipping field"
        );
        return None;
    }
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::ColumnRef;

    #[test]
    fn test_descriptor_from_row_fixed() {
        let row = (
            1,
            "status".to_string(),
            4,
            Some("reservations.status".to_string()),
            0,
            None,
        );
        let field = descriptor_from_row(row).unwrap();
        assert_eq!(field.field_type, FieldType::Boolean);
        assert_eq!(field.column, ColumnRef::Fixed("reservations.status".to_string()));
        assert_eq!(field.style, None);
    }

    #[test]
    fn test_descriptor_from_row_custom_with_style() {
        let row = (
            42,
            "diet".to_string(),
            3,
            None,
            7,
            Some(r#"{"options":[1,2]}"#.to_string()),
        );
        let field = descriptor_from_row(row).unwrap();
        assert_eq!(field.field_type, FieldType::List);
        assert_eq!(field.column, ColumnRef::Custom);
        assert_eq!(field.scope_id, 7);
        assert_eq!(field.style, Some(serde_json::json!({"options": [1, 2]})));
    }

    #[test]
    fn test_descriptor_from_row_bad_style_is_dropped() {
        let row = (2, "memo".to_string(), 1, None, 7, Some("{oops".to_string()));
        let field = descriptor_from_row(row).unwrap();
        assert_eq!(field.style, None);
    }

    #[test]
    fn test_descriptor_from_row_global_without_column() {
        let row = (3, "reservationStatus".to_string(), 7, None, 0, None);
        let field = descriptor_from_row(row).unwrap();
        assert_eq!(field.column, ColumnRef::Fixed("reservationStatus".to_string()));
    }

    #[test]
    fn test_descriptor_from_row_rejects_unsafe_column() {
        let row = (
            4,
            "status".to_string(),
            0,
            Some("status) OR (1=1".to_string()),
            0,
            None,
        );
        assert!(descriptor_from_row(row).is_none());

        let row = (5, "guest-name".to_string(), 0, None, 0, None);
        assert!(descriptor_from_row(row).is_none());
    }

    #[test]
    fn test_descriptor_from_row_unknown_type() {
        let row = (3, "legacy".to_string(), 99, None, 7, None);
        assert!(descriptor_from_row(row).is_none());
    }
}
