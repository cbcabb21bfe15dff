//! In-memory field catalog
//!
//! Loaded from a JSON array of catalog records. Applies the same scope
//! visibility and ordering rules as the MySQL catalog, which makes it usable
//! for offline compilation and for tests.

use std::fs;
use std::path::Path;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::FieldCatalog;
use crate::data::types::FieldDescriptor;

#[derive(Debug, Clone, Default)]
pub struct StaticFieldCatalog {
    fields: Vec<FieldDescriptor>,
}

impl StaticFieldCatalog {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Parse a JSON array of catalog records
    ///
    /// Records whose column is not a plain identifier are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let fields: Vec<FieldDescriptor> = serde_json::from_str(json)?;
        let fields = fields
            .into_iter()
            .filter(|field| {
                let usable = field.has_valid_column();
                if !usable {
                    tracing::warn!(
                        field_code = %field.field_code,
                        column = ?field.column,
                        "Column is not a plain identifier, skipping field"
                    );
                }
                usable
            })
            .collect();
        Ok(Self::new(fields))
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, DataError> {
        tracing::debug!(path = %path.display(), "Loading static field catalog");
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        tracing::debug!(fields = catalog.len(), "Static field catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[async_trait]
impl FieldCatalog for StaticFieldCatalog {
    async fn lookup_fields(
        &self,
        scope_id: i64,
        codes: &[String],
    ) -> Result<Vec<FieldDescriptor>, DataError> {
        let mut found = Vec::new();
        for code in codes {
            let mut matches: Vec<&FieldDescriptor> = self
                .fields
                .iter()
                .filter(|f| &f.field_code == code && f.visible_in(scope_id))
                .collect();
            matches.sort_by_key(|f| f.scope_id);
            found.extend(matches.into_iter().cloned());
        }
        Ok(found)
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {"field_id": 1, "field_code": "status", "field_type": "boolean", "column_name": "reservations.status"},
        {"field_id": 2, "field_code": "age", "field_type": "number", "column_name": "reservations.age"},
        {"field_id": 10, "field_code": "diet", "field_type": "list", "scope_id": 7},
        {"field_id": 11, "field_code": "diet", "field_type": "list", "scope_id": 8},
        {"field_id": 12, "field_code": "age", "field_type": "number", "scope_id": 7}
    ]"#;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lookup_preserves_requested_order() {
        let catalog = StaticFieldCatalog::from_json_str(CATALOG).unwrap();
        let fields = catalog
            .lookup_fields(7, &codes(&["diet", "status"]))
            .await
            .unwrap();
        let found: Vec<_> = fields.iter().map(|f| f.field_code.as_str()).collect();
        assert_eq!(found, vec!["diet", "status"]);
        assert_eq!(fields[0].field_id, 10);
    }

    #[tokio::test]
    async fn test_lookup_filters_other_scopes() {
        let catalog = StaticFieldCatalog::from_json_str(CATALOG).unwrap();
        let fields = catalog.lookup_fields(9, &codes(&["diet"])).await.unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_global_before_scoped() {
        let catalog = StaticFieldCatalog::from_json_str(CATALOG).unwrap();
        let fields = catalog.lookup_fields(7, &codes(&["age"])).await.unwrap();
        let ids: Vec<_> = fields.iter().map(|f| f.field_id).collect();
        assert_eq!(ids, vec![2, 12]);
    }

    #[tokio::test]
    async fn test_lookup_empty_codes() {
        let catalog = StaticFieldCatalog::from_json_str(CATALOG).unwrap();
        assert!(catalog.lookup_fields(7, &[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = StaticFieldCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_unsafe_columns_are_skipped() {
        let catalog = StaticFieldCatalog::from_json_str(
            r#"[
                {"field_id": 1, "field_code": "status", "field_type": "text", "column_name": "status`; --"},
                {"field_id": 2, "field_code": "age", "field_type": "number", "column_name": "reservations.age"}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_load_invalid_json() {
        let err = StaticFieldCatalog::from_json_str("[{\"field_id\": 1}]").unwrap_err();
        assert!(matches!(err, DataError::InvalidCatalog(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StaticFieldCatalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
