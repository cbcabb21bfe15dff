//! FieldCatalog trait implementation for MySQL

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::data::error::DataError;
use crate::data::traits::FieldCatalog;
use crate::data::types::FieldDescriptor;

use super::repositories::field;

/// Field catalog backed by a MySQL table
///
/// Holds a clone of the pool handle; the pool itself is owned by the caller.
#[derive(Clone)]
pub struct MysqlFieldCatalog {
    pool: MySqlPool,
    table: String,
}

impl MysqlFieldCatalog {
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl FieldCatalog for MysqlFieldCatalog {
    async fn lookup_fields(
        &self,
        scope_id: i64,
        codes: &[String],
    ) -> Result<Vec<FieldDescriptor>, DataError> {
        field::lookup_fields(&self.pool, &self.table, scope_id, codes).await
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}
