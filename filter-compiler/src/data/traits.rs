//! Field catalog trait
//!
//! The catalog maps stable field codes to their physical storage. The filter
//! compiler only ever reads it, once per compilation, in a single batch.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::FieldDescriptor;

/// Batched, scope-aware lookup of field descriptors
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    /// Fetch descriptors for `codes` visible in `scope_id`
    ///
    /// Visible means `scope_id == 0` (global) or the given scope. Rows come
    /// back in the order of `codes`; when a code exists both globally and in
    /// the scope, the global row precedes the scoped one.
    async fn lookup_fields(
        &self,
        scope_id: i64,
        codes: &[String],
    ) -> Result<Vec<FieldDescriptor>, DataError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
