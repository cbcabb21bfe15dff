//! Filter compilation service
//!
//! Ties parsing, the single catalog round trip, and compilation together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::builder::{CompileOptions, CustomFieldTable, FilterCompiler, field_map};
use super::error::FilterError;
use super::parser::{collect_field_codes, parse_filter};
use super::types::CompiledQuery;
use crate::data::traits::FieldCatalog;

/// Compiles wire filters for one catalog
///
/// Holds no per-call state; concurrent `compile` calls are independent.
#[derive(Clone)]
pub struct FilterService {
    catalog: Arc<dyn FieldCatalog>,
    custom_fields: CustomFieldTable,
    time_zone: Tz,
}

impl FilterService {
    pub fn new(catalog: Arc<dyn FieldCatalog>, custom_fields: CustomFieldTable, time_zone: Tz) -> Self {
        Self {
            catalog,
            custom_fields,
            time_zone,
        }
    }

    /// Same catalog and zone, joining custom fields through `custom_fields`
    pub fn with_custom_fields(&self, custom_fields: CustomFieldTable) -> Self {
        Self {
            custom_fields,
            ..self.clone()
        }
    }

    /// Compile `wire` for `scope_id` at the current time
    pub async fn compile(&self, scope_id: i64, wire: &Value) -> Result<CompiledQuery, FilterError> {
        self.compile_at(scope_id, wire, Utc::now()).await
    }

    /// Compile with an explicit "now" for time-relative operators
    pub async fn compile_at(
        &self,
        scope_id: i64,
        wire: &Value,
        now: DateTime<Utc>,
    ) -> Result<CompiledQuery, FilterError> {
        let Some(expr) = parse_filter(wire)? else {
            tracing::debug!(scope_id, "Empty filter, matching everything");
            return Ok(CompiledQuery::always_true());
        };

        let codes = collect_field_codes(wire);
        let fields = self
            .catalog
            .lookup_fields(scope_id, &codes)
            .await
            .map_err(|e| {
                tracing::warn!(
                    backend = self.catalog.backend_name(),
                    scope_id,
                    transient = e.is_transient(),
                    error = %e,
                    "Field catalog lookup failed"
                );
                FilterError::CatalogUnavailable(e)
            })?;

        // Catalogs already filter by scope; re-check so a lax backend cannot widen it
        let fields = field_map(
            fields
                .into_iter()
                .filter(|field| field.visible_in(scope_id))
                .collect(),
        );

        let options = CompileOptions::new(self.custom_fields.clone(), self.time_zone).with_now(now);
        let query = FilterCompiler::new(options).compile(Some(&expr), &fields)?;

        tracing::debug!(
            scope_id,
            codes = ?codes,
            resolved = fields.len(),
            joins = query.joins.len(),
            params = query.params.len(),
            "Compiled filter"
        );
        tracing::trace!(
            predicate = %query.predicate,
            joins = %query.join_clause(),
            "Compiled filter SQL"
        );

        Ok(query)
    }
}
