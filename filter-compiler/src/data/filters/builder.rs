//! SQL filter builder
//!
//! Walks a parsed filter tree depth-first, left to right, and produces the
//! parenthesized predicate, the custom field joins it needs, and the bound
//! parameters. All state lives in a `CompilationContext` owned by one call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::operators::OperatorCall;
use super::types::{CompiledQuery, Condition, FilterExpr, Group, Operand, SqlParams};
use crate::core::constants::{
    DEFAULT_CUSTOM_FIELD_BOOLEAN_COLUMN, DEFAULT_CUSTOM_FIELD_FIELD_COLUMN,
    DEFAULT_CUSTOM_FIELD_KEY_COLUMN, DEFAULT_CUSTOM_FIELD_LIST_COLUMN,
    DEFAULT_CUSTOM_FIELD_NUMERIC_COLUMN, DEFAULT_CUSTOM_FIELD_PARENT_KEY,
    DEFAULT_CUSTOM_FIELD_TABLE, DEFAULT_CUSTOM_FIELD_TEXT_COLUMN,
};
use crate::data::types::{ColumnRef, FieldDescriptor, StorageKind};
use crate::utils::sql::requalify;
use crate::utils::time::utc_offset_seconds;

/// Layout of the per-entity custom field value table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomFieldTable {
    /// Attribute table name
    pub table: String,
    /// Qualified key of the filtered entity, e.g. `reservations.reservation_id`
    pub parent_key: String,
    /// Column in `table` referencing the entity
    pub key_column: String,
    /// Column in `table` holding the catalog field id
    pub field_column: String,
    pub text_column: String,
    pub list_column: String,
    pub boolean_column: String,
    pub numeric_column: String,
}

impl Default for CustomFieldTable {
    fn default() -> Self {
        Self {
            table: DEFAULT_CUSTOM_FIELD_TABLE.to_string(),
            parent_key: DEFAULT_CUSTOM_FIELD_PARENT_KEY.to_string(),
            key_column: DEFAULT_CUSTOM_FIELD_KEY_COLUMN.to_string(),
            field_column: DEFAULT_CUSTOM_FIELD_FIELD_COLUMN.to_string(),
            text_column: DEFAULT_CUSTOM_FIELD_TEXT_COLUMN.to_string(),
            list_column: DEFAULT_CUSTOM_FIELD_LIST_COLUMN.to_string(),
            boolean_column: DEFAULT_CUSTOM_FIELD_BOOLEAN_COLUMN.to_string(),
            numeric_column: DEFAULT_CUSTOM_FIELD_NUMERIC_COLUMN.to_string(),
        }
    }
}

impl CustomFieldTable {
    pub fn storage_column(&self, storage: StorageKind) -> &str {
        match storage {
            StorageKind::Text => &self.text_column,
            StorageKind::List => &self.list_column,
            StorageKind::Boolean => &self.boolean_column,
            StorageKind::Numeric => &self.numeric_column,
        }
    }

    /// Same layout keyed from `to_table` when the parent key is qualified by
    /// `from_table`
    pub fn for_parent_table(&self, from_table: &str, to_table: &str) -> Self {
        Self {
            parent_key: requalify(&self.parent_key, from_table, to_table),
            ..self.clone()
        }
    }

    /// Join fragment attaching one field's value row under `alias`
    pub fn join(&self, alias: &str, field_id: i64) -> String {
        format!(
            "LEFT OUTER JOIN {table} AS {alias} ON {parent} = {alias}.{key} AND {alias}.{field} = {field_id}",
            table = self.table,
            parent = self.parent_key,
            key = self.key_column,
            field = self.field_column,
        )
    }
}

/// Settings shared by every condition of one compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub custom_fields: CustomFieldTable,
    /// Zone used to read date literals and to find the start of today
    pub time_zone: Tz,
    /// Instant used by every time-relative operator in this compilation
    pub now: DateTime<Utc>,
}

impl CompileOptions {
    /// Options stamped with the current time
    pub fn new(custom_fields: CustomFieldTable, time_zone: Tz) -> Self {
        Self {
            custom_fields,
            time_zone,
            now: Utc::now(),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Offset of the configured zone from UTC at `now`, in seconds
    pub fn utc_offset(&self) -> i64 {
        utc_offset_seconds(self.now, self.time_zone)
    }
}

/// Resolved catalog fields keyed by field code
pub type FieldMap = HashMap<String, FieldDescriptor>;

/// Index catalog rows by code; later rows win, so scoped rows listed after
/// global ones take precedence
pub fn field_map(fields: Vec<FieldDescriptor>) -> FieldMap {
    fields
        .into_iter()
        .map(|field| (field.field_code.clone(), field))
        .collect()
}

/// Compiles parsed filters into MySQL fragments
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    options: CompileOptions,
}

impl FilterCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile `expr` against `fields`; `None` compiles to `1=1`
    ///
    /// On error nothing is returned; the partially built context is dropped.
    pub fn compile(
        &self,
        expr: Option<&FilterExpr>,
        fields: &FieldMap,
    ) -> Result<CompiledQuery, FilterError> {
        let Some(expr) = expr else {
            return Ok(CompiledQuery::always_true());
        };

        let mut ctx = CompilationContext::new(fields, &self.options);
        let predicate = ctx.compile_expr(expr)?;

        Ok(CompiledQuery {
            predicate,
            joins: ctx.joins,
            params: ctx.params,
        })
    }
}

/// Mutable state of a single compilation
struct CompilationContext<'a> {
    fields: &'a FieldMap,
    options: &'a CompileOptions,
    /// Last join alias number handed out
    alias_counter: usize,
    joins: Vec<String>,
    params: SqlParams,
}

impl<'a> CompilationContext<'a> {
    fn new(fields: &'a FieldMap, options: &'a CompileOptions) -> Self {
        Self {
            fields,
            options,
            alias_counter: 0,
            joins: Vec::new(),
            params: SqlParams::default(),
        }
    }

    fn compile_expr(&mut self, expr: &FilterExpr) -> Result<String, FilterError> {
        match expr {
            FilterExpr::Condition(condition) => self.compile_condition(condition),
            FilterExpr::Group(group) => self.compile_group(group),
        }
    }

    fn compile_group(&mut self, group: &Group) -> Result<String, FilterError> {
        let mut sql = String::from("(");
        sql.push_str(&self.compile_expr(&group.first)?);
        for (conjunction, child) in &group.rest {
            sql.push_str(conjunction.as_sql());
            sql.push_str(&self.compile_expr(child)?);
        }
        sql.push(')');
        Ok(sql)
    }

    fn compile_condition(&mut self, condition: &Condition) -> Result<String, FilterError> {
        let (field, column) = self.resolve(&condition.field_code)?;
        let call = OperatorCall {
            operator: condition.operator,
            field,
            column: &column,
            options: self.options,
        };

        let body = match &condition.operand {
            Operand::Value(value) => call.render_literal(value, &mut self.params)?,
            Operand::Field(other_code) => {
                let (_, other) = self.resolve(other_code)?;
                call.render_columns(&other)?
            }
        };

        Ok(format!("({body})"))
    }

    /// Look up a field and produce its column reference, allocating a join
    /// for custom fields
    fn resolve(&mut self, code: &str) -> Result<(&'a FieldDescriptor, String), FilterError> {
        let fields = self.fields;
        let field = fields
            .get(code)
            .ok_or_else(|| FilterError::unknown_field(code))?;

        let column = match &field.column {
            ColumnRef::Fixed(column) => column.clone(),
            ColumnRef::Custom => {
                self.alias_counter += 1;
                let alias = format!("f{}", self.alias_counter);
                let custom = &self.options.custom_fields;
                self.joins.push(custom.join(&alias, field.field_id));
                tracing::trace!(
                    field_code = %code,
                    field_id = field.field_id,
                    alias = %alias,
                    "Allocated custom field join"
                );
                format!("{alias}.{}", custom.storage_column(field.field_type.storage()))
            }
        };

        Ok((field, column))
    }
}
