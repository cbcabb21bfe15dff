//! Filter type definitions
//!
//! The typed filter tree produced by the parser, the operator vocabulary, and
//! the compiled output with its bound parameters.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::{QueryAs, QueryScalar};

/// Predicate used when a filter is empty
pub const ALWAYS_TRUE: &str = "1=1";

/// Comparison operators understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Between,
    MinLength,
    MaxLength,
    Same,
    NotSame,
    SameDate,
    NotSameDate,
    Regex,
    IsBlank,
    IsNotBlank,
    ListInclude,
    ListNotInclude,
    RangeFrom,
    RangeTo,
    NowGreaterThan,
    NowLessThan,
    DateEq,
    DateNe,
    DateLt,
    DateGt,
    DateLte,
    DateGte,
}

impl Operator {
    /// Every operator, in table order
    pub const ALL: [Operator; 32] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Gt,
        Self::Lte,
        Self::Gte,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Between,
        Self::MinLength,
        Self::MaxLength,
        Self::Same,
        Self::NotSame,
        Self::SameDate,
        Self::NotSameDate,
        Self::Regex,
        Self::IsBlank,
        Self::IsNotBlank,
        Self::ListInclude,
        Self::ListNotInclude,
        Self::RangeFrom,
        Self::RangeTo,
        Self::NowGreaterThan,
        Self::NowLessThan,
        Self::DateEq,
        Self::DateNe,
        Self::DateLt,
        Self::DateGt,
        Self::DateLte,
        Self::DateGte,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    /// Wire token for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Contains => "contains",
            Self::NotContains => "notcontains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Between => "between",
            Self::MinLength => "minlength",
            Self::MaxLength => "maxlength",
            Self::Same => "same",
            Self::NotSame => "notsame",
            Self::SameDate => "samedate",
            Self::NotSameDate => "notsamedate",
            Self::Regex => "regex",
            Self::IsBlank => "isblank",
            Self::IsNotBlank => "isnotblank",
            Self::ListInclude => "listinclude",
            Self::ListNotInclude => "listnotinclude",
            Self::RangeFrom => "rangefrom",
            Self::RangeTo => "rangeto",
            Self::NowGreaterThan => "nowgreaterthan",
            Self::NowLessThan => "nowlessthan",
            Self::DateEq => "=date",
            Self::DateNe => "<>date",
            Self::DateLt => "<date",
            Self::DateGt => ">date",
            Self::DateLte => "<=date",
            Self::DateGte => ">=date",
        }
    }

    /// Operators whose operand names another field instead of a literal
    pub fn is_cross_field(&self) -> bool {
        matches!(
            self,
            Self::Same | Self::NotSame | Self::SameDate | Self::NotSameDate
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `and` / `or` token joining a group child to its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Literal, pair of literals, or list, as received
    Value(Value),
    /// Another field, for cross-field operators
    Field(String),
}

/// Leaf of the filter tree
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field_code: String,
    pub operator: Operator,
    pub operand: Operand,
}

/// Ordered, non-empty sequence of sub-expressions
///
/// Each child after the first remembers the token that preceded it on the
/// wire; the SQL keeps exactly that order and those tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub first: Box<FilterExpr>,
    pub rest: Vec<(Conjunction, FilterExpr)>,
}

/// Typed filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Condition(Condition),
    Group(Group),
}

/// A bound SQL parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Convert a JSON scalar; booleans become 1/0, containers and null are rejected
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

impl SqlParams {
    pub fn push(&mut self, value: impl Into<SqlValue>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bind every value, in order, onto a `query_as` statement
    pub fn bind_query_as<'q, O>(
        &'q self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.as_str()),
            };
        }
        query
    }

    /// Bind every value, in order, onto a `query_scalar` statement
    pub fn bind_scalar<'q, O>(
        &'q self,
        mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    ) -> QueryScalar<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.as_str()),
            };
        }
        query
    }
}

/// Output of one compilation
///
/// `predicate` contains `?` placeholders matching `params` in order. Join
/// fragments never contain placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub predicate: String,
    pub joins: Vec<String>,
    pub params: SqlParams,
}

impl CompiledQuery {
    /// Query for an empty filter: matches everything, needs nothing
    pub fn always_true() -> Self {
        Self {
            predicate: ALWAYS_TRUE.to_string(),
            joins: Vec::new(),
            params: SqlParams::default(),
        }
    }

    pub fn is_always_true(&self) -> bool {
        self.predicate == ALWAYS_TRUE && self.joins.is_empty()
    }

    /// Fragment appended to a base query's WHERE clause
    pub fn where_clause(&self) -> String {
        format!("AND ({})", self.predicate)
    }

    /// Join fragments, space separated, for splicing after the FROM table
    pub fn join_clause(&self) -> String {
        self.joins.join(" ")
    }

    /// Assemble `SELECT <select> FROM <from> <joins> WHERE <base_where> AND (<predicate>)`
    ///
    /// Parameters for `base_where` must be bound before `self.params`.
    pub fn apply(&self, select: &str, from: &str, base_where: &str) -> String {
        let mut sql = format!("SELECT {select} FROM {from}");
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.join_clause());
        }
        sql.push_str(" WHERE ");
        sql.push_str(base_where);
        sql.push(' ');
        sql.push_str(&self.where_clause());
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_tokens_roundtrip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_token(op.as_str()), Some(op));
        }
        assert_eq!(Operator::from_token("like"), None);
        assert_eq!(Operator::from_token("CONTAINS"), None);
    }

    #[test]
    fn cross_field_operators() {
        let cross: Vec<_> = Operator::ALL
            .into_iter()
            .filter(Operator::is_cross_field)
            .map(|op| op.as_str())
            .collect();
        assert_eq!(cross, vec!["same", "notsame", "samedate", "notsamedate"]);
    }

    #[test]
    fn conjunction_tokens() {
        assert_eq!(Conjunction::from_token("and"), Some(Conjunction::And));
        assert_eq!(Conjunction::from_token("or"), Some(Conjunction::Or));
        assert_eq!(Conjunction::from_token("AND"), None);
        assert_eq!(Conjunction::Or.as_sql(), " or ");
    }

    #[test]
    fn sql_value_from_json() {
        assert_eq!(SqlValue::from_json(&json!(18)), Some(SqlValue::Int(18)));
        assert_eq!(SqlValue::from_json(&json!(1.5)), Some(SqlValue::Float(1.5)));
        assert_eq!(SqlValue::from_json(&json!("x")), Some(SqlValue::Text("x".into())));
        assert_eq!(SqlValue::from_json(&json!(true)), Some(SqlValue::Int(1)));
        assert_eq!(SqlValue::from_json(&json!(null)), None);
        assert_eq!(SqlValue::from_json(&json!([1])), None);
    }

    #[test]
    fn sql_params_serialize_as_plain_array() {
        let mut params = SqlParams::default();
        params.push(1);
        params.push("abc");
        params.values.push(SqlValue::Float(0.5));
        assert_eq!(serde_json::to_value(&params).unwrap(), json!([1, "abc", 0.5]));
    }

    #[test]
    fn compiled_query_always_true() {
        let query = CompiledQuery::always_true();
        assert!(query.is_always_true());
        assert_eq!(query.where_clause(), "AND (1=1)");
        assert_eq!(query.join_clause(), "");
    }

    #[test]
    fn compiled_query_apply_without_joins() {
        let query = CompiledQuery {
            predicate: "(reservations.age > ?)".to_string(),
            joins: vec![],
            params: SqlParams::default(),
        };
        assert_eq!(
            query.apply("COUNT(*)", "reservations", "reservations.project_id = ?"),
            "SELECT COUNT(*) FROM reservations WHERE reservations.project_id = ? AND ((reservations.age > ?))"
        );
    }

    #[test]
    fn compiled_query_apply_with_joins() {
        let query = CompiledQuery {
            predicate: "(LOCATE(?, f1.value_text) > 0)".to_string(),
            joins: vec![
                "LEFT OUTER JOIN custom_field_values AS f1 ON r.id = f1.reservation_id AND f1.field_id = 5".to_string(),
                "LEFT OUTER JOIN custom_field_values AS f2 ON r.id = f2.reservation_id AND f2.field_id = 6".to_string(),
            ],
            params: SqlParams::default(),
        };
        let sql = query.apply("r.id", "reservations r", "1=1");
        assert_eq!(
            sql,
            "SELECT r.id FROM reservations r \
             LEFT OUTER JOIN custom_field_values AS f1 ON r.id = f1.reservation_id AND f1.field_id = 5 \
             LEFT OUTER JOIN custom_field_values AS f2 ON r.id = f2.reservation_id AND f2.field_id = 6 \
             WHERE 1=1 AND ((LOCATE(?, f1.value_text) > 0))"
        );
    }
}
