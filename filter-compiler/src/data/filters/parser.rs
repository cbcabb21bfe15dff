//! Wire filter parsing
//!
//! A wire filter is a JSON nested array. `["code", "op", operand]` is a
//! condition unless its middle element is `"and"`/`"or"`; every other array
//! alternates sub-expressions and `and`/`or` tokens.

use std::collections::HashSet;

use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, Conjunction, FilterExpr, Group, Operand, Operator};

/// Maximum size of filter JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Decode filter JSON received at the boundary
pub fn parse_filter_json(json_str: &str) -> Result<Value, FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::malformed_shape(format!(
            "filter JSON exceeds maximum size of {} bytes",
            MAX_FILTER_JSON_SIZE
        )));
    }

    serde_json::from_str(json_str).map_err(|e| FilterError::malformed_shape(e.to_string()))
}

/// Field code without its `Table.` qualifier
pub fn strip_qualifier(code: &str) -> &str {
    match code.rfind('.') {
        Some(idx) => &code[idx + 1..],
        None => code,
    }
}

fn is_conjunction(value: &Value) -> bool {
    value.as_str().and_then(Conjunction::from_token).is_some()
}

fn is_condition(items: &[Value]) -> bool {
    items.len() == 3 && !is_conjunction(&items[1])
}

/// Build the typed tree; `null` and `[]` mean "no filter"
pub fn parse_filter(wire: &Value) -> Result<Option<FilterExpr>, FilterError> {
    match wire {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Array(items) => parse_node(items).map(Some),
        other => Err(FilterError::malformed_shape(format!(
            "filter must be an array, got {}",
            other
        ))),
    }
}

fn parse_node(items: &[Value]) -> Result<FilterExpr, FilterError> {
    if is_condition(items) {
        parse_condition(items).map(FilterExpr::Condition)
    } else {
        parse_group(items).map(FilterExpr::Group)
    }
}

fn parse_condition(items: &[Value]) -> Result<Condition, FilterError> {
    let [code, token, operand] = items else {
        return Err(FilterError::malformed_shape("condition must have three elements"));
    };

    let field_code = code
        .as_str()
        .map(strip_qualifier)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            FilterError::malformed_shape(format!("condition field code must be a string, got {}", code))
        })?
        .to_string();

    let token = token.as_str().ok_or_else(|| {
        FilterError::malformed_shape(format!("operator for {} must be a string", field_code))
    })?;

    let operator = Operator::from_token(token)
        .ok_or_else(|| FilterError::unsupported_operator(&field_code, token))?;

    let operand = if operator.is_cross_field() {
        let other = operand
            .as_str()
            .map(strip_qualifier)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                FilterError::malformed_operand(&field_code, token, "expected a field code")
            })?;
        Operand::Field(other.to_string())
    } else {
        Operand::Value(operand.clone())
    };

    Ok(Condition {
        field_code,
        operator,
        operand,
    })
}

fn parse_child(value: &Value) -> Result<FilterExpr, FilterError> {
    match value {
        Value::Array(items) if items.is_empty() => {
            Err(FilterError::malformed_shape("empty sub-expression"))
        }
        Value::Array(items) => parse_node(items),
        other => Err(FilterError::malformed_shape(format!(
            "expected a sub-expression, got {}",
            other
        ))),
    }
}

fn parse_group(items: &[Value]) -> Result<Group, FilterError> {
    let mut children = items.iter();

    let first = match children.next() {
        Some(value) => parse_child(value)?,
        None => return Err(FilterError::malformed_shape("empty group")),
    };

    let mut rest = Vec::new();
    while let Some(token) = children.next() {
        let conjunction = token
            .as_str()
            .and_then(Conjunction::from_token)
            .ok_or_else(|| {
                FilterError::malformed_shape(format!(
                    "expected 'and' or 'or' between sub-expressions, got {}",
                    token
                ))
            })?;

        let Some(next) = children.next() else {
            return Err(FilterError::malformed_shape(format!(
                "dangling {} at end of group",
                token
            )));
        };
        rest.push((conjunction, parse_child(next)?));
    }

    Ok(Group {
        first: Box::new(first),
        rest,
    })
}

/// Every field code referenced by the filter, in first-seen order
///
/// Includes the right-hand codes of cross-field operators. Tolerates shapes
/// the parser would reject; it only decides what to fetch.
pub fn collect_field_codes(wire: &Value) -> Vec<String> {
    let mut collector = CodeCollector::default();
    if let Value::Array(items) = wire {
        collector.visit(items);
    }
    collector.codes
}

#[derive(Default)]
struct CodeCollector {
    codes: Vec<String>,
    seen: HashSet<String>,
}

impl CodeCollector {
    fn add(&mut self, code: &str) {
        let code = strip_qualifier(code);
        if !code.is_empty() && self.seen.insert(code.to_string()) {
            self.codes.push(code.to_string());
        }
    }

    fn visit(&mut self, items: &[Value]) {
        if is_condition(items) {
            if let Some(code) = items[0].as_str() {
                self.add(code);
            }
            let cross_field = items[1]
                .as_str()
                .and_then(Operator::from_token)
                .is_some_and(|op| op.is_cross_field());
            if cross_field {
                if let Some(other) = items[2].as_str() {
                    self.add(other);
                }
            }
            return;
        }

        for item in items {
            if let Value::Array(child) = item {
                self.visit(child);
            }
        }
    }
}
