//! Operator semantics table
//!
//! Renders one condition's boolean expression for an already resolved column.
//! Literal operands are pushed onto the parameter list and referenced by `?`;
//! only the column reference and compiler-chosen constants reach the SQL text.

use serde_json::{Value, json};

use super::builder::CompileOptions;
use super::error::FilterError;
use super::patterns::RegexClass;
use super::types::{Operator, SqlParams, SqlValue};
use crate::data::types::{FieldDescriptor, FieldType, StorageKind};
use crate::utils::sql::escape_like_pattern;
use crate::utils::time::{
    SECONDS_PER_DAY, day_bounds, epoch_date, literal_date, parse_epoch_seconds, start_of_day,
};

/// Render epoch seconds stored in `expr` as a `%Y-%m-%d` calendar date,
/// shifted by `offset` seconds into local time
fn calendar_date(expr: &str, offset: i64) -> String {
    let shifted = match offset {
        0 => expr.to_string(),
        o if o > 0 => format!("({expr} + {o})"),
        o => format!("({expr} - {})", -o),
    };
    format!("DATE_FORMAT(DATE_ADD('1970-01-01', INTERVAL {shifted} SECOND), '%Y-%m-%d')")
}

/// NULL-or-empty test; numeric storage has no empty string
fn blank_test(column: &str, storage: StorageKind) -> String {
    match storage {
        StorageKind::Text | StorageKind::List => format!("{column} IS NULL OR {column} = ''"),
        StorageKind::Boolean | StorageKind::Numeric => format!("{column} IS NULL"),
    }
}

fn not_blank_test(column: &str, storage: StorageKind) -> String {
    match storage {
        StorageKind::Text | StorageKind::List => {
            format!("{column} IS NOT NULL AND {column} <> ''")
        }
        StorageKind::Boolean | StorageKind::Numeric => format!("{column} IS NOT NULL"),
    }
}

fn is_empty_operand(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Catalog list ids: 8 hex characters are string ids, everything else numeric
fn list_id(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_i64().map(Value::from),
        Value::String(s) => {
            let s = s.trim();
            if s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit()) {
                Some(Value::String(s.to_string()))
            } else {
                s.parse::<i64>().ok().map(Value::from)
            }
        }
        _ => None,
    }
}

/// One condition being rendered
pub(super) struct OperatorCall<'a> {
    pub operator: Operator,
    pub field: &'a FieldDescriptor,
    pub column: &'a str,
    pub options: &'a CompileOptions,
}

impl OperatorCall<'_> {
    fn malformed(&self, reason: impl Into<String>) -> FilterError {
        FilterError::malformed_operand(&self.field.field_code, self.operator.as_str(), reason)
    }

    fn storage(&self) -> StorageKind {
        self.field.field_type.storage()
    }

    fn scalar(&self, value: &Value) -> Result<SqlValue, FilterError> {
        SqlValue::from_json(value).ok_or_else(|| self.malformed(format!("expected a scalar, got {value}")))
    }

    fn text(&self, value: &Value) -> Result<String, FilterError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.malformed(format!("expected text, got {other}"))),
        }
    }

    fn integer(&self, value: &Value) -> Result<i64, FilterError> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.malformed(format!("expected an integer, got {value}")))
    }

    fn truthy(&self, value: &Value) -> Result<bool, FilterError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            Value::String(s) => match s.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(self.malformed(format!("expected a boolean, got {value}"))),
            },
            other => Err(self.malformed(format!("expected a boolean, got {other}"))),
        }
    }

    /// Render against a literal operand
    pub fn render_literal(&self, operand: &Value, params: &mut SqlParams) -> Result<String, FilterError> {
        let c = self.column;

        match self.operator {
            Operator::Eq => self.equality(operand, params, false),
            Operator::Ne => self.equality(operand, params, true),
            Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
                params.push(self.scalar(operand)?);
                Ok(format!("{c} {} ?", self.operator))
            }
            Operator::Contains => {
                params.push(self.text(operand)?);
                Ok(format!("LOCATE(?, {c}) > 0"))
            }
            Operator::NotContains => {
                params.push(self.text(operand)?);
                Ok(format!("LOCATE(?, {c}) = 0 OR {c} IS NULL"))
            }
            Operator::StartsWith => {
                params.push(format!("{}%", escape_like_pattern(&self.text(operand)?)));
                Ok(format!("{c} LIKE ?"))
            }
            Operator::EndsWith => {
                params.push(format!("%{}", escape_like_pattern(&self.text(operand)?)));
                Ok(format!("{c} LIKE ?"))
            }
            Operator::Between => self.between(operand, params),
            Operator::MinLength | Operator::MaxLength => {
                let length = self.integer(operand)?;
                if length < 0 {
                    return Err(self.malformed("length must not be negative"));
                }
                params.push(length);
                let cmp = if self.operator == Operator::MinLength { ">=" } else { "<=" };
                Ok(format!("CHAR_LENGTH({c}) {cmp} ?"))
            }
            Operator::Regex => self.regex(operand, params),
            Operator::IsBlank => Ok(blank_test(c, self.storage())),
            Operator::IsNotBlank => Ok(not_blank_test(c, self.storage())),
            Operator::ListInclude => self.list_membership(operand, params),
            Operator::ListNotInclude => {
                let membership = self.list_membership(operand, params)?;
                Ok(format!("{c} IS NULL OR NOT {membership}"))
            }
            Operator::RangeFrom => self.relative_range(operand, params, ">="),
            Operator::RangeTo => self.relative_range(operand, params, "<="),
            Operator::NowGreaterThan => {
                params.push(self.options.now.timestamp());
                Ok(format!("{c} < ?"))
            }
            Operator::NowLessThan => {
                params.push(self.options.now.timestamp());
                Ok(format!("{c} > ?"))
            }
            Operator::DateEq
            | Operator::DateNe
            | Operator::DateLt
            | Operator::DateGt
            | Operator::DateLte
            | Operator::DateGte => self.date_compare(operand, params),
            Operator::Same | Operator::NotSame | Operator::SameDate | Operator::NotSameDate => {
                Err(self.malformed("expected a field code"))
            }
        }
    }

    /// Render a column-to-column comparison
    pub fn render_columns(&self, other: &str) -> Result<String, FilterError> {
        let c = self.column;
        let offset = self.options.utc_offset();

        match self.operator {
            Operator::Same => Ok(format!(
                "BINARY COALESCE({c}, '') = BINARY COALESCE({other}, '')"
            )),
            Operator::NotSame => Ok(format!(
                "BINARY COALESCE({c}, '') <> BINARY COALESCE({other}, '')"
            )),
            Operator::SameDate => Ok(format!(
                "{} = {}",
                calendar_date(&format!("COALESCE({c}, 0)"), offset),
                calendar_date(&format!("COALESCE({other}, 0)"), offset)
            )),
            Operator::NotSameDate => Ok(format!(
                "{} <> {}",
                calendar_date(&format!("COALESCE({c}, 0)"), offset),
                calendar_date(&format!("COALESCE({other}, 0)"), offset)
            )),
            _ => Err(self.malformed("expected a literal operand, got a field code")),
        }
    }

    fn equality(&self, operand: &Value, params: &mut SqlParams, negate: bool) -> Result<String, FilterError> {
        let c = self.column;

        if is_empty_operand(operand) {
            let storage = self.storage();
            return Ok(if negate {
                not_blank_test(c, storage)
            } else {
                blank_test(c, storage)
            });
        }

        if self.field.field_type == FieldType::Boolean {
            let flag = if self.truthy(operand)? { 1 } else { 0 };
            return Ok(if negate {
                format!("{c} <> {flag} OR {c} IS NULL")
            } else {
                format!("{c} = {flag}")
            });
        }

        params.push(self.scalar(operand)?);
        Ok(if negate {
            format!("{c} <> ? OR {c} IS NULL")
        } else {
            format!("{c} = ?")
        })
    }

    fn between(&self, operand: &Value, params: &mut SqlParams) -> Result<String, FilterError> {
        let bounds = match operand {
            Value::Array(items) if items.len() == 2 => items,
            Value::Array(items) => {
                return Err(self.malformed(format!(
                    "expected two bounds, got {}",
                    items.len()
                )));
            }
            other => return Err(self.malformed(format!("expected two bounds, got {other}"))),
        };

        for bound in bounds {
            let value = match (self.field.field_type, bound) {
                (FieldType::Date, Value::String(s)) => {
                    let secs = parse_epoch_seconds(s, self.options.time_zone)
                        .ok_or_else(|| self.malformed(format!("unparseable date '{s}'")))?;
                    SqlValue::Int(secs)
                }
                _ => self.scalar(bound)?,
            };
            params.push(value);
        }

        Ok(format!("{} BETWEEN ? AND ?", self.column))
    }

    fn regex(&self, operand: &Value, params: &mut SqlParams) -> Result<String, FilterError> {
        let class = RegexClass::from_operand(operand)
            .ok_or_else(|| self.malformed(format!("unknown regex class {operand}")))?;
        params.push(class.pattern());

        let c = self.column;
        Ok(if class.accepts_blank() {
            format!("{} OR {c} REGEXP ?", blank_test(c, self.storage()))
        } else {
            format!("{c} REGEXP ?")
        })
    }

    fn list_membership(&self, operand: &Value, params: &mut SqlParams) -> Result<String, FilterError> {
        let ids: Vec<&Value> = match operand {
            Value::Array(items) => items.iter().collect(),
            scalar => vec![scalar],
        };
        if ids.is_empty() {
            return Err(self.malformed("expected at least one list id"));
        }

        let c = self.column;
        let mut tests = Vec::with_capacity(ids.len() * 2);
        for raw in ids {
            let id = list_id(raw).ok_or_else(|| self.malformed(format!("invalid list id {raw}")))?;
            params.push(id.to_string());
            params.push(json!({ "id": id }).to_string());
            tests.push(format!("JSON_CONTAINS({c}, ?)"));
            tests.push(format!("JSON_CONTAINS({c}, ?)"));
        }

        Ok(format!("({})", tests.join(" OR ")))
    }

    fn relative_range(&self, operand: &Value, params: &mut SqlParams, cmp: &str) -> Result<String, FilterError> {
        let raw = operand
            .as_str()
            .map(str::trim)
            .ok_or_else(|| self.malformed(format!("expected an anchored offset, got {operand}")))?;
        let mut chars = raw.chars();
        let anchor = chars.next();
        let days: i64 = chars
            .as_str()
            .trim()
            .parse()
            .map_err(|_| self.malformed(format!("invalid day offset in '{raw}'")))?;
        let offset = days
            .checked_mul(SECONDS_PER_DAY)
            .ok_or_else(|| self.malformed(format!("day offset out of range in '{raw}'")))?;

        let now = self.options.now.timestamp();
        let today = start_of_day(self.options.now, self.options.time_zone);
        let target = match anchor {
            Some('a') => now.checked_sub(offset),
            Some('b') => today.checked_sub(offset),
            Some('c') => now.checked_add(offset),
            Some('d') => today.checked_add(offset),
            _ => return Err(self.malformed(format!("unknown anchor in '{raw}'"))),
        }
        .ok_or_else(|| self.malformed(format!("day offset out of range in '{raw}'")))?;

        params.push(target);
        Ok(format!("{} {cmp} ?", self.column))
    }

    /// Calendar-day comparison in the configured zone, rendered as a range
    /// over the stored epoch seconds
    fn date_compare(&self, operand: &Value, params: &mut SqlParams) -> Result<String, FilterError> {
        let tz = self.options.time_zone;
        let date = match operand {
            Value::String(s) => literal_date(s, tz),
            Value::Number(n) => n.as_i64().and_then(|secs| epoch_date(secs, tz)),
            _ => None,
        }
        .ok_or_else(|| self.malformed(format!("unparseable date {operand}")))?;
        let (start, end) =
            day_bounds(date, tz).ok_or_else(|| self.malformed(format!("date {date} out of range")))?;

        let c = self.column;
        let sql = match self.operator {
            Operator::DateEq => {
                params.push(start);
                params.push(end);
                format!("{c} >= ? AND {c} < ?")
            }
            Operator::DateNe => {
                params.push(start);
                params.push(end);
                format!("{c} < ? OR {c} >= ?")
            }
            Operator::DateLt => {
                params.push(start);
                format!("{c} < ?")
            }
            Operator::DateGt => {
                params.push(end);
                format!("{c} >= ?")
            }
            Operator::DateLte => {
                params.push(end);
                format!("{c} < ?")
            }
            Operator::DateGte => {
                params.push(start);
                format!("{c} >= ?")
            }
            _ => return Err(self.malformed("expected a date comparison")),
        };
        Ok(sql)
    }
}
