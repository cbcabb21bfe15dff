//! Reservation queries driven by compiled filters
//!
//! The scope condition is bound first, followed by the filter's parameters,
//! matching the placeholder order of the assembled statement.

use sqlx::MySqlPool;

use crate::data::error::DataError;
use crate::data::filters::CompiledQuery;

/// Table and scope column of the filtered entity
#[derive(Debug, Clone, Copy)]
pub struct EntityTarget<'a> {
    pub table: &'a str,
    pub scope_column: &'a str,
}

fn count_sql(target: EntityTarget<'_>, filter: &CompiledQuery) -> String {
    filter.apply(
        "COUNT(*)",
        target.table,
        &format!("{} = ?", target.scope_column),
    )
}

fn ids_sql(target: EntityTarget<'_>, id_column: &str, filter: &CompiledQuery) -> String {
    let mut sql = filter.apply(
        &format!("DISTINCT CAST({id_column} AS SIGNED)"),
        target.table,
        &format!("{} = ?", target.scope_column),
    );
    sql.push_str(" ORDER BY 1 LIMIT ?");
    sql
}

/// Count entities belonging to `scope_id` that match `filter`
pub async fn count_filtered(
    pool: &MySqlPool,
    target: EntityTarget<'_>,
    scope_id: i64,
    filter: &CompiledQuery,
) -> Result<i64, DataError> {
    let sql = count_sql(target, filter);
    tracing::trace!(
        %sql,
        params = filter.params.len(),
        unfiltered = filter.is_always_true(),
        "Counting filtered rows"
    );

    let query = sqlx::query_scalar::<_, i64>(&sql).bind(scope_id);
    let count = filter.params.bind_scalar(query).fetch_one(pool).await?;

    Ok(count)
}

/// Ids of up to `limit` matching entities, ascending
///
/// Joins are one-to-one per field, but DISTINCT keeps duplicated value rows
/// in the attribute table from repeating an id.
pub async fn list_filtered_ids(
    pool: &MySqlPool,
    target: EntityTarget<'_>,
    id_column: &str,
    scope_id: i64,
    filter: &CompiledQuery,
    limit: u32,
) -> Result<Vec<i64>, DataError> {
    let sql = ids_sql(target, id_column, filter);
    tracing::trace!(
        %sql,
        params = filter.params.len(),
        unfiltered = filter.is_always_true(),
        limit,
        "Listing filtered ids"
    );

    let query = sqlx::query_as::<_, (i64,)>(&sql).bind(scope_id);
    let rows = filter
        .params
        .bind_query_as(query)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::SqlParams;

    const TARGET: EntityTarget<'static> = EntityTarget {
        table: "reservations",
        scope_column: "reservations.project_id",
    };

    fn filter() -> CompiledQuery {
        let mut params = SqlParams::default();
        params.push("vip");
        CompiledQuery {
            predicate: "(LOCATE(?, f1.value_text) > 0)".to_string(),
            joins: vec![
                "LEFT OUTER JOIN custom_field_values AS f1 ON reservations.reservation_id = f1.reservation_id AND f1.field_id = 9"
                    .to_string(),
            ],
            params,
        }
    }

    #[test]
    fn test_count_sql_places_scope_before_filter() {
        let sql = count_sql(TARGET, &filter());
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM reservations \
             LEFT OUTER JOIN custom_field_values AS f1 ON reservations.reservation_id = f1.reservation_id AND f1.field_id = 9 \
             WHERE reservations.project_id = ? AND ((LOCATE(?, f1.value_text) > 0))"
        );
    }

    #[test]
    fn test_ids_sql_appends_limit_placeholder() {
        let sql = ids_sql(TARGET, "reservations.reservation_id", &CompiledQuery::always_true());
        assert_eq!(
            sql,
            "SELECT DISTINCT CAST(reservations.reservation_id AS SIGNED) FROM reservations \
             WHERE reservations.project_id = ? AND (1=1) ORDER BY 1 LIMIT ?"
        );
    }
}
