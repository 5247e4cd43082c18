//! Compile bound query options into SQL with placeholders

use sqlx::{Postgres, QueryBuilder};

use super::{OrderBy, Predicate, TextFunction};
use super::filter::FilterValue;

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Int(n) => builder.push_bind(*n),
        FilterValue::Text(s) => builder.push_bind(s.clone()),
        FilterValue::Bool(b) => builder.push_bind(*b),
        FilterValue::DateTime(instant) => builder.push_bind(*instant),
    };
}

/// Append a predicate; every literal becomes a bound parameter
pub fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Compare { column, op, value } => {
            builder.push(*column).push(" ").push(op.sql()).push(" ");
            push_value(builder, value);
        }
        Predicate::IsNull { column, negated } => {
            builder
                .push(*column)
                .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Predicate::Text {
            column,
            function,
            value,
        } => match function {
            TextFunction::Contains => {
                builder
                    .push("strpos(")
                    .push(*column)
                    .push(", ")
                    .push_bind(value.clone())
                    .push(") > 0");
            }
            TextFunction::StartsWith => {
                builder
                    .push("starts_with(")
                    .push(*column)
                    .push(", ")
                    .push_bind(value.clone())
                    .push(")");
            }
            TextFunction::EndsWith => {
                builder
                    .push("right(")
                    .push(*column)
                    .push(", char_length(")
                    .push_bind(value.clone())
                    .push(")) = ")
                    .push_bind(value.clone());
            }
        },
        Predicate::And(left, right) => {
            builder.push("(");
            push_predicate(builder, left);
            builder.push(" AND ");
            push_predicate(builder, right);
            builder.push(")");
        }
        Predicate::Or(left, right) => {
            builder.push("(");
            push_predicate(builder, left);
            builder.push(" OR ");
            push_predicate(builder, right);
            builder.push(")");
        }
        Predicate::Not(inner) => {
            builder.push("NOT (");
            push_predicate(builder, inner);
            builder.push(")");
        }
    }
}

/// Append ORDER BY, falling back to `default_order` and always ending with
/// the key column
pub fn push_order_by(
    builder: &mut QueryBuilder<'_, Postgres>,
    order_by: &[OrderBy],
    default_order: &str,
    key_column: &str,
) {
    builder.push(" ORDER BY ");

    if order_by.is_empty() {
        builder.push(default_order);
    } else {
        for (i, term) in order_by.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder
                .push(term.column)
                .push(if term.descending { " DESC" } else { " ASC" });
        }
    }

    builder.push(", ").push(key_column);
}

/// Append LIMIT/OFFSET as bound parameters
pub fn push_paging(builder: &mut QueryBuilder<'_, Postgres>, limit: i64, offset: i64) {
    builder
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
}
