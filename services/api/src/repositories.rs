//! Repositories for database operations
//!
//! One repository per entity, each wrapping the shared `PgPool`. Collection
//! reads are assembled with `sqlx::QueryBuilder` so optional filters and
//! OData predicates only ever add bound parameters.

use sqlx::{Postgres, QueryBuilder};

use crate::dates::DateRange;
use crate::odata::{ODataQuery, sql::push_predicate};

pub mod account;
pub mod category;
pub mod news;
pub mod report;
pub mod tag;

pub use account::AccountRepository;
pub use category::CategoryRepository;
pub use news::NewsRepository;
pub use report::ReportRepository;
pub use tag::TagRepository;

/// A page of a collection and, when `$count=true`, the filtered total
pub type Page<T> = (Vec<T>, Option<i64>);

/// Append ` AND <filter>` when the query carries a `$filter`
pub(crate) fn push_odata_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &ODataQuery) {
    if let Some(predicate) = &query.filter {
        builder.push(" AND ");
        push_predicate(builder, predicate);
    }
}

/// Append the inclusive bounds of `range` on `column`
pub(crate) fn push_date_range(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    range: &DateRange,
) {
    if let Some(start) = range.start {
        builder.push(" AND ").push(column).push(" >= ").push_bind(start);
    }
    if let Some(end) = range.end {
        builder.push(" AND ").push(column).push(" <= ").push_bind(end);
    }
}

/// Append a case-insensitive substring match of `term` on any of `columns`
pub(crate) fn push_search(
    builder: &mut QueryBuilder<'_, Postgres>,
    columns: &[&str],
    term: &str,
) {
    let needle = term.to_lowercase();

    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push("strpos(lower(")
            .push(*column)
            .push("), ")
            .push_bind(needle.clone())
            .push(") > 0");
    }
    builder.push(")");
}
