//! OData-style collection queries
//!
//! Collection endpoints accept `$filter`, `$orderby`, `$top`, `$skip`,
//! `$select`, `$count` and, for news, `$expand`. Options are parsed against
//! an [`EntitySchema`] that maps the JSON property names clients see onto SQL
//! columns, then compiled by [`sql`] into a parameterised query. Literal
//! values never reach the SQL text.

pub mod filter;
pub mod sql;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use filter::{CompareOp, FilterValue, Predicate, TextFunction};

pub const DEFAULT_TOP: i64 = 10;
pub const MAX_TOP: i64 = 100;

/// Errors in client-supplied query options; all map to 400
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ODataError {
    #[error("Invalid $filter: {0}")]
    Filter(String),

    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Invalid $orderby: {0}")]
    OrderBy(String),

    #[error("Invalid {option} value '{value}'")]
    InvalidNumber { option: &'static str, value: String },

    #[error("$top must be between 0 and {}", MAX_TOP)]
    TopOutOfRange,

    #[error("Invalid $count value '{0}', expected true or false")]
    Count(String),

    #[error("Cannot expand '{0}'")]
    Expand(String),
}

/// Value type of a filterable property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    Bool,
    DateTime,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::Int => "an integer",
            FieldKind::Text => "a string",
            FieldKind::Bool => "a boolean",
            FieldKind::DateTime => "a date-time",
        }
    }
}

/// A property that can be filtered, sorted and selected
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// JSON property name
    pub name: &'static str,
    /// SQL expression the property reads from
    pub column: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// Query surface of one collection
#[derive(Debug)]
pub struct EntitySchema {
    pub fields: &'static [Field],
    /// Unique column appended to every ORDER BY so paging is stable
    pub key_column: &'static str,
    /// Serialized properties that can be selected but not filtered or sorted
    pub extra_properties: &'static [&'static str],
    /// Navigation properties accepted by `$expand`
    pub expandable: &'static [&'static str],
}

impl EntitySchema {
    /// Look up a field by JSON name, ignoring case
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    fn property(&self, name: &str) -> Option<&'static str> {
        self.field(name).map(|field| field.name).or_else(|| {
            self.extra_properties
                .iter()
                .chain(self.expandable.iter())
                .find(|property| property.eq_ignore_ascii_case(name))
                .copied()
        })
    }
}

/// Raw query options as they arrive on the query string
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ODataParams {
    #[serde(rename = "$filter")]
    pub filter: Option<String>,
    #[serde(rename = "$orderby")]
    pub orderby: Option<String>,
    #[serde(rename = "$top")]
    pub top: Option<String>,
    #[serde(rename = "$skip")]
    pub skip: Option<String>,
    #[serde(rename = "$select")]
    pub select: Option<String>,
    #[serde(rename = "$count")]
    pub count: Option<String>,
    #[serde(rename = "$expand")]
    pub expand: Option<String>,
}

/// One `$orderby` term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

/// Validated query options
#[derive(Debug, Clone)]
pub struct ODataQuery {
    pub filter: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub top: i64,
    pub skip: i64,
    pub count: bool,
    pub select: Option<Vec<&'static str>>,
    pub expand: Vec<&'static str>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(option: &'static str, raw: &str) -> Result<i64, ODataError> {
    raw.parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| ODataError::InvalidNumber {
            option,
            value: raw.to_string(),
        })
}

fn parse_order_by(raw: &str, schema: &EntitySchema) -> Result<Vec<OrderBy>, ODataError> {
    raw.split(',')
        .map(|term| {
            let mut parts = term.split_whitespace();
            let name = parts
                .next()
                .ok_or_else(|| ODataError::OrderBy("empty sort term".to_string()))?;
            let field = schema
                .field(name)
                .ok_or_else(|| ODataError::UnknownProperty(name.to_string()))?;

            let descending = match parts.next() {
                None => false,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
                Some(other) => {
                    return Err(ODataError::OrderBy(format!(
                        "unknown direction '{}'",
                        other
                    )));
                }
            };

            if parts.next().is_some() {
                return Err(ODataError::OrderBy(format!("malformed term '{}'", term.trim())));
            }

            Ok(OrderBy {
                column: field.column,
                descending,
            })
        })
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl ODataQuery {
    /// Validate raw options against a collection schema
    pub fn parse(params: &ODataParams, schema: &EntitySchema) -> Result<Self, ODataError> {
        let filter = match non_blank(&params.filter) {
            Some(raw) => Some(filter::bind(&filter::parse_filter(raw)?, schema)?),
            None => None,
        };

        let order_by = match non_blank(&params.orderby) {
            Some(raw) => parse_order_by(raw, schema)?,
            None => Vec::new(),
        };

        let top = match non_blank(&params.top) {
            Some(raw) => parse_number("$top", raw)?,
            None => DEFAULT_TOP,
        };
        if top > MAX_TOP {
            return Err(ODataError::TopOutOfRange);
        }

        let skip = match non_blank(&params.skip) {
            Some(raw) => parse_number("$skip", raw)?,
            None => 0,
        };

        let count = match non_blank(&params.count) {
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            Some(raw) => return Err(ODataError::Count(raw.to_string())),
            None => false,
        };

        let select = match non_blank(&params.select) {
            Some(raw) => Some(
                split_list(raw)
                    .map(|name| {
                        schema
                            .property(name)
                            .ok_or_else(|| ODataError::UnknownProperty(name.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        let expand = match non_blank(&params.expand) {
            Some(raw) => split_list(raw)
                .map(|name| {
                    schema
                        .expandable
                        .iter()
                        .find(|candidate| candidate.eq_ignore_ascii_case(name))
                        .copied()
                        .ok_or_else(|| ODataError::Expand(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            filter,
            order_by,
            top,
            skip,
            count,
            select,
            expand,
        })
    }

    pub fn expands(&self, navigation: &str) -> bool {
        self.expand.contains(&navigation)
    }
}

/// Wrap items in the `{"@odata.count", "value"}` envelope, projecting each
/// item to the `$select` list when one was given
pub fn envelope<T: Serialize>(
    items: &[T],
    total: Option<i64>,
    select: Option<&[&'static str]>,
) -> serde_json::Result<Value> {
    let values = items
        .iter()
        .map(|item| {
            let value = serde_json::to_value(item)?;
            Ok(match (select, value) {
                (Some(select), Value::Object(mut object)) => {
                    object.retain(|key, _| select.contains(&key.as_str()));
                    Value::Object(object)
                }
                (_, value) => value,
            })
        })
        .collect::<serde_json::Result<Vec<_>>>()?;

    let mut body = Map::new();
    if let Some(total) = total {
        body.insert("@odata.count".to_string(), Value::from(total));
    }
    body.insert("value".to_string(), Value::Array(values));

    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SCHEMA: EntitySchema = EntitySchema {
        fields: &[
            Field::new("tagId", "t.id", FieldKind::Int),
            Field::new("name", "t.name", FieldKind::Text),
            Field::new("createdDate", "t.created_date", FieldKind::DateTime),
        ],
        key_column: "t.id",
        extra_properties: &["description"],
        expandable: &["news"],
    };

    fn params(pairs: &[(&str, &str)]) -> ODataParams {
        let mut params = ODataParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "$filter" => params.filter = value,
                "$orderby" => params.orderby = value,
                "$top" => params.top = value,
                "$skip" => params.skip = value,
                "$select" => params.select = value,
                "$count" => params.count = value,
                "$expand" => params.expand = value,
                _ => unreachable!(),
            }
        }
        params
    }

    #[test]
    fn test_defaults() {
        let query = ODataQuery::parse(&ODataParams::default(), &SCHEMA).unwrap();
        assert!(query.filter.is_none());
        assert!(query.order_by.is_empty());
        assert_eq!((query.top, query.skip, query.count), (DEFAULT_TOP, 0, false));
        assert!(query.select.is_none());
    }

    #[test]
    fn test_top_bounds() {
        assert_eq!(
            ODataQuery::parse(&params(&[("$top", "100")]), &SCHEMA).unwrap().top,
            100
        );
        assert_eq!(
            ODataQuery::parse(&params(&[("$top", "101")]), &SCHEMA).unwrap_err(),
            ODataError::TopOutOfRange
        );
        assert!(ODataQuery::parse(&params(&[("$top", "-1")]), &SCHEMA).is_err());
        assert!(ODataQuery::parse(&params(&[("$skip", "ten")]), &SCHEMA).is_err());
    }

    #[test]
    fn test_order_by_resolves_columns() {
        let query =
            ODataQuery::parse(&params(&[("$orderby", "Name desc, tagId")]), &SCHEMA).unwrap();
        assert_eq!(
            query.order_by,
            vec![
                OrderBy {
                    column: "t.name",
                    descending: true
                },
                OrderBy {
                    column: "t.id",
                    descending: false
                },
            ]
        );

        assert_eq!(
            ODataQuery::parse(&params(&[("$orderby", "password")]), &SCHEMA).unwrap_err(),
            ODataError::UnknownProperty("password".to_string())
        );
        assert!(ODataQuery::parse(&params(&[("$orderby", "name sideways")]), &SCHEMA).is_err());
    }

    #[test]
    fn test_select_and_expand_use_canonical_names() {
        let query = ODataQuery::parse(
            &params(&[("$select", "NAME, description"), ("$expand", "News")]),
            &SCHEMA,
        )
        .unwrap();
        assert_eq!(query.select, Some(vec!["name", "description"]));
        assert!(query.expands("news"));

        assert_eq!(
            ODataQuery::parse(&params(&[("$expand", "owner")]), &SCHEMA).unwrap_err(),
            ODataError::Expand("owner".to_string())
        );
    }

    #[test]
    fn test_count_flag() {
        assert!(ODataQuery::parse(&params(&[("$count", "true")]), &SCHEMA).unwrap().count);
        assert!(ODataQuery::parse(&params(&[("$count", "yes")]), &SCHEMA).is_err());
    }

    #[test]
    fn test_envelope_projection() {
        let items = vec![json!({"tagId": 1, "name": "rust", "description": null})];

        let full = envelope(&items, None, None).unwrap();
        assert!(full.get("@odata.count").is_none());
        assert_eq!(full["value"][0]["description"], Value::Null);

        let projected = envelope(&items, Some(3), Some(&["name"])).unwrap();
        assert_eq!(projected["@odata.count"], 3);
        assert_eq!(projected["value"][0], json!({"name": "rust"}));
    }
}
