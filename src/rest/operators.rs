//! Query operators.
//!
//! Each [`Operator`] is an immutable refinement of a listing query that
//! renders itself into ordered `(key, value)` query pairs. Field-bearing
//! operators need a field name from the caller and render `filter[<field>]`
//! keys with a prefix that encodes the comparison:
//!
//! | Operator | Value |
//! |---|---|
//! | [`Operator::Equals`] | raw value |
//! | [`not_null`]`(true)` | `␀false` |
//! | [`is_null`]`(true)` | `␀true` |
//! | [`contains`] | `:s` per substring |
//! | [`starts_with`] | `^s` |
//! | [`neq`] | `!v` per value |
//! | [`gt`] / [`lt`] | `>v` / `<v` |
//! | [`window`] | `>a` then `<b` |
//!
//! # Example
//!
//! ```rust
//! use workbench_api::rest::{contains, relationship, ResourceSchema};
//!
//! let schema = ResourceSchema::new("investigations")
//!     .attributes(["close_comment"])
//!     .relationships(["comments"]);
//!
//! let pairs = contains(["one", "two"]).render(Some("close_comment"), &schema).unwrap();
//! assert_eq!(pairs, vec![
//!     ("filter[close_comment]".to_string(), ":one".to_string()),
//!     ("filter[close_comment]".to_string(), ":two".to_string()),
//! ]);
//!
//! let op = relationship("comments.comment", "hello").unwrap();
//! assert_eq!(
//!     op.render(None, &schema).unwrap(),
//!     vec![("filter[comments][comment]".to_string(), "hello".to_string())]
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};

use crate::rest::errors::ResourceError;
use crate::rest::registry::ResourceSchema;

/// Marker that distinguishes null tests from string matches (U+2400).
pub const NULL_SENTINEL: char = '\u{2400}';

/// A filter value in its canonical wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterValue(String);

impl FilterValue {
    /// Returns the wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

macro_rules! integer_filter_values {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

integer_filter_values!(i32, i64, u32, u64, usize);

impl From<NaiveDateTime> for FilterValue {
    /// `2020-01-01T00:00:00`, with microseconds only when present.
    fn from(value: NaiveDateTime) -> Self {
        let format = if value.nanosecond() == 0 {
            "%Y-%m-%dT%H:%M:%S"
        } else {
            "%Y-%m-%dT%H:%M:%S%.6f"
        };
        Self(value.format(format).to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        Self(value.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// `+`
    #[default]
    Ascending,
    /// `-`
    Descending,
}

impl SortDirection {
    /// Returns the wire prefix.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Ascending => '+',
            Self::Descending => '-',
        }
    }
}

impl FromStr for SortDirection {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "asc" => Ok(Self::Ascending),
            "-" | "desc" => Ok(Self::Descending),
            other => Err(ResourceError::InvalidSortDirection {
                direction: other.to_string(),
            }),
        }
    }
}

/// A filter scoped to one relationship hop.
///
/// Built by [`relationship`]; the path is split at construction time and
/// checked against the owning schema when rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipFilter {
    path: String,
    relationship: String,
    key_segments: Vec<String>,
    value: Box<Operator>,
}

impl RelationshipFilter {
    /// Returns the path as given by the caller.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the relationship this filter traverses.
    #[must_use]
    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    /// Returns the operator applied at the end of the path.
    #[must_use]
    pub fn value(&self) -> &Operator {
        &self.value
    }
}

/// One query refinement.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Plain equality.
    Equals(FilterValue),
    /// Null test; `NotNull(true)` matches records whose field is set.
    NotNull(bool),
    /// Null test; `IsNull(true)` matches records whose field is null.
    IsNull(bool),
    /// Substring match, one pair per substring.
    Contains(Vec<String>),
    /// Prefix match.
    StartsWith(String),
    /// Inequality, one pair per value.
    NotEqual(Vec<FilterValue>),
    /// Strictly greater.
    GreaterThan(FilterValue),
    /// Strictly less.
    LessThan(FilterValue),
    /// Range; an absent bound is left open.
    Window {
        /// Lower bound.
        start: Option<FilterValue>,
        /// Upper bound.
        end: Option<FilterValue>,
    },
    /// A `flag[<field>]` parameter.
    Flag(FilterValue),
    /// Filter on a related record's field.
    Relationship(RelationshipFilter),
    /// `page[limit]`.
    Limit(u32),
    /// Side-load related records.
    Include(String),
    /// Result ordering.
    Sort {
        /// Field to sort by.
        field: String,
        /// Direction.
        direction: SortDirection,
    },
}

macro_rules! equals_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operator {
                fn from(value: $ty) -> Self {
                    Self::Equals(FilterValue::from(value))
                }
            }
        )*
    };
}

equals_from!(
    &str,
    String,
    &String,
    bool,
    f64,
    i32,
    i64,
    u32,
    u64,
    usize,
    NaiveDateTime,
    NaiveDate,
    DateTime<Utc>
);

impl From<FilterValue> for Operator {
    fn from(value: FilterValue) -> Self {
        Self::Equals(value)
    }
}

impl Operator {
    /// Returns `true` for operators that need a field name to render.
    #[must_use]
    pub const fn is_field_bearing(&self) -> bool {
        !matches!(
            self,
            Self::Relationship(_) | Self::Limit(_) | Self::Include(_) | Self::Sort { .. }
        )
    }

    /// Returns `true` for [`Operator::Sort`].
    #[must_use]
    pub const fn is_sort(&self) -> bool {
        matches!(self, Self::Sort { .. })
    }

    /// Renders this operator into query pairs.
    ///
    /// `field` is required by field-bearing operators and ignored by the
    /// rest. `schema` is the type being queried; relationship filters check
    /// their first segment against it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidOperator`] when a field-bearing
    /// operator has no field, or when a relationship filter names a
    /// relationship the schema does not declare.
    pub fn render(
        &self,
        field: Option<&str>,
        schema: &ResourceSchema,
    ) -> Result<Vec<(String, String)>, ResourceError> {
        match self {
            Self::Relationship(filter) => {
                if !schema.has_relationships() {
                    return Err(ResourceError::InvalidOperator {
                        message: "Relationship operator has no class relationships defined"
                            .to_string(),
                    });
                }
                if !schema.has_relationship(&filter.relationship) {
                    return Err(ResourceError::InvalidOperator {
                        message: format!(
                            "'{}' is not a defined relationship of {}",
                            filter.relationship,
                            schema.type_name()
                        ),
                    });
                }
                let segments: Vec<&str> =
                    filter.key_segments.iter().map(String::as_str).collect();
                Ok(filter.value.render_at(&segments))
            }
            Self::Limit(n) => Ok(vec![("page[limit]".to_string(), n.to_string())]),
            Self::Include(names) => Ok(vec![("include".to_string(), names.clone())]),
            Self::Sort { field, direction } => Ok(vec![(
                "sort".to_string(),
                format!("{}{field}", direction.prefix()),
            )]),
            _ => {
                let field = field.ok_or_else(|| ResourceError::InvalidOperator {
                    message: format!("{self:?} needs a field name to render"),
                })?;
                Ok(self.render_at(&[field]))
            }
        }
    }

    /// Renders a field-bearing operator under the given key segments.
    fn render_at(&self, segments: &[&str]) -> Vec<(String, String)> {
        let root = if matches!(self, Self::Flag(_)) {
            "flag"
        } else {
            "filter"
        };
        let key = segments
            .iter()
            .fold(root.to_string(), |key, segment| format!("{key}[{segment}]"));
        let pair = |value: String| (key.clone(), value);

        match self {
            Self::Equals(value) | Self::Flag(value) => vec![pair(value.to_string())],
            Self::NotNull(flag) => vec![pair(format!("{NULL_SENTINEL}{}", !flag))],
            Self::IsNull(flag) => vec![pair(format!("{NULL_SENTINEL}{flag}"))],
            Self::Contains(parts) => parts.iter().map(|s| pair(format!(":{s}"))).collect(),
            Self::StartsWith(prefix) => vec![pair(format!("^{prefix}"))],
            Self::NotEqual(values) => values.iter().map(|v| pair(format!("!{v}"))).collect(),
            Self::GreaterThan(value) => vec![pair(format!(">{value}"))],
            Self::LessThan(value) => vec![pair(format!("<{value}"))],
            Self::Window { start, end } => start
                .iter()
                .map(|v| pair(format!(">{v}")))
                .chain(end.iter().map(|v| pair(format!("<{v}"))))
                .collect(),
            // Rejected at construction
            Self::Relationship(_) | Self::Limit(_) | Self::Include(_) | Self::Sort { .. } => {
                Vec::new()
            }
        }
    }
}

/// Matches records whose field is set (`not_null(true)`) or unset (`not_null(false)`).
#[must_use]
pub const fn not_null(flag: bool) -> Operator {
    Operator::NotNull(flag)
}

/// Matches records whose field is null (`is_null(true)`) or set (`is_null(false)`).
#[must_use]
pub const fn is_null(flag: bool) -> Operator {
    Operator::IsNull(flag)
}

/// Substring match; several substrings render several pairs.
pub fn contains<I, S>(substrings: I) -> Operator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Operator::Contains(substrings.into_iter().map(Into::into).collect())
}

/// Prefix match.
pub fn starts_with(prefix: impl Into<String>) -> Operator {
    Operator::StartsWith(prefix.into())
}

/// Inequality against every value.
pub fn neq<I, V>(values: I) -> Operator
where
    I: IntoIterator<Item = V>,
    V: Into<FilterValue>,
{
    Operator::NotEqual(values.into_iter().map(Into::into).collect())
}

/// Strictly greater than `value`.
pub fn gt(value: impl Into<FilterValue>) -> Operator {
    Operator::GreaterThan(value.into())
}

/// Strictly less than `value`.
pub fn lt(value: impl Into<FilterValue>) -> Operator {
    Operator::LessThan(value.into())
}

/// Between `start` and `end`, both exclusive.
pub fn window(start: impl Into<FilterValue>, end: impl Into<FilterValue>) -> Operator {
    Operator::Window {
        start: Some(start.into()),
        end: Some(end.into()),
    }
}

/// After `start`, with no upper bound.
pub fn window_from(start: impl Into<FilterValue>) -> Operator {
    Operator::Window {
        start: Some(start.into()),
        end: None,
    }
}

/// Before `end`, with no lower bound.
pub fn window_until(end: impl Into<FilterValue>) -> Operator {
    Operator::Window {
        start: None,
        end: Some(end.into()),
    }
}

/// A `flag[<field>]=<value>` parameter.
pub fn flag(value: impl Into<FilterValue>) -> Operator {
    Operator::Flag(value.into())
}

/// Filters on a field of a related record.
///
/// `path` is `relationship.field`, or a single segment. A final segment
/// ending in `_id` renders as `[<name>][id]`, so
/// `investigation.organization_id` becomes
/// `filter[investigation][organization][id]`.
///
/// # Errors
///
/// Returns [`ResourceError::RelationshipDepth`] for paths with more than
/// two segments, and [`ResourceError::InvalidOperator`] for empty segments
/// or a value that cannot sit at the end of a path.
pub fn relationship(path: &str, value: impl Into<Operator>) -> Result<Operator, ResourceError> {
    let value = value.into();
    if !value.is_field_bearing() {
        return Err(ResourceError::InvalidOperator {
            message: format!("{value:?} cannot be used as a relationship filter value"),
        });
    }

    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() > 2 {
        return Err(ResourceError::RelationshipDepth {
            path: path.to_string(),
        });
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ResourceError::InvalidOperator {
            message: format!("Relationship path '{path}' has an empty segment"),
        });
    }

    let mut key_segments: Vec<String> = segments.iter().map(ToString::to_string).collect();
    if let Some(last) = key_segments.pop() {
        match last.strip_suffix("_id") {
            Some(stem) if !stem.is_empty() => {
                key_segments.push(stem.to_string());
                key_segments.push("id".to_string());
            }
            _ => key_segments.push(last),
        }
    }

    Ok(Operator::Relationship(RelationshipFilter {
        path: path.to_string(),
        relationship: key_segments[0].clone(),
        key_segments,
        value: Box::new(value),
    }))
}

/// `page[limit]=<n>`.
#[must_use]
pub const fn limit(n: u32) -> Operator {
    Operator::Limit(n)
}

/// `include=<names>`, with `names` comma separated.
pub fn include(names: impl Into<String>) -> Operator {
    Operator::Include(names.into())
}

/// Sort by `field`; `direction` is one of `+`, `asc`, `-`, `desc`.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidSortDirection`] for anything else.
pub fn sort(field: impl Into<String>, direction: &str) -> Result<Operator, ResourceError> {
    Ok(sort_by(field, direction.parse()?))
}

/// Sort by `field` with an already parsed direction.
pub fn sort_by(field: impl Into<String>, direction: SortDirection) -> Operator {
    Operator::Sort {
        field: field.into(),
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::errors::ErrorKind;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("investigations")
            .attributes(["close_comment", "created_at"])
            .relationships(["comments", "organization"])
    }

    fn one(key: &str, value: &str) -> Vec<(String, String)> {
        vec![(key.to_string(), value.to_string())]
    }

    fn render(op: &Operator) -> Vec<(String, String)> {
        op.render(Some("close_comment"), &schema()).unwrap()
    }

    #[test]
    fn test_null_tests_use_sentinel() {
        assert_eq!(render(&not_null(true)), one("filter[close_comment]", "\u{2400}false"));
        assert_eq!(render(&not_null(false)), one("filter[close_comment]", "\u{2400}true"));
        assert_eq!(render(&is_null(true)), one("filter[close_comment]", "\u{2400}true"));
        assert_eq!(render(&is_null(false)), one("filter[close_comment]", "\u{2400}false"));
    }

    #[test]
    fn test_multi_value_operators_preserve_order() {
        assert_eq!(
            render(&contains(["one", "two"])),
            vec![
                ("filter[close_comment]".to_string(), ":one".to_string()),
                ("filter[close_comment]".to_string(), ":two".to_string()),
            ]
        );
        assert_eq!(
            render(&neq(["one", "two"])),
            vec![
                ("filter[close_comment]".to_string(), "!one".to_string()),
                ("filter[close_comment]".to_string(), "!two".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_multi_value_operators_render_nothing() {
        assert!(render(&contains(Vec::<String>::new())).is_empty());
        assert!(render(&neq(Vec::<String>::new())).is_empty());
    }

    #[test]
    fn test_prefix_operators() {
        assert_eq!(render(&starts_with("one")), one("filter[close_comment]", "^one"));
        assert_eq!(render(&gt(245)), one("filter[close_comment]", ">245"));
        assert_eq!(render(&lt(245)), one("filter[close_comment]", "<245"));
        assert_eq!(render(&Operator::from("x")), one("filter[close_comment]", "x"));
        assert_eq!(render(&flag("test")), one("flag[close_comment]", "test"));
    }

    #[test]
    fn test_datetimes_are_normalized() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            render(&gt(start)),
            one("filter[close_comment]", ">2020-01-01T00:00:00")
        );
        assert_eq!(
            render(&window(start, end)),
            vec![
                ("filter[close_comment]".to_string(), ">2020-01-01T00:00:00".to_string()),
                ("filter[close_comment]".to_string(), "<2020-05-01T00:00:00".to_string()),
            ]
        );

        let precise = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 0, 250)
            .unwrap();
        assert_eq!(
            FilterValue::from(precise).as_str(),
            "2020-01-01T12:30:00.000250"
        );
        assert_eq!(FilterValue::from(start.and_utc()).as_str(), "2020-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_window_with_open_bounds() {
        assert_eq!(render(&window_from(100)), one("filter[close_comment]", ">100"));
        assert_eq!(render(&window_until(500)), one("filter[close_comment]", "<500"));
        let open = Operator::Window {
            start: None,
            end: None,
        };
        assert!(render(&open).is_empty());
    }

    #[test]
    fn test_relationship_paths() {
        let op = relationship("comments.comment", gt(123)).unwrap();
        assert_eq!(
            op.render(None, &schema()).unwrap(),
            one("filter[comments][comment]", ">123")
        );

        let op = relationship("comments.comment", "some value").unwrap();
        assert_eq!(
            op.render(None, &schema()).unwrap(),
            one("filter[comments][comment]", "some value")
        );

        let op = relationship("organization_id", "abc").unwrap();
        assert_eq!(
            op.render(None, &schema()).unwrap(),
            one("filter[organization][id]", "abc")
        );
    }

    #[test]
    fn test_relationship_id_suffix_on_second_segment() {
        let schema = ResourceSchema::new("investigative_actions").relationships(["investigation"]);
        let op = relationship("investigation.organization_id", "11111111").unwrap();
        assert_eq!(
            op.render(None, &schema).unwrap(),
            one("filter[investigation][organization][id]", "11111111")
        );
    }

    #[test]
    fn test_three_segment_path_fails_construction() {
        let error = relationship("a.b.c", "x").unwrap_err();
        assert!(matches!(error, ResourceError::RelationshipDepth { .. }));
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_relationship_render_errors() {
        let bare = ResourceSchema::new("investigations").attributes(["title"]);
        let op = relationship("comments.comment", "x").unwrap();
        let error = op.render(None, &bare).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Relationship operator has no class relationships defined"
        );

        let op = relationship("bogus.comment", "x").unwrap();
        let error = op.render(None, &schema()).unwrap_err();
        assert!(error.to_string().contains("not a defined relationship"));
    }

    #[test]
    fn test_relationship_rejects_non_filter_values() {
        assert!(relationship("comments.comment", limit(5)).is_err());
        let nested = relationship("comments.comment", "x").unwrap();
        assert!(relationship("comments.comment", nested).is_err());
    }

    #[test]
    fn test_field_free_operators() {
        let schema = schema();
        assert_eq!(limit(5).render(None, &schema).unwrap(), one("page[limit]", "5"));
        assert_eq!(
            include("organization,created_by").render(None, &schema).unwrap(),
            one("include", "organization,created_by")
        );
        for (direction, expected) in [
            ("+", "+created_at"),
            ("asc", "+created_at"),
            ("-", "-created_at"),
            ("desc", "-created_at"),
        ] {
            let op = sort("created_at", direction).unwrap();
            assert_eq!(op.render(None, &schema).unwrap(), one("sort", expected));
        }
    }

    #[test]
    fn test_invalid_sort_direction() {
        let error = sort("created_at", "sideways").unwrap_err();
        assert!(matches!(
            error,
            ResourceError::InvalidSortDirection { direction } if direction == "sideways"
        ));
    }

    #[test]
    fn test_field_bearing_operator_without_field() {
        let error = gt(1).render(None, &schema()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }
}
