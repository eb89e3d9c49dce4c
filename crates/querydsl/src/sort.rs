//! Sort field resolution.
//!
//! Callers sort by logical field names. [`SortFields`] is the allow-list that
//! maps each accepted name to the physical index field, so arbitrary field
//! names never reach the index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{QueryError, QueryResult};

const SORT: &str = "sort";

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    fn parse(order: &str) -> QueryResult<Self> {
        match order {
            "ascending" => Ok(SortOrder::Ascending),
            "descending" => Ok(SortOrder::Descending),
            other => Err(QueryError::validation(
                SORT,
                format!("order of {:?} was neither ascending nor descending", other),
            )),
        }
    }

    /// Returns the index's spelling of the order.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One requested sort, as sent by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    /// Logical field name.
    pub field: String,
    /// `ascending` or `descending`.
    pub order: String,
}

/// A sort resolved to a physical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    /// Index field to sort on.
    pub field: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl ResolvedSort {
    /// Renders the sort as an index sort entry: `{field: {"order": "asc"}}`.
    pub fn to_value(&self) -> Value {
        json!({ self.field.as_str(): { "order": self.order.as_str() } })
    }
}

/// Allow-list of sortable fields, keyed by logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortFields {
    fields: BTreeMap<String, String>,
}

impl Default for SortFields {
    fn default() -> Self {
        let fields = [
            ("label", "label.keyword"),
            ("path", "path.keyword"),
            ("id", "id"),
            ("creator", "creator"),
            ("fileType", "fileType"),
            ("fileSize", "fileSize"),
            ("size", "fileSize"),
            ("dateCreated", "dateCreated"),
            ("created", "dateCreated"),
            ("dateModified", "dateModified"),
            ("modified", "dateModified"),
        ]
        .into_iter()
        .map(|(logical, physical)| (logical.to_string(), physical.to_string()))
        .collect();
        Self { fields }
    }
}

impl SortFields {
    /// Creates an allow-list from `(logical, physical)` pairs.
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses an allow-list from a JSON object of `logical: physical` names.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the physical field for `logical`, if allowed.
    pub fn physical(&self, logical: &str) -> Option<&str> {
        self.fields.get(logical).map(String::as_str)
    }

    /// Resolves every requested sort, failing on the first invalid one.
    pub fn resolve(&self, specs: &[SortSpec]) -> QueryResult<Vec<ResolvedSort>> {
        specs
            .iter()
            .map(|spec| {
                if spec.field.is_empty() {
                    return Err(QueryError::validation(SORT, "no field was provided in sort"));
                }
                let order = SortOrder::parse(&spec.order)?;
                let field = self
                    .physical(&spec.field)
                    .ok_or_else(|| QueryError::UnknownSortField {
                        field: spec.field.clone(),
                    })?;
                Ok(ResolvedSort {
                    field: field.to_string(),
                    order,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(field: &str, order: &str) -> SortSpec {
        SortSpec {
            field: field.to_string(),
            order: order.to_string(),
        }
    }

    #[test]
    fn test_resolve_default_fields() {
        let sorts = SortFields::default()
            .resolve(&[spec("label", "ascending"), spec("size", "descending")])
            .unwrap();
        assert_eq!(sorts[0].to_value(), json!({"label.keyword": {"order": "asc"}}));
        assert_eq!(sorts[1].to_value(), json!({"fileSize": {"order": "desc"}}));
    }

    #[test]
    fn test_unknown_field() {
        let err = SortFields::default()
            .resolve(&[spec("_source.secret", "ascending")])
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField { ref field } if field == "_source.secret"));
    }

    #[test]
    fn test_bad_order_and_blank_field() {
        let fields = SortFields::default();
        let err = fields.resolve(&[spec("label", "up")]).unwrap_err();
        assert!(err.to_string().contains("neither ascending nor descending"));

        let err = fields.resolve(&[spec("", "ascending")]).unwrap_err();
        assert!(matches!(err, QueryError::Validation { .. }));
    }

    #[test]
    fn test_from_json_replaces_table() {
        let fields = SortFields::from_json(r#"{"name": "label.raw"}"#).unwrap();
        assert_eq!(fields.physical("name"), Some("label.raw"));
        assert_eq!(fields.physical("label"), None);
    }
}
