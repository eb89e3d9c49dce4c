//! Elasticsearch Query DSL primitives.
//!
//! Compiled fragments are plain [`serde_json::Value`]s. These constructors
//! cover the subset of the DSL the clause processors emit.

use serde_json::{Map, Value, json};

/// `{"term": {field: value}}`
pub fn term(field: &str, value: impl Into<Value>) -> Value {
    let value: Value = value.into();
    json!({ "term": { field: value } })
}

/// `{"terms": {field: [values...]}}`
pub fn terms<I, V>(field: &str, values: I) -> Value
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    json!({ "terms": { field: values } })
}

/// Terms lookup: matches `field` against the values stored at `path` in the
/// document `id` of `index`.
pub fn terms_lookup(field: &str, index: &str, id: &str, path: &str) -> Value {
    json!({
        "terms": {
            field: {
                "index": index,
                "id": id,
                "path": path
            }
        }
    })
}

/// `{"prefix": {field: value}}`
pub fn prefix(field: &str, value: &str) -> Value {
    json!({ "prefix": { field: value } })
}

/// `{"wildcard": {field: pattern}}`
pub fn wildcard(field: &str, pattern: &str) -> Value {
    json!({ "wildcard": { field: pattern } })
}

/// Query-string query restricted to a single field.
pub fn query_string(field: &str, query: &str) -> Value {
    json!({
        "query_string": {
            "query": query,
            "fields": [field]
        }
    })
}

/// Inclusive range on `field`; each bound is only emitted when present.
pub fn range(field: &str, lower: Option<i64>, upper: Option<i64>) -> Value {
    let mut bounds = Map::new();
    if let Some(lower) = lower {
        bounds.insert("gte".to_string(), json!(lower));
    }
    if let Some(upper) = upper {
        bounds.insert("lte".to_string(), json!(upper));
    }
    json!({ "range": { field: Value::Object(bounds) } })
}

/// Nested query over the objects at `path`.
pub fn nested(path: &str, query: Value) -> Value {
    json!({
        "nested": {
            "path": path,
            "query": query
        }
    })
}

/// Has-child query with `max` scoring and inner hits retrieval.
pub fn has_child(child_type: &str, query: Value) -> Value {
    json!({
        "has_child": {
            "type": child_type,
            "query": query,
            "score_mode": "max",
            "inner_hits": {}
        }
    })
}

/// A boolean query under construction.
///
/// An empty `BoolQuery` serializes to `{"bool": {}}`, which matches every
/// document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    must: Vec<Value>,
    should: Vec<Value>,
    must_not: Vec<Value>,
    filter: Vec<Value>,
    minimum_should_match: Option<u32>,
}

impl BoolQuery {
    /// Creates an empty boolean query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mandatory clause.
    pub fn must(mut self, query: Value) -> Self {
        self.must.push(query);
        self
    }

    /// Adds optional clauses.
    pub fn should<I: IntoIterator<Item = Value>>(mut self, queries: I) -> Self {
        self.should.extend(queries);
        self
    }

    /// Adds a negated clause.
    pub fn must_not(mut self, query: Value) -> Self {
        self.must_not.push(query);
        self
    }

    /// Adds a non-scoring mandatory clause.
    pub fn filter(mut self, query: Value) -> Self {
        self.filter.push(query);
        self
    }

    /// Sets how many `should` clauses must match.
    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    /// Returns true if no clause has been added.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Returns the number of `should` clauses.
    pub fn should_len(&self) -> usize {
        self.should.len()
    }

    /// Serializes the query, omitting empty clause lists.
    pub fn into_value(self) -> Value {
        let mut body = Map::new();
        for (key, clauses) in [
            ("must", self.must),
            ("should", self.should),
            ("must_not", self.must_not),
            ("filter", self.filter),
        ] {
            if !clauses.is_empty() {
                body.insert(key.to_string(), Value::Array(clauses));
            }
        }
        if let Some(n) = self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(n));
        }
        json!({ "bool": Value::Object(body) })
    }
}

impl From<BoolQuery> for Value {
    fn from(query: BoolQuery) -> Self {
        query.into_value()
    }
}
