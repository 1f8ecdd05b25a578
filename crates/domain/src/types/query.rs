//! Typed list queries
//!
//! The ERP list endpoint takes filters as `[field, operator, value]`
//! triples serialized into a JSON array. Building them through a typed
//! query keeps operator spelling in one place.

use serde_json::Value;

use super::document::DocType;

/// Comparison operators accepted by the ERP list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl FilterOp {
    /// Operator spelling on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
        }
    }
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// The `[field, operator, value]` triple the ERP expects.
    #[must_use]
    pub fn to_triple(&self) -> Value {
        Value::Array(vec![
            Value::String(self.field.clone()),
            Value::String(self.op.as_str().to_string()),
            self.value.clone(),
        ])
    }
}

/// Query against the ERP list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub doctype: DocType,
    pub filters: Vec<Filter>,
    /// Field names to project. Empty means server default (`name` only).
    pub fields: Vec<String>,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    #[must_use]
    pub fn new(doctype: DocType) -> Self {
        Self { doctype, filters: Vec::new(), fields: Vec::new(), order_by: None, limit: None }
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.into(), op, value: value.into() });
        self
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// All filters as the JSON array-of-triples wire form.
    #[must_use]
    pub fn filter_triples(&self) -> Value {
        Value::Array(self.filters.iter().map(Filter::to_triple).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_triple_shape() {
        let filter =
            Filter { field: "employee".to_string(), op: FilterOp::Eq, value: json!("EMP-001") };
        assert_eq!(filter.to_triple(), json!(["employee", "=", "EMP-001"]));
    }

    #[test]
    fn test_query_builder_collects_triples() {
        let query = ListQuery::new(DocType::SalarySlip)
            .filter("employee", FilterOp::Eq, "EMP-001")
            .filter("start_date", FilterOp::Gte, "2025-01-01")
            .filter("start_date", FilterOp::Lte, "2025-01-31")
            .fields(["name", "docstatus"])
            .order_by("start_date desc")
            .limit(20);

        assert_eq!(
            query.filter_triples(),
            json!([
                ["employee", "=", "EMP-001"],
                ["start_date", ">=", "2025-01-01"],
                ["start_date", "<=", "2025-01-31"],
            ])
        );
        assert_eq!(query.fields, vec!["name", "docstatus"]);
        assert_eq!(query.limit, Some(20));
    }

    #[test]
    fn test_operator_spelling() {
        assert_eq!(FilterOp::Ne.as_str(), "!=");
        assert_eq!(FilterOp::Like.as_str(), "like");
    }
}
