//! In-memory mock of the `DocumentApi` port.
//!
//! Stores documents keyed by doctype and name, assigns names the way the
//! real ERP does (naming series for employees, assignments and slips, the
//! natural key elsewhere) and counts calls per operation so tests can
//! assert on traffic, not just on outcomes. Failures can be scripted,
//! either as a one-shot queue or per doctype.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use paybridge_core::DocumentApi;
use paybridge_domain::{
    coerce_f64, DocStatus, DocType, Document, ErpError, Filter, FilterOp, ListQuery, Result,
};
use serde_json::Value;

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallCounts {
    pub insert: usize,
    pub save: usize,
    pub submit: usize,
    pub cancel: usize,
    pub get: usize,
    pub list: usize,
    pub delete: usize,
}

#[derive(Default)]
struct State {
    docs: HashMap<(DocType, String), Document>,
    counts: CallCounts,
    sequence: u64,
    stamp: u64,
    queued_submit_errors: VecDeque<ErpError>,
    submit_errors_by_type: HashMap<DocType, ErpError>,
    insert_errors_by_type: HashMap<DocType, ErpError>,
    get_misses: usize,
}

/// In-memory `DocumentApi` double.
#[derive(Default)]
pub struct MockErp {
    state: Mutex<State>,
}

impl MockErp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a document. It must already carry a name.
    pub fn seed(&self, doc: Document) {
        let mut state = self.state.lock().unwrap();
        let name = doc.name.clone().unwrap();
        state.stamp += 1;
        let mut stored = doc;
        stored.modified = Some(format!("stamp-{}", state.stamp));
        state.docs.insert((stored.doctype, name), stored);
    }

    /// Snapshot of the per-operation call counters.
    pub fn counts(&self) -> CallCounts {
        self.state.lock().unwrap().counts
    }

    /// Current stored copy of a document.
    pub fn document(&self, doctype: DocType, name: &str) -> Option<Document> {
        self.state.lock().unwrap().docs.get(&(doctype, name.to_string())).cloned()
    }

    pub fn documents_of(&self, doctype: DocType) -> Vec<Document> {
        let state = self.state.lock().unwrap();
        let mut docs: Vec<Document> =
            state.docs.values().filter(|doc| doc.doctype == doctype).cloned().collect();
        docs.sort_by(|a, b| a.name.cmp(&b.name));
        docs
    }

    /// Fail the next submit call with `err`, in queue order.
    pub fn queue_submit_error(&self, err: ErpError) {
        self.state.lock().unwrap().queued_submit_errors.push_back(err);
    }

    /// Fail every submit of `doctype` with `err` until cleared.
    pub fn fail_submit_for(&self, doctype: DocType, err: ErpError) {
        self.state.lock().unwrap().submit_errors_by_type.insert(doctype, err);
    }

    /// Fail every insert of `doctype` with `err` until cleared.
    pub fn fail_insert_for(&self, doctype: DocType, err: ErpError) {
        self.state.lock().unwrap().insert_errors_by_type.insert(doctype, err);
    }

    /// Make the next `n` get calls report not-found regardless of state.
    pub fn set_get_misses(&self, n: usize) {
        self.state.lock().unwrap().get_misses = n;
    }
}

#[async_trait]
impl DocumentApi for MockErp {
    async fn insert(&self, doc: &Document) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        state.counts.insert += 1;

        if let Some(err) = state.insert_errors_by_type.get(&doc.doctype) {
            return Err(err.clone());
        }
        if let Some(existing) = duplicate_of(&state.docs, doc) {
            return Err(ErpError::DuplicateEntry(format!(
                "Duplicate entry: {} {existing} already exists",
                doc.doctype
            )));
        }

        let name = assign_name(&mut state, doc)?;
        state.stamp += 1;
        let mut stored = doc.clone();
        stored.name = Some(name.clone());
        stored.modified = Some(format!("stamp-{}", state.stamp));
        state.docs.insert((doc.doctype, name), stored.clone());
        Ok(stored)
    }

    async fn save(&self, doc: &Document) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        state.counts.save += 1;

        let Some(name) = doc.name.clone() else {
            return Err(ErpError::Validation("cannot save a document without a name".to_string()));
        };
        state.stamp += 1;
        let mut stored = doc.clone();
        stored.modified = Some(format!("stamp-{}", state.stamp));
        state.docs.insert((doc.doctype, name), stored.clone());
        Ok(stored)
    }

    async fn submit(&self, doc: &Document) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        state.counts.submit += 1;

        if let Some(err) = state.queued_submit_errors.pop_front() {
            return Err(err);
        }
        if let Some(err) = state.submit_errors_by_type.get(&doc.doctype) {
            return Err(err.clone());
        }

        let Some(name) = doc.name.clone() else {
            return Err(ErpError::Validation("cannot submit a document without a name".to_string()));
        };
        let stamp = {
            state.stamp += 1;
            state.stamp
        };
        let Some(stored) = state.docs.get_mut(&(doc.doctype, name.clone())) else {
            return Err(ErpError::Validation(format!("{} {name} not found", doc.doctype)));
        };
        match stored.docstatus {
            DocStatus::Submitted => Err(ErpError::Validation(format!(
                "{} {name} is already submitted",
                doc.doctype
            ))),
            DocStatus::Cancelled => Err(ErpError::Validation(format!(
                "Cannot edit cancelled document {name}"
            ))),
            DocStatus::Draft => {
                stored.docstatus = DocStatus::Submitted;
                stored.modified = Some(format!("stamp-{stamp}"));
                Ok(stored.clone())
            }
        }
    }

    async fn cancel(&self, doc: &Document) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        state.counts.cancel += 1;

        let Some(name) = doc.name.clone() else {
            return Err(ErpError::Validation("cannot cancel a document without a name".to_string()));
        };
        let stamp = {
            state.stamp += 1;
            state.stamp
        };
        let Some(stored) = state.docs.get_mut(&(doc.doctype, name.clone())) else {
            return Err(ErpError::Validation(format!("{} {name} not found", doc.doctype)));
        };
        match stored.docstatus {
            DocStatus::Cancelled => Err(ErpError::Validation(format!(
                "{} {name} is already cancelled",
                doc.doctype
            ))),
            DocStatus::Draft => Err(ErpError::Validation(format!(
                "{} {name} is a draft and cannot be cancelled",
                doc.doctype
            ))),
            DocStatus::Submitted => {
                stored.docstatus = DocStatus::Cancelled;
                stored.modified = Some(format!("stamp-{stamp}"));
                Ok(stored.clone())
            }
        }
    }

    async fn delete(&self, doctype: DocType, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.counts.delete += 1;
        state.docs.remove(&(doctype, name.to_string()));
        Ok(())
    }

    async fn get(&self, doctype: DocType, name: &str) -> Result<Option<Document>> {
        let mut state = self.state.lock().unwrap();
        state.counts.get += 1;
        if state.get_misses > 0 {
            state.get_misses -= 1;
            return Ok(None);
        }
        Ok(state.docs.get(&(doctype, name.to_string())).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Document>> {
        let mut state = self.state.lock().unwrap();
        state.counts.list += 1;

        let mut rows: Vec<Document> = state
            .docs
            .values()
            .filter(|doc| {
                doc.doctype == query.doctype
                    && query.filters.iter().all(|filter| filter_matches(doc, filter))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(order) = query.order_by.as_deref() {
            let mut parts = order.split_whitespace();
            if let Some(field) = parts.next() {
                let descending = parts.next().is_some_and(|d| d.eq_ignore_ascii_case("desc"));
                rows.sort_by(|a, b| {
                    let ord = match (field_value(a, field), field_value(b, field)) {
                        (Some(x), Some(y)) => compare(&x, &y).unwrap_or(Ordering::Equal),
                        (Some(_), None) => Ordering::Greater,
                        (None, Some(_)) => Ordering::Less,
                        (None, None) => Ordering::Equal,
                    };
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            }
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Natural key the real ERP would reject a duplicate insert on.
fn duplicate_of(docs: &HashMap<(DocType, String), Document>, doc: &Document) -> Option<String> {
    match doc.doctype {
        DocType::Employee => {
            let number = doc.str_field("employee_number")?;
            docs.values()
                .find(|d| {
                    d.doctype == DocType::Employee
                        && d.str_field("employee_number") == Some(number)
                })
                .and_then(|d| d.name.clone())
        }
        DocType::Company | DocType::SalaryComponent | DocType::SalaryStructure => {
            let key = natural_name(doc)?;
            docs.contains_key(&(doc.doctype, key.clone())).then_some(key)
        }
        // Series-named doctypes never collide on insert.
        DocType::SalaryStructureAssignment | DocType::SalarySlip => None,
    }
}

fn natural_name(doc: &Document) -> Option<String> {
    match doc.doctype {
        DocType::Company => {
            doc.str_field("company_name").map(str::to_string).or_else(|| doc.name.clone())
        }
        DocType::SalaryComponent => {
            doc.str_field("salary_component").map(str::to_string).or_else(|| doc.name.clone())
        }
        DocType::SalaryStructure => doc.name.clone(),
        _ => None,
    }
}

fn assign_name(state: &mut State, doc: &Document) -> Result<String> {
    match doc.doctype {
        DocType::Company | DocType::SalaryComponent | DocType::SalaryStructure => natural_name(doc)
            .ok_or_else(|| {
                ErpError::Validation(format!("{}: mandatory name field missing", doc.doctype))
            }),
        DocType::Employee => {
            state.sequence += 1;
            Ok(format!("HR-EMP-{:05}", state.sequence))
        }
        DocType::SalaryStructureAssignment => {
            state.sequence += 1;
            Ok(format!("SSA-{:04}", state.sequence))
        }
        DocType::SalarySlip => {
            state.sequence += 1;
            Ok(format!("SAL-{:04}", state.sequence))
        }
    }
}

/// Envelope fields resolve specially; everything else reads the field map.
fn field_value(doc: &Document, field: &str) -> Option<Value> {
    match field {
        "name" => doc.name.clone().map(Value::String),
        "docstatus" => Some(Value::from(doc.docstatus.as_int())),
        "modified" => doc.modified.clone().map(Value::String),
        _ => doc.field(field).cloned(),
    }
}

fn filter_matches(doc: &Document, filter: &Filter) -> bool {
    let Some(actual) = field_value(doc, &filter.field) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => loose_eq(&actual, &filter.value),
        FilterOp::Ne => !loose_eq(&actual, &filter.value),
        FilterOp::Gt => compare(&actual, &filter.value).is_some_and(Ordering::is_gt),
        FilterOp::Gte => compare(&actual, &filter.value).is_some_and(Ordering::is_ge),
        FilterOp::Lt => compare(&actual, &filter.value).is_some_and(Ordering::is_lt),
        FilterOp::Lte => compare(&actual, &filter.value).is_some_and(Ordering::is_le),
        FilterOp::Like => {
            let pattern = filter.value.as_str().unwrap_or_default().trim_matches('%');
            actual.as_str().is_some_and(|s| s.contains(pattern))
        }
    }
}

/// Numeric equality when both sides coerce; exact JSON equality otherwise.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (coerce_f64(a), coerce_f64(b)) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

/// Numbers compare numerically, strings lexicographically, which makes ISO
/// dates order correctly.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (coerce_f64(a), coerce_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
