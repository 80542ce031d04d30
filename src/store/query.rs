use serde_json::Value;

use super::StoreError;

/// Equality on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: &'static str,
    pub value: Value,
}

impl Predicate {
    pub fn matches(&self, document: &Value) -> bool {
        document.get(self.field) == Some(&self.value)
    }
}

/// Ordering by the container's creation sequence. Ties, which only a
/// backend without a strict sequence can produce, are broken by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

/// A query against a single partition.
///
/// Results are always ordered; when no order is given the default
/// ([`Order::NewestFirst`]) applies, so pagination is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    order: Option<Order>,
    page: Option<Page>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            field,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.page = Some(Page { offset, limit });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn effective_order(&self) -> Order {
        self.order.unwrap_or_default()
    }

    pub fn page_spec(&self) -> Option<Page> {
        self.page
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(page) = self.page {
            if page.limit == 0 {
                return Err(StoreError::Invalid(
                    "page limit must be greater than zero".to_string(),
                ));
            }
        }
        if let Some(p) = self.predicates.iter().find(|p| p.field.is_empty()) {
            return Err(StoreError::Invalid(format!(
                "predicate on empty field name (value {})",
                p.value
            )));
        }
        Ok(())
    }
}
