//! Client-side list filtering shared by every screen.
//!
//! Screens fetch a whole collection and narrow it in memory with text
//! search, an inclusive date range, a status/type tag, and an owning
//! record id. A filter field that is absent matches everything.

use serde::Deserialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::model::{
    Account, Category, Coupon, Customer, InventoryItem, Order, Product, ProductionBatch, Purchase, Recipe, Sale,
    StockMovement,
};

/// Query-string filter accepted by list routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    /// Case-insensitive substring over the record's searchable text.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub from: Option<Date>,
    #[serde(default)]
    pub to: Option<Date>,
    /// Status, type, or segment, depending on the record.
    #[serde(default, alias = "status", alias = "type", alias = "segment")]
    pub tag: Option<String>,
    /// Owning record: category, inventory item, or account.
    #[serde(default, alias = "category", alias = "item", alias = "account")]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub active: Option<bool>,
}

pub trait Filterable {
    fn search_text(&self) -> Vec<&str>;

    fn date(&self) -> Option<Date> {
        None
    }

    fn tag(&self) -> Option<&str> {
        None
    }

    fn parent(&self) -> Option<Uuid> {
        None
    }

    fn active(&self) -> Option<bool> {
        None
    }
}

impl ListFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.q.as_deref().is_none_or(|q| q.trim().is_empty())
            && self.from.is_none()
            && self.to.is_none()
            && self.tag.is_none()
            && self.parent.is_none()
            && self.active.is_none()
    }

    #[must_use]
    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            if !record.search_text().iter().any(|text| text.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            let Some(day) = record.date() else {
                return false;
            };
            if self.from.is_some_and(|from| day < from) || self.to.is_some_and(|to| day > to) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !record.tag().is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(parent) = self.parent {
            if record.parent() != Some(parent) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if record.active() != Some(active) {
                return false;
            }
        }
        true
    }

    /// Keep the records that match, preserving order.
    #[must_use]
    pub fn apply<T: Filterable>(&self, records: Vec<T>) -> Vec<T> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

// =============================================================================
// RECORD IMPLS
// =============================================================================

impl Filterable for Product {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn date(&self) -> Option<Date> {
        self.created_at.map(|t| t.date())
    }

    fn parent(&self) -> Option<Uuid> {
        self.category_id
    }

    fn active(&self) -> Option<bool> {
        Some(self.is_active)
    }
}

impl Filterable for Category {
    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.slug.as_str()]
    }

    fn parent(&self) -> Option<Uuid> {
        self.parent_id
    }
}

impl Filterable for Order {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.order_number.as_str(), self.customer_name.as_str()];
        text.extend(self.customer_email.as_deref());
        text.extend(self.tracking_number.as_deref());
        text
    }

    fn date(&self) -> Option<Date> {
        self.created_at.map(|t| t.date())
    }

    fn tag(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Filterable for Coupon {
    fn search_text(&self) -> Vec<&str> {
        vec![self.code.as_str()]
    }

    /// A coupon counts as active only while it can be redeemed today.
    fn active(&self) -> Option<bool> {
        Some(self.is_redeemable_on(OffsetDateTime::now_utc().date()))
    }
}

impl Filterable for Customer {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str()];
        text.extend(self.email.as_deref());
        text.extend(self.phone.as_deref());
        text.extend(self.company.as_deref());
        text
    }

    fn date(&self) -> Option<Date> {
        self.created_at.map(|t| t.date())
    }

    fn tag(&self) -> Option<&str> {
        self.segment.as_deref()
    }
}

impl Filterable for InventoryItem {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str()];
        text.extend(self.supplier.as_deref());
        text
    }

    fn tag(&self) -> Option<&str> {
        Some(self.item_type.as_str())
    }
}

impl Filterable for Recipe {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str()];
        text.extend(self.description.as_deref());
        text
    }
}

impl Filterable for ProductionBatch {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.lot_number.as_str()];
        text.extend(self.notes.as_deref());
        text
    }

    fn date(&self) -> Option<Date> {
        self.production_date
    }

    fn tag(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn parent(&self) -> Option<Uuid> {
        self.recipe_id
    }
}

impl Filterable for Sale {
    fn search_text(&self) -> Vec<&str> {
        vec![self.product_name.as_str()]
    }

    fn date(&self) -> Option<Date> {
        self.sale_date
    }

    fn parent(&self) -> Option<Uuid> {
        self.customer_id
    }
}

impl Filterable for Purchase {
    fn search_text(&self) -> Vec<&str> {
        vec![self.supplier_name.as_str(), self.item_name.as_str()]
    }

    fn date(&self) -> Option<Date> {
        Some(self.order_date)
    }

    fn tag(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn parent(&self) -> Option<Uuid> {
        self.inventory_item_id
    }
}

impl Filterable for Account {
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str()];
        text.extend(self.email.as_deref());
        text.extend(self.phone.as_deref());
        text
    }
}

impl Filterable for StockMovement {
    fn search_text(&self) -> Vec<&str> {
        self.reference.as_deref().into_iter().collect()
    }

    fn date(&self) -> Option<Date> {
        self.created_at.map(|t| t.date())
    }

    fn tag(&self) -> Option<&str> {
        Some(self.reason.as_str())
    }

    fn parent(&self) -> Option<Uuid> {
        Some(self.inventory_item_id)
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
