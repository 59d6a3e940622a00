//! Manufacturing ERP records: inventory, recipes, production batches,
//! sales, purchasing, current accounts, stock movements, QC tests, and
//! exchange rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::null_as_zero;

// =============================================================================
// INVENTORY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    RawMaterial,
    Packaging,
    FinishedGood,
}

impl ItemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RawMaterial => "raw_material",
            Self::Packaging => "packaging",
            Self::FinishedGood => "finished_good",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub unit: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub stock_quantity: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub unit_cost: Decimal,
    pub currency: String,
    #[serde(default)]
    pub critical_level: Option<Decimal>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl InventoryItem {
    #[must_use]
    pub fn is_below_critical(&self) -> bool {
        self.critical_level.is_some_and(|level| self.stock_quantity <= level)
    }
}

// =============================================================================
// RECIPES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<Uuid>,
    pub inventory_item_id: Uuid,
    pub percentage: Decimal,
    #[serde(default)]
    pub position: i32,
}

/// A recipe together with its ordered ingredient lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeWithIngredients {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

// =============================================================================
// PRODUCTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    Planned,
    #[serde(rename = "In QC")]
    InQc,
    Completed,
}

impl BatchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InQc => "In QC",
            Self::Completed => "Completed",
        }
    }

    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Planned" | "planned" => Some(Self::Planned),
            "In QC" | "in_qc" | "InQc" => Some(Self::InQc),
            "Completed" | "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// The five cost buckets recorded on a batch, all in the batch currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostComponents {
    pub raw_material_cost: Decimal,
    pub packaging_cost: Decimal,
    pub shipping_cost: Decimal,
    pub overhead_cost: Decimal,
    pub financing_cost: Decimal,
}

impl CostComponents {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.raw_material_cost + self.packaging_cost + self.shipping_cost + self.overhead_cost + self.financing_cost
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub lot_number: String,
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    pub currency: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub raw_material_cost: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub packaging_cost: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub shipping_cost: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub overhead_cost: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub financing_cost: Decimal,
    pub status: BatchStatus,
    #[serde(default)]
    pub production_date: Option<Date>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProductionBatch {
    #[must_use]
    pub fn costs(&self) -> CostComponents {
        CostComponents {
            raw_material_cost: self.raw_material_cost,
            packaging_cost: self.packaging_cost,
            shipping_cost: self.shipping_cost,
            overhead_cost: self.overhead_cost,
            financing_cost: self.financing_cost,
        }
    }
}

// =============================================================================
// SALES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub sale_date: Option<Date>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_amount: Decimal,
    pub currency: String,
    /// Cost already computed and stored when the sale was recorded.
    #[serde(default)]
    pub total_production_cost: Option<Decimal>,
    #[serde(default)]
    pub production_batch_id: Option<Uuid>,
}

// =============================================================================
// PURCHASING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub supplier_name: String,
    #[serde(default)]
    pub inventory_item_id: Option<Uuid>,
    pub item_name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub unit_price: Decimal,
    pub currency: String,
    pub status: PurchaseStatus,
    pub order_date: Date,
    #[serde(default)]
    pub received_date: Option<Date>,
}

impl Purchase {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

// =============================================================================
// CURRENT ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Supplier,
    Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub currency: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub transaction_date: Date,
}

// =============================================================================
// STOCK HISTORY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementReason {
    Purchase,
    Production,
    Sale,
    Adjustment,
}

impl MovementReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Production => "production",
            Self::Sale => "sale",
            Self::Adjustment => "adjustment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub inventory_item_id: Uuid,
    /// Signed change: positive adds stock, negative removes it.
    pub quantity_change: Decimal,
    pub reason: MovementReason,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

// =============================================================================
// QUALITY CONTROL
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub batch_id: Uuid,
    pub parameter: String,
    #[serde(default)]
    pub spec_min: Option<Decimal>,
    #[serde(default)]
    pub spec_max: Option<Decimal>,
    pub measured_value: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl QualityTest {
    /// Inside every bound that is present.
    #[must_use]
    pub fn passes(&self) -> bool {
        self.spec_min.is_none_or(|min| self.measured_value >= min)
            && self.spec_max.is_none_or(|max| self.measured_value <= max)
    }
}

// =============================================================================
// EXCHANGE RATES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency: String,
    pub rate: Decimal,
}

#[cfg(test)]
#[path = "erp_test.rs"]
mod tests;
