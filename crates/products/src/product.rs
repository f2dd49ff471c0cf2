use serde::{Deserialize, Serialize};

use restock_core::{DomainError, DomainResult, Entity, ProductId, find_by_id};

/// Share of the unit price assumed as purchase cost when a product carries no
/// explicit `unit_cost` (i.e. a 35% margin).
pub const DEFAULT_COST_RATIO: f64 = 0.65;

/// Catalog product as seen by one analysis call.
///
/// Owned and mutated by the external inventory store; the analysis only ever
/// reads a snapshot of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub unit_price: f64,
    /// Explicit purchase cost; when absent the cost is derived from the price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    pub current_stock: u32,
    /// Aggregate sales signal kept by the store, used when granular movement
    /// history is missing.
    #[serde(default)]
    pub units_sold_last_30_days: u32,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: f64, current_stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            category: String::new(),
            unit_price,
            unit_cost: None,
            current_stock,
            units_sold_last_30_days: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_units_sold_last_30_days(mut self, units: u32) -> Self {
        self.units_sold_last_30_days = units;
        self
    }

    /// Check the invariants the analysis relies on.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "product {}: name cannot be empty",
                self.id
            )));
        }
        if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            return Err(DomainError::validation(format!(
                "product {}: unit_price must be a finite non-negative number",
                self.id
            )));
        }
        if let Some(cost) = self.unit_cost {
            if !(cost.is_finite() && cost >= 0.0) {
                return Err(DomainError::validation(format!(
                    "product {}: unit_cost must be a finite non-negative number",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Purchase cost per unit: the explicit cost if known, otherwise
    /// `unit_price × fallback_ratio`.
    pub fn effective_unit_cost(&self, fallback_ratio: f64) -> f64 {
        self.unit_cost
            .unwrap_or(self.unit_price * fallback_ratio)
    }

    /// Category label for grouping; blank categories collapse into one bucket.
    pub fn category_label(&self) -> &str {
        let trimmed = self.category.trim();
        if trimmed.is_empty() { UNCATEGORIZED } else { trimmed }
    }

    /// Value of the stock on hand at sale price.
    pub fn stock_value(&self) -> f64 {
        f64::from(self.current_stock) * self.unit_price
    }
}

/// Label used for products without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Look up a product by id in a snapshot.
pub fn find_product(products: &[Product], id: ProductId) -> Option<&Product> {
    find_by_id(products, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product::new(ProductId::new(1), "Notebook", 10.0, 5).with_category("Stationery")
    }

    #[test]
    fn cost_falls_back_to_share_of_price() {
        let p = sample();
        assert!((p.effective_unit_cost(DEFAULT_COST_RATIO) - 6.5).abs() < 1e-9);
    }

    #[test]
    fn explicit_cost_wins_over_fallback() {
        let p = sample().with_unit_cost(4.0);
        assert_eq!(p.effective_unit_cost(DEFAULT_COST_RATIO), 4.0);
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut p = sample();
        p.unit_price = -1.0;
        match p.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("unit_price")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_blank_name_and_nan_cost() {
        let mut p = sample();
        p.name = "  ".to_string();
        assert!(p.validate().is_err());

        let p = sample().with_unit_cost(f64::NAN);
        assert!(p.validate().is_err());
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn blank_category_is_uncategorized() {
        let p = Product::new(ProductId::new(2), "Pen", 1.5, 0);
        assert_eq!(p.category_label(), UNCATEGORIZED);
        assert_eq!(sample().category_label(), "Stationery");
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{"id":3,"name":"Glue","unit_price":2.0,"current_stock":4}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, ProductId::new(3));
        assert_eq!(p.unit_cost, None);
        assert_eq!(p.units_sold_last_30_days, 0);
        assert_eq!(p.category_label(), UNCATEGORIZED);
    }

    #[test]
    fn negative_stock_is_rejected_at_deserialization() {
        let json = r#"{"id":3,"name":"Glue","unit_price":2.0,"current_stock":-4}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn find_product_by_id() {
        let products = vec![sample(), Product::new(ProductId::new(9), "Ink", 3.0, 1)];
        assert_eq!(find_product(&products, ProductId::new(9)).map(|p| p.name.as_str()), Some("Ink"));
        assert!(find_product(&products, ProductId::new(10)).is_none());
    }
}
