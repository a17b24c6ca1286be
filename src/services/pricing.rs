use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::enums::TransactionKind;
use crate::entities::product;

/// Pluggable sale-price computation. The ledger treats implementations as
/// a black box; the product is passed so policies can price off attributes
/// or stock position.
pub trait PricingPolicy: Send + Sync {
    fn sale_price(
        &self,
        product: &product::Model,
        unit_cost: Decimal,
        kind: TransactionKind,
    ) -> Decimal;
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Cost pass-through: the sale price is the unit cost rounded to cents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostPricing;

impl PricingPolicy for CostPricing {
    fn sale_price(
        &self,
        _product: &product::Model,
        unit_cost: Decimal,
        _kind: TransactionKind,
    ) -> Decimal {
        round_money(unit_cost)
    }
}

/// Fixed percentage margin over cost, applied to sales only; purchases
/// price at cost.
#[derive(Debug, Clone, Copy)]
pub struct MarginPricing {
    pub margin_percent: Decimal,
}

impl MarginPricing {
    pub fn new(margin_percent: Decimal) -> Self {
        Self { margin_percent }
    }
}

impl PricingPolicy for MarginPricing {
    fn sale_price(
        &self,
        _product: &product::Model,
        unit_cost: Decimal,
        kind: TransactionKind,
    ) -> Decimal {
        match kind {
            TransactionKind::Purchase => round_money(unit_cost),
            TransactionKind::Sale => {
                let factor = Decimal::ONE + self.margin_percent / Decimal::ONE_HUNDRED;
                round_money(unit_cost * factor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::ProductStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_product() -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            code: Some("SKU-1".to_string()),
            name: "Sample".to_string(),
            description: None,
            stock: dec!(10),
            min_stock: dec!(1),
            attributes: None,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn cost_pricing_passes_cost_through() {
        let product = sample_product();
        let price = CostPricing.sale_price(&product, dec!(5.0000), TransactionKind::Purchase);
        assert_eq!(price, dec!(5.00));
    }

    #[test]
    fn cost_pricing_rounds_half_up_to_cents() {
        let product = sample_product();
        let price = CostPricing.sale_price(&product, dec!(2.4851), TransactionKind::Sale);
        assert_eq!(price, dec!(2.49));
    }

    #[test]
    fn margin_pricing_marks_up_sales_only() {
        let product = sample_product();
        let policy = MarginPricing::new(dec!(30));

        let sale = policy.sale_price(&product, dec!(10.00), TransactionKind::Sale);
        assert_eq!(sale, dec!(13.00));

        let purchase = policy.sale_price(&product, dec!(10.00), TransactionKind::Purchase);
        assert_eq!(purchase, dec!(10.00));
    }
}
