use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{current_timestamp, DataAmount};

/// A sellable data bundle.
///
/// `price` is what the customer pays; `supplier_cost` is the wholesale
/// amount owed upstream. Both are GHS with 2-decimal fixed-point
/// precision. Orders copy the price at creation time, so editing a
/// package never changes existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub data_amount: DataAmount,
    pub price: Decimal,
    pub supplier_cost: Decimal,
    pub is_active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Package {
    pub fn new(data_amount: DataAmount, price: Decimal, supplier_cost: Decimal) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            data_amount,
            price,
            supplier_cost,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_package_is_active() {
        let pkg = Package::new(
            "10GB".parse().unwrap(),
            Decimal::from_str("46.00").unwrap(),
            Decimal::from_str("32.20").unwrap(),
        );

        assert!(pkg.is_active);
        assert_eq!(pkg.data_amount.gigabytes(), 10);
        assert!(pkg.supplier_cost < pkg.price);
    }
}
