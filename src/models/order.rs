use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::{order_items, orders};

/// Attempts at finding a free order number before giving up. Collisions
/// in a 40-bit token space are astronomically rare; the cap exists so a
/// pathological state can never loop forever.
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    Pending,
    Complete,
    Failed,
}

impl PaymentStatus {
    /// Single-character code stored in the `payment_status` column.
    pub fn code(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "P",
            PaymentStatus::Complete => "C",
            PaymentStatus::Failed => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(PaymentStatus::Pending),
            "C" => Some(PaymentStatus::Complete),
            "F" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Append-only once created; payment_status is the only mutable field and
/// order_number never changes after assignment.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub payment_status: String,
    pub customer_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub total_amount: BigDecimal,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub payment_status: String,
    pub customer_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub total_amount: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(Order))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
    /// Captured at order creation; never recomputed from the live catalog.
    pub unit_price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Produce a candidate order number: a fixed tag plus the first ten hex
/// characters of a v4 UUID, upper-cased.
pub fn generate_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", hex[..10].to_uppercase())
}

/// Find an order number not yet present in `orders`. The UNIQUE constraint
/// on the column backstops the remaining check-to-insert window.
pub fn reserve_order_number(conn: &mut PgConnection) -> Result<String, AppError> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number();
        let taken: bool = diesel::select(exists(
            orders::table.filter(orders::order_number.eq(&candidate)),
        ))
        .get_result(conn)?;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(AppError::InvalidState(
        "could not allocate a unique order number".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_number_has_tag_and_ten_hex_chars() {
        let number = generate_order_number();
        assert_eq!(number.len(), 14);
        let token = number.strip_prefix("ORD-").expect("missing ORD- tag");
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn order_numbers_are_distinct_across_many_generations() {
        let numbers: HashSet<String> = (0..100).map(|_| generate_order_number()).collect();
        assert_eq!(numbers.len(), 100);
    }

    #[test]
    fn payment_status_codes_round_trip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Complete,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_payment_code_is_rejected() {
        assert_eq!(PaymentStatus::from_code("X"), None);
    }
}
