use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{cart_items, carts};

/// A shopping cart, identified by an opaque UUID so ids cannot be
/// enumerated. Expiry is left to an external reaper; `created_at` is
/// persisted for it.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub id: Uuid,
}

/// At most one row per (cart, book); adds merge into `quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(Cart))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
}
