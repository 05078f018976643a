use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::books;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Informational in the cart/order subsystem; never decremented here.
    pub stock: i32,
    pub isbn: Option<String>,
    pub price: BigDecimal,
    pub author_id: Uuid,
    pub genre_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = books)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub stock: i32,
    pub isbn: Option<String>,
    pub price: BigDecimal,
    pub author_id: Uuid,
    pub genre_id: Uuid,
}
