use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::addresses;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = addresses)]
#[diesel(belongs_to(crate::models::customer::Customer))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub customer_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddress {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub customer_id: Uuid,
}
