use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::customers;

/// Customer profile, one-to-one with an upstream account identity.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Customer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}
