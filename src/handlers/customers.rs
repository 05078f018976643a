use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::customer::{Customer, NewCustomer};
use crate::schema::customers;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    /// Upstream account identity this profile belongs to.
    pub account_id: Uuid,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

fn customer_response(customer: Customer) -> CustomerResponse {
    CustomerResponse {
        id: customer.id,
        account_id: customer.account_id,
        phone: customer.phone,
        birth_date: customer.birth_date,
    }
}

fn check_phone(phone: &str) -> Result<(), AppError> {
    if phone.is_empty() || phone.len() > 255 {
        return Err(AppError::validation("phone", "must be 1-255 characters"));
    }
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /customers
#[utoipa::path(
    get,
    path = "/customers",
    responses(
        (status = 200, description = "All customers", body = [CustomerResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn list_customers(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let customers = web::block(move || {
        let mut conn = pool.get()?;
        let rows: Vec<Customer> = customers::table
            .select(Customer::as_select())
            .load(&mut conn)?;
        Ok::<_, AppError>(rows.into_iter().map(customer_response).collect::<Vec<_>>())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(customers))
}

/// POST /customers
#[utoipa::path(
    post,
    path = "/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "A profile already exists for this account"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    pool: web::Data<DbPool>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    check_phone(&body.phone)?;

    let customer = web::block(move || {
        let mut conn = pool.get()?;
        let customer: Customer = diesel::insert_into(customers::table)
            .values(&NewCustomer {
                id: Uuid::new_v4(),
                account_id: body.account_id,
                phone: body.phone,
                birth_date: body.birth_date,
            })
            .returning(Customer::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(customer_response(customer))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(customer))
}

/// GET /customers/{customer_id}
#[utoipa::path(
    get,
    path = "/customers/{customer_id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
    ),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();

    let customer = web::block(move || {
        let mut conn = pool.get()?;
        let customer: Customer = customers::table
            .find(customer_id)
            .select(Customer::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("customer"))?;
        Ok::<_, AppError>(customer_response(customer))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(customer))
}

/// PUT /customers/{customer_id}
#[utoipa::path(
    put,
    path = "/customers/{customer_id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
    ),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let body = body.into_inner();
    check_phone(&body.phone)?;

    let customer = web::block(move || {
        let mut conn = pool.get()?;
        let customer: Customer = diesel::update(customers::table.find(customer_id))
            .set((
                customers::phone.eq(body.phone),
                customers::birth_date.eq(body.birth_date),
            ))
            .returning(Customer::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("customer"))?;
        Ok::<_, AppError>(customer_response(customer))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(customer))
}

/// DELETE /customers/{customer_id}
///
/// Blocked (409) while orders reference the customer; otherwise cascades
/// the customer's addresses.
#[utoipa::path(
    delete,
    path = "/customers/{customer_id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
    ),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer has orders"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(customers::table.find(customer_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("customer"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
