use actix_web::{web, HttpResponse};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::address::{Address, NewAddress};
use crate::schema::{addresses, customers};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub customer_id: Uuid,
}

fn address_response(address: Address) -> AddressResponse {
    AddressResponse {
        id: address.id,
        street: address.street,
        city: address.city,
        customer_id: address.customer_id,
    }
}

fn validate_address(body: &AddressRequest) -> Result<(), AppError> {
    if body.street.is_empty() || body.street.len() > 255 {
        return Err(AppError::validation("street", "must be 1-255 characters"));
    }
    if body.city.is_empty() || body.city.len() > 255 {
        return Err(AppError::validation("city", "must be 1-255 characters"));
    }
    Ok(())
}

fn check_customer(conn: &mut PgConnection, customer_id: Uuid) -> Result<(), AppError> {
    let customer_exists: bool =
        diesel::select(exists(customers::table.find(customer_id))).get_result(conn)?;
    if !customer_exists {
        return Err(AppError::not_found("customer"));
    }
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /customers/{customer_id}/addresses
#[utoipa::path(
    get,
    path = "/customers/{customer_id}/addresses",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
    ),
    responses(
        (status = 200, description = "Customer addresses", body = [AddressResponse]),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn list_addresses(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();

    let addresses = web::block(move || {
        let mut conn = pool.get()?;
        check_customer(&mut conn, customer_id)?;
        let rows: Vec<Address> = addresses::table
            .filter(addresses::customer_id.eq(customer_id))
            .select(Address::as_select())
            .load(&mut conn)?;
        Ok::<_, AppError>(rows.into_iter().map(address_response).collect::<Vec<_>>())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(addresses))
}

/// POST /customers/{customer_id}/addresses
#[utoipa::path(
    post,
    path = "/customers/{customer_id}/addresses",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
    ),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address created", body = AddressResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn create_address(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let body = body.into_inner();
    validate_address(&body)?;

    let address = web::block(move || {
        let mut conn = pool.get()?;
        check_customer(&mut conn, customer_id)?;
        let address: Address = diesel::insert_into(addresses::table)
            .values(&NewAddress {
                id: Uuid::new_v4(),
                street: body.street,
                city: body.city,
                customer_id,
            })
            .returning(Address::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(address_response(address))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(address))
}

/// DELETE /customers/{customer_id}/addresses/{address_id}
///
/// Orders that shipped to this address keep existing; their
/// shipping_address_id is nulled by the storage layer.
#[utoipa::path(
    delete,
    path = "/customers/{customer_id}/addresses/{address_id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
        ("address_id" = Uuid, Path, description = "Address UUID"),
    ),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Address not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn delete_address(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (customer_id, address_id) = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(
            addresses::table
                .filter(addresses::id.eq(address_id))
                .filter(addresses::customer_id.eq(customer_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("address"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
