use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::book::Book;
use crate::models::cart::{Cart, CartItem, NewCart};
use crate::schema::{books, cart_items, carts};

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub book: BookSummary,
    pub quantity: i32,
    pub total_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub created_at: String,
    pub items: Vec<CartItemResponse>,
    pub total_price: String,
}

// ── Shared helpers (also used by the cart-item handlers) ─────────────────────

pub(crate) fn line_total(quantity: i32, unit_price: &BigDecimal) -> BigDecimal {
    unit_price * BigDecimal::from(quantity)
}

pub(crate) fn cart_item_response(item: &CartItem, book: &Book) -> CartItemResponse {
    CartItemResponse {
        id: item.id,
        book: BookSummary {
            id: book.id,
            title: book.title.clone(),
            price: book.price.to_string(),
        },
        quantity: item.quantity,
        total_price: line_total(item.quantity, &book.price).to_string(),
    }
}

/// Load a cart's items joined to their books. Prices are whatever the
/// catalog says right now; nothing here is cached or frozen.
pub(crate) fn load_cart_items(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<(CartItem, Book)>, AppError> {
    let rows = cart_items::table
        .inner_join(books::table)
        .filter(cart_items::cart_id.eq(cart_id))
        .select((CartItem::as_select(), Book::as_select()))
        .load::<(CartItem, Book)>(conn)?;
    Ok(rows)
}

pub(crate) fn cart_response(
    conn: &mut PgConnection,
    cart: &Cart,
) -> Result<CartResponse, AppError> {
    let rows = load_cart_items(conn, cart.id)?;
    let total = rows
        .iter()
        .fold(BigDecimal::from(0), |acc, (item, book)| {
            acc + line_total(item.quantity, &book.price)
        })
        .with_scale(2);
    Ok(CartResponse {
        id: cart.id,
        created_at: cart.created_at.to_rfc3339(),
        items: rows
            .iter()
            .map(|(item, book)| cart_item_response(item, book))
            .collect(),
        total_price: total.to_string(),
    })
}

pub(crate) fn find_cart(conn: &mut PgConnection, cart_id: Uuid) -> Result<Cart, AppError> {
    carts::table
        .find(cart_id)
        .select(Cart::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("cart"))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /carts
///
/// Creates an empty cart with a fresh opaque id.
#[utoipa::path(
    post,
    path = "/carts",
    responses(
        (status = 201, description = "Cart created", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn create_cart(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let cart: Cart = diesel::insert_into(carts::table)
            .values(&NewCart { id: Uuid::new_v4() })
            .returning(Cart::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(CartResponse {
            id: cart.id,
            created_at: cart.created_at.to_rfc3339(),
            items: vec![],
            total_price: "0.00".to_string(),
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(cart))
}

/// GET /carts/{cart_id}
///
/// Returns the cart with its items eagerly resolved and a total computed
/// from live catalog prices.
#[utoipa::path(
    get,
    path = "/carts/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 200, description = "Cart found", body = CartResponse),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();

    let cart = web::block(move || {
        let mut conn = pool.get()?;
        let cart = find_cart(&mut conn, cart_id)?;
        cart_response(&mut conn, &cart)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart))
}

/// DELETE /carts/{cart_id}
///
/// Deletes the cart; the database cascades deletion of its items.
#[utoipa::path(
    delete,
    path = "/carts/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 204, description = "Cart deleted"),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn delete_cart(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(carts::table.find(cart_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("cart"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
