use actix_web::{web, HttpResponse};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::book::Book;
use crate::models::cart::{CartItem, NewCartItem};
use crate::schema::{books, cart_items};

use super::carts::{cart_item_response, find_cart, load_cart_items, CartItemResponse};

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub book_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

fn check_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::validation("quantity", "must be at least 1"));
    }
    Ok(())
}

fn find_book(conn: &mut PgConnection, book_id: Uuid) -> Result<Book, AppError> {
    books::table
        .find(book_id)
        .select(Book::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("book"))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /carts/{cart_id}/items
#[utoipa::path(
    get,
    path = "/carts/{cart_id}/items",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 200, description = "Cart items", body = [CartItemResponse]),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart-items"
)]
pub async fn list_cart_items(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();

    let items = web::block(move || {
        let mut conn = pool.get()?;
        find_cart(&mut conn, cart_id)?;
        let rows = load_cart_items(&mut conn, cart_id)?;
        Ok::<_, AppError>(
            rows.iter()
                .map(|(item, book)| cart_item_response(item, book))
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(items))
}

/// POST /carts/{cart_id}/items
///
/// Adds a book to the cart. If the cart already holds the book, the
/// requested quantity is merged into the existing row via a conditional
/// upsert, so concurrent adds can never produce duplicate rows.
#[utoipa::path(
    post,
    path = "/carts/{cart_id}/items",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
    ),
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Item added or merged", body = CartItemResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Cart or book not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart-items"
)]
pub async fn add_cart_item(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let body = body.into_inner();
    check_quantity(body.quantity)?;

    let item = web::block(move || {
        let mut conn = pool.get()?;
        find_cart(&mut conn, cart_id)?;
        let book = find_book(&mut conn, body.book_id)?;

        let item: CartItem = diesel::insert_into(cart_items::table)
            .values(&NewCartItem {
                id: Uuid::new_v4(),
                cart_id,
                book_id: body.book_id,
                quantity: body.quantity,
            })
            .on_conflict((cart_items::cart_id, cart_items::book_id))
            .do_update()
            .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
            .returning(CartItem::as_returning())
            .get_result(&mut conn)?;

        Ok::<_, AppError>(cart_item_response(&item, &book))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(item))
}

/// PATCH /carts/{cart_id}/items/{item_id}
///
/// Replaces the stored quantity entirely (no merge). Removal is a distinct
/// operation, so 0 is rejected.
#[utoipa::path(
    patch,
    path = "/carts/{cart_id}/items/{item_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
        ("item_id" = Uuid, Path, description = "Cart item UUID"),
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartItemResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Cart item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart-items"
)]
pub async fn update_cart_item(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    let body = body.into_inner();
    check_quantity(body.quantity)?;

    let item = web::block(move || {
        let mut conn = pool.get()?;
        let item: CartItem = diesel::update(
            cart_items::table
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::cart_id.eq(cart_id)),
        )
        .set(cart_items::quantity.eq(body.quantity))
        .returning(CartItem::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("cart item"))?;

        let book = find_book(&mut conn, item.book_id)?;
        Ok::<_, AppError>(cart_item_response(&item, &book))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /carts/{cart_id}/items/{item_id}
///
/// Removes the item. Deleting an absent item fails with 404 rather than
/// succeeding as a no-op.
#[utoipa::path(
    delete,
    path = "/carts/{cart_id}/items/{item_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart UUID"),
        ("item_id" = Uuid, Path, description = "Cart item UUID"),
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Cart item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart-items"
)]
pub async fn remove_cart_item(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::cart_id.eq(cart_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("cart item"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
