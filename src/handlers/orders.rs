use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::order::{
    reserve_order_number, NewOrder, NewOrderItem, Order, OrderItem, PaymentStatus,
};
use crate::schema::{addresses, carts, customers, order_items, orders};

use super::carts::{line_total, load_cart_items};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
    pub customer_id: Uuid,
    pub shipping_address_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
    /// Unit price frozen at order creation, e.g. "9.99"
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub customer_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub total_amount: String,
    pub placed_at: String,
    pub items: Vec<OrderItemResponse>,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn order_response(order: Order, items: Vec<OrderItem>) -> Result<OrderResponse, AppError> {
    let payment_status = PaymentStatus::from_code(&order.payment_status).ok_or_else(|| {
        AppError::Internal(format!(
            "unknown payment status code '{}'",
            order.payment_status
        ))
    })?;
    Ok(OrderResponse {
        id: order.id,
        order_number: order.order_number,
        payment_status,
        customer_id: order.customer_id,
        shipping_address_id: order.shipping_address_id,
        total_amount: order.total_amount.to_string(),
        placed_at: order.placed_at.to_rfc3339(),
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                book_id: item.book_id,
                quantity: item.quantity,
                unit_price: item.unit_price.to_string(),
            })
            .collect(),
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Converts a cart into an order. The cart read, the order and order-item
/// inserts, and the cart deletion all run inside one database transaction:
/// either the full snapshot commits and the cart is consumed, or nothing
/// changes. Unit prices are resolved from the catalog here and frozen.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created from cart", body = OrderResponse),
        (status = 404, description = "Cart, customer, or address not found"),
        (status = 409, description = "Cart is empty"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let order = web::block(move || {
        let mut conn = pool.get()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let cart_exists: bool =
                diesel::select(exists(carts::table.find(body.cart_id))).get_result(conn)?;
            if !cart_exists {
                return Err(AppError::not_found("cart"));
            }

            let customer_exists: bool =
                diesel::select(exists(customers::table.find(body.customer_id)))
                    .get_result(conn)?;
            if !customer_exists {
                return Err(AppError::not_found("customer"));
            }

            // The shipping address must belong to the ordering customer.
            let address_exists: bool = diesel::select(exists(
                addresses::table
                    .filter(addresses::id.eq(body.shipping_address_id))
                    .filter(addresses::customer_id.eq(body.customer_id)),
            ))
            .get_result(conn)?;
            if !address_exists {
                return Err(AppError::not_found("address"));
            }

            let rows = load_cart_items(conn, body.cart_id)?;
            if rows.is_empty() {
                return Err(AppError::InvalidState(
                    "cannot convert an empty cart".to_string(),
                ));
            }

            let order_number = reserve_order_number(conn)?;
            let total = rows
                .iter()
                .fold(BigDecimal::from(0), |acc, (item, book)| {
                    acc + line_total(item.quantity, &book.price)
                })
                .with_scale(2);

            let order_id = Uuid::new_v4();
            let order: Order = diesel::insert_into(orders::table)
                .values(&NewOrder {
                    id: order_id,
                    order_number,
                    payment_status: PaymentStatus::Pending.code().to_string(),
                    customer_id: body.customer_id,
                    shipping_address_id: Some(body.shipping_address_id),
                    total_amount: total,
                })
                .returning(Order::as_returning())
                .get_result(conn)?;

            let new_items: Vec<NewOrderItem> = rows
                .iter()
                .map(|(item, book)| NewOrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    book_id: item.book_id,
                    quantity: item.quantity,
                    unit_price: book.price.clone(),
                })
                .collect();
            let items: Vec<OrderItem> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItem::as_returning())
                .get_results(conn)?;

            // Conversion is destructive: the cart is consumed. Its items go
            // with it via the cascade.
            diesel::delete(carts::table.find(body.cart_id)).execute(conn)?;

            order_response(order, items)
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(order))
}

/// GET /orders/{id_or_number}
///
/// Looks the order up by UUID when the path segment parses as one,
/// otherwise by its order number.
#[utoipa::path(
    get,
    path = "/orders/{id_or_number}",
    params(
        ("id_or_number" = String, Path, description = "Order UUID or order number"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();

    let order = web::block(move || {
        let mut conn = pool.get()?;

        let order: Option<Order> = match Uuid::parse_str(&key) {
            Ok(id) => orders::table
                .find(id)
                .select(Order::as_select())
                .first(&mut conn)
                .optional()?,
            Err(_) => orders::table
                .filter(orders::order_number.eq(&key))
                .select(Order::as_select())
                .first(&mut conn)
                .optional()?,
        };
        let order = order.ok_or_else(|| AppError::not_found("order"))?;

        let items = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .select(OrderItem::as_select())
            .load(&mut conn)?;

        order_response(order, items)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order))
}

/// GET /orders
///
/// Returns a paginated list of orders (without their items), newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let result = web::block(move || {
        let mut conn = pool.get()?;

        let total: i64 = orders::table.count().get_result(&mut conn)?;

        let rows = orders::table
            .select(Order::as_select())
            .order(orders::placed_at.desc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;

        let items = rows
            .into_iter()
            .map(|o| order_response(o, vec![]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok::<_, AppError>(ListOrdersResponse {
            items,
            total,
            page,
            limit,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(result))
}

/// PATCH /orders/{order_id}
///
/// Updates the payment status. Any status may move to any other; no
/// transition guard is enforced at this layer.
#[utoipa::path(
    patch,
    path = "/orders/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_payment_status(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let new_status = body.into_inner().payment_status;

    let order = web::block(move || {
        let mut conn = pool.get()?;

        let order: Order = diesel::update(orders::table.find(order_id))
            .set(orders::payment_status.eq(new_status.code()))
            .returning(Order::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("order"))?;

        let items = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .select(OrderItem::as_select())
            .load(&mut conn)?;

        order_response(order, items)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order))
}
