use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Utc;
use diesel::dsl::{avg, count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::book::{Book, NewBook};
use crate::schema::{authors, books, genres, reviews};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRequest {
    pub title: String,
    pub description: String,
    pub stock: i32,
    pub isbn: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub author_id: Uuid,
    pub genre_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub stock: i32,
    pub isbn: Option<String>,
    pub price: String,
    pub author_id: Uuid,
    pub genre_id: Uuid,
    /// Mean review score rounded to one decimal; 0 when unreviewed.
    pub average_rating: f64,
    pub total_reviews: i64,
    pub created_at: String,
    pub updated_at: String,
}

fn book_response(book: Book, total_reviews: i64, average_rating: f64) -> BookResponse {
    BookResponse {
        id: book.id,
        title: book.title,
        description: book.description,
        stock: book.stock,
        isbn: book.isbn,
        price: book.price.to_string(),
        author_id: book.author_id,
        genre_id: book.genre_id,
        average_rating,
        total_reviews,
        created_at: book.created_at.to_rfc3339(),
        updated_at: book.updated_at.to_rfc3339(),
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    let price = BigDecimal::from_str(raw)
        .map_err(|_| AppError::validation("price", "must be a decimal number"))?;
    if price < BigDecimal::from(0) {
        return Err(AppError::validation("price", "must not be negative"));
    }
    if price.fractional_digit_count() > 2 {
        return Err(AppError::validation(
            "price",
            "must have at most 2 fraction digits",
        ));
    }
    if price > BigDecimal::from_str("9999.99").expect("literal decimal") {
        return Err(AppError::validation("price", "must not exceed 9999.99"));
    }
    Ok(price)
}

fn validate_book(body: &BookRequest) -> Result<BigDecimal, AppError> {
    if body.title.is_empty() || body.title.len() > 255 {
        return Err(AppError::validation("title", "must be 1-255 characters"));
    }
    if body.stock < 0 {
        return Err(AppError::validation("stock", "must not be negative"));
    }
    if let Some(isbn) = &body.isbn {
        if isbn.is_empty() || isbn.len() > 13 {
            return Err(AppError::validation("isbn", "must be 1-13 characters"));
        }
    }
    parse_price(&body.price)
}

fn check_book_refs(
    conn: &mut PgConnection,
    author_id: Uuid,
    genre_id: Uuid,
) -> Result<(), AppError> {
    let author_exists: bool =
        diesel::select(exists(authors::table.find(author_id))).get_result(conn)?;
    if !author_exists {
        return Err(AppError::not_found("author"));
    }
    let genre_exists: bool =
        diesel::select(exists(genres::table.find(genre_id))).get_result(conn)?;
    if !genre_exists {
        return Err(AppError::not_found("genre"));
    }
    Ok(())
}

// ── Rating aggregates ────────────────────────────────────────────────────────

/// (review count, mean score rounded to 1 decimal) per book, for the books
/// that have reviews. Absent books mean zero reviews.
fn rating_aggregates(
    conn: &mut PgConnection,
    book_ids: &[Uuid],
) -> Result<HashMap<Uuid, (i64, f64)>, AppError> {
    let rows: Vec<(Uuid, i64, Option<BigDecimal>)> = reviews::table
        .filter(reviews::book_id.eq_any(book_ids))
        .group_by(reviews::book_id)
        .select((reviews::book_id, count_star(), avg(reviews::score)))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(book_id, count, mean)| {
            let mean = mean.and_then(|m| m.to_f64()).unwrap_or(0.0);
            (book_id, (count, (mean * 10.0).round() / 10.0))
        })
        .collect())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /books
#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "All books", body = [BookResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "books"
)]
pub async fn list_books(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let books = web::block(move || {
        let mut conn = pool.get()?;
        let rows: Vec<Book> = books::table
            .select(Book::as_select())
            .order(books::created_at.desc())
            .load(&mut conn)?;
        let ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
        let aggregates = rating_aggregates(&mut conn, &ids)?;
        Ok::<_, AppError>(
            rows.into_iter()
                .map(|book| {
                    let (count, mean) = aggregates.get(&book.id).copied().unwrap_or((0, 0.0));
                    book_response(book, count, mean)
                })
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(books))
}

/// POST /books
#[utoipa::path(
    post,
    path = "/books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Author or genre not found"),
        (status = 409, description = "Duplicate ISBN"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "books"
)]
pub async fn create_book(
    pool: web::Data<DbPool>,
    body: web::Json<BookRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let price = validate_book(&body)?;

    let book = web::block(move || {
        let mut conn = pool.get()?;
        check_book_refs(&mut conn, body.author_id, body.genre_id)?;
        let book: Book = diesel::insert_into(books::table)
            .values(&NewBook {
                id: Uuid::new_v4(),
                title: body.title,
                description: body.description,
                stock: body.stock,
                isbn: body.isbn,
                price,
                author_id: body.author_id,
                genre_id: body.genre_id,
            })
            .returning(Book::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(book_response(book, 0, 0.0))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(book))
}

/// GET /books/{book_id}
#[utoipa::path(
    get,
    path = "/books/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
    ),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "books"
)]
pub async fn get_book(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();

    let book = web::block(move || {
        let mut conn = pool.get()?;
        let book: Book = books::table
            .find(book_id)
            .select(Book::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("book"))?;
        let aggregates = rating_aggregates(&mut conn, &[book.id])?;
        let (count, mean) = aggregates.get(&book.id).copied().unwrap_or((0, 0.0));
        Ok::<_, AppError>(book_response(book, count, mean))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(book))
}

/// PUT /books/{book_id}
#[utoipa::path(
    put,
    path = "/books/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Book, author, or genre not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "books"
)]
pub async fn update_book(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<BookRequest>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    let body = body.into_inner();
    let price = validate_book(&body)?;

    let book = web::block(move || {
        let mut conn = pool.get()?;
        check_book_refs(&mut conn, body.author_id, body.genre_id)?;
        let book: Book = diesel::update(books::table.find(book_id))
            .set((
                books::title.eq(body.title),
                books::description.eq(body.description),
                books::stock.eq(body.stock),
                books::isbn.eq(body.isbn),
                books::price.eq(price),
                books::author_id.eq(body.author_id),
                books::genre_id.eq(body.genre_id),
                books::updated_at.eq(Utc::now()),
            ))
            .returning(Book::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("book"))?;
        let aggregates = rating_aggregates(&mut conn, &[book.id])?;
        let (count, mean) = aggregates.get(&book.id).copied().unwrap_or((0, 0.0));
        Ok::<_, AppError>(book_response(book, count, mean))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(book))
}

/// DELETE /books/{book_id}
///
/// Deleting a book referenced by order items is blocked by the storage
/// layer's restrict policy and surfaces as 409; cart items referencing it
/// are cascaded away.
#[utoipa::path(
    delete,
    path = "/books/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is referenced by order items"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "books"
)]
pub async fn delete_book(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(books::table.find(book_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("book"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
