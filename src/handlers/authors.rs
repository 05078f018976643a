use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::author::{Author, NewAuthor};
use crate::schema::{authors, books};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorRequest {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    /// Bio truncated to 100 characters for list displays.
    pub short_bio: String,
    pub total_books: i64,
    pub created_at: String,
    pub updated_at: String,
}

fn short_bio(bio: &str) -> String {
    if bio.chars().count() > 100 {
        let truncated: String = bio.chars().take(100).collect();
        format!("{truncated}...")
    } else {
        bio.to_string()
    }
}

fn author_response(author: Author, total_books: i64) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        name: author.name,
        short_bio: short_bio(&author.bio),
        bio: author.bio,
        total_books,
        created_at: author.created_at.to_rfc3339(),
        updated_at: author.updated_at.to_rfc3339(),
    }
}

fn validate_author(body: &AuthorRequest) -> Result<(), AppError> {
    if body.name.is_empty() || body.name.len() > 255 {
        return Err(AppError::validation("name", "must be 1-255 characters"));
    }
    Ok(())
}

fn book_counts(conn: &mut PgConnection) -> Result<HashMap<Uuid, i64>, AppError> {
    let rows: Vec<(Uuid, i64)> = books::table
        .group_by(books::author_id)
        .select((books::author_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /authors
#[utoipa::path(
    get,
    path = "/authors",
    responses(
        (status = 200, description = "All authors", body = [AuthorResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "authors"
)]
pub async fn list_authors(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let authors = web::block(move || {
        let mut conn = pool.get()?;
        let rows: Vec<Author> = authors::table
            .select(Author::as_select())
            .order(authors::name.asc())
            .load(&mut conn)?;
        let counts = book_counts(&mut conn)?;
        Ok::<_, AppError>(
            rows.into_iter()
                .map(|author| {
                    let total = counts.get(&author.id).copied().unwrap_or(0);
                    author_response(author, total)
                })
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(authors))
}

/// POST /authors
#[utoipa::path(
    post,
    path = "/authors",
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Author created", body = AuthorResponse),
        (status = 400, description = "Validation failed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "authors"
)]
pub async fn create_author(
    pool: web::Data<DbPool>,
    body: web::Json<AuthorRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    validate_author(&body)?;

    let author = web::block(move || {
        let mut conn = pool.get()?;
        let author: Author = diesel::insert_into(authors::table)
            .values(&NewAuthor {
                id: Uuid::new_v4(),
                name: body.name,
                bio: body.bio,
            })
            .returning(Author::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(author_response(author, 0))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(author))
}

/// GET /authors/{author_id}
#[utoipa::path(
    get,
    path = "/authors/{author_id}",
    params(
        ("author_id" = Uuid, Path, description = "Author UUID"),
    ),
    responses(
        (status = 200, description = "Author found", body = AuthorResponse),
        (status = 404, description = "Author not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "authors"
)]
pub async fn get_author(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let author_id = path.into_inner();

    let author = web::block(move || {
        let mut conn = pool.get()?;
        let author: Author = authors::table
            .find(author_id)
            .select(Author::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("author"))?;
        let total: i64 = books::table
            .filter(books::author_id.eq(author.id))
            .count()
            .get_result(&mut conn)?;
        Ok::<_, AppError>(author_response(author, total))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(author))
}

/// PUT /authors/{author_id}
#[utoipa::path(
    put,
    path = "/authors/{author_id}",
    params(
        ("author_id" = Uuid, Path, description = "Author UUID"),
    ),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Author updated", body = AuthorResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Author not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "authors"
)]
pub async fn update_author(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AuthorRequest>,
) -> Result<HttpResponse, AppError> {
    let author_id = path.into_inner();
    let body = body.into_inner();
    validate_author(&body)?;

    let author = web::block(move || {
        let mut conn = pool.get()?;
        let author: Author = diesel::update(authors::table.find(author_id))
            .set((
                authors::name.eq(body.name),
                authors::bio.eq(body.bio),
                authors::updated_at.eq(Utc::now()),
            ))
            .returning(Author::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("author"))?;
        let total: i64 = books::table
            .filter(books::author_id.eq(author.id))
            .count()
            .get_result(&mut conn)?;
        Ok::<_, AppError>(author_response(author, total))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(author))
}

/// DELETE /authors/{author_id}
///
/// Cascades to the author's books; blocked (409) if any of those books is
/// referenced by order items.
#[utoipa::path(
    delete,
    path = "/authors/{author_id}",
    params(
        ("author_id" = Uuid, Path, description = "Author UUID"),
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "A book of this author is referenced by order items"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "authors"
)]
pub async fn delete_author(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let author_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(authors::table.find(author_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("author"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
