use actix_web::{web, HttpResponse};
use chrono::Utc;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::genre::{slugify, Genre, NewGenre};
use crate::schema::{books, genres};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenreRequest {
    pub title: String,
    pub featured_book_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenreResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub featured_book_id: Option<Uuid>,
    pub book_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

fn genre_response(genre: Genre, book_count: i64) -> GenreResponse {
    GenreResponse {
        id: genre.id,
        title: genre.title,
        slug: genre.slug,
        featured_book_id: genre.featured_book_id,
        book_count,
        created_at: genre.created_at.to_rfc3339(),
        updated_at: genre.updated_at.to_rfc3339(),
    }
}

fn validate_genre(body: &GenreRequest) -> Result<(), AppError> {
    if body.title.is_empty() || body.title.len() > 30 {
        return Err(AppError::validation("title", "must be 1-30 characters"));
    }
    Ok(())
}

fn check_featured_book(
    conn: &mut PgConnection,
    featured_book_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(book_id) = featured_book_id {
        let book_exists: bool =
            diesel::select(exists(books::table.find(book_id))).get_result(conn)?;
        if !book_exists {
            return Err(AppError::not_found("book"));
        }
    }
    Ok(())
}

fn genre_book_count(conn: &mut PgConnection, genre_id: Uuid) -> Result<i64, AppError> {
    let count = books::table
        .filter(books::genre_id.eq(genre_id))
        .count()
        .get_result(conn)?;
    Ok(count)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /genres
#[utoipa::path(
    get,
    path = "/genres",
    responses(
        (status = 200, description = "All genres", body = [GenreResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "genres"
)]
pub async fn list_genres(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let genres = web::block(move || {
        let mut conn = pool.get()?;
        let rows: Vec<Genre> = genres::table
            .select(Genre::as_select())
            .order(genres::title.asc())
            .load(&mut conn)?;
        rows.into_iter()
            .map(|genre| {
                let count = genre_book_count(&mut conn, genre.id)?;
                Ok(genre_response(genre, count))
            })
            .collect::<Result<Vec<_>, AppError>>()
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(genres))
}

/// POST /genres
///
/// The slug is derived from the title once, here; it never changes on
/// later renames.
#[utoipa::path(
    post,
    path = "/genres",
    request_body = GenreRequest,
    responses(
        (status = 201, description = "Genre created", body = GenreResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Featured book not found"),
        (status = 409, description = "Duplicate slug"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "genres"
)]
pub async fn create_genre(
    pool: web::Data<DbPool>,
    body: web::Json<GenreRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    validate_genre(&body)?;
    let slug = slugify(&body.title);
    if slug.is_empty() {
        return Err(AppError::validation(
            "title",
            "must contain at least one alphanumeric character",
        ));
    }

    let genre = web::block(move || {
        let mut conn = pool.get()?;
        check_featured_book(&mut conn, body.featured_book_id)?;
        let genre: Genre = diesel::insert_into(genres::table)
            .values(&NewGenre {
                id: Uuid::new_v4(),
                title: body.title,
                slug,
                featured_book_id: body.featured_book_id,
            })
            .returning(Genre::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(genre_response(genre, 0))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(genre))
}

/// GET /genres/{genre_id}
#[utoipa::path(
    get,
    path = "/genres/{genre_id}",
    params(
        ("genre_id" = Uuid, Path, description = "Genre UUID"),
    ),
    responses(
        (status = 200, description = "Genre found", body = GenreResponse),
        (status = 404, description = "Genre not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "genres"
)]
pub async fn get_genre(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let genre_id = path.into_inner();

    let genre = web::block(move || {
        let mut conn = pool.get()?;
        let genre: Genre = genres::table
            .find(genre_id)
            .select(Genre::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("genre"))?;
        let count = genre_book_count(&mut conn, genre.id)?;
        Ok::<_, AppError>(genre_response(genre, count))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(genre))
}

/// PUT /genres/{genre_id}
#[utoipa::path(
    put,
    path = "/genres/{genre_id}",
    params(
        ("genre_id" = Uuid, Path, description = "Genre UUID"),
    ),
    request_body = GenreRequest,
    responses(
        (status = 200, description = "Genre updated", body = GenreResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Genre or featured book not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "genres"
)]
pub async fn update_genre(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<GenreRequest>,
) -> Result<HttpResponse, AppError> {
    let genre_id = path.into_inner();
    let body = body.into_inner();
    validate_genre(&body)?;

    let genre = web::block(move || {
        let mut conn = pool.get()?;
        check_featured_book(&mut conn, body.featured_book_id)?;
        let genre: Genre = diesel::update(genres::table.find(genre_id))
            .set((
                genres::title.eq(body.title),
                genres::featured_book_id.eq(body.featured_book_id),
                genres::updated_at.eq(Utc::now()),
            ))
            .returning(Genre::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("genre"))?;
        let count = genre_book_count(&mut conn, genre.id)?;
        Ok::<_, AppError>(genre_response(genre, count))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(genre))
}

/// DELETE /genres/{genre_id}
#[utoipa::path(
    delete,
    path = "/genres/{genre_id}",
    params(
        ("genre_id" = Uuid, Path, description = "Genre UUID"),
    ),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found"),
        (status = 409, description = "A book of this genre is referenced by order items"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "genres"
)]
pub async fn delete_genre(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let genre_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(genres::table.find(genre_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("genre"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
