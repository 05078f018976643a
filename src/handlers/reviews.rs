use actix_web::{web, HttpResponse};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::review::{NewReview, Review};
use crate::schema::{books, reviews};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Principal id supplied by the upstream identity collaborator.
    pub user_id: Uuid,
    pub score: i32,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub score: i32,
    pub description: String,
    pub created_at: String,
}

fn review_response(review: Review) -> ReviewResponse {
    ReviewResponse {
        id: review.id,
        user_id: review.user_id,
        book_id: review.book_id,
        score: review.score,
        description: review.description,
        created_at: review.created_at.to_rfc3339(),
    }
}

fn check_book(conn: &mut PgConnection, book_id: Uuid) -> Result<(), AppError> {
    let book_exists: bool = diesel::select(exists(books::table.find(book_id))).get_result(conn)?;
    if !book_exists {
        return Err(AppError::not_found("book"));
    }
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /books/{book_id}/reviews
#[utoipa::path(
    get,
    path = "/books/{book_id}/reviews",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
    ),
    responses(
        (status = 200, description = "Reviews for the book", body = [ReviewResponse]),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();

    let reviews = web::block(move || {
        let mut conn = pool.get()?;
        check_book(&mut conn, book_id)?;
        let rows: Vec<Review> = reviews::table
            .filter(reviews::book_id.eq(book_id))
            .select(Review::as_select())
            .order(reviews::created_at.desc())
            .load(&mut conn)?;
        Ok::<_, AppError>(rows.into_iter().map(review_response).collect::<Vec<_>>())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(reviews))
}

/// POST /books/{book_id}/reviews
///
/// A user gets one review per book: re-submitting replaces the stored
/// score and description instead of creating a second row.
#[utoipa::path(
    post,
    path = "/books/{book_id}/reviews",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created or replaced", body = ReviewResponse),
        (status = 400, description = "Score out of range"),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    let body = body.into_inner();
    if !(1..=5).contains(&body.score) {
        return Err(AppError::validation("score", "must be between 1 and 5"));
    }

    let review = web::block(move || {
        let mut conn = pool.get()?;
        check_book(&mut conn, book_id)?;
        let review: Review = diesel::insert_into(reviews::table)
            .values(&NewReview {
                id: Uuid::new_v4(),
                user_id: body.user_id,
                book_id,
                score: body.score,
                description: body.description,
            })
            .on_conflict((reviews::user_id, reviews::book_id))
            .do_update()
            .set((
                reviews::score.eq(excluded(reviews::score)),
                reviews::description.eq(excluded(reviews::description)),
            ))
            .returning(Review::as_returning())
            .get_result(&mut conn)?;
        Ok::<_, AppError>(review_response(review))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(review))
}

/// DELETE /books/{book_id}/reviews/{review_id}
#[utoipa::path(
    delete,
    path = "/books/{book_id}/reviews/{review_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book UUID"),
        ("review_id" = Uuid, Path, description = "Review UUID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reviews"
)]
pub async fn delete_review(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (book_id, review_id) = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let deleted = diesel::delete(
            reviews::table
                .filter(reviews::id.eq(review_id))
                .filter(reviews::book_id.eq(book_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("review"));
        }
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
