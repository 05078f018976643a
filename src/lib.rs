pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::authors::list_authors,
        handlers::authors::create_author,
        handlers::authors::get_author,
        handlers::authors::update_author,
        handlers::authors::delete_author,
        handlers::genres::list_genres,
        handlers::genres::create_genre,
        handlers::genres::get_genre,
        handlers::genres::update_genre,
        handlers::genres::delete_genre,
        handlers::books::list_books,
        handlers::books::create_book,
        handlers::books::get_book,
        handlers::books::update_book,
        handlers::books::delete_book,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::reviews::delete_review,
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::addresses::list_addresses,
        handlers::addresses::create_address,
        handlers::addresses::delete_address,
        handlers::carts::create_cart,
        handlers::carts::get_cart,
        handlers::carts::delete_cart,
        handlers::cart_items::list_cart_items,
        handlers::cart_items::add_cart_item,
        handlers::cart_items::update_cart_item,
        handlers::cart_items::remove_cart_item,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::update_payment_status,
    ),
    components(schemas(
        handlers::authors::AuthorRequest,
        handlers::authors::AuthorResponse,
        handlers::genres::GenreRequest,
        handlers::genres::GenreResponse,
        handlers::books::BookRequest,
        handlers::books::BookResponse,
        handlers::reviews::CreateReviewRequest,
        handlers::reviews::ReviewResponse,
        handlers::customers::CreateCustomerRequest,
        handlers::customers::UpdateCustomerRequest,
        handlers::customers::CustomerResponse,
        handlers::addresses::AddressRequest,
        handlers::addresses::AddressResponse,
        handlers::carts::BookSummary,
        handlers::carts::CartItemResponse,
        handlers::carts::CartResponse,
        handlers::cart_items::AddCartItemRequest,
        handlers::cart_items::UpdateCartItemRequest,
        handlers::orders::CreateOrderRequest,
        handlers::orders::UpdatePaymentStatusRequest,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersParams,
        handlers::orders::ListOrdersResponse,
        models::order::PaymentStatus,
    ))
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/authors")
                    .route("", web::get().to(handlers::authors::list_authors))
                    .route("", web::post().to(handlers::authors::create_author))
                    .route("/{author_id}", web::get().to(handlers::authors::get_author))
                    .route("/{author_id}", web::put().to(handlers::authors::update_author))
                    .route("/{author_id}", web::delete().to(handlers::authors::delete_author)),
            )
            .service(
                web::scope("/genres")
                    .route("", web::get().to(handlers::genres::list_genres))
                    .route("", web::post().to(handlers::genres::create_genre))
                    .route("/{genre_id}", web::get().to(handlers::genres::get_genre))
                    .route("/{genre_id}", web::put().to(handlers::genres::update_genre))
                    .route("/{genre_id}", web::delete().to(handlers::genres::delete_genre)),
            )
            .service(
                web::scope("/books")
                    .route("", web::get().to(handlers::books::list_books))
                    .route("", web::post().to(handlers::books::create_book))
                    .route("/{book_id}", web::get().to(handlers::books::get_book))
                    .route("/{book_id}", web::put().to(handlers::books::update_book))
                    .route("/{book_id}", web::delete().to(handlers::books::delete_book))
                    .route("/{book_id}/reviews", web::get().to(handlers::reviews::list_reviews))
                    .route("/{book_id}/reviews", web::post().to(handlers::reviews::create_review))
                    .route(
                        "/{book_id}/reviews/{review_id}",
                        web::delete().to(handlers::reviews::delete_review),
                    ),
            )
            .service(
                web::scope("/customers")
                    .route("", web::get().to(handlers::customers::list_customers))
                    .route("", web::post().to(handlers::customers::create_customer))
                    .route("/{customer_id}", web::get().to(handlers::customers::get_customer))
                    .route("/{customer_id}", web::put().to(handlers::customers::update_customer))
                    .route(
                        "/{customer_id}",
                        web::delete().to(handlers::customers::delete_customer),
                    )
                    .route(
                        "/{customer_id}/addresses",
                        web::get().to(handlers::addresses::list_addresses),
                    )
                    .route(
                        "/{customer_id}/addresses",
                        web::post().to(handlers::addresses::create_address),
                    )
                    .route(
                        "/{customer_id}/addresses/{address_id}",
                        web::delete().to(handlers::addresses::delete_address),
                    ),
            )
            .service(
                web::scope("/carts")
                    .route("", web::post().to(handlers::carts::create_cart))
                    .route("/{cart_id}", web::get().to(handlers::carts::get_cart))
                    .route("/{cart_id}", web::delete().to(handlers::carts::delete_cart))
                    .route("/{cart_id}/items", web::get().to(handlers::cart_items::list_cart_items))
                    .route("/{cart_id}/items", web::post().to(handlers::cart_items::add_cart_item))
                    .route(
                        "/{cart_id}/items/{item_id}",
                        web::patch().to(handlers::cart_items::update_cart_item),
                    )
                    .route(
                        "/{cart_id}/items/{item_id}",
                        web::delete().to(handlers::cart_items::remove_cart_item),
                    ),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id_or_number}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{order_id}",
                        web::patch().to(handlers::orders::update_payment_status),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
