pub(crate) mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/books/new",
            get(handlers::add_book_page)
                .post(handlers::add_book)
                .layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .route("/admin/books", get(handlers::list_books))
        .route("/admin/books/:book_id/copies", post(handlers::update_copies))
        .route("/admin/books/:book_id/delete", post(handlers::delete_book))
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/:user_id/approve", post(handlers::approve_user))
}
