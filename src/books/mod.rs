pub(crate) mod dto;
pub mod handlers;
mod services;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(handlers::list_books))
        .route("/borrow/:book_id", post(handlers::borrow_book))
        .route("/return/:book_id", post(handlers::return_book))
        .route("/rate/:book_id", post(handlers::rate_book))
        .route("/history", get(handlers::history))
}
