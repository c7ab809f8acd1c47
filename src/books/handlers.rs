use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    msg::{self, Msg},
    session::SessionUser,
    state::AppState,
    views,
};

use super::dto::{ActiveBorrowRow, ApprovalRow, BookRow, BooksQuery, HistoryRow, RateForm, RatingRow};
use super::services::{self, Filter};

/// The book list assembles its view model from three sequential fetches:
/// the catalog view, the caller's ratings, and the caller's active borrows.
/// A failed fetch degrades to an empty collection rather than an error page.
#[instrument(skip(state, session))]
pub async fn list_books(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Query(params): Query<BooksQuery>,
) -> Html<String> {
    let token = Some(session.access_token.as_str());

    let books: Vec<BookRow> = state
        .backend
        .get("/rest/v1/books_with_ratings?select=*&order=created_at.desc", token)
        .await
        .json()
        .unwrap_or_default();

    let ratings: Vec<RatingRow> = state
        .backend
        .get(
            &format!(
                "/rest/v1/ratings?select=book_id,rating&user_id=eq.{}",
                session.user_id
            ),
            token,
        )
        .await
        .json()
        .unwrap_or_default();

    let borrows: Vec<ActiveBorrowRow> = state
        .backend
        .get(
            &format!(
                "/rest/v1/borrow_history?select=book_id,due_date,status&user_id=eq.{}&status=eq.borrowed",
                session.user_id
            ),
            token,
        )
        .await
        .json()
        .unwrap_or_default();

    let q = params.q.unwrap_or_default();
    let filter = Filter::parse(params.filter.as_deref().unwrap_or("all"));
    let banner = params.msg.as_deref().and_then(Msg::text);

    let views = services::enrich(books, &ratings, &borrows);
    let views = services::search(views, &q);
    let views = services::apply_filter(views, filter);

    views::books_page(&session, &views, q.trim(), filter.as_str(), banner)
}

/// Borrowing is gated on the caller's approval flag (a convenience
/// short-circuit; the remote procedure remains the authority) and then
/// delegated to the atomic `borrow_copy` procedure.
#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn borrow_book(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(book_id): Path<i64>,
) -> Redirect {
    let token = Some(session.access_token.as_str());

    let profile = state
        .backend
        .get(
            &format!(
                "/rest/v1/user_profiles?select=is_approved&user_id=eq.{}&limit=1",
                session.user_id
            ),
            token,
        )
        .await;
    let approved = profile
        .json::<Vec<ApprovalRow>>()
        .unwrap_or_default()
        .first()
        .map(|p| p.is_approved)
        .unwrap_or(false);
    if !approved {
        info!(%book_id, "borrow refused, account not approved");
        return msg::to_books(Msg::AwaitApproval);
    }

    let resp = state
        .backend
        .post(
            "/rest/v1/rpc/borrow_copy",
            json!({ "p_book_id": book_id, "p_user_id": session.user_id }),
            token,
        )
        .await;
    if resp.is_error() {
        warn!(%book_id, status = %resp.status, "borrow_copy failed");
        return msg::to_books(msg::classify_borrow(&resp.body));
    }
    info!(%book_id, "copy borrowed");
    msg::to_books(Msg::Borrowed)
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn return_book(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(book_id): Path<i64>,
) -> Redirect {
    let resp = state
        .backend
        .post(
            "/rest/v1/rpc/return_copy",
            json!({ "p_book_id": book_id, "p_user_id": session.user_id }),
            Some(&session.access_token),
        )
        .await;
    if resp.is_error() {
        warn!(%book_id, status = %resp.status, "return_copy failed");
        return msg::to_books(msg::classify_return(&resp.body));
    }
    info!(%book_id, "copy returned");
    msg::to_books(Msg::Returned)
}

/// Ratings are write-once per (user, book); the remote unique constraint is
/// the authority and its violation surfaces as `already_rated`.
#[instrument(skip(state, session, form), fields(user_id = %session.user_id))]
pub async fn rate_book(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
    Path(book_id): Path<i64>,
    Form(form): Form<RateForm>,
) -> Redirect {
    let resp = state
        .backend
        .post(
            "/rest/v1/ratings",
            json!({ "book_id": book_id, "user_id": session.user_id, "rating": form.rating }),
            Some(&session.access_token),
        )
        .await;
    if resp.is_error() {
        warn!(%book_id, status = %resp.status, "rating insert failed");
        return msg::to_page("/books", msg::classify_rating(&resp.body));
    }
    msg::to_page("/books", Msg::Rated)
}

#[instrument(skip(state, session))]
pub async fn history(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
) -> Html<String> {
    let rows: Vec<HistoryRow> = state
        .backend
        .get(
            &format!(
                "/rest/v1/borrow_history?select=*&user_id=eq.{}&order=borrowed_at.desc",
                session.user_id
            ),
            Some(&session.access_token),
        )
        .await
        .json()
        .unwrap_or_default();
    views::history_page(&session, &rows)
}
