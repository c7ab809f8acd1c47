use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use bytes::Bytes;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    books::dto::BookRow,
    msg::{self, Msg, MsgQuery},
    session::AdminUser,
    state::AppState,
    views,
};

use super::dto::{BorrowedCountRow, CopiesForm, ProfileRow};

const IMAGE_BUCKET: &str = "book-images";

pub async fn add_book_page(
    AdminUser(session): AdminUser,
    Query(params): Query<MsgQuery>,
) -> Html<String> {
    views::admin_add_book_page(&session, params.banner())
}

struct NewBookForm {
    title: String,
    author: String,
    code: String,
    description: String,
    copies_total: i64,
    image: Option<(String, Bytes)>,
}

async fn read_new_book_form(mut mp: Multipart) -> Option<NewBookForm> {
    let mut form = NewBookForm {
        title: String::new(),
        author: String::new(),
        code: String::new(),
        description: String::new(),
        copies_total: 1,
        image: None,
    };
    while let Ok(Some(field)) = mp.next_field().await {
        match field.name().unwrap_or_default().to_string().as_str() {
            "title" => form.title = field.text().await.ok()?,
            "author" => form.author = field.text().await.ok()?,
            "code" => form.code = field.text().await.ok()?,
            "description" => form.description = field.text().await.ok()?,
            "copies_total" => {
                form.copies_total = field.text().await.ok()?.trim().parse().unwrap_or(1)
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.ok()?;
                if !file_name.is_empty() && !data.is_empty() {
                    form.image = Some((file_name, data));
                }
            }
            _ => {}
        }
    }
    Some(form)
}

/// Create a book: optional cover upload to object storage first (the public
/// URL is derived, not returned by the upload), then the row insert.
#[instrument(skip(state, session, mp), fields(admin = %session.email))]
pub async fn add_book(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    mp: Multipart,
) -> Redirect {
    let Some(form) = read_new_book_form(mp).await else {
        return msg::to_page("/admin/books/new", Msg::UploadError);
    };
    let token = Some(session.access_token.as_str());

    let mut image_url = None;
    if let Some((file_name, data)) = form.image {
        let ext = file_name
            .rsplit('.')
            .next()
            .filter(|e| !e.is_empty())
            .unwrap_or("jpg")
            .to_lowercase();
        let object = format!("{}.{ext}", Uuid::new_v4().simple());
        let content_type = mime_guess::from_path(&file_name).first_or(mime_guess::mime::IMAGE_JPEG);

        let up = state
            .backend
            .upload(IMAGE_BUCKET, &object, data, content_type.essence_str(), token)
            .await;
        if up.is_error() {
            error!(status = %up.status, body = %up.body, "cover upload failed");
            return msg::to_page("/admin/books/new", Msg::UploadError);
        }
        image_url = Some(state.backend.public_url(IMAGE_BUCKET, &object));
    }

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    let payload = json!({
        "title": form.title,
        "author": form.author,
        "code": form.code,
        "description": form.description,
        "image_url": image_url,
        "created_at": created_at,
        "copies_total": if form.copies_total > 0 { form.copies_total } else { 1 },
        "copies_borrowed": 0,
    });

    let resp = state.backend.post("/rest/v1/books", payload, token).await;
    if resp.is_error() {
        error!(status = %resp.status, body = %resp.body, "book insert failed");
        return msg::to_page("/admin/books/new", Msg::UploadError);
    }
    info!(title = %form.title, "book created");
    msg::to_page("/admin/books/new", Msg::Created)
}

#[instrument(skip(state, session))]
pub async fn list_books(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Query(params): Query<MsgQuery>,
) -> Html<String> {
    let books: Vec<BookRow> = state
        .backend
        .get(
            "/rest/v1/books?select=*&order=created_at.desc",
            Some(&session.access_token),
        )
        .await
        .json()
        .unwrap_or_default();
    views::admin_books_page(&session, &books, params.banner())
}

async fn borrowed_count(state: &AppState, book_id: i64, token: &str) -> Option<i64> {
    let resp = state
        .backend
        .get(
            &format!("/rest/v1/books?select=copies_borrowed&id=eq.{book_id}&limit=1"),
            Some(token),
        )
        .await;
    if resp.is_error() {
        return None;
    }
    resp.json::<Vec<BorrowedCountRow>>()?
        .first()
        .map(|r| r.copies_borrowed.unwrap_or(0))
}

/// Lowering `copies_total` below the borrowed count is rejected before the
/// write. The check re-fetches the current count, so a borrow landing
/// between the read and the PATCH can still slip through; the original
/// product accepts this race.
#[instrument(skip(state, session, form), fields(admin = %session.email))]
pub async fn update_copies(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(book_id): Path<i64>,
    Form(form): Form<CopiesForm>,
) -> Redirect {
    let Some(borrowed) = borrowed_count(&state, book_id, &session.access_token).await else {
        return msg::to_page("/admin/books", Msg::UpdateError);
    };

    if form.copies_total < borrowed {
        warn!(%book_id, requested = form.copies_total, borrowed, "copies update below borrowed count");
        return msg::to_page("/admin/books", Msg::CopiesTooLow);
    }

    let resp = state
        .backend
        .patch(
            &format!("/rest/v1/books?id=eq.{book_id}"),
            json!({ "copies_total": form.copies_total }),
            Some(&session.access_token),
        )
        .await;
    if resp.is_error() {
        warn!(%book_id, status = %resp.status, "copies update failed");
        return msg::to_page("/admin/books", Msg::UpdateError);
    }
    info!(%book_id, copies_total = form.copies_total, "copies updated");
    msg::to_page("/admin/books", Msg::Updated)
}

#[instrument(skip(state, session), fields(admin = %session.email))]
pub async fn delete_book(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(book_id): Path<i64>,
) -> Redirect {
    let Some(borrowed) = borrowed_count(&state, book_id, &session.access_token).await else {
        return msg::to_page("/admin/books", Msg::DeleteError);
    };

    if borrowed > 0 {
        warn!(%book_id, borrowed, "delete refused, copies still borrowed");
        return msg::to_page("/admin/books", Msg::CantDeleteReserved);
    }

    let resp = state
        .backend
        .delete(
            &format!("/rest/v1/books?id=eq.{book_id}"),
            Some(&session.access_token),
        )
        .await;
    if resp.is_error() {
        warn!(%book_id, status = %resp.status, "delete failed");
        return msg::to_page("/admin/books", Msg::DeleteError);
    }
    info!(%book_id, "book deleted");
    msg::to_page("/admin/books", Msg::Deleted)
}

#[instrument(skip(state, session))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Query(params): Query<MsgQuery>,
) -> Html<String> {
    let profiles: Vec<ProfileRow> = state
        .backend
        .get(
            "/rest/v1/user_profiles?select=*&order=created_at.desc",
            Some(&session.access_token),
        )
        .await
        .json()
        .unwrap_or_default();
    views::admin_users_page(&session, &profiles, params.banner())
}

#[instrument(skip(state, session), fields(admin = %session.email))]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(user_id): Path<String>,
) -> Redirect {
    let resp = state
        .backend
        .patch(
            &format!("/rest/v1/user_profiles?user_id=eq.{user_id}"),
            json!({ "is_approved": true }),
            Some(&session.access_token),
        )
        .await;
    if resp.is_error() {
        warn!(%user_id, status = %resp.status, "approval failed");
        return msg::to_page("/admin/users", Msg::ApproveError);
    }
    info!(%user_id, "user approved");
    msg::to_page("/admin/users", Msg::Approved)
}
