//! Raw backend dumps for local troubleshooting. Gated on session presence
//! only; keep these routes out of production builds of the deployment.

use axum::extract::State;

use crate::session::MaybeSession;
use crate::state::AppState;

pub async fn debug_books(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> String {
    let Some(session) = session else {
        return "NO SESSION (login first)".into();
    };
    let resp = state
        .backend
        .get("/rest/v1/books?select=*", Some(&session.access_token))
        .await;
    let body: String = resp.body.chars().take(1500).collect();
    format!("status={}\nbody={}", resp.status, body)
}

pub async fn debug_last_book(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> String {
    let Some(session) = session else {
        return "NO SESSION".into();
    };
    let resp = state
        .backend
        .get(
            "/rest/v1/books?select=id,title,image_url&order=created_at.desc&limit=1",
            Some(&session.access_token),
        )
        .await;
    format!("status={}\n{}", resp.status, resp.body)
}
