use axum::{
    extract::{Query, State},
    http::header::{HOST, SET_COOKIE},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Form,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    msg::{self, Msg, MsgQuery},
    session::{clear_cookie, session_cookie, MaybeSession, Session, SessionCodec},
    state::AppState,
    views,
};
use axum::extract::FromRef;

use super::dto::{ForgotForm, LoginForm, SignupForm, SignupResponse, TokenPair};

/// Encode the token pair into the signed cookie and land on the book list.
fn start_session(state: &AppState, tokens: TokenPair, fallback_email: &str) -> Response {
    let email = tokens
        .user
        .email
        .unwrap_or_else(|| fallback_email.to_string());
    let session = Session {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user_id: tokens.user.id,
        email,
    };
    let value = SessionCodec::from_ref(state).encode(&session);
    (
        AppendHeaders([(SET_COOKIE, session_cookie(&value, state.config.cookie_secure))]),
        Redirect::to("/books?filter=all"),
    )
        .into_response()
}

pub async fn signup_page(
    MaybeSession(session): MaybeSession,
    Query(params): Query<MsgQuery>,
) -> Response {
    match session {
        Some(_) => Redirect::to("/books?filter=all").into_response(),
        None => views::signup_page(params.banner()).into_response(),
    }
}

#[instrument(skip(state, form))]
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let resp = state
        .backend
        .post(
            "/auth/v1/signup",
            json!({
                "email": form.email,
                "password": form.password,
                "data": { "full_name": form.full_name },
            }),
            None,
        )
        .await;
    if resp.is_error() {
        warn!(status = %resp.status, "signup failed");
        return msg::to_page("/signup", Msg::SignupError).into_response();
    }

    match resp.json::<SignupResponse>().and_then(|r| r.session) {
        // email confirmation required, no session yet
        None => msg::to_page("/login", Msg::Confirm).into_response(),
        Some(tokens) => {
            info!("user signed up");
            start_session(&state, tokens, &form.email)
        }
    }
}

pub async fn login_page(
    MaybeSession(session): MaybeSession,
    Query(params): Query<MsgQuery>,
) -> Response {
    match session {
        Some(_) => Redirect::to("/books?filter=all").into_response(),
        None => views::login_page(params.banner()).into_response(),
    }
}

#[instrument(skip(state, form))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let resp = state
        .backend
        .post(
            "/auth/v1/token?grant_type=password",
            json!({ "email": form.email, "password": form.password }),
            None,
        )
        .await;
    if resp.is_error() {
        warn!(status = %resp.status, "login failed");
        return msg::to_page("/login", Msg::LoginError).into_response();
    }

    match resp.json::<TokenPair>() {
        Some(tokens) => {
            info!("user logged in");
            start_session(&state, tokens, &form.email)
        }
        None => {
            warn!("login response missing token pair");
            msg::to_page("/login", Msg::LoginError).into_response()
        }
    }
}

pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_cookie())]),
        Redirect::to("/login"),
    )
}

pub async fn forgot_page(
    MaybeSession(session): MaybeSession,
    Query(params): Query<MsgQuery>,
) -> Response {
    match session {
        Some(_) => Redirect::to("/books?filter=all").into_response(),
        None => views::forgot_page(params.banner()).into_response(),
    }
}

/// The recovery email links back to this deployment's `/reset` page, so the
/// public base URL is reconstructed from the Host header of the request.
#[instrument(skip(state, headers, form))]
pub async fn forgot_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ForgotForm>,
) -> Redirect {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8000");
    let scheme = if state.config.cookie_secure { "https" } else { "http" };
    let redirect_to = format!("{scheme}://{host}/reset");

    let resp = state
        .backend
        .post(
            "/auth/v1/recover",
            json!({ "email": form.email, "redirect_to": redirect_to }),
            None,
        )
        .await;
    if resp.is_error() {
        warn!(status = %resp.status, "password recovery failed");
        return msg::to_page("/forgot", Msg::ForgotError);
    }
    info!("password recovery email requested");
    msg::to_page("/forgot", Msg::Sent)
}

pub async fn reset_page() -> impl IntoResponse {
    views::reset_page()
}
