use std::net::SocketAddr;

use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session::MaybeSession;
use crate::state::AppState;
use crate::{admin, auth, books, debug, views};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/faq", get(faq))
        .route("/about", get(about))
        .route("/healthz", get(healthz))
        .route("/debug/books", get(debug::debug_books))
        .route("/debug/last-book", get(debug::debug_last_book))
        .merge(auth::router())
        .merge(books::router())
        .merge(admin::router())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn index(MaybeSession(session): MaybeSession) -> Response {
    match session {
        Some(_) => Redirect::to("/books?filter=all").into_response(),
        None => views::welcome().into_response(),
    }
}

async fn faq(MaybeSession(session): MaybeSession) -> impl IntoResponse {
    views::faq_page(session.as_ref())
}

async fn about(MaybeSession(session): MaybeSession) -> impl IntoResponse {
    views::about_page(session.as_ref())
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
