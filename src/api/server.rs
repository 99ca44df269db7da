use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use http::{HeaderValue, Method, StatusCode};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::admin;
use crate::api::handler::*;
use crate::api::middleware::verify_admin::verify_admin_ident;
use crate::db::prelude::*;
use crate::scoring::DecodeError;
use crate::util::env::{self, Var};
use crate::var;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db_pool: &'static PgPool,
}

#[instrument(skip(tx))]
pub async fn router(tx: UnboundedSender<SocketAddr>) {
    let state = Arc::new(AppState {
        db_pool: db_pool().await.unwrap(),
    });

    let admin_routes = Router::new()
        .route("/admin/checkins", get(admin::list_checkins))
        .route(
            "/admin/checkins/{id}",
            patch(admin::review_checkin).delete(admin::delete_checkin),
        )
        .route("/admin/adjustments", post(admin::create_adjustment))
        .route("/admin/participants", get(admin::list_participants))
        .route(
            "/admin/participants/{id}",
            patch(admin::moderate_participant).delete(admin::delete_participant),
        )
        .route(
            "/admin/lives",
            get(admin::list_lives).post(admin::create_live),
        )
        .route("/admin/lives/{id}", patch(admin::update_live))
        .route("/admin/export", get(admin::export_csv))
        .route_layer(middleware::from_fn(verify_admin_ident));

    let app = Router::new()
        .merge(admin_routes)
        .route("/", get(|| async { Response::new(Body::empty()) }))
        //
        // ranking surfaces
        .route("/leaderboard", get(leaderboard))
        .route("/ranking/summary", get(ranking_summary))
        //
        // schedule + participant surfaces
        .route("/lives", get(lives))
        .route("/participants", post(register_participant))
        .route("/participant/{id}/progress", get(participant_progress))
        //
        // check-in lifecycle
        .route("/checkins", post(submit_checkin))
        .route("/checkins/{id}", patch(edit_checkin).delete(remove_checkin))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .layer(cors_layer().await.unwrap())
        .with_state(state);

    let port = var!(Var::ServerApiPort)
        .await
        .unwrap()
        .parse::<u16>()
        .unwrap();

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await.unwrap();

    tx.send(socket_addr).unwrap();
    axum::serve(listener, app).await.unwrap()
}

async fn cors_layer() -> Result<CorsLayer, env::EnvErr> {
    let origins = var!(Var::CorsAllowOrigins).await?;
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect();

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(parsed)))
}

/// Surfaces handler errors to the trace pipeline; the response itself only
/// carries the client-facing message.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument]
pub async fn start_server(
    tx: UnboundedSender<SocketAddr>,
    mut rx: UnboundedReceiver<SocketAddr>,
) -> Result<Vec<JoinHandle<()>>, RouteError> {
    tracing::info!("starting server");
    let server_handle = tokio::task::spawn(async move {
        router(tx).await;
    });

    let logging_handle = tokio::task::spawn(async move {
        while !rx.is_closed() {
            if let Some(msg) = rx.recv().await {
                tracing::info!(
                    server_url = %format!("http://127.0.0.1:{}", msg.port()),
                    "server ready"
                );
                break;
            }
        }
    });

    Ok(vec![server_handle, logging_handle])
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    QueryError(#[from] PgError),

    #[error(transparent)]
    SqlxError(#[from] sqlx::error::Error),

    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    #[error("{0}")]
    Validation(String),

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    EnvError(#[from] env::EnvErr),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message, err) = match &self {
            RouteError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),

            RouteError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("'{what}' not found"), None)
            }

            RouteError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),

            RouteError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),

            RouteError::QueryError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::SqlxError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::DecodeError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::EnvError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
