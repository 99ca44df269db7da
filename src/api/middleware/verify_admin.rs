use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::StatusCode;
use http::header::AUTHORIZATION;

use crate::util::constant_time_cmp;
use crate::util::env::Var;
use crate::var;

/// The authenticated administrative identity for one request. Handlers take
/// this as an explicit extension instead of consulting any ambient session
/// state.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub name: String,
}

pub async fn verify_admin_ident(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_str()
        .map_err(|_| StatusCode::BAD_REQUEST)?
        .to_owned();

    let presented = header.strip_prefix("Bearer ").unwrap_or(&header);

    let admin_token = var!(Var::AdminToken)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !constant_time_cmp(presented, admin_token) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(AdminPrincipal {
        name: String::from("admin"),
    });

    Ok(next.run(req).await)
}
