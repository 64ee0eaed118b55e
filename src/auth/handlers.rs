use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::directory::{DirectoryUser, EmployeeDirectory};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "K012345")]
    pub employee_id: String,
}

/// Mock login: resolves the employee id through the directory
///
/// No credential verification takes place; this exists so the UI has a user
/// to act as.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Known employee", body = DirectoryUser),
        (status = 401, description = "Unknown employee id", body = Object, example = json!({
            "error": "Unknown employee id"
        }))
    ),
    tag = "Auth"
)]
pub async fn login(
    directory: web::Data<EmployeeDirectory>,
    payload: web::Json<LoginRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = payload.employee_id.trim();

    let user = directory.lookup(employee_id).await.map_err(|e| {
        error!(error = %e, %employee_id, "Directory lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Unknown employee id"
        }))),
    }
}

/// Mock logout: stateless acknowledgement
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = Object, example = json!({
            "message": "Logged out"
        }))
    ),
    tag = "Auth"
)]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Logged out"
    }))
}
