//! Service root.

use axum::Json;
use serde::Serialize;

/// Greeting returned from `GET /`.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        success: true,
        message: "Welcome to the Template Service!",
    })
}
