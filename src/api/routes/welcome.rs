//! GET / - Welcome message

use axum::Json;

use crate::api::dto::WelcomeResponse;

pub const WELCOME_MESSAGE: &str = "Bienvenue sur l'API Almanac ! Posez vos questions sur \
les événements culturels via POST /api/v1/ask.";

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
