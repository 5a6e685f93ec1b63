/*
 * Responsibility
 * - GET /whoami: echo the validated token back to the caller
 */
use axum::Json;

use crate::api::v1::extractors::AuthToken;
use crate::token::Token;

pub async fn whoami(AuthToken(token): AuthToken) -> Json<Token> {
    Json(token)
}
