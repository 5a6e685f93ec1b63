//! `Authorization: <scheme> <value>` -> TokenFactory -> Token in request extensions.
//!
//! Handlers read the token back through `AuthToken`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::error::{AppError, ErrorResponseReason};
use crate::state::AppState;

/// Put every route of `router` behind token construction.
///
/// ```ignore
/// let protected = Router::new().route("/whoami", get(whoami));
/// let protected = middleware::auth::constructor::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, constructor_middleware))
}

async fn constructor_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let reject = |reason| AppError::unauthenticated(reason, state.challenge.clone());

    let (scheme, value) = {
        let raw = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or_else(|| {
                debug!("authorization header missing");
                reject(ErrorResponseReason::MissingHeader)
            })?
            .to_str()
            .map_err(|_| AppError::BadCredentials {
                reason: ErrorResponseReason::InvalidHeader,
            })?;

        let (scheme, value) = raw.split_once(' ').ok_or(AppError::BadCredentials {
            reason: ErrorResponseReason::InvalidHeader,
        })?;
        (scheme.to_string(), value.trim_start().to_string())
    };

    let factory = state.factories.get(&scheme).cloned().ok_or_else(|| {
        debug!(scheme = %scheme, "unsupported authorization scheme");
        reject(ErrorResponseReason::KeyNotSupported)
    })?;

    let (mut parts, body) = req.into_parts();

    let token = match factory.parse_and_validate(&parts, &value).await {
        Ok(token) => token,
        Err(err) => {
            warn!(
                scheme = %scheme,
                kind = err.kind().as_str(),
                error = %err,
                "credential rejected"
            );
            return Err(AppError::from_token_error(&err, state.challenge.clone()));
        }
    };

    debug!(
        scheme = token.scheme(),
        principal = token.principal(),
        "request authenticated"
    );

    parts.extensions.insert(token);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
