/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to clone: everything sits behind Arc
 */
use std::sync::Arc;

use crate::services::auth::TokenFactories;

pub const REALM: &str = "credgate";

#[derive(Clone, Debug)]
pub struct AppState {
    pub factories: Arc<TokenFactories>,
    // WWW-Authenticate value advertised on 401s, derived from the registry
    pub challenge: Option<String>,
}

impl AppState {
    pub fn new(factories: TokenFactories) -> Self {
        let challenge = if factories.is_empty() {
            None
        } else {
            Some(
                factories
                    .schemes()
                    .iter()
                    .map(|scheme| format!("{} realm=\"{}\"", capitalize(scheme), REALM))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        Self {
            factories: Arc::new(factories),
            challenge,
        }
    }
}

// "basic" -> "Basic"; the registry stores lowercase keys
fn capitalize(scheme: &str) -> String {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
