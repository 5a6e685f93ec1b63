/*
 * Responsibility
 * - Public surface of v1 (routes() and the extractors handlers use)
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
