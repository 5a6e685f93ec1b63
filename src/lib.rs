pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
pub mod token;

pub use services::auth::{TokenError, TokenFactories, TokenFactory};
pub use token::{Attributes, Token};
