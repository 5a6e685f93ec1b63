pub mod basic;
pub mod bearer;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod resolver;

pub use basic::{BasicTokenFactory, KeyEntryError, KeyListError};
pub use bearer::BearerTokenFactory;
pub use envelope::{CompactJwsParser, EnvelopeError, EnvelopeParser, SignedEnvelope};
pub use error::{TokenError, TokenErrorKind};
pub use factory::{TokenFactories, TokenFactory};
pub use resolver::{KeyResolver, ResolveError, StaticKeyResolver};
