//! Short token generation.

pub mod random;

pub use random::RandomGenerator;

use burrow_core::ShortToken;
use std::sync::Arc;

/// Trait for generating short tokens.
///
/// Implementations are pure generators that don't interact with storage.
/// They do not guarantee uniqueness; backends rely on the token space being
/// large enough for collisions to be negligible.
pub trait Generator: Send + Sync + 'static {
    /// Produces a new token.
    fn generate(&self) -> ShortToken;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self) -> ShortToken {
        (**self).generate()
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> ShortToken {
        (**self).generate()
    }
}
