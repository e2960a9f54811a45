use crate::Generator;
use burrow_core::token::{TOKEN_ALPHABET, TOKEN_LENGTH};
use burrow_core::ShortToken;
use rand::Rng;

/// Draws every character independently and uniformly from
/// [`TOKEN_ALPHABET`].
///
/// Each call uses the calling thread's RNG, so the generator holds no shared
/// state and can be used from any number of tasks at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortToken {
        let mut rng = rand::thread_rng();
        let token: String = (0..TOKEN_LENGTH)
            .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
            .collect();
        ShortToken::new_unchecked(token)
    }
}
