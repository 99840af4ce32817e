use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::auth::application::domain::entities::PlaintextToken;

/// Draws `len` alphanumeric characters from the thread-local CSPRNG
/// (ChaCha, seeded from the OS).
pub fn generate_token(len: usize) -> PlaintextToken {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect();
    PlaintextToken::new(secret)
}
