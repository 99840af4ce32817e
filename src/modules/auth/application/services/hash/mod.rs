mod token_generator;
mod token_hasher;

pub use token_generator::generate_token;
pub use token_hasher::hash_token;
