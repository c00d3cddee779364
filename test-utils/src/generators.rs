//! Shared proptest generators.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use proptest::prelude::*;

/// Transit-style ciphertexts: `vault:v<N>:<base64>`.
pub fn ciphertext_strategy() -> impl Strategy<Value = String> {
    (1u32..5, prop::collection::vec(any::<u8>(), 12..64))
        .prop_map(|(version, bytes)| format!("vault:v{version}:{}", STANDARD.encode(bytes)))
}

/// Passwords: any non-control characters, including non-ASCII.
pub fn plaintext_strategy() -> impl Strategy<Value = String> {
    "\\PC{1,48}"
}

/// Transit decrypt paths.
pub fn key_path_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,20}".prop_map(|name| format!("transit/decrypt/{name}"))
}

/// Gateway tokens.
pub fn token_strategy() -> impl Strategy<Value = String> {
    "s\\.[A-Za-z0-9]{24}"
}

/// Property keys without separators or escapes.
pub fn property_key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,24}"
}

/// Property values without escapes, leading whitespace or line breaks.
pub fn property_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9/_.:=-][A-Za-z0-9 /_.:=-]{0,40}"
}
