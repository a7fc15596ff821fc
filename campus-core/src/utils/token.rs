use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;

/// Generates an opaque bearer token: 32 random bytes, URL-safe base64 encoded.
///
/// The raw value goes to the caller once; only its SHA-256 digest is stored.
pub fn generate_opaque_token() -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
