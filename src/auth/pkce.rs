//! PKCE S256 challenge generation
//!
//! Federated sign-in runs the OAuth authorization-code flow with PKCE
//! (RFC 7636): the client keeps a random verifier, sends its S256 digest
//! with the authorization request, and proves possession of the verifier
//! at the token exchange.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A PKCE verifier and its derived S256 challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Random base64url string, presented at the token exchange
    pub verifier: String,
    /// Base64url SHA-256 digest of the verifier, sent with the
    /// authorization request
    pub challenge: String,
}

/// Generate a fresh challenge pair
///
/// The verifier is 32 random bytes encoded as base64url without padding
/// (43 characters); the challenge is the base64url-encoded SHA-256 digest
/// of the verifier's UTF-8 bytes.
///
/// # Examples
///
/// ```
/// use talvi::auth::pkce::generate;
///
/// let pkce = generate();
/// assert_eq!(pkce.verifier.len(), 43);
/// assert_ne!(pkce.verifier, pkce.challenge);
/// ```
pub fn generate() -> PkceChallenge {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);

    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    PkceChallenge {
        verifier,
        challenge,
    }
}
