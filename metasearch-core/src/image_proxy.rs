//! Signed links for the image proxy endpoint.
//!
//! The proxy only fetches URLs whose signature matches the one recomputed
//! here, so it cannot be used as an open relay. Signatures are BLAKE3
//! keyed hashes; the 32-byte key is derived from the configured secret
//! once per process.

use std::fmt;
use url::form_urlencoded;

use crate::error::SearchError;

const KEY_CONTEXT: &str = "metasearch image proxy v1";

/// Signs and verifies upstream image URLs.
#[derive(Clone)]
pub struct ImageProxy {
    key: [u8; 32],
    path: String,
}

impl ImageProxy {
    /// Derive the signing key from `secret`; links point at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an empty secret or path.
    pub fn new(secret: &str, path: &str) -> Result<Self, SearchError> {
        if secret.is_empty() {
            return Err(SearchError::Config("image proxy secret must not be empty".into()));
        }
        if path.trim().is_empty() {
            return Err(SearchError::Config("image proxy path must not be empty".into()));
        }
        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            path: path.trim().to_string(),
        })
    }

    /// Lowercase hex signature of `url`.
    pub fn sign(&self, url: &str) -> String {
        blake3::keyed_hash(&self.key, url.as_bytes()).to_hex().to_string()
    }

    /// Constant-time check of `signature` against `url`.
    pub fn verify(&self, url: &str, signature: &str) -> bool {
        match blake3::Hash::from_hex(signature.trim()) {
            Ok(supplied) => supplied == blake3::keyed_hash(&self.key, url.as_bytes()),
            Err(_) => false,
        }
    }

    /// The `<path>?url=<url>&sha=<signature>` link to embed in pages.
    pub fn proxied_url(&self, url: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("url", url)
            .append_pair("sha", &self.sign(url))
            .finish();
        format!("{}?{query}", self.path)
    }
}

impl fmt::Debug for ImageProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageProxy")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
