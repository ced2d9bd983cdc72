//! Credential verification seam
//!
//! `unlock` delegates credential checking to an external collaborator
//! (biometric prompt, password check). Implementations bridge to it through
//! [`CredentialVerifier`]; the orchestrator only flips session state on
//! success.

use async_trait::async_trait;

/// External credential verifier
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify an unlock credential. `false` keeps the session locked.
    async fn verify(&self, credential: &str) -> bool;
}

/// Fixed-credential verifier for tests and development builds
pub struct StaticCredential {
    expected: String,
}

impl StaticCredential {
    /// Accept exactly `expected`
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredential {
    async fn verify(&self, credential: &str) -> bool {
        credential == self.expected
    }
}

/// Verifier that accepts everything. Development only.
pub struct AcceptAll;

#[async_trait]
impl CredentialVerifier for AcceptAll {
    async fn verify(&self, _credential: &str) -> bool {
        true
    }
}
