//! Signed unsubscribe tokens
//!
//! A token is `base64url(subscription uuid bytes) + "." + hex(hmac)`, where the
//! HMAC-SHA256 is taken over the raw uuid bytes. Tokens do not expire: an
//! unsubscribe link in an old email keeps working.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::entities::SubscriptionId;
use crate::error::DomainError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UnsubscribeSigner {
    key: Vec<u8>,
}

impl UnsubscribeSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, DomainError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| DomainError::Internal("Invalid unsubscribe secret".to_string()))?;
        mac.update(payload);
        Ok(mac)
    }

    pub fn sign(&self, id: &SubscriptionId) -> Result<String, DomainError> {
        let bytes = id.0.as_bytes();
        let signature = self.mac(bytes)?.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(bytes),
            hex::encode(signature)
        ))
    }

    /// Check a token and return the subscription it was issued for
    pub fn verify(&self, token: &str) -> Result<SubscriptionId, DomainError> {
        let invalid = || DomainError::Validation("Invalid unsubscribe link".to_string());

        let (payload, signature) = token.trim().split_once('.').ok_or_else(invalid)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let expected = hex::decode(signature).map_err(|_| invalid())?;

        self.mac(&bytes)?
            .verify_slice(&expected)
            .map_err(|_| invalid())?;

        let id = Uuid::from_slice(&bytes).map_err(|_| invalid())?;
        Ok(SubscriptionId(id))
    }
}
