use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use thiserror::Error;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, warn};

use commentary_core::domain::events::CommentEvent;

const HEADER_EVENT: &str = "x-commentary-event";
const HEADER_SIGNATURE: &str = "x-commentary-signature";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Forwards each event as a JSON POST. Delivery is attempted once; failures
/// are logged and the event is dropped.
pub struct WebhookForwarder {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookForwarder {
    pub fn new(client: Client, url: String, secret: Option<String>) -> Self {
        Self {
            client,
            url,
            secret: secret.filter(|value| !value.is_empty()),
        }
    }

    pub async fn run(self, mut receiver: Receiver<CommentEvent>) {
        while let Some(event) = receiver.recv().await {
            let name = event.name.as_str();
            match self.deliver(&event).await {
                Ok(()) => debug!(event = name, "event forwarded"),
                Err(err) => warn!(event = name, error = %err, "event forward failed"),
            }
        }
    }

    async fn deliver(&self, event: &CommentEvent) -> Result<(), WebhookError> {
        let body = serde_json::to_vec(event)?;
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(HEADER_EVENT, event.name.as_str());
        if let Some(secret) = self.secret.as_deref() {
            request = request.header(HEADER_SIGNATURE, sign_payload(secret, &body));
        }
        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status.as_u16()));
        }
        Ok(())
    }
}

pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("hmac can take key of any size");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::sign_payload;

    #[test]
    fn signature_verifies_against_body() {
        let body = br#"{"name":"comment.create"}"#;
        let header = sign_payload("secret", body);
        let hex_sig = header.strip_prefix("sha256=").unwrap();
        let raw = hex::decode(hex_sig).unwrap();
        let mut mac = Hmac::<Sha256>::new_from_slice(b"secret").unwrap();
        mac.update(body);
        assert!(mac.verify_slice(&raw).is_ok());
    }

    #[test]
    fn signature_depends_on_secret() {
        assert_ne!(sign_payload("a", b"body"), sign_payload("b", b"body"));
    }
}
