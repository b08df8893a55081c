//! Tag-keyed marquee store
//!
//! One directory holds `<tag>.txt` (current marquee text) and, once the tag
//! has been provisioned, `<tag>.key` (the tag's secret). Content is always
//! replaced through a temp file and a rename.

use tracing::{debug, info, warn};

use crate::authn::shared_key::{tokens_match, SharedKey};
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::filesys::segment::Segment;
use crate::marquee::status::PublishStatus;

const CONTENT_EXT: &str = "txt";
const SECRET_EXT: &str = "key";

/// A publish request as received from the player
#[derive(Debug, Default, Clone, Copy)]
pub struct PublishRequest<'a> {
    pub tag: Option<&'a str>,
    /// Per-tag secret
    pub secret: Option<&'a str>,
    /// Endpoint shared key, checked only when present
    pub key: Option<&'a str>,
    pub content: Option<&'a [u8]>,
}

/// Marquee storage for all tags
#[derive(Debug, Clone)]
pub struct MarqueeStore {
    dir: Dir,
    shared_key: Option<SharedKey>,
}

impl MarqueeStore {
    pub fn new(dir: Dir, shared_key: Option<SharedKey>) -> Self {
        Self { dir, shared_key }
    }

    fn content_file(&self, tag: &Segment) -> File {
        self.dir.file(&format!("{}.{}", tag, CONTENT_EXT))
    }

    fn secret_file(&self, tag: &Segment) -> File {
        self.dir.file(&format!("{}.{}", tag, SECRET_EXT))
    }

    /// Current marquee text for `tag`, empty when there is none.
    pub async fn fetch(&self, tag: Option<&str>) -> Vec<u8> {
        let Some(tag) = tag.and_then(|t| Segment::parse(t).ok()) else {
            debug!("Marquee fetch without a valid tag");
            return Vec::new();
        };

        match self.content_file(&tag).read_optional().await {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                warn!("Unable to read marquee for tag {}: {}", tag, e);
                Vec::new()
            }
        }
    }

    /// Store new marquee text for a tag.
    pub async fn publish(&self, request: PublishRequest<'_>) -> PublishStatus {
        let Some(tag) = request.tag.and_then(|t| Segment::parse(t).ok()) else {
            return PublishStatus::MissingTag;
        };

        if let Some(key) = request.key {
            let accepted = self
                .shared_key
                .as_ref()
                .map(|shared| shared.matches(key))
                .unwrap_or(false);
            if !accepted {
                info!("Marquee publish for tag {} rejected: bad shared key", tag);
                return PublishStatus::BadSharedKey;
            }
        }

        let Some(content) = request.content else {
            return PublishStatus::MissingContent;
        };

        let secret = match request.secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                info!("Marquee publish for tag {} rejected: no secret", tag);
                return PublishStatus::NotSecured;
            }
        };

        if let Err(status) = self.authorize(&tag, secret).await {
            return status;
        }

        match self.content_file(&tag).write_atomic(content).await {
            Ok(()) => {
                debug!("Marquee for tag {} updated ({} bytes)", tag, content.len());
                PublishStatus::Ok
            }
            Err(e) => {
                warn!("Unable to store marquee for tag {}: {}", tag, e);
                PublishStatus::TempWriteFailed
            }
        }
    }

    /// Check `secret` against the tag's secret, provisioning the tag with
    /// `secret` if it has none yet.
    async fn authorize(&self, tag: &Segment, secret: &str) -> Result<(), PublishStatus> {
        let secret_file = self.secret_file(tag);

        match secret_file.read_optional().await {
            Ok(Some(stored)) => return Self::compare(tag, secret, &stored),
            Ok(None) => {}
            Err(e) => {
                warn!("Unable to read secret for tag {}: {}", tag, e);
                return Err(PublishStatus::NotSecured);
            }
        }

        match secret_file.create_exclusive(secret.as_bytes()).await {
            Ok(()) => {
                info!("Marquee tag {} provisioned", tag);
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                // another first publish won; judge against its secret
                match secret_file.read_bytes().await {
                    Ok(stored) => Self::compare(tag, secret, &stored),
                    Err(e) => {
                        warn!("Unable to read secret for tag {}: {}", tag, e);
                        Err(PublishStatus::NotSecured)
                    }
                }
            }
            Err(e) => {
                warn!("Unable to provision tag {}: {}", tag, e);
                Err(PublishStatus::SecretWriteFailed)
            }
        }
    }

    fn compare(tag: &Segment, secret: &str, stored: &[u8]) -> Result<(), PublishStatus> {
        if tokens_match(secret.as_bytes(), stored) {
            Ok(())
        } else {
            info!("Marquee publish for tag {} rejected: secret mismatch", tag);
            Err(PublishStatus::SecretMismatch)
        }
    }
}
