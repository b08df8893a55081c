//! Support upload receiver
//!
//! Uploads land below `<uploads>/<identifier>/`, mirroring the relative name
//! the client sent. Encoded uploads pass through on-disk stages named after
//! the markers still to be undone (`x.gz.b64` -> `x.gz` -> `x`); the stages
//! are removed once the final file is in place.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::authn::shared_key::{key_accepted, SharedKey};
use crate::errors::WebError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::filesys::segment::{RelativeName, Segment};
use crate::upload::decode::{strip_markers, DecodePipeline, DecodeStep};
use crate::upload::notify::{Notification, Notifier};
use crate::upload::status::UploadStatus;

/// Upload name whose content is relayed to the operator
pub const SUPPORT_SENTINEL: &str = "support.txt";

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// A file received in a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name the client gave the uploaded part
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A support upload as received from the desktop client
#[derive(Debug, Default, Clone, Copy)]
pub struct SupportUpload<'a> {
    pub key: Option<&'a str>,
    pub identifier: Option<&'a str>,
    pub orig_name: Option<&'a str>,
    pub file: Option<&'a UploadedFile>,
}

pub struct UploadReceiver {
    uploads_dir: Dir,
    support_key: Option<SharedKey>,
    notifier: Arc<dyn Notifier>,
    max_decoded_bytes: usize,
}

impl UploadReceiver {
    pub fn new(
        uploads_dir: Dir,
        support_key: Option<SharedKey>,
        notifier: Arc<dyn Notifier>,
        max_decoded_bytes: usize,
    ) -> Self {
        Self {
            uploads_dir,
            support_key,
            notifier,
            max_decoded_bytes,
        }
    }

    pub async fn receive(&self, upload: SupportUpload<'_>) -> UploadStatus {
        if !key_accepted(self.support_key.as_ref(), upload.key) {
            info!("Support upload rejected: bad key");
            return UploadStatus::AuthFailed;
        }

        let identifier = match upload.identifier {
            None | Some("") => return UploadStatus::MissingIdentifier,
            Some(raw) => match Segment::parse(raw) {
                Ok(identifier) => identifier,
                Err(e) => {
                    info!("Support upload rejected: {}", e);
                    return UploadStatus::InvalidIdentifier;
                }
            },
        };

        let Some(file) = upload.file else {
            return UploadStatus::NoFile;
        };

        let dir = self.uploads_dir.subdir(&identifier);
        let stored = match store_upload(&dir, upload.orig_name, file, self.max_decoded_bytes).await
        {
            Ok(stored) => stored,
            Err(status) => return status,
        };
        info!(
            "Stored support upload {} for {}",
            stored.display_name, identifier
        );

        if stored.display_name.base_name() == SUPPORT_SENTINEL {
            self.relay(&identifier, &stored.file).await;
        }

        UploadStatus::Ok
    }

    async fn relay(&self, identifier: &Segment, file: &File) {
        let content = match file.read_bytes().await {
            Ok(content) => content,
            Err(e) => {
                warn!("Unable to read support message for {}: {}", identifier, e);
                return;
            }
        };

        let notification = Notification::support_message(identifier.as_str(), &content);
        match tokio::time::timeout(NOTIFY_TIMEOUT, self.notifier.notify(&notification)).await {
            Ok(Ok(())) => debug!("Support message for {} relayed", identifier),
            Ok(Err(e)) => warn!("Unable to relay support message for {}: {}", identifier, e),
            Err(_) => warn!("Relaying support message for {} timed out", identifier),
        }
    }
}

/// Result of a successful store
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub file: File,
    pub display_name: RelativeName,
}

/// Validate the destination name, then decode and store `upload` below `dir`.
pub async fn store_upload(
    dir: &Dir,
    orig_name: Option<&str>,
    upload: &UploadedFile,
    max_decoded_bytes: usize,
) -> Result<StoredUpload, UploadStatus> {
    let pipeline =
        DecodePipeline::for_upload_name(&upload.file_name).with_max_output(max_decoded_bytes);

    let requested = orig_name
        .filter(|name| !name.is_empty())
        .unwrap_or(&upload.file_name);
    let requested = if pipeline.steps().is_empty() {
        requested.to_string()
    } else {
        strip_markers(requested)
    };
    let name = RelativeName::parse(&requested).map_err(|e| {
        info!("Upload rejected: {}", e);
        UploadStatus::InvalidFileName
    })?;

    let target = dir.file_at(&name);
    decode_into(&target, &upload.bytes, &pipeline)
        .await
        .map_err(|e| {
            warn!("Unable to store upload {}: {}", name, e);
            UploadStatus::StoreFailed
        })?;

    Ok(StoredUpload {
        file: target,
        display_name: name,
    })
}

fn stage_suffix(steps: &[DecodeStep]) -> String {
    steps.iter().rev().map(|step| step.marker()).collect()
}

async fn decode_into(target: &File, raw: &[u8], pipeline: &DecodePipeline) -> Result<(), WebError> {
    let steps = pipeline.steps();
    if steps.is_empty() {
        return target.write_atomic(raw).await;
    }

    let mut stages = Vec::new();
    let result = decode_stages(target, raw, pipeline, &mut stages).await;

    // stages are removed on failure too
    for stage in stages {
        if let Err(e) = stage.delete().await {
            warn!("Unable to remove {}: {}", stage.path().display(), e);
        }
    }
    result
}

async fn decode_stages(
    target: &File,
    raw: &[u8],
    pipeline: &DecodePipeline,
    stages: &mut Vec<File>,
) -> Result<(), WebError> {
    let steps = pipeline.steps();

    let mut stage = target.with_suffix(&stage_suffix(steps));
    stages.push(stage.clone());
    stage.write_bytes(raw).await?;

    for (i, step) in steps.iter().enumerate() {
        let input = stage.read_bytes().await?;
        let output = step.apply(&input, pipeline.max_output())?;
        let remaining = &steps[i + 1..];
        if remaining.is_empty() {
            target.write_atomic(&output).await?;
        } else {
            stage = target.with_suffix(&stage_suffix(remaining));
            stages.push(stage.clone());
            stage.write_bytes(&output).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_suffix() {
        let steps = [DecodeStep::Base64Decode, DecodeStep::GzipDecompress];
        assert_eq!(stage_suffix(&steps), ".gz.b64");
        assert_eq!(stage_suffix(&steps[1..]), ".gz");
        assert_eq!(stage_suffix(&[]), "");
    }
}
