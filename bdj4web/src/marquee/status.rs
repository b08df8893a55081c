//! Publish result codes returned to marquee clients

use std::fmt;

/// Outcome of a marquee publish.
///
/// Clients key off the short code, so the numbering is part of the wire
/// contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// Content stored
    Ok,
    /// `tag` missing or not a valid tag name
    MissingTag,
    /// `key` present but wrong
    BadSharedKey,
    /// Neither `content` nor `mqdata` supplied
    MissingContent,
    /// Tag is provisioned and `secret` does not match
    SecretMismatch,
    /// Writing the temp file or renaming it into place failed
    TempWriteFailed,
    /// Provisioning the tag's secret file failed
    SecretWriteFailed,
    /// No usable secret, nothing written
    NotSecured,
}

impl PublishStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PublishStatus::Ok => "OK",
            PublishStatus::MissingTag => "NG1",
            PublishStatus::BadSharedKey => "NG2",
            PublishStatus::MissingContent => "NG3",
            PublishStatus::SecretMismatch => "NG4",
            PublishStatus::TempWriteFailed => "NG5",
            PublishStatus::SecretWriteFailed => "NG6",
            PublishStatus::NotSecured => "NG7",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
