use std::fmt;

/// Reply to an upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Ok,
    AuthFailed,
    MissingIdentifier,
    InvalidIdentifier,
    NoFile,
    InvalidFileName,
    StoreFailed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UploadStatus::Ok => "OK",
            UploadStatus::AuthFailed => "NG: authentication failed",
            UploadStatus::MissingIdentifier => "NG: missing identifier",
            UploadStatus::InvalidIdentifier => "NG: invalid identifier",
            UploadStatus::NoFile => "NG: no file attached",
            UploadStatus::InvalidFileName => "NG: invalid file name",
            UploadStatus::StoreFailed => "NG: unable to store file",
        };
        f.write_str(text)
    }
}
