//! Support uploads from the desktop client

pub mod decode;
pub mod notify;
pub mod receiver;
pub mod status;

pub use receiver::{SupportUpload, UploadReceiver, UploadedFile, SUPPORT_SENTINEL};
pub use status::UploadStatus;
