//! Connectivity test endpoint used by the desktop client's network check

use std::fmt;

use tracing::{debug, info};

use crate::authn::shared_key::{key_accepted, SharedKey};
use crate::filesys::dir::Dir;
use crate::upload::receiver::{store_upload, UploadedFile};
use crate::upload::status::UploadStatus;

/// Parameter whose value is never echoed back
const REDACTED_PARAM: &str = "key";

#[derive(Debug, Default, Clone, Copy)]
pub struct TestRequest<'a> {
    pub key: Option<&'a str>,
    pub orig_name: Option<&'a str>,
    pub file: Option<&'a UploadedFile>,
    pub testdata: Option<&'a str>,
    /// Every received parameter, in arrival order
    pub params: &'a [(String, String)],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestReply {
    Upload(UploadStatus),
    Echo(String),
    NoDirective(Vec<(String, String)>),
}

impl fmt::Display for TestReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestReply::Upload(status) => write!(f, "{}", status),
            TestReply::Echo(data) => write!(f, "OK{}", data),
            TestReply::NoDirective(params) => {
                writeln!(f, "NG: no directive")?;
                for (name, value) in params {
                    if name == REDACTED_PARAM {
                        writeln!(f, "{}=***", name)?;
                    } else {
                        writeln!(f, "{}={}", name, value)?;
                    }
                }
                Ok(())
            }
        }
    }
}

pub struct ConnectivityTester {
    dir: Dir,
    key: Option<SharedKey>,
    max_decoded_bytes: usize,
}

impl ConnectivityTester {
    pub fn new(dir: Dir, key: Option<SharedKey>, max_decoded_bytes: usize) -> Self {
        Self {
            dir,
            key,
            max_decoded_bytes,
        }
    }

    pub async fn test(&self, request: TestRequest<'_>) -> TestReply {
        if !key_accepted(self.key.as_ref(), request.key) {
            info!("Connectivity test rejected: bad key");
            return TestReply::Upload(UploadStatus::AuthFailed);
        }

        if let Some(file) = request.file {
            let status =
                match store_upload(&self.dir, request.orig_name, file, self.max_decoded_bytes)
                    .await
                {
                    Ok(stored) => {
                        debug!("Connectivity test stored {}", stored.display_name);
                        UploadStatus::Ok
                    }
                    Err(status) => status,
                };
            return TestReply::Upload(status);
        }

        if let Some(testdata) = request.testdata {
            return TestReply::Echo(testdata.to_string());
        }

        TestReply::NoDirective(request.params.to_vec())
    }
}
