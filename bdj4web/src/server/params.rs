//! Request parameter extraction
//!
//! Clients send the same named parameters either in the query string, as an
//! urlencoded form or as multipart form data. All of them are merged into a
//! single list, body after query, so a body value wins over a query value.

use axum::extract::{FromRequest, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Form;
use tracing::{debug, warn};

use crate::upload::UploadedFile;

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "upfile";

#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: Vec<(String, String)>,
    upload: Option<UploadedFile>,
}

impl RequestParams {
    pub fn new(values: Vec<(String, String)>, upload: Option<UploadedFile>) -> Self {
        Self { values, upload }
    }

    /// Last value received for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.iter().any(|(key, _)| key == name)
    }

    /// Every received name/value pair, in arrival order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.values
    }

    pub fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }
}

enum BodyKind {
    None,
    UrlEncoded,
    Multipart,
}

fn body_kind(req: &Request) -> BodyKind {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        return BodyKind::None;
    }
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyKind::UrlEncoded
    } else {
        BodyKind::None
    }
}

// Unreadable input never rejects the request: the endpoints answer with
// their own status tokens for missing parameters.
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut values = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            Ok(Query(values)) => values,
            Err(e) => {
                warn!("Ignoring malformed query string: {}", e);
                Vec::new()
            }
        };
        let mut upload = None;

        match body_kind(&req) {
            BodyKind::None => {}
            BodyKind::UrlEncoded => {
                match Form::<Vec<(String, String)>>::from_request(req, state).await {
                    Ok(Form(body)) => values.extend(body),
                    Err(e) => warn!("Ignoring malformed form body: {}", e),
                }
            }
            BodyKind::Multipart => match Multipart::from_request(req, state).await {
                Ok(multipart) => {
                    upload = read_multipart(multipart, &mut values).await;
                }
                Err(e) => warn!("Ignoring malformed multipart body: {}", e),
            },
        }

        Ok(RequestParams::new(values, upload))
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    values: &mut Vec<(String, String)>,
) -> Option<UploadedFile> {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped reading multipart body: {}", e);
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Unable to read multipart field {:?}: {}", name, e);
                break;
            }
        };

        if name == UPLOAD_FIELD {
            debug!("Received upload {:?} ({} bytes)", file_name, bytes.len());
            upload = Some(UploadedFile {
                file_name: file_name.unwrap_or_default(),
                bytes: bytes.to_vec(),
            });
        } else {
            values.push((name, String::from_utf8_lossy(&bytes).into_owned()));
        }
    }

    upload
}
