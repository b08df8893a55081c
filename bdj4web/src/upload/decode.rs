//! Decode steps selected from an uploaded file's name.
//!
//! The desktop client gzips support files and base64-encodes the result,
//! naming the upload `<name>.gz.b64`. Only trailing name segments count as
//! markers. Decoding always runs base64 first and gzip second, whatever order
//! the markers appear in.

use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::read::GzDecoder;

use crate::errors::WebError;

pub const BASE64_MARKER: &str = ".b64";
pub const GZIP_MARKER: &str = ".gz";

/// Upper bound on a decompressed upload
pub const DEFAULT_MAX_DECODED_BYTES: usize = 64 * 1024 * 1024;

/// One transformation of an upload body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    Base64Decode,
    GzipDecompress,
}

impl DecodeStep {
    /// Name marker that selects this step
    pub fn marker(&self) -> &'static str {
        match self {
            DecodeStep::Base64Decode => BASE64_MARKER,
            DecodeStep::GzipDecompress => GZIP_MARKER,
        }
    }

    pub fn apply(&self, input: &[u8], max_output: usize) -> Result<Vec<u8>, WebError> {
        match self {
            DecodeStep::Base64Decode => {
                // the client may wrap lines
                let compact: Vec<u8> = input
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                BASE64
                    .decode(&compact)
                    .map_err(|e| WebError::ValidationError(format!("Invalid base64: {e}")))
            }
            DecodeStep::GzipDecompress => {
                let mut output = Vec::new();
                GzDecoder::new(input)
                    .take(max_output as u64 + 1)
                    .read_to_end(&mut output)
                    .map_err(|e| WebError::ValidationError(format!("Invalid gzip data: {e}")))?;
                if output.len() > max_output {
                    return Err(WebError::ValidationError(format!(
                        "Decompressed upload exceeds {} bytes",
                        max_output
                    )));
                }
                Ok(output)
            }
        }
    }
}

/// Ordered decode steps for one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodePipeline {
    steps: Vec<DecodeStep>,
    max_output: usize,
}

impl DecodePipeline {
    /// Select steps from the uploaded file name's markers
    pub fn for_upload_name(name: &str) -> Self {
        let (_, found) = split_markers(name);
        let steps = [DecodeStep::Base64Decode, DecodeStep::GzipDecompress]
            .into_iter()
            .filter(|step| found.contains(step))
            .collect();
        Self {
            steps,
            max_output: DEFAULT_MAX_DECODED_BYTES,
        }
    }

    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    pub fn steps(&self) -> &[DecodeStep] {
        &self.steps
    }

    pub fn max_output(&self) -> usize {
        self.max_output
    }

    /// Run every step over `input` in memory
    pub fn decode(&self, input: &[u8]) -> Result<Vec<u8>, WebError> {
        let mut data = input.to_vec();
        for step in &self.steps {
            data = step.apply(&data, self.max_output)?;
        }
        Ok(data)
    }
}

/// Split trailing decode markers off `name`, each marker at most once
fn split_markers(name: &str) -> (&str, Vec<DecodeStep>) {
    let mut base = name;
    let mut found = Vec::new();

    loop {
        let next = [DecodeStep::Base64Decode, DecodeStep::GzipDecompress]
            .into_iter()
            .filter(|step| !found.contains(step))
            .find_map(|step| base.strip_suffix(step.marker()).map(|rest| (rest, step)));
        match next {
            Some((rest, step)) => {
                base = rest;
                found.push(step);
            }
            None => return (base, found),
        }
    }
}

/// The upload name with its trailing decode markers removed
pub fn strip_markers(name: &str) -> String {
    split_markers(name).0.to_string()
}
