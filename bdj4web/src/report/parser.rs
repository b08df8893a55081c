//! Telemetry log parser
//!
//! ```text
//! ===BEGIN
//! -version
//! 4.3.2
//! -new
//! 1
//! ===END
//! ```

use tracing::trace;

use crate::report::record::InstallRecord;

const BEGIN_MARKER: &str = "===BEGIN";
const END_MARKER: &str = "===END";

enum State {
    Outside,
    Key(InstallRecord),
    Value(InstallRecord, String),
}

/// Parse every complete block, in log order.
///
/// Lines outside blocks are skipped, a second BEGIN restarts the block and
/// a block without END at the end of the log is dropped.
pub fn parse_log(text: &str) -> Vec<InstallRecord> {
    let mut records = Vec::new();
    let mut state = State::Outside;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if line.starts_with(END_MARKER) {
            if let State::Key(mut record) | State::Value(mut record, _) = state {
                record.finish();
                records.push(record);
            }
            state = State::Outside;
            continue;
        }

        if line.starts_with(BEGIN_MARKER) {
            state = State::Key(InstallRecord::default());
            continue;
        }

        state = match state {
            State::Outside => State::Outside,
            State::Key(record) => State::Value(record, line.to_string()),
            State::Value(mut record, key) => {
                if !record.set(&key, line) {
                    trace!("Ignoring unknown telemetry key {}", key);
                }
                State::Key(record)
            }
        };
    }

    records
}
