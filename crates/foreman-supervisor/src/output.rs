//! Child output capture.
//!
//! Each started child gets two reader tasks, one per stream, that drain it
//! line by line into the record's [`OutputLog`] until the stream closes.
//! Stdout lines are tagged `[OUT] `, stderr lines `[ERR] `; the tags are part
//! of the output contract consumed by front-ends.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::record::ProcessRecord;

pub const STDOUT_TAG: &str = "[OUT] ";
pub const STDERR_TAG: &str = "[ERR] ";

/// Append-only log of tagged output lines.
#[derive(Debug, Default)]
pub struct OutputLog {
    buf: String,
    lines: usize,
}

impl OutputLog {
    /// Append `tag` + `line` + newline as one unit, so concurrent stdout and
    /// stderr readers interleave whole lines, never fragments.
    pub fn push_line(&mut self, tag: &str, line: &str) {
        self.buf.reserve(tag.len() + line.len() + 1);
        self.buf.push_str(tag);
        self.buf.push_str(line);
        self.buf.push('\n');
        self.lines += 1;
    }

    pub fn contents(&self) -> String {
        self.buf.clone()
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }
}

/// Spawn a task that copies `stream` into `record`'s log, one tagged line at
/// a time. The task ends when the stream closes (normally at child exit).
pub fn spawn_line_reader<R>(
    record: Arc<ProcessRecord>,
    stream: R,
    tag: &'static str,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => record.append_output(tag, &line).await,
                Ok(None) => break,
                Err(e) => {
                    debug!(process = %record.name(), error = %e, "output stream read failed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_line_appends_tagged_lines() {
        let mut log = OutputLog::default();
        log.push_line(STDOUT_TAG, "starting");
        log.push_line(STDERR_TAG, "warning: low disk");
        assert_eq!(log.contents(), "[OUT] starting\n[ERR] warning: low disk\n");
        assert_eq!(log.line_count(), 2);
    }

    #[tokio::test]
    async fn reader_drains_a_stream_to_the_record() {
        let record = Arc::new(ProcessRecord::new("echoer"));
        let data: &[u8] = b"one\ntwo\n";
        spawn_line_reader(record.clone(), data, STDOUT_TAG)
            .await
            .unwrap();

        let state = record.state().lock().await;
        assert_eq!(state.output.contents(), "[OUT] one\n[OUT] two\n");
    }
}
