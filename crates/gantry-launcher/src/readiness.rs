//! Readiness detection.
//!
//! The launched process signals readiness by printing a designated
//! sentinel line to stdout or stderr. [`await_ready`] races three event
//! sources: a stdout match, a stderr match, and a timer. The first to
//! complete wins; the losing stream's reader task is abandoned, not
//! joined, since the process itself keeps running.

use std::time::Duration;

use gantry_common::{FixtureError, FixtureResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tracing::debug;

/// Wait until either stream emits a line exactly equal to `ready_line`,
/// or fail once `timeout` elapses.
///
/// Each stream is scanned by its own spawned task so that a blocked or
/// silent stream never delays the other. A stream that closes before the
/// sentinel appears simply stops reporting; the detector then waits out
/// the remaining timeout rather than failing early, matching the
/// behavior of a process that goes quiet without ever becoming ready.
pub async fn await_ready<O, E>(
    stdout: O,
    stderr: E,
    ready_line: &str,
    timeout: Duration,
) -> FixtureResult<()>
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = oneshot::channel();
    let (err_tx, err_rx) = oneshot::channel();

    tokio::spawn(scan_for_line(stdout, ready_line.to_string(), "stdout", out_tx));
    tokio::spawn(scan_for_line(stderr, ready_line.to_string(), "stderr", err_tx));

    // A dropped sender (EOF or read error) resolves the receiver to Err,
    // which disables that branch; only a real match can win a branch.
    tokio::select! {
        Ok(()) = out_rx => {
            debug!("ready line matched on stdout");
            Ok(())
        }
        Ok(()) = err_rx => {
            debug!("ready line matched on stderr");
            Ok(())
        }
        _ = tokio::time::sleep(timeout) => {
            Err(FixtureError::ready_timeout(ready_line, timeout))
        }
    }
}

/// Read lines until one equals `ready_line`, then signal and stop.
/// Returns silently on EOF or read error.
async fn scan_for_line<R>(stream: R, ready_line: String, name: &'static str, found: oneshot::Sender<()>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line == ready_line {
                    // Receiver may already be gone if the other stream won.
                    let _ = found.send(());
                    return;
                }
            }
            Ok(None) => {
                debug!(stream = name, "stream closed before ready line");
                return;
            }
            Err(e) => {
                debug!(stream = name, error = %e, "error reading stream");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::AsyncWriteExt;
    use tokio::time::Instant;

    fn stream(contents: &str) -> Cursor<Vec<u8>> {
        Cursor::new(contents.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_match_on_stdout() {
        let stdout = stream("starting up\nRunning\nmore output\n");
        let stderr = stream("");

        await_ready(stdout, stderr, "Running", Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_match_on_stderr() {
        let stdout = stream("");
        let stderr = stream("Running\n");

        await_ready(stdout, stderr, "Running", Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_partial_line_does_not_match() {
        let stdout = stream("Running on port 8080\n");
        let stderr = stream("");

        let err = await_ready(stdout, stderr, "Running", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::ReadyTimeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_names_sentinel() {
        let stdout = stream("never ready\n");
        let stderr = stream("");

        let err = await_ready(stdout, stderr, "Running", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("\"Running\""));
    }

    #[tokio::test]
    async fn test_closed_streams_wait_out_the_timeout() {
        let timeout = Duration::from_millis(150);
        let start = Instant::now();

        // Both streams hit EOF immediately; the detector must still wait
        // for the full deadline rather than failing early.
        let err = await_ready(stream(""), stream(""), "Running", timeout)
            .await
            .unwrap_err();

        assert!(matches!(err, FixtureError::ReadyTimeout { .. }));
        assert!(start.elapsed() >= timeout);
    }

    #[tokio::test]
    async fn test_delayed_sentinel_completes_before_deadline() {
        let (mut writer, reader) = tokio::io::duplex(64);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer.write_all(b"Running\n").await.unwrap();
        });

        let start = Instant::now();
        await_ready(reader, stream(""), "Running", Duration::from_secs(2))
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
