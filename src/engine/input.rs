/// Chat input read off the async runtime
use std::io::{BufRead, BufReader};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

const LINE_BUFFER: usize = 100;

/// Read `reader` line by line on a plain OS thread and forward each line.
///
/// A blocked read never holds up the tokio runtime, so a run can end while
/// the terminal is still open. The channel closes at EOF, on a read error, or
/// once the receiver is dropped.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = thread::Builder::new().name("chat-input".into()).spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        debug!("chat receiver gone, reader stopping");
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "reading chat input failed");
                    return;
                }
            }
        }
    });
    if let Err(e) = spawned {
        // tx was moved into the closure and dropped with it, so rx reports closed
        warn!(error = %e, "could not start chat reader");
    }
    rx
}

/// Forward the process's stdin.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    spawn_line_reader(BufReader::new(std::io::stdin()))
}
