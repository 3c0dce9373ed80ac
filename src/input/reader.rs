//! Dedicated stdin-reading thread, feeding raw byte chunks to the decoder.
//!
//! Grounded on the teacher's `StdinReader` (`rust/src/input/reader.rs`):
//! blocking `Read` on stdin inside a `thread::Builder`-spawned worker, one
//! chunk per `send`, cooperative shutdown via a running flag.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Reads raw bytes from stdin on a dedicated thread and forwards each chunk
/// to `tx` as it arrives.
pub struct StdinReader {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl StdinReader {
    pub fn spawn(tx: Sender<Vec<u8>>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::Builder::new()
            .name("container-stage-stdin".to_string())
            .spawn(move || Self::read_loop(running_clone, tx))?;

        Ok(Self {
            handle: Some(handle),
            running,
        })
    }

    fn read_loop(running: Arc<AtomicBool>, tx: Sender<Vec<u8>>) {
        let stdin = io::stdin();
        let mut buf = [0u8; 256];

        while running.load(Ordering::SeqCst) {
            match stdin.lock().read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("stdin reader: read error, stopping: {e}");
                    break;
                }
            }
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
        // The worker thread is very likely blocked on a stdin read with no
        // portable way to interrupt it; joining here would hang past
        // process shutdown, so we deliberately let it leak, matching the
        // teacher's own rationale in `StdinReader::stop`.
        self.handle.take();
    }
}
