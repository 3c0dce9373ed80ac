//! The TTY driver: raw-mode terminal setup/teardown, differential render,
//! and dual-strategy resize detection.
//!
//! Grounded on the teacher's `TerminalSetup` (`rust/src/pipeline/terminal.rs`)
//! for the raw-mode enter/exit shape and on `StdinReader`/`ResizeWatcher`
//! (`rust/src/input/reader.rs`) for the SIGWINCH self-pipe thread pattern —
//! restricted to exactly the raw-mode attributes and escape sequences this
//! spec names (no mouse tracking, Kitty keyboard protocol, or bracketed
//! paste, which the teacher's fuller terminal enables but this system has
//! no use for).

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::container::RenderableState;
use crate::error::{EngineError, Result};
use crate::scheduler::Debouncer;

use super::output::OutputBuffer;
use super::ansi;

/// Holds the terminal's original attributes so they can be restored on
/// shutdown, even if the process is interrupted mid-render.
#[cfg(unix)]
struct RawModeGuard {
    fd: i32,
    original: libc::termios,
}

#[cfg(unix)]
impl RawModeGuard {
    fn enable() -> Result<Option<Self>> {
        use std::os::unix::io::AsRawFd;
        let fd = io::stdin().as_raw_fd();

        if unsafe { libc::isatty(fd) } == 0 {
            return Ok(None);
        }

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                return Err(EngineError::Io(io::Error::last_os_error()));
            }
            let original = termios;

            termios.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &termios) != 0 {
                return Err(EngineError::Io(io::Error::last_os_error()));
            }

            Ok(Some(Self { fd, original }))
        }
    }

    fn restore(&self) {
        unsafe {
            libc::tcsetattr(self.fd, libc::TCSAFLUSH, &self.original);
        }
    }
}

/// The renderer: owns the TTY writer, alternate-screen/raw-mode lifecycle,
/// and the differential-render scratch buffer.
pub struct Renderer {
    #[cfg(unix)]
    raw_guard: Option<RawModeGuard>,
    output: OutputBuffer,
    initialized: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            raw_guard: None,
            output: OutputBuffer::new(),
            initialized: false,
        }
    }

    /// Enter the alternate screen, set raw attributes, hide the cursor,
    /// clear the screen.
    pub fn initialize(&mut self) -> Result<()> {
        #[cfg(unix)]
        {
            self.raw_guard = RawModeGuard::enable()?;
        }

        let mut out = io::stdout();
        out.write_all(ansi::ENTER_ALT_SCREEN.as_bytes())?;
        out.write_all(ansi::CURSOR_HIDE.as_bytes())?;
        out.write_all(ansi::CLEAR_SCREEN_HOME.as_bytes())?;
        out.flush()?;
        self.initialized = true;
        Ok(())
    }

    /// Show cursor, exit alternate screen, restore original attributes.
    /// Idempotent and infallible-in-spirit: best-effort restore even if a
    /// write fails partway through, since this runs on the shutdown path.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        let mut out = io::stdout();
        let _ = out.write_all(ansi::CURSOR_SHOW.as_bytes());
        let _ = out.write_all(ansi::EXIT_ALT_SCREEN.as_bytes());
        let _ = out.flush();

        #[cfg(unix)]
        if let Some(guard) = self.raw_guard.take() {
            guard.restore();
        }

        self.initialized = false;
        Ok(())
    }

    /// Render one frame from a container's snapshot and write the resulting
    /// ANSI delta stream in a single `write`. Does not touch `prev_cells` —
    /// committing is the container's responsibility.
    pub fn render(&mut self, state: &RenderableState) -> Result<()> {
        let frame = self.output.render_diff(
            &state.cells,
            &state.prev_cells,
            state.width,
            state.height,
            state.cursor_x,
            state.cursor_y,
            state.cursor_visible,
        );
        let mut out = io::stdout();
        out.write_all(frame.as_bytes())
            .map_err(|e| EngineError::Render(e.to_string()))?;
        out.flush().map_err(|e| EngineError::Render(e.to_string()))?;
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend the coordinator renders through. Exists so the failure-backoff
/// logic in [`crate::coordinator::RenderCoordinator`] can be driven by a
/// scripted test double instead of a live TTY.
pub trait RenderSink: Send {
    fn render(&mut self, state: &RenderableState) -> Result<()>;

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RenderSink for Renderer {
    fn render(&mut self, state: &RenderableState) -> Result<()> {
        Renderer::render(self, state)
    }

    fn initialize(&mut self) -> Result<()> {
        Renderer::initialize(self)
    }

    fn shutdown(&mut self) -> Result<()> {
        Renderer::shutdown(self)
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Query the current TTY dimensions via `TIOCGWINSZ`, or `None` off a TTY.
#[cfg(unix)]
pub fn terminal_size() -> Option<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let ok = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    (ok == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some((ws.ws_col, ws.ws_row))
}

#[cfg(not(unix))]
pub fn terminal_size() -> Option<(u16, u16)> {
    None
}

#[cfg(unix)]
static SIGWINCH_PIPE: AtomicI32 = AtomicI32::new(-1);

#[cfg(unix)]
extern "C" fn sigwinch_handler(_: libc::c_int) {
    let fd = SIGWINCH_PIPE.load(Ordering::SeqCst);
    if fd >= 0 {
        unsafe {
            let _ = libc::write(fd, b"R".as_ptr() as *const libc::c_void, 1);
        }
    }
}

/// Dual-strategy resize watcher: a SIGWINCH self-pipe plus a 100 ms poll,
/// run together for a 2 s observation window. If the signal path delivers
/// at least one resize in that window, polling stops; otherwise the poll
/// loop continues indefinitely as the sole source of truth. Resize events
/// are debounced with 80 ms leading-edge semantics before `on_resize` runs.
pub struct ResizeWatcher {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ResizeWatcher {
    pub fn spawn<F>(poll_interval: Duration, signal_test_window: Duration, debounce: Duration, on_resize: F) -> Self
    where
        F: Fn(u16, u16) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        #[cfg(unix)]
        let signal_rx = spawn_sigwinch_pipe_reader(running.clone());

        let handle = thread::Builder::new()
            .name("container-stage-resize".to_string())
            .spawn(move || {
                let started = Instant::now();
                let mut signal_seen = false;
                let mut poll_active = true;
                let mut last_size = terminal_size();
                let debouncer = Arc::new(Mutex::new(Debouncer::new(debounce)));

                while running_clone.load(Ordering::SeqCst) {
                    #[cfg(unix)]
                    {
                        if let Some(rx) = &signal_rx {
                            while rx.try_recv().is_ok() {
                                signal_seen = true;
                                if let Some((w, h)) = terminal_size() {
                                    if Some((w, h)) != last_size && debouncer.lock().unwrap().should_fire(Instant::now()) {
                                        last_size = Some((w, h));
                                        on_resize(w, h);
                                    }
                                }
                            }
                        }
                    }

                    if poll_active {
                        if let Some((w, h)) = terminal_size() {
                            if Some((w, h)) != last_size && debouncer.lock().unwrap().should_fire(Instant::now()) {
                                last_size = Some((w, h));
                                on_resize(w, h);
                            }
                        }
                        if started.elapsed() >= signal_test_window && signal_seen {
                            poll_active = false;
                        }
                    }

                    thread::sleep(poll_interval);
                }
            })
            .expect("failed to spawn resize watcher thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        self.stop();
        self.handle.take();
    }
}

#[cfg(unix)]
fn spawn_sigwinch_pipe_reader(running: Arc<AtomicBool>) -> Option<std::sync::mpsc::Receiver<()>> {
    use std::fs::File;
    use std::io::Read;
    use std::os::unix::io::FromRawFd;

    let mut fds = [0i32; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return None;
    }
    let (read_fd, write_fd) = (fds[0], fds[1]);
    unsafe {
        let flags = libc::fcntl(write_fd, libc::F_GETFL);
        libc::fcntl(write_fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
    }
    SIGWINCH_PIPE.store(write_fd, Ordering::SeqCst);
    unsafe {
        libc::signal(libc::SIGWINCH, sigwinch_handler as *const () as usize);
    }

    let (tx, rx) = std::sync::mpsc::channel();
    thread::Builder::new()
        .name("container-stage-sigwinch".to_string())
        .spawn(move || {
            let mut read_file = unsafe { File::from_raw_fd(read_fd) };
            let mut byte = [0u8; 1];
            while running.load(Ordering::SeqCst) {
                match read_file.read(&mut byte) {
                    Ok(1) => {
                        let _ = tx.send(());
                    }
                    Ok(_) => continue,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            SIGWINCH_PIPE.store(-1, Ordering::SeqCst);
            unsafe {
                libc::close(write_fd);
            }
        })
        .ok()?;

    Some(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_watcher_stops_cleanly() {
        let mut watcher = ResizeWatcher::spawn(
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(5),
            |_, _| {},
        );
        thread::sleep(Duration::from_millis(30));
        watcher.stop();
    }
}
