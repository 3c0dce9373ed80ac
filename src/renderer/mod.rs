//! Terminal renderer: ANSI escape building, differential frame output, and
//! the TTY lifecycle (raw mode, alternate screen, resize detection).

pub mod ansi;
pub mod output;
pub mod tty;

pub use output::OutputBuffer;
pub use tty::{terminal_size, RenderSink, Renderer, ResizeWatcher};
