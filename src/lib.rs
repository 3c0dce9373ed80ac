//! A multi-container, pull-based compositor for raw-mode ANSI terminals.
//!
//! [`coordinator::RenderCoordinator`] owns a registry of [`container::Container`]s,
//! arbitrates their show/hide/focus/maximize/restore/destroy requests on a
//! fixed ~60 Hz tick, and renders the currently-focused container through a
//! [`renderer::Renderer`] using damage-tracked ANSI diffing. Keyboard input
//! arrives from [`input::InputDecoder`], which turns raw stdin bytes into
//! USB-HID keyboard events independent of the host's locale or keymap.

pub mod cell;
pub mod config;
pub mod container;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod input;
pub mod renderer;
pub mod scheduler;
pub mod state_machine;
pub mod style;

pub use config::EngineConfig;
pub use container::{Container, ContainerId};
pub use coordinator::RenderCoordinator;
pub use error::{EngineError, Result};
pub use events::{HidCode, LifecycleEvent, Modifiers, RoutedEvent};
