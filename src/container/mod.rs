//! Container: a full-terminal display surface with its own cell buffer,
//! cursor, draw commands, and lifecycle state machine.
//!
//! Grounded on the teacher's `FrameBuffer` ownership shape (one buffer per
//! logical surface, mutated only from its own serialized executor) and on
//! the request/grant lifecycle sketched in `rust/src/input/focus.rs`'s
//! `FocusManager`, generalized here into the full show/hide/focus/
//! maximize/restore/destroy set.

pub mod buffer;
pub mod commands;
pub mod draw;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub use buffer::{Buffer, Rect};
pub use commands::DrawCommand;
pub use draw::{BoxStyle, TextAlign, TitlePos};

use crate::cell::Cell;
use crate::events::LifecycleEvent;
use crate::scheduler::Executor;
use crate::state_machine::{ContainerFlags, StateMachine};

/// Opaque, globally unique container identity, assigned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A stable snapshot of a container's renderable state, handed to the
/// renderer for a single render attempt. Lifetime is bounded by that
/// attempt: the coordinator must not retain it across ticks.
pub struct RenderableState {
    pub generation: u64,
    pub width: u16,
    pub height: u16,
    pub cursor_x: u16,
    pub cursor_y: u16,
    pub cursor_visible: bool,
    pub cells: Vec<Cell>,
    pub prev_cells: Vec<Cell>,
}

pub type RequestCallback = Arc<dyn Fn(ContainerId) + Send + Sync>;
type EventConsumer = Box<dyn FnMut(LifecycleEvent) + Send>;

struct Inner {
    cells: Buffer,
    prev_cells: Buffer,
    cursor_x: u16,
    cursor_y: u16,
    cursor_visible: bool,
    event_consumer: Option<EventConsumer>,
}

/// A logical, full-terminal display surface.
pub struct Container {
    id: ContainerId,
    title: String,
    owner_path: String,
    renderer_id: String,
    state: Arc<StateMachine>,
    inner: Mutex<Inner>,
    executor: Executor,
    on_request_made: RequestCallback,
}

impl Container {
    /// Create a container sized to the current TTY dimensions. `prev_cells`
    /// is seeded with [`Cell::SENTINEL`] to force an initial full paint.
    pub fn new(
        title: impl Into<String>,
        owner_path: impl Into<String>,
        renderer_id: impl Into<String>,
        width: u16,
        height: u16,
        on_request_made: RequestCallback,
    ) -> Self {
        let id = ContainerId::next();
        Self {
            id,
            title: title.into(),
            owner_path: owner_path.into(),
            renderer_id: renderer_id.into(),
            state: Arc::new(StateMachine::new()),
            inner: Mutex::new(Inner {
                cells: Buffer::new(width, height),
                prev_cells: Buffer::filled(width, height, Cell::SENTINEL),
                cursor_x: 0,
                cursor_y: 0,
                cursor_visible: true,
                event_consumer: None,
            }),
            executor: Executor::spawn(&format!("container-{id}", id = id.0)),
            on_request_made,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn owner_path(&self) -> &str {
        &self.owner_path
    }

    pub fn renderer_id(&self) -> &str {
        &self.renderer_id
    }

    pub fn state(&self) -> &StateMachine {
        &self.state
    }

    /// Register the application's lifecycle-event consumer. Fulfills
    /// `event_stream_ready()` once set.
    pub fn set_event_consumer<F>(&self, f: F)
    where
        F: FnMut(LifecycleEvent) + Send + 'static,
    {
        self.inner.lock().unwrap().event_consumer = Some(Box::new(f));
        self.state.add(ContainerFlags::EVENT_STREAM_READY);
    }

    pub fn event_stream_ready(&self) -> bool {
        self.state.has(ContainerFlags::EVENT_STREAM_READY)
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Some(consumer) = self.inner.lock().unwrap().event_consumer.as_mut() {
            consumer(event);
        }
    }

    /// VISIBLE ∧ ¬HIDDEN ∧ ¬ERROR ∧ ¬DESTROYED.
    pub fn should_render(&self) -> bool {
        let flags = self.state.snapshot();
        flags.contains(ContainerFlags::VISIBLE)
            && !flags.contains(ContainerFlags::HIDDEN)
            && !flags.contains(ContainerFlags::ERROR)
            && !flags.contains(ContainerFlags::DESTROYED)
    }

    /// Request the executor-serialized snapshot used by the renderer.
    /// Callable from the coordinator thread without blocking writers: the
    /// snapshot itself runs on the container's own executor.
    pub fn snapshot_renderable_state(&self, generation: u64) -> RenderableState {
        self.executor.submit_wait({
            let inner = &self.inner;
            move || {
                let guard = inner.lock().unwrap();
                RenderableState {
                    generation,
                    width: guard.cells.width(),
                    height: guard.cells.height(),
                    cursor_x: guard.cursor_x,
                    cursor_y: guard.cursor_y,
                    cursor_visible: guard.cursor_visible,
                    cells: guard.cells.cells().to_vec(),
                    prev_cells: guard.prev_cells.cells().to_vec(),
                }
            }
        })
    }

    /// Copy `cells` into `prev_cells`, cell by cell. Idempotent: a second
    /// call with no intervening mutation is a no-op in effect (the copy is
    /// identical to what's already there).
    pub fn commit_render(&self) {
        self.executor.submit_wait({
            let inner = &self.inner;
            move || {
                let mut guard = inner.lock().unwrap();
                let cells = guard.cells.cells().to_vec();
                for (i, cell) in cells.into_iter().enumerate() {
                    let y = i as u16 / guard.prev_cells.width();
                    let x = i as u16 % guard.prev_cells.width();
                    guard.prev_cells.set(x, y, cell, None);
                }
            }
        });
    }

    /// Force the next render to be a full repaint by resetting `prev_cells`
    /// back to the sentinel. Used when this container is about to occupy a
    /// screen that last showed different content (a focus switch).
    pub(crate) fn invalidate_prev_cells(&self) {
        self.executor.submit_wait({
            let inner = &self.inner;
            move || {
                let mut guard = inner.lock().unwrap();
                let (w, h) = (guard.prev_cells.width(), guard.prev_cells.height());
                guard.prev_cells = Buffer::filled(w, h, Cell::SENTINEL);
            }
        });
    }

    /// Reallocate both buffers to the new dimensions, copying the
    /// overlapping region, clamping the cursor, emitting a resize event, and
    /// requesting a render.
    pub fn resize(&self, width: u16, height: u16) {
        self.executor.submit_wait({
            let inner = &self.inner;
            move || {
                let mut guard = inner.lock().unwrap();
                guard.cells.resize(width, height);
                guard.prev_cells.resize(width, height);
                guard.cursor_x = guard.cursor_x.min(width.saturating_sub(1));
                guard.cursor_y = guard.cursor_y.min(height.saturating_sub(1));
            }
        });
        self.emit(LifecycleEvent::ContainerResized(width, height));
        self.request_render();
    }

    /// Run a batch of commands serially on this container's executor, then
    /// request a single render. Atomic with respect to render snapshots:
    /// because both the batch and the snapshot run on the same serialized
    /// executor, no snapshot can land mid-batch.
    pub fn batch(self: &Arc<Self>, commands: Vec<DrawCommand>) {
        let this = self.clone();
        self.executor.submit_wait(move || {
            for cmd in commands {
                this.execute_on_executor(cmd);
            }
        });
        self.request_render();
    }

    /// Execute a single command and request a render. Equivalent to a
    /// one-command batch but avoids the `Vec` allocation on the hot path.
    pub fn execute(self: &Arc<Self>, cmd: DrawCommand) {
        let this = self.clone();
        self.executor.submit_wait(move || this.execute_on_executor(cmd));
        self.request_render();
    }

    fn request(&self, flag: ContainerFlags) {
        self.state.add(flag);
        (self.on_request_made)(self.id);
    }

    pub fn request_show(&self) {
        self.request(ContainerFlags::SHOW_REQUESTED);
    }

    pub fn request_hide(&self) {
        self.request(ContainerFlags::HIDE_REQUESTED);
    }

    pub fn request_focus(&self) {
        self.request(ContainerFlags::FOCUS_REQUESTED);
    }

    pub fn request_maximize(&self) {
        self.request(ContainerFlags::MAXIMIZE_REQUESTED);
    }

    pub fn request_restore(&self) {
        self.request(ContainerFlags::RESTORE_REQUESTED);
    }

    pub fn request_destroy(&self) {
        self.request(ContainerFlags::DESTROY_REQUESTED);
    }

    pub fn request_render(&self) {
        self.request(ContainerFlags::RENDER_REQUESTED);
    }

    pub fn request_update(&self) {
        self.request(ContainerFlags::UPDATE_REQUESTED);
    }

    pub(crate) fn notify_shown(&self) {
        self.emit(LifecycleEvent::ContainerShown);
    }
    pub(crate) fn notify_hidden(&self) {
        self.emit(LifecycleEvent::ContainerHidden);
    }
    pub(crate) fn notify_focus_gained(&self) {
        self.emit(LifecycleEvent::ContainerFocusGained);
    }
    pub(crate) fn notify_focus_lost(&self) {
        self.emit(LifecycleEvent::ContainerFocusLost);
    }
    pub(crate) fn notify_maximized(&self) {
        self.emit(LifecycleEvent::ContainerMaximized);
    }
    pub(crate) fn notify_restored(&self) {
        self.emit(LifecycleEvent::ContainerRestored);
    }
    pub(crate) fn notify_closed(&self) {
        self.emit(LifecycleEvent::ContainerClosed);
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleAttributes;

    fn no_op_callback() -> RequestCallback {
        Arc::new(|_| {})
    }

    #[test]
    fn new_container_prev_cells_are_sentinel() {
        let c = Container::new("t", "/owner", "r1", 4, 4, no_op_callback());
        let snap = c.snapshot_renderable_state(0);
        for cell in &snap.prev_cells {
            assert_eq!(*cell, Cell::SENTINEL);
        }
    }

    #[test]
    fn commit_render_copies_cells_into_prev() {
        let c = Arc::new(Container::new("t", "/owner", "r1", 4, 4, no_op_callback()));
        c.execute(DrawCommand::PrintAt {
            x: 0,
            y: 0,
            text: "x".to_string(),
            style: StyleAttributes::NORMAL,
        });
        c.commit_render();
        let snap = c.snapshot_renderable_state(0);
        assert_eq!(snap.cells, snap.prev_cells);
    }

    #[test]
    fn commit_render_twice_is_idempotent() {
        let c = Arc::new(Container::new("t", "/owner", "r1", 4, 4, no_op_callback()));
        c.execute(DrawCommand::PrintAt {
            x: 0,
            y: 0,
            text: "x".to_string(),
            style: StyleAttributes::NORMAL,
        });
        c.commit_render();
        let first = c.snapshot_renderable_state(0).prev_cells;
        c.commit_render();
        let second = c.snapshot_renderable_state(0).prev_cells;
        assert_eq!(first, second);
    }

    #[test]
    fn should_render_requires_visible_not_hidden_not_error_not_destroyed() {
        let c = Container::new("t", "/owner", "r1", 4, 4, no_op_callback());
        assert!(!c.should_render());
        c.state().add(ContainerFlags::VISIBLE);
        assert!(c.should_render());
        c.state().add(ContainerFlags::ERROR);
        assert!(!c.should_render());
    }

    #[test]
    fn resize_clamps_cursor_and_requests_render() {
        let c = Container::new("t", "/owner", "r1", 10, 10, no_op_callback());
        c.inner.lock().unwrap().cursor_x = 9;
        c.inner.lock().unwrap().cursor_y = 9;
        c.resize(3, 3);
        let guard = c.inner.lock().unwrap();
        assert_eq!(guard.cursor_x, 2);
        assert_eq!(guard.cursor_y, 2);
        drop(guard);
        assert!(c.state().has(ContainerFlags::RENDER_REQUESTED));
    }

    #[test]
    fn request_calls_callback_with_container_id() {
        let seen = Arc::new(Mutex::new(None));
        let seen2 = seen.clone();
        let c = Container::new(
            "t",
            "/owner",
            "r1",
            4,
            4,
            Arc::new(move |id| *seen2.lock().unwrap() = Some(id)),
        );
        c.request_show();
        assert_eq!(*seen.lock().unwrap(), Some(c.id()));
        assert!(c.state().has(ContainerFlags::SHOW_REQUESTED));
    }
}
