//! `RenderCoordinator`: the pull-based engine facade.
//!
//! Owns the container registry, the focus pointer, the request queue fed by
//! containers' `on_request_made` callback, and the fixed-tick loop that
//! turns queued requests into grants/denials and drives the renderer.
//!
//! Grounded on the teacher's tick-driven render loop shape — a dedicated
//! thread waking at a fixed period (`rust/src/input/reader.rs`'s
//! `thread::Builder` + `Arc<AtomicBool>` running-flag pattern, generalized
//! from "read stdin forever" to "tick forever") — with the request/grant
//! precedence and failure-backoff rules specific to this engine.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::container::{Container, ContainerId, DrawCommand, RequestCallback};
use crate::renderer::{RenderSink, Renderer};
use crate::state_machine::ContainerFlags;

/// Set-like pending-work queue: a container is enqueued at most once
/// concurrently, preserving first-enqueued-first-processed order.
struct RequestQueue {
    queued: HashSet<ContainerId>,
    order: VecDeque<ContainerId>,
}

impl RequestQueue {
    fn new() -> Self {
        Self {
            queued: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    fn enqueue(&mut self, id: ContainerId) {
        if self.queued.insert(id) {
            self.order.push_back(id);
        }
    }

    fn drain(&mut self) -> Vec<ContainerId> {
        self.queued.clear();
        self.order.drain(..).collect()
    }
}

/// Tracks consecutive render failures for one container, per the "3
/// failures within 5s -> RENDER_ERROR, self-healing once 5s passes since the
/// last failure" rule. The window is anchored on the *last* failure, not the
/// first, so a container that stops failing recovers on its own.
#[derive(Debug, Clone, Copy)]
struct FailureTracker {
    consecutive: u32,
    last_failure: Option<Instant>,
}

impl FailureTracker {
    fn new() -> Self {
        Self {
            consecutive: 0,
            last_failure: None,
        }
    }

    /// Non-mutating: `true` while the container is in backoff, i.e. it has
    /// reached `threshold` consecutive failures and the most recent one is
    /// still within `reset_window` of `now`. Safe to call every tick.
    fn is_tripped(&self, now: Instant, threshold: u32, reset_window: Duration) -> bool {
        self.consecutive >= threshold && self.last_failure.is_some_and(|t| now.duration_since(t) < reset_window)
    }

    /// Records one failure, resetting the streak first if the gap since the
    /// last failure already exceeded `reset_window`. Returns the new
    /// consecutive count so the caller can detect the failure that crosses
    /// the threshold.
    fn record_failure(&mut self, now: Instant, reset_window: Duration) -> u32 {
        if let Some(last) = self.last_failure {
            if now.duration_since(last) >= reset_window {
                self.consecutive = 0;
            }
        }
        self.consecutive += 1;
        self.last_failure = Some(now);
        self.consecutive
    }

    fn record_success(&mut self) {
        self.consecutive = 0;
        self.last_failure = None;
    }
}

struct CoordinatorState {
    containers: Vec<Arc<Container>>,
    focused: Option<ContainerId>,
    failures: HashMap<ContainerId, FailureTracker>,
    dirty: HashSet<ContainerId>,
}

impl CoordinatorState {
    fn find(&self, id: ContainerId) -> Option<&Arc<Container>> {
        self.containers.iter().find(|c| c.id() == id)
    }

    fn index_of(&self, id: ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| c.id() == id)
    }

    /// First container in creation order that is eligible to hold focus.
    fn reconcile_focus(&mut self) -> Option<Arc<Container>> {
        self.containers
            .iter()
            .find(|c| {
                let flags = c.state().snapshot();
                flags.contains(ContainerFlags::VISIBLE)
                    && !flags.contains(ContainerFlags::HIDDEN)
                    && !flags.contains(ContainerFlags::DESTROYED)
            })
            .cloned()
    }
}

/// The multi-container pull-based compositor: owns every [`Container`] it
/// creates, arbitrates their lifecycle requests each tick, and renders the
/// focused one through a single [`Renderer`].
pub struct RenderCoordinator {
    state: Mutex<CoordinatorState>,
    queue: Arc<Mutex<RequestQueue>>,
    generation: AtomicU64,
    config: EngineConfig,
    renderer: Mutex<Box<dyn RenderSink>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RenderCoordinator {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Box::new(Renderer::new()))
    }

    /// Construct against an arbitrary [`RenderSink`] — lets tests exercise
    /// the failure-backoff path without a live TTY.
    fn with_sink(config: EngineConfig, sink: Box<dyn RenderSink>) -> Self {
        Self {
            state: Mutex::new(CoordinatorState {
                containers: Vec::new(),
                focused: None,
                failures: HashMap::new(),
                dirty: HashSet::new(),
            }),
            queue: Arc::new(Mutex::new(RequestQueue::new())),
            generation: AtomicU64::new(0),
            config,
            renderer: Mutex::new(sink),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn focused(&self) -> Option<ContainerId> {
        self.state.lock().unwrap().focused
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().unwrap().containers.len()
    }

    /// Enter the alternate screen and raw mode. Must run before the first
    /// tick produces output.
    pub fn initialize_terminal(&self) -> crate::error::Result<()> {
        self.renderer.lock().unwrap().initialize()
    }

    pub fn shutdown_terminal(&self) -> crate::error::Result<()> {
        self.renderer.lock().unwrap().shutdown()
    }

    /// Create a container registered with this coordinator's request queue.
    pub fn create_container(
        &self,
        title: impl Into<String>,
        owner_path: impl Into<String>,
        renderer_id: impl Into<String>,
        width: u16,
        height: u16,
    ) -> Arc<Container> {
        let queue = self.queue.clone();
        let callback: RequestCallback = Arc::new(move |id| {
            queue.lock().unwrap().enqueue(id);
        });
        let container = Arc::new(Container::new(title, owner_path, renderer_id, width, height, callback));

        let mut state = self.state.lock().unwrap();
        state.failures.insert(container.id(), FailureTracker::new());
        state.containers.push(container.clone());
        container
    }

    pub fn execute(&self, id: ContainerId, cmd: DrawCommand) {
        if let Some(c) = self.state.lock().unwrap().find(id) {
            c.execute(cmd);
        }
    }

    pub fn batch(&self, id: ContainerId, cmds: Vec<DrawCommand>) {
        if let Some(c) = self.state.lock().unwrap().find(id) {
            c.batch(cmds);
        }
    }

    /// Dual-strategy resize fan-out: reallocate every container's buffers
    /// and bump the generation counter so any in-flight render snapshot is
    /// treated as stale by the time it would be committed.
    pub fn on_resize(&self, width: u16, height: u16) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let containers = self.state.lock().unwrap().containers.clone();
        for c in &containers {
            c.resize(width, height);
        }
    }

    /// Run one tick: drain the request queue, grant/deny each pending
    /// request in fixed precedence order, then attempt a render of the
    /// focused container if it is dirty.
    pub fn tick(&self) {
        let pending = self.queue.lock().unwrap().drain();
        for id in pending {
            self.process_requests(id);
        }
        self.render_focused_if_dirty();
    }

    fn process_requests(&self, id: ContainerId) {
        let container = match self.state.lock().unwrap().find(id).cloned() {
            Some(c) => c,
            None => return,
        };
        let flags = container.state().snapshot();

        if flags.contains(ContainerFlags::DESTROY_REQUESTED) {
            container.state().remove(ContainerFlags::DESTROY_REQUESTED);
            container.state().add(ContainerFlags::DESTROYED);

            let mut state = self.state.lock().unwrap();
            let was_focused = state.focused == Some(id);
            if was_focused {
                state.focused = None;
            }
            state.failures.remove(&id);
            state.dirty.remove(&id);
            if let Some(idx) = state.index_of(id) {
                state.containers.remove(idx);
            }
            drop(state);

            container.notify_closed();
            if was_focused {
                self.reconcile_and_focus();
            }
            return;
        }

        if flags.contains(ContainerFlags::RENDER_REQUESTED) {
            container.state().remove(ContainerFlags::RENDER_REQUESTED);
            self.mark_dirty_if_focused(id);
        }

        if flags.contains(ContainerFlags::UPDATE_REQUESTED) {
            container.state().remove(ContainerFlags::UPDATE_REQUESTED);
            self.mark_dirty_if_focused(id);
        }

        if flags.contains(ContainerFlags::FOCUS_REQUESTED) {
            container.state().remove(ContainerFlags::FOCUS_REQUESTED);
            let eligible = flags.contains(ContainerFlags::VISIBLE) && !flags.contains(ContainerFlags::HIDDEN);
            if eligible {
                self.grant_focus(&container);
            } else {
                log::debug!("focus request denied for container {id}: not visible");
            }
        }

        if flags.contains(ContainerFlags::SHOW_REQUESTED) {
            container.state().remove(ContainerFlags::SHOW_REQUESTED);
            container.state().remove(ContainerFlags::HIDDEN);
            container.state().add(ContainerFlags::VISIBLE);
            container.notify_shown();
            let needs_autofocus = self.state.lock().unwrap().focused.is_none();
            if needs_autofocus {
                self.grant_focus(&container);
            }
        }

        if flags.contains(ContainerFlags::HIDE_REQUESTED) {
            container.state().remove(ContainerFlags::HIDE_REQUESTED);
            container.state().remove(ContainerFlags::VISIBLE);
            container.state().add(ContainerFlags::HIDDEN);
            container.notify_hidden();
            let was_focused = {
                let mut state = self.state.lock().unwrap();
                if state.focused == Some(id) {
                    state.focused = None;
                    true
                } else {
                    false
                }
            };
            if was_focused {
                self.reconcile_and_focus();
            }
        }

        if flags.contains(ContainerFlags::MAXIMIZE_REQUESTED) {
            container.state().remove(ContainerFlags::MAXIMIZE_REQUESTED);
            if container.state().has(ContainerFlags::FOCUSED) {
                container.state().add(ContainerFlags::MAXIMIZED);
                container.notify_maximized();
            } else {
                log::debug!("maximize request denied for container {id}: not focused");
            }
        }

        if flags.contains(ContainerFlags::RESTORE_REQUESTED) {
            container.state().remove(ContainerFlags::RESTORE_REQUESTED);
            if container.state().has(ContainerFlags::MAXIMIZED) {
                container.state().remove(ContainerFlags::MAXIMIZED);
                container.notify_restored();
            } else {
                log::debug!("restore request denied for container {id}: not maximized");
            }
        }
    }

    fn mark_dirty_if_focused(&self, id: ContainerId) {
        let mut state = self.state.lock().unwrap();
        if state.focused == Some(id) {
            state.dirty.insert(id);
        }
    }

    /// Grant focus to `container`: revoke the prior holder, bump the
    /// generation counter, force a full repaint (the physical screen last
    /// showed different content), and mark it dirty.
    fn grant_focus(&self, container: &Arc<Container>) {
        let id = container.id();
        let prior = {
            let mut state = self.state.lock().unwrap();
            let prior = state.focused.replace(id);
            state.dirty.insert(id);
            prior
        };

        if let Some(prior_id) = prior {
            if prior_id != id {
                if let Some(prior_container) = self.state.lock().unwrap().find(prior_id).cloned() {
                    prior_container.state().remove(ContainerFlags::FOCUSED);
                    prior_container.notify_focus_lost();
                }
            }
        }

        container.state().add(ContainerFlags::FOCUSED);
        container.invalidate_prev_cells();
        self.generation.fetch_add(1, Ordering::SeqCst);
        container.notify_focus_gained();
    }

    fn reconcile_and_focus(&self) {
        let candidate = self.state.lock().unwrap().reconcile_focus();
        if let Some(c) = candidate {
            self.grant_focus(&c);
        }
    }

    fn render_focused_if_dirty(&self) {
        let (focused_id, container) = {
            let state = self.state.lock().unwrap();
            match state.focused {
                Some(id) => (id, state.find(id).cloned()),
                None => return,
            }
        };
        let container = match container {
            Some(c) => c,
            None => return,
        };

        if !container.should_render() {
            return;
        }
        let is_dirty = self.state.lock().unwrap().dirty.contains(&focused_id);
        if !is_dirty {
            return;
        }

        let now = Instant::now();
        let tripped = self
            .state
            .lock()
            .unwrap()
            .failures
            .get(&focused_id)
            .is_some_and(|t| t.is_tripped(now, self.config.render_failure_threshold, self.config.render_failure_reset));
        if tripped {
            container.state().add(ContainerFlags::RENDER_ERROR);
            self.state.lock().unwrap().dirty.remove(&focused_id);
            return;
        }

        let generation = self.generation();
        let snapshot = container.snapshot_renderable_state(generation);

        // A resize/focus change raced with this snapshot; drop it rather
        // than paint stale content. The next tick will pick up fresh state.
        if generation != self.generation() {
            return;
        }

        match self.renderer.lock().unwrap().render(&snapshot) {
            Ok(()) => {
                container.commit_render();
                self.state.lock().unwrap().dirty.remove(&focused_id);
                if let Some(tracker) = self.state.lock().unwrap().failures.get_mut(&focused_id) {
                    tracker.record_success();
                }
                container.state().remove(ContainerFlags::RENDER_ERROR);
            }
            Err(e) => {
                log::warn!("render failed for container {focused_id}: {e}");
                // Leave `dirty` set: backpressure means the content is
                // retried on the next free tick instead of being dropped.
                let consecutive = {
                    let mut state = self.state.lock().unwrap();
                    let tracker = state.failures.entry(focused_id).or_insert_with(FailureTracker::new);
                    tracker.record_failure(now, self.config.render_failure_reset)
                };
                container.state().add(ContainerFlags::RENDER_ERROR);
                if consecutive >= self.config.render_failure_threshold {
                    container.state().add(ContainerFlags::ERROR);
                    log::error!("container {focused_id} exceeded render failure threshold; escalating to ERROR");
                }
            }
        }
    }

    /// Spawn the fixed-tick loop on a dedicated thread.
    pub fn run(self: &Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);
        let this = self.clone();
        let handle = thread::Builder::new()
            .name("container-stage-tick".to_string())
            .spawn(move || {
                while this.running.load(Ordering::SeqCst) {
                    let started = Instant::now();
                    this.tick();
                    let elapsed = started.elapsed();
                    if elapsed < this.config.frame_period {
                        thread::sleep(this.config.frame_period - elapsed);
                    }
                }
            })
            .expect("failed to spawn tick thread");
        *self.handle.lock().unwrap() = Some(handle);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EngineConfig {
        EngineConfig {
            frame_period: Duration::from_millis(1),
            render_failure_threshold: 3,
            render_failure_reset: Duration::from_millis(50),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn show_with_no_focused_container_auto_focuses() {
        let coord = RenderCoordinator::new(test_config());
        let c = coord.create_container("a", "/app/a", "r1", 10, 5);
        c.request_show();
        coord.tick();
        assert!(c.state().has(ContainerFlags::FOCUSED));
        assert_eq!(coord.focused(), Some(c.id()));
    }

    #[test]
    fn at_most_one_container_focused_at_a_time() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        let b = coord.create_container("b", "/app/b", "r1", 10, 5);
        a.request_show();
        b.request_show();
        coord.tick();
        a.request_focus();
        b.request_focus();
        coord.tick();
        assert!(!a.state().has(ContainerFlags::FOCUSED));
        assert!(b.state().has(ContainerFlags::FOCUSED));
        assert_eq!(coord.focused(), Some(b.id()));
    }

    #[test]
    fn focus_request_denied_when_not_visible() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        a.request_focus();
        coord.tick();
        assert!(!a.state().has(ContainerFlags::FOCUSED));
        assert_eq!(coord.focused(), None);
    }

    #[test]
    fn hide_focused_container_reconciles_to_next_visible() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        let b = coord.create_container("b", "/app/b", "r1", 10, 5);
        a.request_show();
        b.request_show();
        coord.tick();
        assert_eq!(coord.focused(), Some(a.id()));
        a.request_hide();
        coord.tick();
        assert_eq!(coord.focused(), Some(b.id()));
    }

    #[test]
    fn destroy_always_granted_and_reconciles_focus() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        let b = coord.create_container("b", "/app/b", "r1", 10, 5);
        a.request_show();
        b.request_show();
        coord.tick();
        a.request_destroy();
        coord.tick();
        assert_eq!(coord.container_count(), 1);
        assert_eq!(coord.focused(), Some(b.id()));
    }

    #[test]
    fn maximize_denied_unless_focused() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        a.request_maximize();
        coord.tick();
        assert!(!a.state().has(ContainerFlags::MAXIMIZED));

        a.request_show();
        coord.tick();
        a.request_maximize();
        coord.tick();
        assert!(a.state().has(ContainerFlags::MAXIMIZED));
    }

    #[test]
    fn restore_denied_unless_maximized() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        a.request_restore();
        coord.tick();
        assert!(!a.state().has(ContainerFlags::MAXIMIZED));
    }

    #[test]
    fn generation_increases_on_focus_change_and_resize() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        let b = coord.create_container("b", "/app/b", "r1", 10, 5);
        a.request_show();
        coord.tick();
        let gen_after_a = coord.generation();
        assert!(gen_after_a > 0);

        b.request_show();
        b.request_focus();
        coord.tick();
        assert!(coord.generation() > gen_after_a);

        let gen_before_resize = coord.generation();
        coord.on_resize(40, 20);
        assert!(coord.generation() > gen_before_resize);
    }

    #[test]
    fn render_requested_on_non_focused_container_does_not_mark_dirty() {
        let coord = RenderCoordinator::new(test_config());
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        let b = coord.create_container("b", "/app/b", "r1", 10, 5);
        a.request_show();
        coord.tick();
        b.request_render();
        coord.tick();
        assert!(!coord.state.lock().unwrap().dirty.contains(&b.id()));
    }

    /// Render backend double that plays back a fixed script of results, one
    /// per call, then answers `Ok(())` for everything after.
    struct ScriptedSink {
        results: VecDeque<crate::error::Result<()>>,
    }

    impl ScriptedSink {
        fn new(results: Vec<crate::error::Result<()>>) -> Self {
            Self { results: results.into() }
        }
    }

    impl RenderSink for ScriptedSink {
        fn render(&mut self, _state: &crate::container::RenderableState) -> crate::error::Result<()> {
            self.results.pop_front().unwrap_or(Ok(()))
        }
    }

    #[test]
    fn render_error_clears_on_success_once_reset_window_elapses() {
        use crate::error::EngineError;

        let sink = ScriptedSink::new(vec![
            Err(EngineError::Render("boom".into())),
            Err(EngineError::Render("boom".into())),
        ]);
        let coord = RenderCoordinator::with_sink(test_config(), Box::new(sink));
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        a.request_show();

        coord.tick();
        assert!(a.state().has(ContainerFlags::RENDER_ERROR));
        coord.tick();
        assert!(a.state().has(ContainerFlags::RENDER_ERROR));
        assert!(!a.state().has(ContainerFlags::ERROR));

        thread::sleep(test_config().render_failure_reset + Duration::from_millis(10));

        coord.tick();
        assert!(!a.state().has(ContainerFlags::RENDER_ERROR));
        assert!(!coord.state.lock().unwrap().dirty.contains(&a.id()));
    }

    #[test]
    fn third_consecutive_failure_escalates_to_error() {
        use crate::error::EngineError;

        let sink = ScriptedSink::new(vec![
            Err(EngineError::Render("boom".into())),
            Err(EngineError::Render("boom".into())),
            Err(EngineError::Render("boom".into())),
        ]);
        let coord = RenderCoordinator::with_sink(test_config(), Box::new(sink));
        let a = coord.create_container("a", "/app/a", "r1", 10, 5);
        a.request_show();

        coord.tick();
        coord.tick();
        assert!(!a.state().has(ContainerFlags::ERROR));
        coord.tick();
        assert!(a.state().has(ContainerFlags::RENDER_ERROR));
        assert!(a.state().has(ContainerFlags::ERROR));
    }
}
