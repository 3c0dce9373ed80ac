//! Bit-flagged container state with request/grant transitions and observers.
//!
//! Generalizes the teacher's `bitflags!` usage (`Attr`, `Modifier`) into a
//! stateful machine with a callback registry, per design note §9: "observers
//! must queue nested transitions" rather than re-entering `add`/`remove`
//! while a transition is already being applied.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

bitflags::bitflags! {
    /// Container lifecycle / request flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ContainerFlags: u32 {
        const VISIBLE             = 1 << 0;
        const HIDDEN              = 1 << 1;
        const FOCUSED             = 1 << 2;
        const MAXIMIZED           = 1 << 3;
        const DESTROYED           = 1 << 4;
        const ERROR               = 1 << 5;
        const RENDER_ERROR        = 1 << 6;
        const RENDER_REQUESTED    = 1 << 7;
        const UPDATE_REQUESTED    = 1 << 8;
        const FOCUS_REQUESTED     = 1 << 9;
        const SHOW_REQUESTED      = 1 << 10;
        const HIDE_REQUESTED      = 1 << 11;
        const MAXIMIZE_REQUESTED  = 1 << 12;
        const RESTORE_REQUESTED   = 1 << 13;
        const DESTROY_REQUESTED   = 1 << 14;
        const EVENT_STREAM_READY  = 1 << 15;
    }
}

/// Notification passed to observers on a successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    Added(ContainerFlags),
    Removed(ContainerFlags),
}

type Observer = Box<dyn Fn(FlagChange) + Send + Sync>;

enum PendingOp {
    Add(ContainerFlags),
    Remove(ContainerFlags),
}

/// A bit-set of [`ContainerFlags`] with observer callbacks, safe against
/// observer re-entrancy.
pub struct StateMachine {
    bits: Mutex<ContainerFlags>,
    observers: Mutex<Vec<Observer>>,
    in_transition: AtomicBool,
    pending: Mutex<VecDeque<PendingOp>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            bits: Mutex::new(ContainerFlags::empty()),
            observers: Mutex::new(Vec::new()),
            in_transition: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Register an observer fired on every successful `add`/`remove`.
    pub fn subscribe<F>(&self, f: F)
    where
        F: Fn(FlagChange) + Send + Sync + 'static,
    {
        self.observers.lock().unwrap().push(Box::new(f));
    }

    pub fn has(&self, flag: ContainerFlags) -> bool {
        self.bits.lock().unwrap().contains(flag)
    }

    pub fn snapshot(&self) -> ContainerFlags {
        *self.bits.lock().unwrap()
    }

    pub fn add(&self, flag: ContainerFlags) {
        self.transition(PendingOp::Add(flag));
    }

    pub fn remove(&self, flag: ContainerFlags) {
        self.transition(PendingOp::Remove(flag));
    }

    /// Drive a single `PendingOp` through the reentrancy guard: if a
    /// transition is already in flight (an observer called back into
    /// `add`/`remove`), the op is queued and drained by the outermost call
    /// instead of being applied immediately.
    fn transition(&self, op: PendingOp) {
        if self.in_transition.swap(true, Ordering::AcqRel) {
            self.pending.lock().unwrap().push_back(op);
            return;
        }

        self.apply(op);
        loop {
            let next = self.pending.lock().unwrap().pop_front();
            match next {
                Some(op) => self.apply(op),
                None => break,
            }
        }
        self.in_transition.store(false, Ordering::Release);
    }

    fn apply(&self, op: PendingOp) {
        match op {
            PendingOp::Add(flag) => {
                let changed = {
                    let mut bits = self.bits.lock().unwrap();
                    if bits.contains(flag) {
                        false
                    } else {
                        bits.insert(flag);
                        true
                    }
                };
                if changed {
                    self.notify(FlagChange::Added(flag));
                }
            }
            PendingOp::Remove(flag) => {
                let changed = {
                    let mut bits = self.bits.lock().unwrap();
                    if bits.intersects(flag) {
                        bits.remove(flag);
                        true
                    } else {
                        false
                    }
                };
                if changed {
                    self.notify(FlagChange::Removed(flag));
                }
            }
        }
    }

    fn notify(&self, change: FlagChange) {
        for obs in self.observers.lock().unwrap().iter() {
            obs(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn add_then_has_is_observable() {
        let sm = StateMachine::new();
        assert!(!sm.has(ContainerFlags::VISIBLE));
        sm.add(ContainerFlags::VISIBLE);
        assert!(sm.has(ContainerFlags::VISIBLE));
    }

    #[test]
    fn duplicate_add_does_not_renotify() {
        let sm = StateMachine::new();
        let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let count2 = count.clone();
        sm.subscribe(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        sm.add(ContainerFlags::VISIBLE);
        sm.add(ContainerFlags::VISIBLE);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_transition_from_observer_is_queued_not_reentrant() {
        let sm = Arc::new(StateMachine::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let sm2 = sm.clone();
        let order2 = order.clone();
        sm.subscribe(move |change| {
            if let FlagChange::Added(ContainerFlags::FOCUS_REQUESTED) = change {
                // Nested call while the outer transition is still applying.
                sm2.remove(ContainerFlags::FOCUS_REQUESTED);
            }
            order2.lock().unwrap().push(change);
        });

        sm.add(ContainerFlags::FOCUS_REQUESTED);

        let log = order.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], FlagChange::Added(ContainerFlags::FOCUS_REQUESTED));
        assert_eq!(log[1], FlagChange::Removed(ContainerFlags::FOCUS_REQUESTED));
        assert!(!sm.has(ContainerFlags::FOCUS_REQUESTED));
    }

    #[test]
    fn removing_absent_flag_is_a_noop() {
        let sm = StateMachine::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        sm.subscribe(move |_| fired2.store(true, Ordering::SeqCst));
        sm.remove(ContainerFlags::VISIBLE);
        assert!(!fired.load(Ordering::SeqCst));
    }
}
