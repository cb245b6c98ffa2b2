//! Load Gate
//!
//! One-shot handshake between a parent and the child it spawns. The
//! child's loader reports exactly one outcome (loaded or failed); the
//! parent consumes exactly one outcome. Either side may arrive first.
//!
//! # Design
//! - Three states: pending, ready, consumed. The first report wins;
//!   later reports and later waits are ignored
//! - A parked parent records its id in the gate, so the reporting side
//!   knows exactly whom to wake
//! - The waiter re-checks state under the lock after every wake, so a
//!   spurious wake costs one loop iteration and nothing else

use spin::Mutex;

use super::Pid;

/// Scheduler operations the gate needs to park and unpark threads.
///
/// `sleep_current` may return spuriously; callers re-check their
/// condition in a loop. `wake` on a thread that is already runnable
/// must not be lost if that thread later sleeps on the same condition,
/// and `wake` on an unknown id is a no-op.
pub trait Scheduler: Send + Sync {
    /// Block the calling thread until some `wake` targets it.
    fn sleep_current(&self);

    /// Mark the given thread runnable.
    fn wake(&self, pid: Pid);
}

enum GateState {
    Pending { waiter: Option<Pid> },
    Ready(bool),
    Consumed,
}

/// The handshake cell shared by parent and child.
pub struct LoadGate {
    state: Mutex<GateState>,
}

impl LoadGate {
    /// Create a gate with no outcome reported and no waiter parked.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending { waiter: None }),
        }
    }

    /// Report the load outcome. Only the first report is kept.
    ///
    /// The waiter, if parked, is woken after the state flips so its
    /// re-check observes the outcome.
    pub fn signal(&self, loaded: bool, sched: &dyn Scheduler) {
        let waiter = {
            let mut state = self.state.lock();
            match *state {
                GateState::Pending { waiter } => {
                    *state = GateState::Ready(loaded);
                    waiter
                }
                GateState::Ready(_) | GateState::Consumed => return,
            }
        };
        if let Some(pid) = waiter {
            sched.wake(pid);
        }
    }

    /// Consume the outcome, parking `me` until one is reported.
    ///
    /// Returns whether the load succeeded. A second consume finds the
    /// gate spent and reports failure.
    pub fn wait(&self, me: Pid, sched: &dyn Scheduler) -> bool {
        loop {
            {
                let mut state = self.state.lock();
                match *state {
                    GateState::Ready(loaded) => {
                        *state = GateState::Consumed;
                        return loaded;
                    }
                    GateState::Consumed => {
                        log::debug!("load gate for waiter {} already consumed", me.as_i32());
                        return false;
                    }
                    GateState::Pending { ref mut waiter } => {
                        *waiter = Some(me);
                    }
                }
            }
            sched.sleep_current();
        }
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct YieldSched;

    impl Scheduler for YieldSched {
        fn sleep_current(&self) {
            std::thread::yield_now();
        }

        fn wake(&self, _pid: Pid) {}
    }

    #[test]
    fn test_signal_before_wait_hands_over_outcome() {
        let gate = LoadGate::new();
        gate.signal(true, &YieldSched);
        assert!(gate.wait(Pid::new(3), &YieldSched));
    }

    #[test]
    fn test_first_report_wins() {
        let gate = LoadGate::new();
        gate.signal(false, &YieldSched);
        gate.signal(true, &YieldSched);
        assert!(!gate.wait(Pid::new(3), &YieldSched));
    }

    #[test]
    fn test_second_wait_finds_gate_spent() {
        let gate = LoadGate::new();
        gate.signal(true, &YieldSched);
        assert!(gate.wait(Pid::new(3), &YieldSched));
        assert!(!gate.wait(Pid::new(3), &YieldSched));
    }

    #[test]
    fn test_wait_parks_until_signal() {
        let gate = Arc::new(LoadGate::new());
        let shared = Arc::clone(&gate);
        let waiter = std::thread::spawn(move || shared.wait(Pid::new(5), &YieldSched));
        std::thread::sleep(std::time::Duration::from_millis(10));
        gate.signal(true, &YieldSched);
        assert!(waiter.join().unwrap());
    }
}
