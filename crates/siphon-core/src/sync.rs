//! Two-lock discipline separating the control plane from the data plane.
//!
//! The state lock serializes property mutation and lifecycle transitions.
//! The io lock serializes ring buffer access against start/stop. Anything
//! that needs both takes the state lock first. This type offers no way to
//! take the io lock and then the state lock.
//! Critical sections under either lock are bounded and never call back into
//! the host.

use parking_lot::{Mutex, MutexGuard};

/// Owner of the state lock and the io lock.
#[derive(Debug, Default)]
pub struct IoLocks<S, I> {
    state: Mutex<S>,
    io: Mutex<I>,
}

/// Both locks, acquired state first. Dropped in reverse order.
pub struct BothGuard<'a, S, I> {
    // Field order matters: `io` drops before `state`.
    pub io: MutexGuard<'a, I>,
    pub state: MutexGuard<'a, S>,
}

impl<S, I> IoLocks<S, I> {
    pub fn new(state: S, io: I) -> Self {
        Self {
            state: Mutex::new(state),
            io: Mutex::new(io),
        }
    }

    /// Take the state lock alone.
    pub fn lock_state(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    /// Take the io lock alone. Used by the data path.
    pub fn lock_io(&self) -> MutexGuard<'_, I> {
        self.io.lock()
    }

    /// Take the state lock, then the io lock.
    pub fn lock_both(&self) -> BothGuard<'_, S, I> {
        let state = self.state.lock();
        let io = self.io.lock();
        BothGuard { io, state }
    }

    /// Take the io lock while already holding the state lock.
    pub fn lock_io_under<'a>(&'a self, _state: &MutexGuard<'a, S>) -> MutexGuard<'a, I> {
        self.io.lock()
    }

    /// Consume the locks and return the protected values.
    pub fn into_inner(self) -> (S, I) {
        (self.state.into_inner(), self.io.into_inner())
    }
}
