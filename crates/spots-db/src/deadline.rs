//! Request-scoped deadlines for blocking store calls.
//!
//! A service call runs on one blocking thread, so the deadline lives in a
//! thread-local for the duration of [`scoped`]. The SQLite progress handler
//! and [`check`] both consult it on that same thread.

use std::cell::Cell;
use std::time::Instant;

use thiserror::Error;

thread_local! {
    static DEADLINE: Cell<Option<Instant>> = const { Cell::new(None) };
}

#[derive(Debug, Error)]
#[error("request deadline exceeded")]
pub struct DeadlineExceeded;

/// Run `f` with `deadline` installed for every store call it makes.
pub fn scoped<T>(deadline: Instant, f: impl FnOnce() -> T) -> T {
    let previous = DEADLINE.with(|d| d.replace(Some(deadline)));
    let _restore = Restore(previous);
    f()
}

struct Restore(Option<Instant>);

impl Drop for Restore {
    fn drop(&mut self) {
        DEADLINE.with(|d| d.set(self.0));
    }
}

/// True once the installed deadline has passed. No deadline never expires.
pub fn expired() -> bool {
    DEADLINE
        .with(|d| d.get())
        .is_some_and(|deadline| Instant::now() >= deadline)
}

pub fn check() -> Result<(), DeadlineExceeded> {
    if expired() { Err(DeadlineExceeded) } else { Ok(()) }
}
