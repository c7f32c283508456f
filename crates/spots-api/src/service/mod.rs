//! Request-level operations. Each takes the shared state plus plain values,
//! runs synchronously against the document store, and is driven off the
//! async runtime by [`run`].

pub mod review;
pub mod spot;
pub mod user;

use std::time::Instant;

use spots_db::deadline;
use tracing::{error, warn};

use crate::auth::{AppState, AppStateInner};
use crate::error::{Error, Result};

/// Run a blocking service call under the request deadline.
///
/// Store calls made after the deadline, or still running when it passes, are
/// interrupted and the request answers with a timeout. The worker thread may
/// finish a short moment later, but its result is dropped.
pub async fn run<F, T>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&AppStateInner) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let deadline = Instant::now() + state.request_timeout;
    let inner = state.clone();
    let task = tokio::task::spawn_blocking(move || deadline::scoped(deadline, || f(&inner)));

    match tokio::time::timeout_at(deadline.into(), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!("spawn_blocking join error: {}", e);
            Err(Error::Internal("worker task failed".into()))
        }
        Err(_) => {
            warn!("Request exceeded its {:?} deadline", state.request_timeout);
            Err(Error::Timeout)
        }
    }
}
