//! Periodic background revalidation.

use std::{future::Future, rc::Rc, time::Duration};

use futures::{
    FutureExt,
    future::{AbortHandle, Abortable, LocalBoxFuture},
};
use tracing::debug;

use super::{client::SessionApi, storage::StorageBackend, store::SessionStore};

/// Cancels the revalidation task when dropped.
#[derive(Debug)]
#[must_use = "dropping the handle cancels revalidation"]
pub struct RevalidationHandle {
    abort: AbortHandle,
}

impl RevalidationHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl Drop for RevalidationHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Sleeps for `period`, then refreshes, for as long as a credential is held.
pub async fn run_revalidation<B, A, S, F>(
    store: Rc<SessionStore<B, A>>,
    period: Duration,
    sleep: S,
) where
    B: StorageBackend,
    A: SessionApi,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    loop {
        sleep(period).await;
        if store.credential().is_none() {
            debug!("credential gone; stopping revalidation");
            break;
        }
        let outcome = store.refresh_session().await;
        debug!(?outcome, "periodic revalidation finished");
    }
}

/// Builds the revalidation future and the handle that cancels it. The caller
/// spawns the future on its local executor.
pub fn revalidation_task<B, A, S, F>(
    store: Rc<SessionStore<B, A>>,
    period: Duration,
    sleep: S,
) -> (impl Future<Output = ()>, RevalidationHandle)
where
    B: StorageBackend + 'static,
    A: SessionApi + 'static,
    S: Fn(Duration) -> F + 'static,
    F: Future<Output = ()> + 'static,
{
    let (abort, registration) = AbortHandle::new_pair();
    let task = Abortable::new(run_revalidation(store, period, sleep), registration).map(|_| ());
    (task, RevalidationHandle { abort })
}

/// Starts revalidation when `has_credential` holds, handing the task to
/// `spawn`. Re-run whenever the credential comes or goes; dropping the
/// previous handle stops the previous task.
pub fn revalidate_while<B, A, S, F>(
    has_credential: bool,
    store: Rc<SessionStore<B, A>>,
    period: Duration,
    sleep: S,
    spawn: impl FnOnce(LocalBoxFuture<'static, ()>),
) -> Option<RevalidationHandle>
where
    B: StorageBackend + 'static,
    A: SessionApi + 'static,
    S: Fn(Duration) -> F + 'static,
    F: Future<Output = ()> + 'static,
{
    if !has_credential {
        return None;
    }
    let (task, handle) = revalidation_task(store, period, sleep);
    spawn(task.boxed_local());
    Some(handle)
}
