//! Lifecycle hooks
//!
//! Every hook, sync or async, is stored behind the same boxed-future
//! contract. A hook takes its argument by value and hands it back, which is
//! how a `before` hook rewrites the request that is about to be sent.

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::common::{BoxError, Error, Result};

/// Outcome of a user hook
pub type HookResult<A> = std::result::Result<A, BoxError>;

type HookFn<A> = dyn Fn(A) -> BoxFuture<'static, HookResult<A>> + Send + Sync;

/// Lifecycle stage a hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    After,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::Before => "before",
            HookStage::After => "after",
            HookStage::BeforeEach => "beforeEach",
            HookStage::AfterEach => "afterEach",
        };
        f.write_str(name)
    }
}

/// An optional lifecycle callback
pub struct Hook<A> {
    f: Arc<HookFn<A>>,
}

impl<A: Send + 'static> Hook<A> {
    /// Wrap an async callback
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<A>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |arg| -> BoxFuture<'static, HookResult<A>> { Box::pin(f(arg)) }),
        }
    }

    /// Wrap a synchronous callback; its result counts as already complete
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&mut A) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move |mut arg| -> BoxFuture<'static, HookResult<A>> {
                let outcome = f(&mut arg).map(|()| arg);
                Box::pin(std::future::ready(outcome))
            }),
        }
    }

    pub async fn call(&self, arg: A) -> HookResult<A> {
        (self.f)(arg).await
    }
}

impl Hook<()> {
    /// Wrap an async callback that takes no argument
    pub fn task<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
    {
        Self::new(move |()| f())
    }
}

impl<A> Clone for Hook<A> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<A> fmt::Debug for Hook<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Invokes optional hooks uniformly
#[derive(Debug, Clone, Default)]
pub struct HookRunner {
    timeout: Option<Duration>,
}

impl HookRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run `hook` if present and return the (possibly rewritten) argument.
    ///
    /// A missing hook completes immediately with `arg` unchanged. Errors are
    /// returned to the caller as-is; nothing is retried.
    pub async fn run<A: Send + 'static>(
        &self,
        hook: Option<&Hook<A>>,
        stage: HookStage,
        owner: &str,
        arg: A,
    ) -> Result<A> {
        let Some(hook) = hook else {
            return Ok(arg);
        };

        debug!(%stage, owner, "Running hook");
        let call = hook.call(arg);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(%stage, owner, "Hook timed out");
                Error::timeout(&format!("Hook '{}' of {}", stage, owner), limit.as_secs())
            })?,
            None => call.await,
        };

        outcome.map_err(|e| {
            warn!(%stage, owner, error = %e, "Hook failed");
            Error::hook(stage, owner, &e)
        })
    }
}
