//! # Work contract and function-backed runner.
//!
//! This module defines the [`Runner`] trait (async, cancelable) and a
//! convenient function-backed implementation, [`RunnerFn`]. The common
//! handle type is [`RunnerRef`], an `Arc<dyn Runner>` shared by every slot
//! of a task.
//!
//! A runner receives a [`CancellationToken`] and should periodically check
//! it to stop cooperatively when the task is interrupted.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RunError;

/// Shared handle to a work body (`Arc<dyn Runner>`).
pub type RunnerRef = Arc<dyn Runner>;

/// # One unit of repeatable work.
///
/// Every slot of a task invokes the same runner. Implementors should
/// regularly check the token and return [`RunError::Interrupted`] promptly
/// when it is cancelled; any other error is logged by the slot loop and
/// the runnable is restarted on the next iteration.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use tasklane::{Runner, RunError};
///
/// struct Probe;
///
/// #[async_trait]
/// impl Runner for Probe {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), RunError> {
///         if ctx.is_cancelled() {
///             return Err(RunError::Interrupted);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Executes one invocation of the work body.
    async fn run(&self, ctx: CancellationToken) -> Result<(), RunError>;
}

/// Function-backed runner implementation.
///
/// Wraps a closure that creates a fresh future per invocation, so no state
/// is carried across iterations unless the closure captures an `Arc`
/// explicitly.
pub struct RunnerFn<F> {
    f: F,
}

impl<F, Fut> RunnerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    /// Creates a new function-backed runner.
    ///
    /// Prefer [`RunnerFn::arc`] when you immediately need a [`RunnerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the runner and returns it as a shared handle.
    ///
    /// # Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use tasklane::{RunnerFn, RunnerRef, RunError};
    ///
    /// let r: RunnerRef = RunnerFn::arc(|_ctx: CancellationToken| async {
    ///     Ok::<_, RunError>(())
    /// });
    /// ```
    pub fn arc(f: F) -> RunnerRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), RunError> {
        (self.f)(ctx).await
    }
}
