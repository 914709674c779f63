//! Cancellation and deadlines for a single call.

use std::time::Duration;

use lingua_model::{Error, RequestFailure, Result};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Carries the caller's cancellation signal and deadline into a call.
///
/// Cloning a context shares its token, so cancelling any clone cancels
/// them all. Contexts are cheap to create and meant to be built per call.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[inline]
    pub fn background() -> Self {
        Self::default()
    }

    /// Expires `timeout` from now.
    #[inline]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    /// Expires at `deadline`.
    #[inline]
    pub fn with_deadline<I: Into<Instant>>(deadline: I) -> Self {
        Self::background().deadline(deadline.into())
    }

    /// Uses an existing token, e.g. one shared with other work.
    #[inline]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets the deadline, keeping the earlier one if already set.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// The token that cancels calls made with this context.
    #[inline]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels every call made with this context.
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fails if the context is already cancelled or expired.
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::request(operation, RequestFailure::Cancelled));
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(Error::request(
                operation,
                RequestFailure::DeadlineExceeded,
            ));
        }
        Ok(())
    }

    /// Runs `fut` until it completes or the context ends, whichever comes
    /// first. When the context wins, `fut` is dropped mid-flight.
    pub(crate) async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(operation)?;
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!("{operation} cancelled");
                Err(Error::request(operation, RequestFailure::Cancelled))
            }
            _ = expired => {
                debug!("{operation} ran past its deadline");
                Err(Error::request(operation, RequestFailure::DeadlineExceeded))
            }
            result = fut => result,
        }
    }
}
