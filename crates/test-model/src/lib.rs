//! A local fake transport for testing purpose.

#![deny(missing_docs)]

mod preset;

use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lingua_model::{BoxError, Transport, WireReply, WireRequest};

pub use preset::*;

/// The failure returned when the script can't answer a request.
#[derive(Debug)]
pub struct Error {
    message: &'static str,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    attempts: u64,
    requests: Vec<WireRequest>,
    delay: Option<Duration>,
}

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to setup the script, which is the list
/// of replies the transport answers with, in order. Every request is
/// recorded, so tests can inspect what an adapter actually rendered. If
/// there are no enough replies in the script, an error will be returned.
///
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct TestTransport {
    script: Arc<Mutex<Script>>,
}

impl TestTransport {
    /// Creates a transport that answers with `replies`, in order.
    pub fn with_replies(replies: impl IntoIterator<Item = PresetReply>) -> Self {
        let transport = Self::default();
        for reply in replies {
            transport.push_reply(reply);
        }
        transport
    }

    /// Queues a reply behind the ones already scripted.
    #[inline]
    pub fn push_reply(&self, reply: PresetReply) {
        self.lock().replies.push_back(reply);
    }

    /// Delays every reply, e.g. to race it against a cancellation.
    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.lock().delay = Some(duration);
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<WireRequest> {
        self.lock().requests.clone()
    }

    /// Returns the last request sent.
    pub fn last_request(&self) -> Option<WireRequest> {
        self.lock().requests.last().cloned()
    }

    /// Returns how many exchanges were attempted.
    #[inline]
    pub fn dispatch_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self) -> Result<WireReply, Error> {
        let mut script = self.lock();
        let Some(preset) = script.replies.front() else {
            return Err(Error {
                message: "no enough replies",
            });
        };
        match preset.failures {
            Some(0) => {
                return Err(Error {
                    message: "scripted failure",
                });
            }
            Some(failures) if script.attempts < failures => {
                script.attempts += 1;
                return Err(Error {
                    message: "scripted failure",
                });
            }
            _ => {}
        }
        let reply = preset.to_reply();
        script.replies.pop_front();
        script.attempts = 0;
        Ok(reply)
    }
}

#[async_trait]
impl Transport for TestTransport {
    async fn send(&self, request: WireRequest) -> Result<WireReply, BoxError> {
        let delay = {
            let mut script = self.lock();
            script.requests.push(request);
            script.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.next_reply()?)
    }
}
