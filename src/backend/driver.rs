//! Host-loop glue between a session and its request thread.

use super::{Backend, RequestThread};
use crate::session::SessionController;

/// Moves requests from a session to a [`RequestThread`] and feeds the
/// completions back.
#[derive(Debug)]
pub struct SessionDriver {
    thread: RequestThread,
}

impl SessionDriver {
    pub fn new(thread: RequestThread) -> Self {
        Self { thread }
    }

    /// Spawn a request thread for `backend` and drive sessions with it.
    pub fn spawn<B: Backend + Send + 'static>(backend: B) -> std::io::Result<Self> {
        Ok(Self::new(RequestThread::spawn(backend)?))
    }

    /// One non-blocking step of the host loop: run deferred work, send new
    /// requests and apply whatever has finished.
    ///
    /// Returns how many requests were sent or completed.
    pub fn pump(&mut self, session: &mut SessionController) -> usize {
        session.tick();
        let mut activity = 0;
        for (ticket, request) in session.take_requests() {
            self.thread.submit(ticket, request);
            activity += 1;
        }
        while let Some((ticket, result)) = self.thread.try_take() {
            session.complete(ticket, result);
            activity += 1;
        }
        activity
    }

    /// Requests sent but not yet completed.
    pub fn pending(&self) -> usize {
        self.thread.pending_count()
    }

    /// Pump until the session has nothing in flight and nothing deferred,
    /// blocking on outstanding requests.
    pub fn run_until_idle(&mut self, session: &mut SessionController) {
        loop {
            let activity = self.pump(session);
            if self.pending() == 0 {
                if activity == 0 && !session.has_deferred() {
                    return;
                }
                continue;
            }
            match self.thread.take_blocking() {
                Some((ticket, result)) => session.complete(ticket, result),
                None => return,
            }
        }
    }
}
