//! Background thread executing backend requests.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::Backend;
use crate::error::Result;
use crate::session::{Payload, Request, Ticket};

/// A finished request, ready for [`crate::session::SessionController::complete`].
pub type Completion = (Ticket, Result<Payload>);

/// Message sent to the request thread.
enum ThreadMessage {
    Execute(Ticket, Request),
    Shutdown,
}

/// Runs a [`Backend`] on a background thread so slow responses never block
/// the caller. Requests are executed in submission order.
pub struct RequestThread {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<Completion>,
    /// Joined on drop
    thread_handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl RequestThread {
    /// Spawn a thread owning `backend`.
    pub fn spawn<B: Backend + Send + 'static>(backend: B) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<Completion>();

        let thread_handle = thread::Builder::new()
            .name("backend-requests".to_string())
            .spawn(move || {
                log::debug!("Request thread started");
                Self::thread_loop(&backend, request_rx, result_tx);
                log::debug!("Request thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            in_flight: 0,
        })
    }

    fn thread_loop<B: Backend>(
        backend: &B,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<Completion>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Execute(ticket, request)) => {
                    let result = backend.execute(&request);
                    if let Err(e) = &result {
                        log::debug!("Request #{} failed: {}", ticket.id, e);
                    }
                    if result_tx.send((ticket, result)).is_err() {
                        log::warn!("Result channel closed, request thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Queue a request for execution.
    pub fn submit(&mut self, ticket: Ticket, request: Request) {
        if self
            .request_tx
            .send(ThreadMessage::Execute(ticket, request))
            .is_err()
        {
            log::error!("Failed to send request: channel closed");
        } else {
            self.in_flight += 1;
        }
    }

    /// Take one finished request without blocking.
    pub fn try_take(&mut self) -> Option<Completion> {
        match self.result_rx.try_recv() {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Request thread disconnected");
                None
            }
        }
    }

    /// Wait for the next finished request. Returns `None` if the thread is gone.
    pub fn take_blocking(&mut self) -> Option<Completion> {
        let completion = self.result_rx.recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Number of submitted requests not yet taken.
    pub fn pending_count(&self) -> usize {
        self.in_flight
    }
}

impl Drop for RequestThread {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Request thread panicked: {:?}", e);
            }
        }
    }
}

impl std::fmt::Debug for RequestThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThread")
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
