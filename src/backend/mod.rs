//! Execution of session requests against the dataset backend.
//!
//! The session only describes requests. A [`Backend`] carries one out;
//! [`RequestThread`] runs a backend off the caller's thread and
//! [`SessionDriver`] shuttles requests and completions between the two.

mod client;
mod driver;
mod worker;

pub use client::{ApiClient, image_dims, json_payload};
pub use driver::SessionDriver;
pub use worker::RequestThread;

use crate::error::Result;
use crate::session::{Payload, Request};

/// Something that can answer session requests.
pub trait Backend {
    fn execute(&self, request: &Request) -> Result<Payload>;
}
