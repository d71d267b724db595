//! Request and response value types
//!
//! These are the agent's own view of an intercepted request and of a stored
//! response snapshot. They are deliberately independent of any HTTP client so the
//! policy code can be driven by in-memory fakes.

mod request;
mod response;

pub use request::{Destination, Request, RequestMode};
pub use response::{Headers, Response};
