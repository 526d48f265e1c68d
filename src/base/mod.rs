//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the error surfaced by every request
//! - [`statustext`]: status code phrases used in error messages
//! - [`context`]: I/O error context helpers

pub mod context;
pub mod neterror;
pub mod statustext;
