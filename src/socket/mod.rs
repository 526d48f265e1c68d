//! Socket and connection handling for the default transport.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`stream`]: type-erased plain/TLS sockets

pub mod connectjob;
pub mod stream;
