//! Turns socket-level `io::Error`s into `Transport` errors that name the
//! host they were talking to.

use crate::base::neterror::NetError;
use std::io;

pub trait IoResultExt<T> {
    /// `Connection to example.com:443 failed: <io error>`
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// `Name not resolved for example.com: <io error>`
    fn dns_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::transport(format!("Connection to {host}:{port} failed: {e}"), e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::transport(format!("Name not resolved for {domain}: {e}"), e))
    }
}
