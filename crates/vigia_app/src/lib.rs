//! Daemon internals, exposed as a library for the binary and the
//! integration tests.

#[cfg(unix)]
pub mod daemon;
#[cfg(unix)]
pub mod runner;
#[cfg(unix)]
pub mod server;
#[cfg(unix)]
pub mod settings;
