//! Worker-execution server for the taskwire protocol.
//!
//! A standalone process accepts TCP connections from a driver, executes one
//! unit of distributed computation per connection, and streams serialized
//! results back length-prefixed, ending with a zero-length sentinel.
//!
//! # Architecture
//!
//! - [`TaskListener`] binds the socket, announces the bound port on its
//!   output channel as a raw 4-byte frame, and spawns a fixed set of
//!   acceptors sharing the listening socket.
//! - Each acceptor loops accepting connections and hands each one to the
//!   bounded [`WorkerPool`]; a full queue rejects the connection.
//! - A pool thread runs one [`Worker`] per connection to completion: split
//!   index, closure frame, input frames until half-close, compute, framed
//!   outputs, sentinel.
//! - [`TaskClient`] is the driver-side counterpart used by the CLI and
//!   tests.
//!
//! Per-connection failures are strictly local: the connection drops without
//! a sentinel and nothing else is affected. The protocol carries no in-band
//! error signaling.

pub mod acceptor;
pub mod client;
pub mod config;
pub mod error;
pub mod listener;
pub mod pool;
pub mod task;
pub mod worker;

pub use client::TaskClient;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use listener::TaskListener;
pub use pool::WorkerPool;
pub use task::{Predicate, TaskClosure, TaskError, TaskOp, Transform};
pub use worker::Worker;
