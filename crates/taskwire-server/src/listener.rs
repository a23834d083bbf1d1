use std::io::Write;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tracing::info;

use taskwire_frame::FrameWriter;

use crate::acceptor::Acceptor;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::pool::WorkerPool;

/// Binds the listening socket and runs the acceptor set.
pub struct TaskListener {
    listener: TcpListener,
    config: ServerConfig,
}

impl TaskListener {
    /// Bind `address:port` with default configuration. Port 0 requests an
    /// OS-assigned port; [`port`](Self::port) reports the actual one.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: format!("{addr:?}"),
            source,
        })?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            config: ServerConfig::default(),
        })
    }

    /// Override server configuration.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The bound port.
    pub fn port(&self) -> Result<u16> {
        Ok(self.local_addr()?.port())
    }

    /// Write the bound port as one raw 4-byte big-endian integer.
    ///
    /// The sole startup handshake with the launching process; the CLI emits
    /// it on stdout immediately after binding.
    pub fn announce_port(&self, out: impl Write) -> Result<()> {
        let mut writer = FrameWriter::new(out);
        writer.send_i32(i32::from(self.port()?))?;
        Ok(())
    }

    /// Start the worker pool, spawn the acceptor set, and serve until the
    /// process is terminated externally.
    ///
    /// There is no graceful shutdown path: acceptors run indefinitely and
    /// termination happens via signal, per the protocol contract.
    pub fn run(self) -> Result<()> {
        let pool = Arc::new(WorkerPool::start(
            self.config.pool_size,
            self.config.queue_depth,
            Arc::new(self.config.serializer),
            self.config.frame,
        ));
        let next_connection_id = Arc::new(AtomicU64::new(1));

        let mut handles = Vec::with_capacity(self.config.acceptors);
        for _ in 0..self.config.acceptors.max(1) {
            let socket = self.listener.try_clone().map_err(ServerError::Accept)?;
            let acceptor = Acceptor::new(socket, Arc::clone(&pool), Arc::clone(&next_connection_id));
            handles.push(std::thread::spawn(move || acceptor.run()));
        }

        info!(
            acceptors = handles.len(),
            pool_size = pool.size(),
            "serving"
        );

        for handle in handles {
            let _ = handle.join();
        }
        Ok(())
    }

    /// Bind, announce the port on `out`, and serve.
    pub fn serve(addr: impl ToSocketAddrs + std::fmt::Debug, config: ServerConfig, out: impl Write) -> Result<()> {
        let listener = Self::bind(addr)?.with_config(config);
        listener.announce_port(out)?;
        listener.run()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn bind_port_zero_reports_assigned_port() {
        let listener = TaskListener::bind("127.0.0.1:0").unwrap();
        assert_ne!(listener.port().unwrap(), 0);
    }

    #[test]
    fn announce_port_writes_big_endian_int() {
        let listener = TaskListener::bind("127.0.0.1:0").unwrap();
        let port = listener.port().unwrap();

        let mut out = Cursor::new(Vec::<u8>::new());
        listener.announce_port(&mut out).unwrap();

        assert_eq!(out.into_inner(), i32::from(port).to_be_bytes());
    }

    #[test]
    fn bind_failure_is_typed() {
        // Port 1 requires privileges in any sane environment.
        let result = TaskListener::bind("127.0.0.1:1");
        if let Err(err) = result {
            assert!(matches!(err, ServerError::Bind { .. }));
        }
    }
}
