use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::pool::WorkerPool;

/// Accept loop over a shared listening socket.
///
/// Each acceptor owns a cloned handle of the one listening socket and loops
/// forever: accept, hand the connection to the pool, repeat. Ownership of
/// an accepted connection transfers entirely to the pool (and then to its
/// worker); the acceptor never retains or closes it on the success path.
pub struct Acceptor {
    listener: TcpListener,
    pool: Arc<WorkerPool>,
    next_connection_id: Arc<AtomicU64>,
}

impl Acceptor {
    pub fn new(
        listener: TcpListener,
        pool: Arc<WorkerPool>,
        next_connection_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            listener,
            pool,
            next_connection_id,
        }
    }

    /// Accept connections until the socket fails fatally.
    ///
    /// Transient accept errors are logged and the loop continues; a failing
    /// connection never affects the acceptor itself.
    pub fn run(self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
                    debug!(connection = id, peer = %addr, "accepted connection");
                    self.pool.dispatch(id, stream);
                }
                Err(err) => {
                    warn!(%err, "accept failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Shutdown, TcpStream};
    use std::thread;

    use taskwire_codec::{Serializer, Value};
    use taskwire_frame::{FrameConfig, FrameReader, FrameWriter};

    use crate::task::TaskClosure;

    use super::*;

    #[test]
    fn accepted_connections_reach_workers() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let pool = Arc::new(WorkerPool::start(
            2,
            8,
            Arc::new(Serializer::Plain),
            FrameConfig::default(),
        ));
        let acceptor = Acceptor::new(listener, pool, Arc::new(AtomicU64::new(1)));
        thread::spawn(move || acceptor.run());

        let stream = TcpStream::connect(addr).unwrap();
        let mut writer = FrameWriter::new(stream.try_clone().unwrap());
        let mut reader = FrameReader::new(stream.try_clone().unwrap());

        let closure = TaskClosure::emit(vec![Value::Int(1)]);
        writer.send_i32(0).unwrap();
        writer.send(&closure.to_bytes().unwrap()).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        let frame = reader.read_frame().unwrap();
        assert_eq!(Serializer::Plain.load(&frame.payload).unwrap(), Value::Int(1));
        assert!(reader.read_frame().unwrap().is_sentinel());
    }
}
