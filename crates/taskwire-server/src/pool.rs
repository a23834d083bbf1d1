use std::net::TcpStream;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use taskwire_codec::Serializer;
use taskwire_frame::FrameConfig;

use crate::worker::Worker;

/// Bounded pool of worker threads fed by a queue of accepted connections.
///
/// Each pool thread runs one [`Worker`] per connection to completion, so a
/// connection is still owned exclusively by exactly one worker for its whole
/// request/response cycle. The queue bound plus the pool size form the
/// concurrency ceiling: a connection arriving beyond it is rejected
/// (dropped) rather than queued without limit.
pub struct WorkerPool {
    queue: SyncSender<(u64, TcpStream)>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `pool_size` worker threads behind a queue of `queue_depth`
    /// pending connections.
    pub fn start(
        pool_size: usize,
        queue_depth: usize,
        serializer: Arc<Serializer>,
        frame: FrameConfig,
    ) -> Self {
        let (queue, receiver) = sync_channel(queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..pool_size.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let serializer = Arc::clone(&serializer);
                let frame = frame.clone();
                std::thread::spawn(move || run_pool_thread(&receiver, &serializer, &frame))
            })
            .collect();

        Self { queue, handles }
    }

    /// Hand an accepted connection to the pool.
    ///
    /// Returns `false` if the queue is full and the connection was rejected;
    /// the stream is dropped, which the peer observes as a close without a
    /// terminator, the protocol's only failure signal.
    pub fn dispatch(&self, id: u64, stream: TcpStream) -> bool {
        match self.queue.try_send((id, stream)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection = id, "worker queue full, rejecting connection");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(connection = id, "worker pool stopped, rejecting connection");
                false
            }
        }
    }

    /// Number of pool threads.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Drop the queue side and wait for pool threads to drain and exit.
    /// Used by tests; in production the pool lives until the process dies.
    pub fn join(self) {
        drop(self.queue);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn run_pool_thread(
    receiver: &Mutex<Receiver<(u64, TcpStream)>>,
    serializer: &Arc<Serializer>,
    frame: &FrameConfig,
) {
    loop {
        let next = {
            let guard = match receiver.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.recv()
        };

        let (id, stream) = match next {
            Ok(item) => item,
            Err(_) => break, // queue closed
        };

        match Worker::new(stream, id, Arc::clone(serializer), frame.clone()) {
            Ok(worker) => worker.run(),
            Err(err) => debug!(connection = id, %err, "worker setup failed"),
        }
    }
}
