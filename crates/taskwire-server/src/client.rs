use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use tracing::debug;

use taskwire_codec::{Serializer, Value};
use taskwire_frame::{FrameConfig, FrameReader, FrameWriter};

use crate::error::{Result, ServerError};
use crate::task::TaskClosure;

/// Driver-side connection to a worker server.
///
/// One connection carries exactly one task: the request is the split index,
/// the closure frame, and the input frames; half-closing the send side ends
/// the input (no terminator frame exists for input). The response is framed
/// outputs up to the zero-length sentinel.
pub struct TaskClient {
    stream: TcpStream,
    serializer: Serializer,
    frame: FrameConfig,
}

impl TaskClient {
    /// Connect to a worker server.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let addr = resolve(addr)?;
        let stream = TcpStream::connect(addr)
            .map_err(|source| ServerError::Connect { addr, source })?;
        debug!(%addr, "connected to worker server");
        Ok(Self {
            stream,
            serializer: Serializer::Plain,
            frame: FrameConfig::default(),
        })
    }

    /// Use this serializer for inputs and outputs. Must match the server's
    /// configured serializer.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Override frame codec limits.
    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }

    /// Submit one task and collect its ordered outputs.
    ///
    /// Consumes the client: the protocol is one task per connection.
    pub fn submit(
        self,
        split_index: i32,
        closure: &TaskClosure,
        inputs: &[Value],
    ) -> Result<Vec<Value>> {
        let mut writer = FrameWriter::with_config(self.stream.try_clone()?, self.frame.clone());
        let mut reader = FrameReader::with_config(self.stream.try_clone()?, self.frame.clone());

        writer.send_i32(split_index)?;
        writer.send(&closure.to_bytes()?)?;
        for payload in self.serializer.dump_stream(inputs)? {
            writer.send(&payload)?;
        }
        // Half-close: the read failure on the worker side is the
        // end-of-input signal.
        self.stream.shutdown(Shutdown::Write)?;

        let mut payloads = Vec::new();
        loop {
            match reader.read_frame() {
                Ok(frame) if frame.is_sentinel() => break,
                Ok(frame) => payloads.push(frame.payload),
                // Close without the terminator is the worker's only failure
                // signal.
                Err(err) => return Err(ServerError::Disconnected(err.to_string())),
            }
        }

        self.serializer.load_stream(&payloads)
            .map_err(ServerError::from)
    }
}

fn resolve(addr: impl ToSocketAddrs) -> Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| ServerError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "address resolved to nothing",
        )))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    use taskwire_frame::FrameWriter as RawWriter;

    use crate::task::{TaskOp, Transform};
    use crate::worker::Worker;

    use super::*;

    fn one_shot_server(serializer: Serializer) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let serializer = Arc::new(serializer);
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Worker::new(stream, 1, serializer, FrameConfig::default())
                .unwrap()
                .run();
        });
        addr
    }

    #[test]
    fn submit_roundtrip() {
        let addr = one_shot_server(Serializer::Plain);

        let closure = TaskClosure::new(vec![TaskOp::Map(Transform::MulInt(10))]);
        let outputs = TaskClient::connect(addr)
            .unwrap()
            .submit(0, &closure, &[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap();

        assert_eq!(outputs, vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
    }

    #[test]
    fn submit_with_batched_compressed_pipeline() {
        let serializer = Serializer::batched(Serializer::compressed(Serializer::Plain), 2);
        let addr = one_shot_server(serializer.clone());

        let closure = TaskClosure::new(vec![TaskOp::Filter(crate::task::Predicate::IsInt)]);
        let inputs = vec![
            Value::Int(1),
            Value::Null,
            Value::Int(2),
            Value::Text("skip".into()),
            Value::Int(3),
        ];

        let outputs = TaskClient::connect(addr)
            .unwrap()
            .with_serializer(serializer)
            .submit(4, &closure, &inputs)
            .unwrap();

        assert_eq!(outputs, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn missing_terminator_is_disconnected_error() {
        // A fake server that sends one output frame and hangs up without
        // the sentinel.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FrameReader::new(stream.try_clone().unwrap());
            let _ = reader.read_i32();
            let _ = reader.read_frame();
            let mut writer = RawWriter::new(stream);
            let payload = Serializer::Plain.dump(&Value::Int(9)).unwrap();
            writer.send(&payload).unwrap();
            // drop: no sentinel
        });

        let closure = TaskClosure::emit(vec![]);
        let err = TaskClient::connect(addr)
            .unwrap()
            .submit(0, &closure, &[])
            .unwrap_err();
        assert!(matches!(err, ServerError::Disconnected(_)));
    }
}
