use std::net::TcpStream;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use taskwire_codec::Serializer;
use taskwire_frame::{FrameConfig, FrameReader, FrameWriter};

use crate::error::Result;
use crate::task::TaskClosure;

/// Protocol phase, for log and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SplitIndex,
    Closure,
    Input,
    Compute,
    Stream,
}

/// Executes one task over one exclusively owned connection.
///
/// A worker exists only for the duration of a single request/response
/// cycle. Any failure aborts the connection silently: the peer observes a
/// close without the zero-length terminator and nothing else is affected.
pub struct Worker {
    id: u64,
    reader: FrameReader<TcpStream>,
    writer: FrameWriter<TcpStream>,
    serializer: Arc<Serializer>,
    phase: Phase,
}

impl Worker {
    /// Take exclusive ownership of a connection.
    pub fn new(
        stream: TcpStream,
        id: u64,
        serializer: Arc<Serializer>,
        frame: FrameConfig,
    ) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        Ok(Self {
            id,
            reader: FrameReader::with_config(reader_stream, frame.clone()),
            writer: FrameWriter::with_config(stream, frame),
            serializer,
            phase: Phase::SplitIndex,
        })
    }

    /// Run the request/response cycle to completion.
    ///
    /// Errors are logged, not returned: the protocol defines no in-band
    /// error signaling, so failure is observable only as the dropped
    /// connection.
    pub fn run(mut self) {
        match self.serve() {
            Ok(()) => debug!(connection = self.id, "task completed"),
            Err(err) => debug!(
                connection = self.id,
                phase = ?self.phase,
                %err,
                "connection dropped"
            ),
        }
    }

    fn serve(&mut self) -> Result<()> {
        self.phase = Phase::SplitIndex;
        let split_index = self.reader.read_i32()?;

        self.phase = Phase::Closure;
        let closure_frame = self.reader.read_frame()?;
        let closure = TaskClosure::from_bytes(&closure_frame.payload)?;
        trace!(connection = self.id, split_index, "closure loaded");

        self.phase = Phase::Input;
        let payloads = self.read_inputs();
        let inputs = self.serializer.load_stream(&payloads)?;
        trace!(connection = self.id, inputs = inputs.len(), "input loaded");

        self.phase = Phase::Compute;
        let outputs = closure.invoke(split_index, inputs)?;

        self.phase = Phase::Stream;
        for payload in self.serializer.dump_stream(&outputs)? {
            self.writer.send(&payload)?;
        }
        self.writer.send_sentinel()?;

        Ok(())
    }

    /// Collect input frames until a read fails.
    ///
    /// The input side has no terminator frame: the peer half-closing its
    /// send side makes the next read fail, and that failure is the expected
    /// end-of-input signal. Intentionally asymmetric with the output side's
    /// explicit sentinel; preserved for wire compatibility.
    fn read_inputs(&mut self) -> Vec<Bytes> {
        let mut payloads = Vec::new();
        loop {
            match self.reader.read_frame() {
                Ok(frame) => payloads.push(frame.payload),
                Err(_) => break,
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::{Shutdown, TcpListener};
    use std::thread;

    use taskwire_codec::Value;
    use taskwire_frame::FrameError;

    use super::*;

    fn spawn_worker(serializer: Serializer) -> (std::net::SocketAddr, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let serializer = Arc::new(serializer);

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Worker::new(stream, 1, serializer, FrameConfig::default())
                .unwrap()
                .run();
        });

        (addr, handle)
    }

    fn drive(
        addr: std::net::SocketAddr,
        split_index: i32,
        closure_blob: &[u8],
        input_payloads: &[Vec<u8>],
    ) -> Vec<Bytes> {
        let stream = TcpStream::connect(addr).unwrap();
        let mut writer = FrameWriter::new(stream.try_clone().unwrap());
        let mut reader = FrameReader::new(stream.try_clone().unwrap());

        writer.send_i32(split_index).unwrap();
        writer.send(closure_blob).unwrap();
        for payload in input_payloads {
            writer.send(payload).unwrap();
        }
        stream.shutdown(Shutdown::Write).unwrap();

        let mut frames = Vec::new();
        loop {
            let frame = reader.read_frame().unwrap();
            if frame.is_sentinel() {
                break;
            }
            frames.push(frame.payload);
        }
        frames
    }

    #[test]
    fn emits_outputs_and_terminator() {
        let (addr, handle) = spawn_worker(Serializer::Plain);

        let closure = TaskClosure::emit(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
        let frames = drive(addr, 0, &closure.to_bytes().unwrap(), &[]);

        assert_eq!(frames.len(), 3);
        let plain = Serializer::Plain;
        assert_eq!(plain.load(&frames[0]).unwrap(), Value::Int(10));
        assert_eq!(plain.load(&frames[1]).unwrap(), Value::Int(20));
        assert_eq!(plain.load(&frames[2]).unwrap(), Value::Int(30));

        handle.join().unwrap();
    }

    #[test]
    fn maps_inputs_through_configured_serializer() {
        let serializer = Serializer::compressed(Serializer::Plain);
        let (addr, handle) = spawn_worker(serializer.clone());

        let closure =
            TaskClosure::new(vec![crate::task::TaskOp::Map(crate::task::Transform::AddInt(1))]);
        let inputs: Vec<Value> = vec![Value::Int(5), Value::Int(6)];
        let input_payloads = serializer.dump_stream(&inputs).unwrap();

        let frames = drive(addr, 2, &closure.to_bytes().unwrap(), &input_payloads);
        let outputs = serializer.load_stream(&frames).unwrap();
        assert_eq!(outputs, vec![Value::Int(6), Value::Int(7)]);

        handle.join().unwrap();
    }

    #[test]
    fn batched_outputs_arrive_in_chunks() {
        let serializer = Serializer::batched(Serializer::Plain, 2);
        let (addr, handle) = spawn_worker(serializer.clone());

        let closure = TaskClosure::emit((0..5).map(Value::Int).collect());
        let frames = drive(addr, 0, &closure.to_bytes().unwrap(), &[]);

        // 5 values, batch size 2 -> 3 chunk frames before the terminator
        assert_eq!(frames.len(), 3);
        let outputs = serializer.load_stream(&frames).unwrap();
        assert_eq!(outputs, (0..5).map(Value::Int).collect::<Vec<_>>());

        handle.join().unwrap();
    }

    #[test]
    fn malformed_closure_closes_without_output() {
        let (addr, handle) = spawn_worker(Serializer::Plain);

        let stream = TcpStream::connect(addr).unwrap();
        let mut writer = FrameWriter::new(stream.try_clone().unwrap());
        let mut reader = FrameReader::new(stream.try_clone().unwrap());

        writer.send_i32(0).unwrap();
        writer.send(b"corrupt closure bytes").unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        // No output frames, no terminator: just a closed connection.
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));

        handle.join().unwrap();
    }

    #[test]
    fn abrupt_client_close_is_contained() {
        let (addr, handle) = spawn_worker(Serializer::Plain);

        let mut stream = TcpStream::connect(addr).unwrap();
        // Write half an integer and vanish.
        stream.write_all(&[0x00, 0x01]).unwrap();
        drop(stream);

        handle.join().unwrap();
    }
}
