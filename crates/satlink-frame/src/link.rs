use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use satlink_transport::{SerialConfig, SerialStream};
use tracing::trace;

use crate::codec::{encode_frame, Deframer, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 512;

/// Back-off between polls while waiting on a deadline, so an idle
/// non-blocking transport is not spun hot.
const POLL_BACKOFF: Duration = Duration::from_millis(1);

/// A transport with marker framing bound to it.
///
/// Owns the underlying stream exclusively; two logical sessions must never
/// share one open transport. Sending writes one complete marked frame and
/// flushes. Receiving is poll-based: [`poll_once`](FramedLink::poll_once)
/// never blocks longer than the transport's own read bound, and longer waits
/// are built from repeated polls against a wall-clock deadline.
#[derive(Debug)]
pub struct FramedLink<T> {
    inner: T,
    deframer: Deframer,
    config: FrameConfig,
    write_buf: BytesMut,
}

impl<T: Read + Write> FramedLink<T> {
    /// Bind framing to a transport with default markers.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Bind framing to a transport with explicit markers.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            deframer: Deframer::with_config(config.clone()),
            config,
            write_buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Send one payload as a complete marked frame and flush.
    ///
    /// Write failures propagate unchanged; this layer never retries a failed
    /// write. Returns the payload length in bytes.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        self.write_buf.clear();
        encode_frame(payload, &mut self.write_buf, &self.config);

        let mut offset = 0usize;
        while offset < self.write_buf.len() {
            match self.inner.write(&self.write_buf[offset..]) {
                Ok(0) => return Err(FrameError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        trace!(len = payload.len(), "frame sent");
        Ok(payload.len())
    }

    /// Flush the underlying transport.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Perform one bounded drain of available input.
    ///
    /// Returns a frame if one is already buffered or completes from a single
    /// read; `Ok(None)` when no complete frame is available yet. Read
    /// timeouts and would-block conditions are normal "no data" outcomes,
    /// not errors. EOF means the transport was closed, which is how a caller
    /// aborts a blocked receive loop from the outside.
    pub fn poll_once(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.deframer.poll() {
            return Ok(Some(frame));
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        match self.inner.read(&mut chunk) {
            Ok(0) => Err(FrameError::Closed),
            Ok(n) => {
                self.deframer.extend(&chunk[..n]);
                Ok(self.deframer.poll())
            }
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(FrameError::Io(err)),
        }
    }

    /// Poll until a frame arrives or `timeout` elapses.
    ///
    /// The deadline is wall-clock, measured from the start of the wait.
    /// Expiry returns `Ok(None)`; listening with no data is a normal outcome.
    pub fn recv_deadline(&mut self, timeout: Duration) -> Result<Option<Frame>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.poll_once()? {
                return Ok(Some(frame));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_BACKOFF);
        }
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the link and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FramedLink<SerialStream> {
    /// Open the serial port named in `config` and bind framing to it.
    pub fn open_serial(config: &SerialConfig) -> satlink_transport::Result<Self> {
        let stream = SerialStream::open(config)?;
        Ok(Self::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn send_writes_marked_frame() {
        let mut link = FramedLink::new(Cursor::new(Vec::<u8>::new()));
        let sent = link.send(b"hello").unwrap();
        assert_eq!(sent, 5);
        assert_eq!(link.into_inner().into_inner(), b"<hello>");
    }

    #[test]
    fn send_returns_payload_length_not_wire_length() {
        let mut link = FramedLink::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(link.send(b"hi").unwrap(), 2);
    }

    #[test]
    fn poll_once_reads_available_frames() {
        let mut link = FramedLink::new(Cursor::new(b"<one><two>".to_vec()));
        assert_eq!(link.poll_once().unwrap().unwrap().text(), "one");
        assert_eq!(link.poll_once().unwrap().unwrap().text(), "two");
    }

    #[test]
    fn poll_once_none_on_partial_frame() {
        let mut link = FramedLink::new(Cursor::new(b"<unfini".to_vec()));
        assert!(link.poll_once().unwrap().is_none());
    }

    #[test]
    fn closed_transport_fails_the_poll() {
        let mut link = FramedLink::new(Cursor::new(Vec::<u8>::new()));
        let err = link.poll_once().unwrap_err();
        assert!(matches!(err, FrameError::Closed));
    }

    #[test]
    fn recv_deadline_times_out_without_data() {
        struct NeverReady;
        impl Read for NeverReady {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::WouldBlock))
            }
        }
        impl Write for NeverReady {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut link = FramedLink::new(NeverReady);
        let start = Instant::now();
        let got = link.recv_deadline(Duration::from_millis(20)).unwrap();
        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn roundtrip_over_socket_pair() {
        let (left, right) = UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();

        let mut sender = FramedLink::new(left);
        let mut receiver = FramedLink::new(right);

        sender.send(b"ready: serial").unwrap();
        sender.send(b"0").unwrap();

        let first = receiver.recv_deadline(Duration::from_secs(1)).unwrap();
        let second = receiver.recv_deadline(Duration::from_secs(1)).unwrap();
        assert_eq!(first.unwrap().text(), "ready: serial");
        assert_eq!(second.unwrap().text(), "0");
    }

    #[test]
    fn socket_pair_timeout_is_not_an_error() {
        let (_left, right) = UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(Duration::from_millis(5)))
            .unwrap();

        let mut receiver = FramedLink::new(right);
        let got = receiver.recv_deadline(Duration::from_millis(30)).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn write_failure_propagates() {
        struct FailingWriter;
        impl Read for FailingWriter {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Ok(0)
            }
        }
        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut link = FramedLink::new(FailingWriter);
        let err = link.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn interrupted_write_retries() {
        struct InterruptOnce {
            interrupted: bool,
            out: Vec<u8>,
        }
        impl Read for InterruptOnce {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Ok(0)
            }
        }
        impl Write for InterruptOnce {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.out.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut link = FramedLink::new(InterruptOnce {
            interrupted: false,
            out: Vec::new(),
        });
        link.send(b"ok").unwrap();
        assert_eq!(link.into_inner().out, b"<ok>");
    }

    #[test]
    fn frames_straddle_reads_over_socket() {
        let (mut left, right) = UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        let mut receiver = FramedLink::new(right);

        // Write a frame in two raw halves with no frame boundary alignment.
        left.write_all(b"<spl").unwrap();
        left.flush().unwrap();
        assert!(receiver.poll_once().unwrap().is_none());

        left.write_all(b"it><next>").unwrap();
        left.flush().unwrap();
        let first = receiver.recv_deadline(Duration::from_secs(1)).unwrap();
        let second = receiver.recv_deadline(Duration::from_secs(1)).unwrap();
        assert_eq!(first.unwrap().text(), "split");
        assert_eq!(second.unwrap().text(), "next");
    }
}
