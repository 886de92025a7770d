use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Default start-of-frame marker.
pub const START_MARKER: u8 = b'<';

/// Default end-of-frame marker.
pub const END_MARKER: u8 = b'>';

/// Configuration for the marker codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Byte that opens a frame. Default: `<`.
    pub start_marker: u8,
    /// Byte that closes a frame. Default: `>`.
    pub end_marker: u8,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            start_marker: START_MARKER,
            end_marker: END_MARKER,
        }
    }
}

/// One delimited message received off the wire.
///
/// Transient: produced by the deframer on each matched marker pair and
/// consumed immediately by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The bytes between the markers.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame from a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty (`<>` on the wire).
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text. Invalid UTF-8 is replaced, never rejected; the
    /// session layer decides what to do with garbled frames.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Encode a payload into the wire format: start marker, payload, end marker.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut, config: &FrameConfig) {
    dst.reserve(payload.len() + 2);
    dst.put_u8(config.start_marker);
    dst.put_slice(payload);
    dst.put_u8(config.end_marker);
}

/// Reconstructs complete frames from an arbitrarily chunked byte stream.
///
/// Feed raw input with [`extend`](Deframer::extend); retrieve at most one
/// completed frame per [`poll`](Deframer::poll). Input left over after a
/// frame completes stays buffered, so the emitted frames are independent of
/// how the stream was chunked.
///
/// Rules, matching the microcontroller firmware on the other end:
/// - bytes outside a marker pair are discarded;
/// - a start marker seen while already capturing restarts the capture
///   (last start wins, the abandoned partial is dropped silently);
/// - each matched pair yields exactly one frame.
#[derive(Debug, Default)]
pub struct Deframer {
    config: FrameConfig,
    /// Raw input not yet scanned.
    pending: BytesMut,
    /// Payload of the frame currently being captured.
    capture: BytesMut,
    capturing: bool,
}

impl Deframer {
    /// Create a deframer with default markers.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a deframer with explicit markers.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            pending: BytesMut::new(),
            capture: BytesMut::new(),
            capturing: false,
        }
    }

    /// Append raw input. No scanning happens here.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Scan pending input and return the next completed frame, if any.
    ///
    /// Stops scanning as soon as a frame completes; remaining input is kept
    /// for the next poll. A frame is never returned twice.
    pub fn poll(&mut self) -> Option<Frame> {
        while !self.pending.is_empty() {
            let byte = self.pending[0];
            self.pending.advance(1);

            if self.capturing {
                if byte == self.config.end_marker {
                    self.capturing = false;
                    return Some(Frame {
                        payload: self.capture.split().freeze(),
                    });
                } else if byte == self.config.start_marker {
                    // Restart: the partial capture is abandoned.
                    self.capture.clear();
                } else {
                    self.capture.put_u8(byte);
                }
            } else if byte == self.config.start_marker {
                self.capture.clear();
                self.capturing = true;
            }
        }
        None
    }

    /// Whether a capture is in progress (an unmatched start marker was seen).
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Drop buffered input and any partial capture.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.capture.clear();
        self.capturing = false;
    }
}
