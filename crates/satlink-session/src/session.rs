use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::time::Duration;

use satlink_frame::FramedLink;
use satlink_transport::SerialConfig;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::handshake::{handshake, Subsystem};
use crate::header::{validate_data, Header, Mode, MAX_DATA_LEN};

/// Announces an incoming chunk sequence.
pub const STREAM_START: &str = "receive_stream";

/// Terminates a chunk sequence.
pub const STREAM_STOP: &str = "stop_stream";

/// Default token that ends a monitor loop.
pub const DEFAULT_STOP_TOKEN: &str = "STOP";

/// Session tuning, populated once at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for handshake readiness waits.
    pub handshake_timeout: Duration,
    /// Deadline for acknowledgement waits and each monitor poll round.
    pub ack_timeout: Duration,
    /// Pause between the two transmits of a beacon pulse.
    pub beacon_pause: Duration,
    /// Pause between stream chunks. Backpressure for the receiver's bounded
    /// byte buffer — the sender must not flood faster than the peer drains.
    pub chunk_pause: Duration,
    /// Station identifier transmitted by beacon pulses.
    pub station_id: String,
    /// Closed allow-list of command tokens.
    pub commands: Vec<String>,
    /// Token that ends a monitor loop.
    pub stop_token: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(10),
            beacon_pause: Duration::from_secs(1),
            chunk_pause: Duration::from_millis(25),
            station_id: "satsys-base".to_string(),
            commands: vec![
                "smile".to_string(),
                "picture".to_string(),
                "strobe".to_string(),
            ],
            stop_token: DEFAULT_STOP_TOKEN.to_string(),
        }
    }
}

/// A handshaken link to one peripheral microcontroller.
///
/// Owns its link exclusively; every operation runs to completion or timeout
/// before the next is issued. Cancellation is timeout-only — to abort a
/// blocked loop early, close the underlying transport, which fails the next
/// poll.
#[derive(Debug)]
pub struct Session<T> {
    link: FramedLink<T>,
    config: SessionConfig,
}

impl<T: Read + Write> Session<T> {
    /// Perform the handshake on a fresh link and return the session.
    pub fn connect(
        inner: T,
        subsystem: &Subsystem,
        device_id: u8,
        config: SessionConfig,
    ) -> Result<Self> {
        let mut link = FramedLink::new(inner);
        handshake(&mut link, subsystem, device_id, config.handshake_timeout)?;
        Ok(Self { link, config })
    }

    /// Wrap a link whose handshake has already been performed.
    pub fn attach(link: FramedLink<T>, config: SessionConfig) -> Self {
        Self { link, config }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the underlying link.
    pub fn link_mut(&mut self) -> &mut FramedLink<T> {
        &mut self.link
    }

    /// Consume the session and return the link.
    pub fn into_link(self) -> FramedLink<T> {
        self.link
    }

    /// Send one message as a transmit header frame.
    ///
    /// Rejects empty or oversized payloads before anything is written.
    /// Returns the number of payload bytes transmitted.
    pub fn transmit(&mut self, data: &str) -> Result<usize> {
        let header = Header::new(Mode::Transmit, 1, data)?;
        self.link.send(header.encode().as_bytes())?;
        debug!(len = data.len(), "transmitted");
        Ok(data.len())
    }

    /// Wait up to `timeout` for one frame.
    ///
    /// Listening with no data is a normal outcome: expiry returns
    /// `Ok(None)`, never an error.
    pub fn receive(&mut self, timeout: Duration) -> Result<Option<String>> {
        Ok(self.link.recv_deadline(timeout)?.map(|frame| frame.text()))
    }

    /// Request/acknowledge exchange for an allow-listed command token.
    ///
    /// Unknown tokens are rejected before any byte reaches the transport.
    /// A command without acknowledgement is abnormal, so unlike a bare
    /// [`receive`](Session::receive) the ack wait surfaces a timeout error.
    pub fn command(&mut self, name: &str) -> Result<String> {
        if !self.config.commands.iter().any(|c| c == name) {
            return Err(SessionError::UnsupportedCommand(name.to_string()));
        }

        self.transmit(name)?;
        match self.receive(self.config.ack_timeout)? {
            Some(ack) => {
                debug!(command = name, %ack, "command acknowledged");
                Ok(ack)
            }
            None => {
                warn!(command = name, "no acknowledgement received");
                Err(SessionError::Timeout(self.config.ack_timeout))
            }
        }
    }

    /// Fire-and-forget beacon: `pulse_count` pairs of station id and status,
    /// paced by the configured pause. No acknowledgement is expected.
    pub fn beacon(&mut self, status: &str, pulse_count: u32) -> Result<()> {
        validate_data(status)?;
        let station_id = self.config.station_id.clone();

        for pulse in 0..pulse_count {
            debug!(pulse, "beacon pulse");
            self.transmit(&station_id)?;
            std::thread::sleep(self.config.beacon_pause);
            self.transmit(status)?;
            std::thread::sleep(self.config.beacon_pause);
        }
        Ok(())
    }

    /// Stream a file as a chunk sequence.
    ///
    /// Announces `len/32 + 1` raw frames with a stream header, sends each
    /// successive 32-byte window (the final window may be empty), then
    /// terminates with the stop token. The pause between chunks is
    /// load-bearing: the receiver drains a bounded buffer. Returns the
    /// number of chunks sent.
    pub fn stream(&mut self, path: &str) -> Result<usize> {
        if path.trim().is_empty() {
            return Err(SessionError::SourceUnreadable {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "blank filename"),
            });
        }
        let content = std::fs::read(path).map_err(|source| SessionError::SourceUnreadable {
            path: path.to_string(),
            source,
        })?;

        let payload_count = content.len() / MAX_DATA_LEN + 1;
        info!(path, bytes = content.len(), chunks = payload_count, "streaming");

        let announce = Header::new(Mode::Stream, payload_count as u32, STREAM_START)?;
        self.link.send(announce.encode().as_bytes())?;

        for index in 0..payload_count {
            let start = index * MAX_DATA_LEN;
            let end = (start + MAX_DATA_LEN).min(content.len());
            self.link.send(&content[start..end])?;
            std::thread::sleep(self.config.chunk_pause);
        }

        let stop = Header::new(Mode::Transmit, 1, STREAM_STOP)?;
        self.link.send(stop.encode().as_bytes())?;
        Ok(payload_count)
    }

    /// Passive receive loop, doubling as an inbound command detector.
    ///
    /// Frames are reduced to their control word (see [`control_word`]) and
    /// dispatched:
    /// - the stop token ends the loop (`Ok(None)`);
    /// - a stream start delegates to a sub-loop appending raw chunks to
    ///   `path` until the stream stop word, then monitoring resumes;
    /// - an allow-listed command token short-circuits the loop
    ///   (`Ok(Some(token))`);
    /// - anything else is logged and ignored.
    pub fn monitor(&mut self, path: &str) -> Result<Option<String>> {
        info!(path, stop_token = %self.config.stop_token, "monitoring");
        loop {
            let Some(payload) = self.receive(self.config.ack_timeout)? else {
                continue;
            };
            let word = control_word(&payload);

            if word == self.config.stop_token {
                info!("stop token received");
                return Ok(None);
            }
            if word == STREAM_START {
                self.receive_stream(path)?;
                continue;
            }
            if self.config.commands.iter().any(|c| *c == word) {
                info!(command = %word, "inbound command detected");
                return Ok(Some(word));
            }
            debug!(frame = %payload, "ignoring unrecognized frame");
        }
    }

    /// Append incoming raw chunks to `path` until the stream stop word.
    fn receive_stream(&mut self, path: &str) -> Result<()> {
        let mut output = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path, "receiving stream");

        loop {
            let Some(payload) = self.receive(self.config.ack_timeout)? else {
                continue;
            };
            if control_word(&payload) == STREAM_STOP {
                output.flush()?;
                debug!(path, "stream complete");
                return Ok(());
            }
            output.write_all(payload.as_bytes())?;
        }
    }
}

impl Session<satlink_transport::SerialStream> {
    /// Open the configured serial port, handshake, and return the session.
    pub fn open_serial(
        serial: &SerialConfig,
        subsystem: &Subsystem,
        device_id: u8,
        config: SessionConfig,
    ) -> Result<Self> {
        let mut link = FramedLink::open_serial(serial)?;
        handshake(&mut link, subsystem, device_id, config.handshake_timeout)?;
        Ok(Self { link, config })
    }
}

/// Reduce a frame payload to its control word: the header data field when
/// the payload parses as a `MODE:COUNT:DATA` header, the raw payload
/// otherwise. Lets the monitor treat `T:1:smile` and a bare `smile`
/// identically, so headered traffic from our own transmit path and raw
/// tokens from simpler firmware both dispatch.
pub fn control_word(payload: &str) -> String {
    match Header::decode(payload) {
        Ok(header) => header.data,
        Err(_) => payload.to_string(),
    }
}
