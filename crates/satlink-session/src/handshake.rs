use std::io::{Read, Write};
use std::time::{Duration, Instant};

use satlink_frame::FramedLink;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Readiness token every microcontroller emits once its UART is up.
pub const READY_SERIAL: &str = "ready: serial";

/// A peripheral device class: its handshake name and legal identity set.
///
/// Shared handshake logic lives here once; concrete devices differ only in
/// their name and which ids the flight harness allows.
#[derive(Debug, Clone)]
pub struct Subsystem {
    name: String,
    legal_ids: Vec<u8>,
}

impl Subsystem {
    /// RF24-class radios: two ends of one link.
    pub fn radio() -> Self {
        Self::custom("radio", [0, 1])
    }

    /// Reaction wheels: one per controlled axis.
    pub fn reaction_wheel() -> Self {
        Self::custom("reactionwheel", [0, 1, 2])
    }

    /// A device class not covered by the stock constructors.
    pub fn custom(name: impl Into<String>, legal_ids: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            legal_ids: legal_ids.into(),
        }
    }

    /// Handshake name, e.g. `radio`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The readiness token this device class emits after identity
    /// assignment, e.g. `ready: radio`.
    pub fn ready_token(&self) -> String {
        format!("ready: {}", self.name)
    }

    /// Check a device id against the legal set for this class.
    pub fn validate_id(&self, id: u8) -> Result<()> {
        if self.legal_ids.contains(&id) {
            Ok(())
        } else {
            Err(SessionError::InvalidIdentity {
                id,
                subsystem: self.name.clone(),
                legal: self.legal_ids.clone(),
            })
        }
    }
}

/// Bring a freshly opened link to identity agreement with the peer.
///
/// Protocol: wait for `ready: serial`, announce our device id as a decimal
/// frame, wait for `ready: <subsystem>`. Each wait is bounded by `timeout`
/// and proceeds with a warning on expiry — the microcontroller may already
/// be past its boot banner when we attach. The identity is validated before
/// any byte is written.
pub fn handshake<T: Read + Write>(
    link: &mut FramedLink<T>,
    subsystem: &Subsystem,
    device_id: u8,
    timeout: Duration,
) -> Result<()> {
    subsystem.validate_id(device_id)?;

    wait_for_token(link, READY_SERIAL, timeout)?;
    link.send(device_id.to_string().as_bytes())?;
    wait_for_token(link, &subsystem.ready_token(), timeout)?;

    debug!(
        subsystem = subsystem.name(),
        device_id, "handshake complete"
    );
    Ok(())
}

/// Discard frames until one contains `token` or the timeout elapses.
///
/// Expiry is non-fatal by design: the protocol proceeds optimistically and
/// leaves retry decisions to the caller.
fn wait_for_token<T: Read + Write>(
    link: &mut FramedLink<T>,
    token: &str,
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(expected = token, "no readiness message received");
            return Ok(());
        }

        match link.recv_deadline(remaining)? {
            Some(frame) => {
                let text = frame.text();
                if text.contains(token) {
                    debug!(token, "peer ready");
                    return Ok(());
                }
                debug!(frame = %text, "discarding frame while waiting for readiness");
            }
            None => {
                warn!(expected = token, "no readiness message received");
                return Ok(());
            }
        }
    }
}
