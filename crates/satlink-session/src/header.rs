use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SessionError};

/// Per-message payload ceiling, dictated by the transceiver hardware.
pub const MAX_DATA_LEN: usize = 32;

/// Usage pattern announced by a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A single self-contained message.
    Transmit,
    /// Announces a sequence of raw data frames to follow.
    Stream,
    /// Requests data from the peer.
    Receive,
}

impl Mode {
    /// One-letter wire token.
    pub fn token(self) -> &'static str {
        match self {
            Mode::Transmit => "T",
            Mode::Stream => "S",
            Mode::Receive => "R",
        }
    }
}

impl FromStr for Mode {
    type Err = SessionError;

    /// Case-insensitive; accepts the wire token or the full word.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "transmit" => Ok(Mode::Transmit),
            "s" | "stream" => Ok(Mode::Stream),
            "r" | "receive" => Ok(Mode::Receive),
            _ => Err(SessionError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The `MODE:COUNT:DATA` triple carried inside a single frame.
///
/// `count` is the number of raw data frames following a [`Mode::Stream`]
/// header; for other modes it is 1. Constructed per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub mode: Mode,
    pub count: u32,
    pub data: String,
}

impl Header {
    /// Build a header, validating the data field against the payload ceiling.
    pub fn new(mode: Mode, count: u32, data: impl Into<String>) -> Result<Self> {
        let data = data.into();
        validate_data(&data)?;
        Ok(Self { mode, count, data })
    }

    /// Render the wire form, e.g. `T:1:hello`.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.mode.token(), self.count, self.data)
    }

    /// Parse the wire form.
    ///
    /// Splits on the first two `:` only; the data field may itself contain
    /// colons. Rejects missing fields, unknown modes, non-numeric counts,
    /// and data outside the payload ceiling.
    pub fn decode(raw: &str) -> Result<Self> {
        let mut fields = raw.splitn(3, ':');
        let (mode, count, data) = match (fields.next(), fields.next(), fields.next()) {
            (Some(mode), Some(count), Some(data)) => (mode, count, data),
            _ => return Err(SessionError::MalformedHeader(raw.to_string())),
        };

        let mode = mode.parse::<Mode>()?;
        let count = count
            .trim()
            .parse::<u32>()
            .map_err(|_| SessionError::MalformedHeader(raw.to_string()))?;
        validate_data(data)?;

        Ok(Self {
            mode,
            count,
            data: data.to_string(),
        })
    }
}

/// Reject empty data and data beyond the transceiver ceiling.
pub fn validate_data(data: &str) -> Result<()> {
    if data.is_empty() || data.len() > MAX_DATA_LEN {
        return Err(SessionError::InvalidPayload { len: data.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_renders_wire_form() {
        let header = Header::new(Mode::Transmit, 1, "hello").unwrap();
        assert_eq!(header.encode(), "T:1:hello");

        let header = Header::new(Mode::Stream, 12, "receive_stream").unwrap();
        assert_eq!(header.encode(), "S:12:receive_stream");
    }

    #[test]
    fn roundtrip_all_modes() {
        for mode in [Mode::Transmit, Mode::Stream, Mode::Receive] {
            let header = Header::new(mode, 7, "payload:with:colons").unwrap();
            let decoded = Header::decode(&header.encode()).unwrap();
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn mode_parse_accepts_token_and_word_any_case() {
        assert_eq!("T".parse::<Mode>().unwrap(), Mode::Transmit);
        assert_eq!("transmit".parse::<Mode>().unwrap(), Mode::Transmit);
        assert_eq!("Stream".parse::<Mode>().unwrap(), Mode::Stream);
        assert_eq!("s".parse::<Mode>().unwrap(), Mode::Stream);
        assert_eq!("RECEIVE".parse::<Mode>().unwrap(), Mode::Receive);
        assert_eq!("r".parse::<Mode>().unwrap(), Mode::Receive);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "broadcast".parse::<Mode>().unwrap_err();
        assert!(matches!(err, SessionError::InvalidMode(_)));

        let err = Header::decode("X:1:data").unwrap_err();
        assert!(matches!(err, SessionError::InvalidMode(_)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        for raw in ["", "T", "T:1", "just some text"] {
            let err = Header::decode(raw).unwrap_err();
            assert!(matches!(err, SessionError::MalformedHeader(_)), "{raw:?}");
        }
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let err = Header::decode("T:one:data").unwrap_err();
        assert!(matches!(err, SessionError::MalformedHeader(_)));
    }

    #[test]
    fn empty_data_is_rejected() {
        let err = Header::new(Mode::Transmit, 1, "").unwrap_err();
        assert!(matches!(err, SessionError::InvalidPayload { len: 0 }));

        let err = Header::decode("T:1:").unwrap_err();
        assert!(matches!(err, SessionError::InvalidPayload { len: 0 }));
    }

    #[test]
    fn oversized_data_is_rejected() {
        let long = "x".repeat(MAX_DATA_LEN + 1);
        let err = Header::new(Mode::Transmit, 1, long.as_str()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPayload { len: 33 }));
    }

    #[test]
    fn data_at_ceiling_is_accepted() {
        let exact = "y".repeat(MAX_DATA_LEN);
        let header = Header::new(Mode::Transmit, 1, exact.as_str()).unwrap();
        assert_eq!(Header::decode(&header.encode()).unwrap(), header);
    }
}
