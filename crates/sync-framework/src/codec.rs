//! # Envelope Codec
//!
//! JSON encoding helpers plus the two traits that plug domain types into the
//! generic loops: [`Outbound`] for records a publisher sends and
//! [`EventHandler`] for events a consumer applies.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(payload).map_err(CodecError::Decode)
}

/// A record that can be queued for publication.
pub trait Outbound: Debug + Send + 'static {
    type Key: Display + Send;

    /// Identifier used in log lines.
    fn key(&self) -> Self::Key;

    fn encode(&self) -> Result<Vec<u8>, CodecError>;
}

/// Decodes and applies one kind of inbound event.
pub trait EventHandler: Send + Sync + 'static {
    type Event: Debug + Send;
    type Error: std::error::Error + Send + Sync + 'static;

    fn decode(&self, payload: &[u8]) -> Result<Self::Event, CodecError>;

    fn apply(&self, event: Self::Event) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Ping {
        sequence_no: u32,
    }

    #[test]
    fn encodes_camel_case_json() {
        let bytes = encode(&Ping { sequence_no: 4 }).unwrap();
        assert_eq!(bytes, br#"{"sequenceNo":4}"#);
    }

    #[test]
    fn decode_reports_malformed_payload() {
        let err = decode::<Ping>(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
