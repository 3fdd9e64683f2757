//! Response framing.
//!
//! `ALG:<label>|TIME_MS:<x.xx>|SIG:<hex>|PK:<hex>`: ASCII, lowercase hex with two
//! characters per byte and no separators. Requests are raw bytes with no framing.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::crypto::AlgorithmId;
use crate::errors::ProtocolError;

/// Response built by a session right before it is written out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedResponse<'a> {
    pub algorithm: AlgorithmId,
    pub latency_ms: f32,
    pub signature: &'a [u8],
    pub public_key: &'a [u8],
}

impl SignedResponse<'_> {
    pub fn encode(&self) -> String {
        let label = self.algorithm.label();
        let mut out = String::with_capacity(
            label.len() + 32 + 2 * (self.signature.len() + self.public_key.len()),
        );
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "ALG:{}|TIME_MS:{:.2}|SIG:{}|PK:{}",
            label,
            self.latency_ms,
            hex::encode(self.signature),
            hex::encode(self.public_key)
        );
        out
    }
}

/// Decoded response as seen by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub algorithm: AlgorithmId,
    /// Label exactly as received.
    pub label: String,
    /// Missing in frames from older firmware.
    pub latency_ms: Option<f32>,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, ProtocolError> {
    hex::decode(value).map_err(|e| ProtocolError::InvalidHex { field, reason: e.to_string() })
}

/// Parse a response frame. Fields are split on `|` and on the first `:` of each part;
/// unknown labels are resolved by public key length.
pub fn parse_response(text: &str) -> Result<ParsedResponse, ProtocolError> {
    let fields: HashMap<&str, &str> = text
        .trim()
        .split('|')
        .filter_map(|part| part.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let label = *fields.get("ALG").ok_or(ProtocolError::MissingField("ALG"))?;
    let signature = decode_hex("SIG", fields.get("SIG").ok_or(ProtocolError::MissingField("SIG"))?)?;
    let public_key = decode_hex("PK", fields.get("PK").ok_or(ProtocolError::MissingField("PK"))?)?;
    let latency_ms = fields
        .get("TIME_MS")
        .map(|v| {
            v.parse::<f32>()
                .ok()
                .filter(|ms| ms.is_finite())
                .ok_or_else(|| ProtocolError::InvalidLatency(v.to_string()))
        })
        .transpose()?;
    let algorithm = AlgorithmId::from_label(label)
        .or_else(|| AlgorithmId::from_public_key_len(public_key.len()))
        .ok_or_else(|| ProtocolError::UnknownAlgorithm(label.to_string()))?;

    Ok(ParsedResponse { algorithm, label: label.to_string(), latency_ms, signature, public_key })
}
