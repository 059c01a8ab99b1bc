//! Stored Item Module
//!
//! Payloads are persisted with a short format tag in front of the body so the
//! format survives any storage engine unchanged.

use bytes::{BufMut, Bytes, BytesMut};

/// Declared format of a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    Json,
    Xml,
    /// Unknown or missing format tag
    Invalid,
}

impl PayloadFormat {
    const JSON_TAG: &'static [u8] = b"json";
    const XML_TAG: &'static [u8] = b"xml";

    /// Parses the `type` field of a put request.
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "json" => PayloadFormat::Json,
            "xml" => PayloadFormat::Xml,
            _ => PayloadFormat::Invalid,
        }
    }

    /// Reads the format tag at the front of an encoded payload.
    pub fn from_payload(payload: &[u8]) -> Self {
        if payload.starts_with(Self::JSON_TAG) {
            PayloadFormat::Json
        } else if payload.starts_with(Self::XML_TAG) {
            PayloadFormat::Xml
        } else {
            PayloadFormat::Invalid
        }
    }

    fn tag(&self) -> &'static [u8] {
        match self {
            PayloadFormat::Json => Self::JSON_TAG,
            PayloadFormat::Xml => Self::XML_TAG,
            PayloadFormat::Invalid => b"",
        }
    }

    /// Length of the tag in front of an encoded payload of this format.
    pub fn tag_len(&self) -> usize {
        self.tag().len()
    }

    /// HTTP content type used when serving the payload back.
    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "application/json",
            PayloadFormat::Xml => "application/xml",
            PayloadFormat::Invalid => "application/octet-stream",
        }
    }
}

// == Stored Item ==
/// One value headed for (or read back from) a storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub key: String,
    pub payload: Bytes,
    pub format: PayloadFormat,
    pub ttl_seconds: u64,
}

impl StoredItem {
    pub fn new(
        key: impl Into<String>,
        payload: Bytes,
        format: PayloadFormat,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            key: key.into(),
            payload,
            format,
            ttl_seconds,
        }
    }

    /// Encodes the payload as `<tag><body>` for storage.
    pub fn encode(&self) -> Bytes {
        let tag = self.format.tag();
        let mut buf = BytesMut::with_capacity(tag.len() + self.payload.len());
        buf.put_slice(tag);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decodes a stored value. Returns `None` when the tag is unknown.
    pub fn decode(key: impl Into<String>, stored: Bytes) -> Option<Self> {
        let format = PayloadFormat::from_payload(&stored);
        if format == PayloadFormat::Invalid {
            return None;
        }
        let payload = stored.slice(format.tag_len()..);
        Some(Self::new(key, payload, format, 0))
    }
}
