//! Asset codec.
//!
//! Binary attachments (cover images, thumbnails, PDFs) are stored inline in
//! the record as a data URL, `data:<mime>;base64,<payload>`. The encoded form
//! doubles as the display URL, and it decodes back to the exact input bytes.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AssetError, Error, InvalidInputError};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Accepted MIME types and the size ceiling for one collection's assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPolicy {
    allowed_types: Vec<String>,
    max_bytes: u64,
}

impl AssetPolicy {
    /// A policy accepting exactly the given types.
    pub fn new<I, S>(allowed_types: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| normalize_mime(t.as_ref()))
                .collect(),
            max_bytes,
        }
    }

    /// JPEG, PNG and SVG images.
    pub fn images(max_bytes: u64) -> Self {
        Self::new(["image/jpeg", "image/png", "image/svg+xml"], max_bytes)
    }

    /// Also accept `mime`.
    pub fn allowing(mut self, mime: &str) -> Self {
        let mime = normalize_mime(mime);
        if !self.allowed_types.contains(&mime) {
            self.allowed_types.push(mime);
        }
        self
    }

    /// Tighten the size ceiling to `ceiling` if it is lower.
    pub fn capped_at(mut self, ceiling: Option<u64>) -> Self {
        if let Some(ceiling) = ceiling {
            self.max_bytes = self.max_bytes.min(ceiling);
        }
        self
    }

    /// Whether `mime` (after normalization) is accepted.
    pub fn allows(&self, mime: &str) -> bool {
        let mime = normalize_mime(mime);
        self.allowed_types.iter().any(|t| *t == mime)
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check an input against this policy. The type is checked first.
    pub fn check(&self, mime: &str, size: u64) -> Result<(), AssetError> {
        if !self.allows(mime) {
            return Err(AssetError::UnsupportedType {
                mime: normalize_mime(mime),
            });
        }
        if size > self.max_bytes {
            return Err(AssetError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// An asset stored in textual form.
///
/// Always a well-formed `data:<mime>;base64,<payload>` URL. The payload
/// alphabet is only checked when decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset(String);

impl EncodedAsset {
    /// Wrap an existing data URL.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        Self::validate(&url)?;
        Ok(Self(url))
    }

    /// The MIME type recorded in the URL.
    pub fn mime(&self) -> &str {
        let rest = &self.0[DATA_PREFIX.len()..];
        // Shape validated at construction.
        let end = rest.find(BASE64_MARKER).unwrap_or(rest.len());
        &rest[..end]
    }

    /// The base64 payload.
    pub fn payload(&self) -> &str {
        match self.0.find(BASE64_MARKER) {
            Some(idx) => &self.0[idx + BASE64_MARKER.len()..],
            None => "",
        }
    }

    /// The URL, usable directly as an image or link source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Size of the decoded bytes, computed from the payload length.
    pub fn decoded_len(&self) -> usize {
        let payload = self.payload().as_bytes();
        let padding = payload.iter().rev().take_while(|b| **b == b'=').count();
        (payload.len() / 4 * 3).saturating_sub(padding)
    }

    fn validate(url: &str) -> Result<(), Error> {
        let invalid = |reason: &str| {
            Error::InvalidInput(InvalidInputError::EncodedAsset {
                reason: reason.to_string(),
            })
        };

        let rest = url
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| invalid("must start with 'data:'"))?;
        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| invalid("must contain ';base64,'"))?;

        let mime = &rest[..marker];
        if mime.is_empty() || !mime.contains('/') {
            return Err(invalid("missing MIME type"));
        }
        if mime != normalize_mime(mime) {
            return Err(invalid("MIME type is not normalized"));
        }
        Ok(())
    }
}

impl fmt::Display for EncodedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EncodedAsset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EncodedAsset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url = String::deserialize(deserializer)?;
        EncodedAsset::new(url).map_err(serde::de::Error::custom)
    }
}

/// An uploaded file before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsset {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl RawAsset {
    pub fn new(bytes: Vec<u8>, mime: &str) -> Self {
        Self {
            bytes,
            mime: normalize_mime(mime),
        }
    }

    /// Read a file, inferring the MIME type from its extension.
    ///
    /// Unknown extensions are reported as `application/octet-stream` and
    /// left for the collection's policy to reject.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("cannot read asset {}: {e}", path.display()),
            })
        })?;
        let mime = mime_from_path(path).unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, mime))
    }

    /// Validate against `policy` and encode.
    pub fn encode(&self, policy: &AssetPolicy) -> Result<EncodedAsset, Error> {
        encode(&self.bytes, &self.mime, policy)
    }
}

/// A decoded asset, ready to be written out or served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryHandle {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encode `bytes` as a data URL.
///
/// The declared type is checked before the size, and both before any
/// encoding work.
pub fn encode(
    bytes: &[u8],
    declared_mime: &str,
    policy: &AssetPolicy,
) -> Result<EncodedAsset, Error> {
    let mime = normalize_mime(declared_mime);
    policy.check(&mime, bytes.len() as u64)?;

    let payload = BASE64.encode(bytes);
    let mut url = String::with_capacity(
        DATA_PREFIX.len() + mime.len() + BASE64_MARKER.len() + payload.len(),
    );
    url.push_str(DATA_PREFIX);
    url.push_str(&mime);
    url.push_str(BASE64_MARKER);
    url.push_str(&payload);
    Ok(EncodedAsset(url))
}

/// Reconstruct the binary file from its encoded form.
pub fn decode(encoded: &EncodedAsset, filename: impl Into<String>) -> Result<BinaryHandle, Error> {
    let bytes = BASE64.decode(encoded.payload()).map_err(|e| {
        Error::InvalidInput(InvalidInputError::EncodedAsset {
            reason: format!("malformed base64 payload: {e}"),
        })
    })?;

    Ok(BinaryHandle {
        filename: filename.into(),
        mime: encoded.mime().to_string(),
        bytes,
    })
}

/// Lowercase, strip parameters, map legacy aliases.
pub fn normalize_mime(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/svg" => "image/svg+xml".to_string(),
        _ => essence,
    }
}

/// Guess a MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// A file extension for a MIME type, used when exporting assets.
pub fn extension_for(mime: &str) -> &'static str {
    match normalize_mime(mime).as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/svg+xml" => "svg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

    #[test]
    fn encode_decode_preserves_bytes() {
        let policy = AssetPolicy::images(1024);
        let encoded = encode(PNG, "image/png", &policy).unwrap();
        assert!(encoded.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(encoded.mime(), "image/png");
        assert_eq!(encoded.decoded_len(), PNG.len());

        let handle = decode(&encoded, "cover.png").unwrap();
        assert_eq!(handle.bytes, PNG);
        assert_eq!(handle.mime, "image/png");
        assert_eq!(handle.filename, "cover.png");
    }

    #[test]
    fn empty_input_round_trips() {
        let encoded = encode(&[], "image/jpeg", &AssetPolicy::images(10)).unwrap();
        assert_eq!(encoded.as_str(), "data:image/jpeg;base64,");
        assert!(decode(&encoded, "x").unwrap().bytes.is_empty());
    }

    #[test]
    fn declared_type_is_normalized() {
        let policy = AssetPolicy::images(1024);
        let encoded = encode(PNG, "IMAGE/JPG; charset=binary", &policy).unwrap();
        assert_eq!(encoded.mime(), "image/jpeg");
    }

    #[test]
    fn unsupported_type_checked_before_size() {
        let policy = AssetPolicy::images(4);
        let err = encode(PNG, "application/pdf", &policy).unwrap_err();
        assert!(matches!(
            err,
            Error::Asset(AssetError::UnsupportedType { ref mime }) if mime == "application/pdf"
        ));
    }

    #[test]
    fn too_large_is_rejected() {
        let policy = AssetPolicy::images(4);
        let err = encode(PNG, "image/png", &policy).unwrap_err();
        assert!(matches!(
            err,
            Error::Asset(AssetError::TooLarge { size: 10, limit: 4 })
        ));
    }

    #[test]
    fn ceiling_only_tightens() {
        let policy = AssetPolicy::images(100).capped_at(Some(10));
        assert_eq!(policy.max_bytes(), 10);
        let policy = AssetPolicy::images(100).capped_at(Some(1000));
        assert_eq!(policy.max_bytes(), 100);
        let policy = AssetPolicy::images(100).capped_at(None);
        assert_eq!(policy.max_bytes(), 100);
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(EncodedAsset::new("http://example.com/a.png").is_err());
        assert!(EncodedAsset::new("data:image/png,abc").is_err());
        assert!(EncodedAsset::new("data:;base64,abc").is_err());
        assert!(EncodedAsset::new("data:Image/PNG;base64,abc").is_err());
        assert!(EncodedAsset::new("data:image/png;base64,iVBO").is_ok());
    }

    #[test]
    fn malformed_payload_fails_on_decode() {
        let encoded = EncodedAsset::new("data:image/png;base64,@@@").unwrap();
        let err = decode(&encoded, "x.png").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInputError::EncodedAsset { .. })
        ));
    }

    #[test]
    fn deserialize_validates_shape() {
        let ok: EncodedAsset =
            serde_json::from_str(r#""data:application/pdf;base64,JVBE""#).unwrap();
        assert_eq!(ok.mime(), "application/pdf");
        assert!(serde_json::from_str::<EncodedAsset>(r#""not a url""#).is_err());
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(mime_from_path(Path::new("a/B.JPG")), Some("image/jpeg"));
        assert_eq!(mime_from_path(Path::new("issue.pdf")), Some("application/pdf"));
        assert_eq!(mime_from_path(Path::new("logo.svg")), Some("image/svg+xml"));
        assert_eq!(mime_from_path(Path::new("noext")), None);
        assert_eq!(extension_for("image/jpg"), "jpg");
    }
}
