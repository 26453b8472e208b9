//! SSH public key validation.
//!
//! Parses one `authorized_keys`-style line (`type payload [comment]`) and
//! rejects anything that sshd would not accept as a plain public key entry.
//! Options prefixes (`command="..." ssh-ed25519 ...`) are not supported.

use std::fmt;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Supported public key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    Ed25519,
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
}

impl KeyType {
    /// All supported types, in the order they are usually listed.
    pub const ALL: [KeyType; 5] = [
        KeyType::Rsa,
        KeyType::Ed25519,
        KeyType::EcdsaP256,
        KeyType::EcdsaP384,
        KeyType::EcdsaP521,
    ];

    /// Parse the algorithm name used in key files.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Algorithm name as written in key files.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Rsa => "ssh-rsa",
            KeyType::Ed25519 => "ssh-ed25519",
            KeyType::EcdsaP256 => "ecdsa-sha2-nistp256",
            KeyType::EcdsaP384 => "ecdsa-sha2-nistp384",
            KeyType::EcdsaP521 => "ecdsa-sha2-nistp521",
        }
    }

    /// Smallest decoded blob that can hold a key of this type.
    ///
    /// Each blob is a sequence of length-prefixed fields: the type name, then
    /// the key parameters. ECDSA carries a curve name and an uncompressed
    /// point; RSA carries `e` and `n` (1024-bit floor).
    pub fn min_blob_len(self) -> usize {
        match self {
            KeyType::Ed25519 => 4 + 11 + 4 + 32,
            KeyType::EcdsaP256 => 4 + 19 + 4 + 8 + 4 + 65,
            KeyType::EcdsaP384 => 4 + 19 + 4 + 8 + 4 + 97,
            KeyType::EcdsaP521 => 4 + 19 + 4 + 8 + 4 + 133,
            KeyType::Rsa => 4 + 7 + 4 + 1 + 4 + 128,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    key_type: KeyType,
    payload: String,
    blob: Vec<u8>,
    comment: Option<String>,
}

impl ParsedKey {
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Base64 payload exactly as it appeared in the source line.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Canonical single-line form: `type payload[ comment]`.
    pub fn to_line(&self) -> String {
        match &self.comment {
            Some(comment) => format!("{} {} {}", self.key_type, self.payload, comment),
            None => format!("{} {}", self.key_type, self.payload),
        }
    }

    /// OpenSSH-style fingerprint, e.g. `SHA256:L98M7/3E...`.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.blob);
        format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
    }
}

impl fmt::Display for ParsedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Validate a single public key line.
///
/// # Errors
///
/// - `ValidationError::Empty` if the line is blank
/// - `ValidationError::UnsupportedType` if the algorithm is not supported
/// - `ValidationError::MalformedPayload` if the payload is missing, not
///   base64, too short for its type, or declares a different type internally
pub fn validate(raw: &str) -> Result<ParsedKey, ValidationError> {
    let line = raw.trim();
    if line.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut tokens = line.split_whitespace();
    let type_name = tokens.next().ok_or(ValidationError::Empty)?;
    let key_type = KeyType::from_name(type_name)
        .ok_or_else(|| ValidationError::UnsupportedType(type_name.to_string()))?;

    let payload = tokens
        .next()
        .ok_or_else(|| ValidationError::MalformedPayload("missing payload".to_string()))?;

    let blob = STANDARD
        .decode(payload)
        .map_err(|e| ValidationError::MalformedPayload(format!("invalid base64: {}", e)))?;

    if blob.len() < key_type.min_blob_len() {
        return Err(ValidationError::MalformedPayload(format!(
            "{} bytes is too short for {} (need at least {})",
            blob.len(),
            key_type,
            key_type.min_blob_len()
        )));
    }

    match embedded_type(&blob) {
        Some(name) if name == key_type.as_str().as_bytes() => {}
        Some(name) => {
            return Err(ValidationError::MalformedPayload(format!(
                "payload is a {} key, declared as {}",
                String::from_utf8_lossy(name),
                key_type
            )))
        }
        None => {
            return Err(ValidationError::MalformedPayload(
                "payload has no key type header".to_string(),
            ))
        }
    }

    let comment: Vec<&str> = tokens.collect();
    let comment = if comment.is_empty() {
        None
    } else {
        Some(comment.join(" "))
    };

    Ok(ParsedKey {
        key_type,
        payload: payload.to_string(),
        blob,
        comment,
    })
}

/// Read the leading length-prefixed type name from a key blob.
fn embedded_type(blob: &[u8]) -> Option<&[u8]> {
    let len_bytes: [u8; 4] = blob.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    blob.get(4..4usize.checked_add(len)?)
}
