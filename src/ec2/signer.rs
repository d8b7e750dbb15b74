use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{CheckError, Result};

/// Query API parameters, kept sorted by name
pub type RequestParameters = BTreeMap<String, String>;

/// HMAC digests accepted by Signature Version 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    Sha1,
    #[default]
    Sha256,
}

impl SignatureAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }

    /// Value of the `SignatureMethod` request parameter
    pub fn signature_method(self) -> String {
        format!("Hmac{}", self.name())
    }

    fn hmac(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key)
                    .map_err(|e| CheckError::Signing(e.to_string()))?;
                mac.update(message);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Self::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key)
                    .map_err(|e| CheckError::Signing(e.to_string()))?;
                mac.update(message);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CheckError;

    /// Accepts `SHA256`, `sha1`, `HmacSHA256` and similar spellings
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        let digest = normalized.strip_prefix("HMAC").unwrap_or(&normalized);

        match digest {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            _ => Err(CheckError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Signs EC2 query requests for one host
#[derive(Clone)]
pub struct RequestSigner {
    secret_key: String,
    host: String,
    algorithm: SignatureAlgorithm,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret_key", &"<redacted>")
            .field("host", &self.host)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl RequestSigner {
    pub fn new(
        secret_key: impl Into<String>,
        host: impl Into<String>,
        algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            host: host.into(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// `POST`, host and path on their own lines, followed by the canonical query
    pub fn string_to_sign(&self, params: &RequestParameters) -> String {
        format!("POST\n{}\n/\n{}", self.host, canonical_query_string(params))
    }

    /// Base64 HMAC of the string to sign, without any line breaks
    pub fn sign(&self, params: &RequestParameters) -> Result<String> {
        let string_to_sign = self.string_to_sign(params);
        let digest = self
            .algorithm
            .hmac(self.secret_key.as_bytes(), string_to_sign.as_bytes())?;

        Ok(BASE64.encode(digest))
    }
}

/// Percent-encoded `key=value` pairs joined with `&`, in key order
pub fn canonical_query_string(params: &RequestParameters) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
