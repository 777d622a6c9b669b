//! Content digests.
//!
//! A digest has the form `<algorithm>:<hex>`. Only registered algorithms are
//! accepted and the hex part must have exactly the algorithm's output length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};

use crate::error::{Error, Result};

/// A registered hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    /// SHA-256, the canonical algorithm.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl Algorithm {
    /// SHA-256.
    pub const SHA256: Self = Self::Sha256;

    /// SHA-512.
    pub const SHA512: Self = Self::Sha512;

    /// Algorithm used whenever a digest cannot be parsed.
    pub const CANONICAL: Self = Self::Sha256;

    /// Returns the algorithm name as it appears in a digest.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Returns the length of the hex-encoded hash.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Hashes `data` and returns the digest.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Digest {
        let encoded = match self {
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
        };
        Digest {
            algorithm: self,
            encoded,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(Error::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

/// A validated content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: Algorithm,
    encoded: String,
}

impl Digest {
    /// Parses and validates a digest string.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_core::{Algorithm, Digest};
    ///
    /// let digest = Digest::parse(
    ///     "sha256:44752f37272e944fd2c913a35342eaccdd1aaf189bae50676b301ab213fc5061",
    /// ).unwrap();
    /// assert_eq!(digest.algorithm(), Algorithm::Sha256);
    ///
    /// assert!(Digest::parse("sha512:1234").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDigest`] if the separator is missing, the
    /// algorithm is not registered, or the hex part is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDigest {
            digest: input.to_string(),
            reason: reason.to_string(),
        };

        let (algo, encoded) = input
            .split_once(':')
            .ok_or_else(|| invalid("missing algorithm separator"))?;

        let algorithm = algo
            .parse::<Algorithm>()
            .map_err(|_| invalid("unsupported algorithm"))?;

        if encoded.len() != algorithm.hex_len() {
            return Err(invalid("invalid hash length"));
        }
        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid("invalid hex encoding"));
        }

        Ok(Self {
            algorithm,
            encoded: encoded.to_string(),
        })
    }

    /// Computes the digest of `data`.
    #[must_use]
    pub fn from_bytes(algorithm: Algorithm, data: &[u8]) -> Self {
        algorithm.digest(data)
    }

    /// Returns the hash algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the hex-encoded hash without the algorithm prefix.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Returns true when `data` hashes to this digest.
    #[must_use]
    pub fn verify(&self, data: &[u8]) -> bool {
        self.algorithm.digest(data) == *self
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_SHA256: &str =
        "sha256:44752f37272e944fd2c913a35342eaccdd1aaf189bae50676b301ab213fc5061";

    #[test]
    fn test_parse_sha256() {
        let digest = Digest::parse(EXAMPLE_SHA256).unwrap();
        assert_eq!(digest.algorithm(), Algorithm::Sha256);
        assert_eq!(digest.encoded().len(), 64);
        assert_eq!(digest.to_string(), EXAMPLE_SHA256);
    }

    #[test]
    fn test_from_bytes_matches_known_value() {
        let digest = Digest::from_bytes(Algorithm::Sha256, b"example data");
        assert_eq!(digest.to_string(), EXAMPLE_SHA256);
        assert!(digest.verify(b"example data"));
        assert!(!digest.verify(b"other data"));
    }

    #[test]
    fn test_from_bytes_sha512() {
        let digest = Digest::from_bytes(Algorithm::Sha512, b"example data");
        assert_eq!(digest.algorithm(), Algorithm::Sha512);
        assert_eq!(digest.encoded().len(), 128);
        assert_eq!(Digest::parse(&digest.to_string()).unwrap(), digest);
    }

    #[test]
    fn test_parse_rejects_short_hash() {
        let err = Digest::parse("sha512:1234").unwrap_err();
        assert!(matches!(err, Error::InvalidDigest { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(Digest::parse("unknown").is_err());
        assert!(Digest::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let err = Digest::parse("sha123:123412341234").unwrap_err();
        assert!(err.to_string().contains("unsupported algorithm"));
    }

    #[test]
    fn test_parse_rejects_uppercase_hex() {
        let upper = EXAMPLE_SHA256.to_uppercase().replace("SHA256", "sha256");
        assert!(Digest::parse(&upper).is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("sha256".parse::<Algorithm>().unwrap(), Algorithm::SHA256);
        assert_eq!("sha512".parse::<Algorithm>().unwrap(), Algorithm::SHA512);
        assert!(matches!(
            "invalid".parse::<Algorithm>(),
            Err(Error::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_digest_serde() {
        let json = format!("\"{EXAMPLE_SHA256}\"");
        let digest: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&digest).unwrap(), json);
        assert!(serde_json::from_str::<Digest>("\"sha256:abc\"").is_err());
    }
}
