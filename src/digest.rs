//! Streaming content digests over a closed set of SHA-2 algorithms.
//!
//! Files are consumed in fixed-size chunks, so memory use does not grow with
//! file size, and the result is identical however the underlying reader
//! splits its output.

use crate::cancel::CancellationToken;
use crate::error::{IntegrityError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Size of the read buffer used while streaming.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// How often a timed read wakes up to check for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-256 (32-byte digest)
    #[default]
    Sha256,
    /// SHA-384 (48-byte digest)
    Sha384,
    /// SHA-512 (64-byte digest)
    Sha512,
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha384, Self::Sha512];

    /// Canonical lowercase name as stored in manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == normalized)
            .ok_or_else(|| IntegrityError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Why a hex string could not be turned into a [`Digest`].
#[derive(Debug, Error)]
pub enum DigestParseError {
    /// Not valid hexadecimal.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Valid hex, but the wrong number of bytes for the algorithm.
    #[error("expected {expected} bytes for {algorithm}, found {actual}")]
    WrongLength {
        /// Algorithm the digest was declared with.
        algorithm: Algorithm,
        /// Bytes the algorithm produces.
        expected: usize,
        /// Bytes actually decoded.
        actual: usize,
    },
}

/// A fixed-length content digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    /// Algorithm that produced `bytes`
    algorithm: Algorithm,
    /// Raw digest output
    bytes: Vec<u8>,
}

impl Digest {
    /// Decodes a hex digest, checking its length against `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns an error if `hex_str` is not valid hex or has the wrong length.
    pub fn from_hex(algorithm: Algorithm, hex_str: &str) -> Result<Self, DigestParseError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != algorithm.output_len() {
            return Err(DigestParseError::WrongLength {
                algorithm,
                expected: algorithm.output_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// Algorithm that produced this digest.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex encoding, as stored in manifests.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Failure while streaming a reader through a hash function.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The reader returned an error.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Cancellation was requested between chunks.
    #[error("cancelled")]
    Cancelled,
}

/// Digest engine bound to one algorithm.
///
/// Resolving the algorithm once up front means every file in a scan is hashed
/// by the same concrete function.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    /// Selected algorithm
    algorithm: Algorithm,
}

impl Hasher {
    /// Creates a hasher for `algorithm`.
    #[must_use]
    pub const fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    /// Algorithm this hasher produces.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Digests an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let bytes = match self.algorithm {
            Algorithm::Sha256 => <Sha256 as sha2::Digest>::digest(data).to_vec(),
            Algorithm::Sha384 => <Sha384 as sha2::Digest>::digest(data).to_vec(),
            Algorithm::Sha512 => <Sha512 as sha2::Digest>::digest(data).to_vec(),
        };
        Digest {
            algorithm: self.algorithm,
            bytes,
        }
    }

    /// Streams `reader` to its end and returns the digest.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Io`] if the reader fails and
    /// [`StreamError::Cancelled`] if `cancel` fires between chunks.
    pub fn digest_reader<R: Read>(
        &self,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<Digest, StreamError> {
        let bytes = match self.algorithm {
            Algorithm::Sha256 => stream::<Sha256, R>(reader, cancel)?,
            Algorithm::Sha384 => stream::<Sha384, R>(reader, cancel)?,
            Algorithm::Sha512 => stream::<Sha512, R>(reader, cancel)?,
        };
        Ok(Digest {
            algorithm: self.algorithm,
            bytes,
        })
    }

    /// Opens and digests the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Io`] if the file cannot be opened or read
    /// completely, or [`IntegrityError::Cancelled`].
    pub fn digest_file(&self, path: &Path, cancel: &CancellationToken) -> Result<Digest> {
        let file = File::open(path).map_err(|e| IntegrityError::io(path, e))?;
        self.digest_reader(file, cancel).map_err(|e| match e {
            StreamError::Io(source) => IntegrityError::io(path, source),
            StreamError::Cancelled => IntegrityError::Cancelled,
        })
    }

    /// Digests `path`, giving up after `timeout` if one is set.
    ///
    /// With a timeout the read happens on a helper thread; on expiry the helper
    /// is told to stop at its next chunk boundary and this call returns
    /// immediately, so a read blocked on a hung mount does not hold up the
    /// caller.
    ///
    /// # Errors
    ///
    /// Same as [`digest_file`](Self::digest_file), plus
    /// [`IntegrityError::TimedOut`].
    pub fn digest_file_with_timeout(
        &self,
        path: &Path,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Digest> {
        let Some(timeout) = timeout else {
            return self.digest_file(path, cancel);
        };

        let abandon = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        let hasher = *self;
        let owned_path = path.to_path_buf();
        let worker_abandon = abandon.clone();

        thread::Builder::new()
            .name("hashguard-read".to_string())
            .spawn(move || {
                // Receiver is gone if the caller already timed out
                let _ = tx.send(hasher.digest_file(&owned_path, &worker_abandon));
            })
            .map_err(|e| IntegrityError::io(path, e))?;

        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                abandon.cancel();
                return Err(IntegrityError::TimedOut {
                    path: path.to_path_buf(),
                    after: timeout,
                });
            }

            match rx.recv_timeout((deadline - now).min(POLL_INTERVAL)) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        abandon.cancel();
                        return Err(IntegrityError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(IntegrityError::io(
                        path,
                        io::Error::other("reader thread exited without a result"),
                    ));
                }
            }
        }
    }
}

/// Feeds `reader` through `D` in [`CHUNK_SIZE`] pieces.
fn stream<D: sha2::Digest, R: Read>(
    mut reader: R,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, StreamError> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(hasher.finalize().to_vec())
}
