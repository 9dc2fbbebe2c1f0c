//! Length-prefixed framing for ordered sets of binary blobs.
//!
//! ```text
//! ┌──────────────┬──────────────┬─────┬──────────────┬──────────────────────┐
//! │ count: u64le │ len[0]: u64le│ ... │ len[N-1]     │ blob[0] .. blob[N-1] │
//! └──────────────┴──────────────┴─────┴──────────────┴──────────────────────┘
//! ```
//!
//! Every declared length is checked against [`FrameLimits`] and against the
//! bytes actually available before anything is allocated for it. A short
//! stream is always [`FunctionClientError::TruncatedStream`], never a partial
//! result.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{FunctionClientError, Result};

/// Width of the count field and of every length field.
pub const LEN_FIELD: usize = 8;

// ─── FrameLimits ──────────────────────────────────────────────────────────

/// Upper bounds applied while decoding, before any allocation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLimits {
    #[serde(default = "default_max_blob_count")]
    pub max_blob_count: u64,
    #[serde(default = "default_max_blob_len")]
    pub max_blob_len: u64,
    #[serde(default = "default_max_total_len")]
    pub max_total_len: u64,
}

fn default_max_blob_count() -> u64 {
    65_536
}

fn default_max_blob_len() -> u64 {
    64 * 1024 * 1024
}

fn default_max_total_len() -> u64 {
    256 * 1024 * 1024
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_blob_count: default_max_blob_count(),
            max_blob_len: default_max_blob_len(),
            max_total_len: default_max_total_len(),
        }
    }
}

impl FrameLimits {
    /// No limits beyond what the address space allows.
    pub fn unbounded() -> Self {
        Self {
            max_blob_count: u64::MAX,
            max_blob_len: u64::MAX,
            max_total_len: u64::MAX,
        }
    }

    fn check_count(&self, count: u64) -> Result<usize> {
        if count > self.max_blob_count {
            return Err(FunctionClientError::LimitExceeded {
                what: "blob count",
                declared: count,
                limit: self.max_blob_count,
            });
        }
        to_usize("blob count", count)
    }

    /// Validates every declared length and returns the payload size.
    fn check_lengths(&self, lens: &[u64]) -> Result<usize> {
        let mut total: u64 = 0;
        for &len in lens {
            if len > self.max_blob_len {
                return Err(FunctionClientError::LimitExceeded {
                    what: "blob length",
                    declared: len,
                    limit: self.max_blob_len,
                });
            }
            total = total
                .checked_add(len)
                .ok_or(FunctionClientError::LimitExceeded {
                    what: "payload length",
                    declared: u64::MAX,
                    limit: self.max_total_len,
                })?;
        }
        if total > self.max_total_len {
            return Err(FunctionClientError::LimitExceeded {
                what: "payload length",
                declared: total,
                limit: self.max_total_len,
            });
        }
        to_usize("payload length", total)
    }
}

fn to_usize(what: &'static str, value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| FunctionClientError::LimitExceeded {
        what,
        declared: value,
        limit: usize::MAX as u64,
    })
}

// ─── Encode ───────────────────────────────────────────────────────────────

/// Number of bytes [`encode`] produces for `blobs`.
pub fn encoded_len<B: AsRef<[u8]>>(blobs: &[B]) -> usize {
    LEN_FIELD * (1 + blobs.len()) + blobs.iter().map(|b| b.as_ref().len()).sum::<usize>()
}

/// Packs `blobs` into a single frame.
pub fn encode<B: AsRef<[u8]>>(blobs: &[B]) -> Bytes {
    let mut out = BytesMut::with_capacity(encoded_len(blobs));
    out.put_u64_le(blobs.len() as u64);
    for blob in blobs {
        out.put_u64_le(blob.as_ref().len() as u64);
    }
    for blob in blobs {
        out.put_slice(blob.as_ref());
    }
    out.freeze()
}

// ─── Decode ───────────────────────────────────────────────────────────────

/// Decodes a complete frame held in memory using [`FrameLimits::default`].
pub fn decode(frame: &[u8]) -> Result<Vec<Bytes>> {
    decode_with(frame, &FrameLimits::default())
}

/// Decodes a complete frame held in memory.
///
/// The slice must contain exactly one frame: bytes left over after the last
/// blob are reported as [`FunctionClientError::TrailingBytes`].
pub fn decode_with(frame: &[u8], limits: &FrameLimits) -> Result<Vec<Bytes>> {
    let mut buf = frame;

    ensure_available(buf.remaining(), "blob count", LEN_FIELD as u64)?;
    let count = limits.check_count(buf.get_u64_le())?;

    let header_len = (count as u64).saturating_mul(LEN_FIELD as u64);
    ensure_available(buf.remaining(), "blob lengths", header_len)?;
    let lens: Vec<u64> = (0..count).map(|_| buf.get_u64_le()).collect();

    let total = limits.check_lengths(&lens)?;
    ensure_available(buf.remaining(), "blob payload", total as u64)?;

    let mut payload = Bytes::copy_from_slice(&buf[..total]);
    buf.advance(total);
    if buf.has_remaining() {
        return Err(FunctionClientError::TrailingBytes(buf.remaining()));
    }

    Ok(lens
        .into_iter()
        .map(|len| payload.split_to(len as usize))
        .collect())
}

fn ensure_available(remaining: usize, section: &'static str, expected: u64) -> Result<()> {
    let available = remaining as u64;
    if available < expected {
        return Err(FunctionClientError::TruncatedStream {
            section,
            expected,
            available,
        });
    }
    Ok(())
}

/// Reads exactly one frame from `reader`.
///
/// Bytes after the frame are left unread. Each section is validated before
/// its buffer is allocated, so a hostile length prefix cannot claim more
/// memory than `limits` allow.
pub async fn read_frame<R>(reader: &mut R, limits: &FrameLimits) -> Result<Vec<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut field = [0u8; LEN_FIELD];

    read_section(reader, &mut field, "blob count").await?;
    let count = limits.check_count(u64::from_le_bytes(field))?;

    let mut lens = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        read_section(reader, &mut field, "blob lengths").await?;
        lens.push(u64::from_le_bytes(field));
    }
    limits.check_lengths(&lens)?;

    let mut blobs = Vec::with_capacity(lens.len());
    for len in lens {
        let mut blob = vec![0u8; len as usize];
        read_section(reader, &mut blob, "blob payload").await?;
        blobs.push(Bytes::from(blob));
    }
    Ok(blobs)
}

/// Fills `buf` completely or reports how far the reader got.
async fn read_section<R>(reader: &mut R, buf: &mut [u8], section: &'static str) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(FunctionClientError::TruncatedStream {
                section,
                expected: buf.len() as u64,
                available: filled as u64,
            });
        }
        filled += n;
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────
