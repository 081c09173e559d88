// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical binary encoding for the negotiation protocol.
//!
//! Every structured value crossing the wire is little-endian, with
//! variable-length sequences (byte strings, transactions) prefixed by an
//! 8-byte length. Every read is bounded by a caller-supplied maximum so a
//! malicious peer cannot force an unbounded allocation.

mod announcement;
mod errors;
mod rpc;

pub use announcement::{announcement_signing_bytes, decode_announcement, encode_announcement};
pub use errors::WireError;
pub use rpc::RpcSpecifier;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads a `u64` length prefix followed by that many bytes, rejecting
/// anything over `max_len`.
pub async fn read_length_prefixed<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: u64,
) -> Result<Vec<u8>, WireError> {
    let len = read_u64(reader).await?;
    if len > max_len {
        return Err(WireError::TooLarge { len, max: max_len });
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Writes `bytes.len()` as an 8-byte little-endian prefix, then `bytes`.
pub async fn write_length_prefixed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    bytes: &[u8],
) -> Result<(), WireError> {
    write_u64(writer, bytes.len() as u64).await?;
    writer.write_all(bytes).await?;
    Ok(())
}

pub async fn read_u64<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, WireError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).await?;
    Ok(u64::from_le_bytes(buf))
}

pub async fn write_u64<W: AsyncWrite + Unpin>(writer: &mut W, value: u64) -> Result<(), WireError> {
    writer.write_all(&value.to_le_bytes()).await?;
    Ok(())
}

/// Reads a fixed-size array verbatim — no length prefix, since the size is
/// known to both ends from the message's position in the protocol.
pub async fn read_fixed<R: AsyncRead + Unpin, const N: usize>(
    reader: &mut R,
) -> Result<[u8; N], WireError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_fixed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    bytes: &[u8],
) -> Result<(), WireError> {
    writer.write_all(bytes).await?;
    Ok(())
}

/// Sends a single length-prefixed error string and lets the caller close the
/// connection; used for the "any failure before step 5" negotiation path.
pub async fn write_error_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &str,
) -> Result<(), WireError> {
    write_length_prefixed(writer, message.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn length_prefixed_round_trips() {
        let mut buf = Vec::new();
        write_length_prefixed(&mut buf, b"hello").await.unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let got = read_length_prefixed(&mut cursor, 64).await.unwrap();
        assert_eq!(got, b"hello");
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        write_length_prefixed(&mut buf, &vec![0u8; 100]).await.unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let err = read_length_prefixed(&mut cursor, 10).await.unwrap_err();
        assert!(matches!(err, WireError::TooLarge { len: 100, max: 10 }));
    }

    #[tokio::test]
    async fn u64_round_trips_little_endian() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 0x1122_3344_5566_7788).await.unwrap();
        assert_eq!(buf, 0x1122_3344_5566_7788u64.to_le_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(read_u64(&mut cursor).await.unwrap(), 0x1122_3344_5566_7788);
    }
}
