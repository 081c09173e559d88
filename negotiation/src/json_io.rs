// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads/writes one JSON-encoded [`crate::messages`] value inside a
//! length-prefixed frame, on top of `host_wire`'s primitive framing.

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::errors::NegotiationError;

pub async fn read_json<R, T>(reader: &mut R, max_len: u64) -> Result<T, NegotiationError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let bytes = host_wire::read_length_prefixed(reader, max_len).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NegotiationError::Communication(format!("malformed message: {e}")))
}

pub async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<(), NegotiationError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = serde_json::to_vec(value).expect("RPC message is serializable");
    host_wire::write_length_prefixed(writer, &bytes).await?;
    Ok(())
}
