// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RPCSettings` (spec component 4.F): a single signed settings response,
//! no further exchange.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::json_io::write_json;

pub async fn handle<Conn, S, W, P>(conn: &mut Conn, ctx: &HostContext<S, W, P>) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let quote = ctx.settings.quote(&*ctx.pool)?;
    write_json(conn, &quote).await?;
    conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use host_settings::SignedExternalSettings;
    use host_types::HostParams;

    use super::*;
    use crate::json_io::read_json;
    use crate::test_support::setup;

    #[tokio::test]
    async fn sends_a_signed_settings_quote() {
        let ctx = setup();
        let (mut host_side, mut client_side) = tokio::io::duplex(8192);

        let server = tokio::spawn(async move { handle(&mut host_side, &*ctx).await });

        let received: SignedExternalSettings = read_json(&mut client_side, 64 * 1024).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(received.settings.revision_number, 1);
        assert_eq!(received.settings.sector_size, HostParams::testing().sector_size);
    }
}
