// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RPCRevisionRequest` (spec component 4.F): lets a renter fetch the
//! host's latest signed revision for a contract it believes it still
//! holds, to recover from a lost local copy.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::json_io::{read_json, write_json};
use crate::messages::{RevisionRequest, RevisionSnapshot};

pub async fn handle<Conn, S, W, P>(conn: &mut Conn, ctx: &HostContext<S, W, P>) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let req: RevisionRequest = read_json(conn, ctx.params.max_contract_len as u64).await?;
    let lock = ctx.obligations.lock(req.contract_id)?;
    let so = ctx.obligations.get(&lock)?;

    write_json(
        conn,
        &RevisionSnapshot {
            terms: None,
            revision_transaction_set: so.revision_transaction_set,
        },
    )
    .await?;
    conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use host_clock::BlockHeight;
    use host_obligation_store::{ObligationAccounting, StorageObligation};
    use host_types::FileContractId;

    use super::*;
    use crate::json_io::read_json;
    use crate::test_support::setup;

    #[tokio::test]
    async fn returns_the_stored_revision_transaction_set() {
        let ctx = setup();
        let id = FileContractId([4u8; 32]);
        let mut so = StorageObligation::new(
            id,
            b"origin".to_vec(),
            BlockHeight::new(0),
            BlockHeight::new(20),
            BlockHeight::new(40),
            ObligationAccounting::default(),
        );
        so.revision_transaction_set = b"latest revision".to_vec();
        ctx.obligations.add_obligation(so).unwrap();

        let (mut host_side, mut client_side) = tokio::io::duplex(8192);
        let server = tokio::spawn(async move { handle(&mut host_side, &*ctx).await });

        write_json(&mut client_side, &RevisionRequest { contract_id: id }).await.unwrap();
        let snapshot: RevisionSnapshot = read_json(&mut client_side, 64 * 1024).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(snapshot.revision_transaction_set, b"latest revision");
    }
}
