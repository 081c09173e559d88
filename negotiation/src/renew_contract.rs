// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RPCRenewContract` (spec component 4.F): closes out an expiring
//! obligation and opens a fresh one carrying the same sector roots forward
//! at a new proof window, without re-uploading any data.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_obligation_store::{ObligationAccounting, StorageObligation};

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::form_contract::collateral_contribution;
use crate::json_io::{read_json, write_json};
use crate::messages::{FormContractResponse, RenewContractRequest};

pub async fn handle<Conn, S, W, P>(conn: &mut Conn, ctx: &HostContext<S, W, P>) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let quote = ctx.settings.quote(&*ctx.pool)?;
    write_json(conn, &quote).await?;

    let accept = host_wire::read_fixed::<_, 1>(conn).await?;
    if accept[0] == 0 {
        return Ok(());
    }

    let result = negotiate(conn, ctx, &quote.settings).await;
    if let Err(err) = &result {
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
    }
    result
}

async fn negotiate<Conn, S, W, P>(
    conn: &mut Conn,
    ctx: &HostContext<S, W, P>,
    settings: &host_settings::ExternalSettings,
) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let req: RenewContractRequest = read_json(conn, ctx.params.max_contract_len as u64).await?;

    let prior_lock = ctx.obligations.lock(req.prior_obligation_id)?;
    let prior = ctx.obligations.get(&prior_lock)?;
    if prior.status.is_terminal() {
        return Err(NegotiationError::Communication(
            "the obligation being renewed is already finalized".into(),
        ));
    }
    if req.terms.id == req.prior_obligation_id {
        return Err(NegotiationError::Communication(
            "a renewal's contract id must differ from the one it replaces".into(),
        ));
    }
    if req.terms.window_start.as_u64() <= ctx.height.get().saturating_add(ctx.params.revision_submission_buffer).as_u64()
    {
        return Err(NegotiationError::Communication(
            "window_start leaves no room for a revision-submission buffer".into(),
        ));
    }
    if req.terms.window_end.as_u64().saturating_sub(req.terms.window_start.as_u64()) < settings.window_size {
        return Err(NegotiationError::Communication(
            "proof window is narrower than the host's configured window_size".into(),
        ));
    }
    if req.terms.file_size != prior.sector_roots.len() as u64 * settings.sector_size {
        return Err(NegotiationError::Communication(
            "renewal's file size does not match the carried-forward sector set".into(),
        ));
    }

    let collateral = collateral_contribution(
        req.terms.renter_payout,
        settings.max_collateral,
        ctx.settings.internal().collateral_fraction,
    );
    let required = settings
        .contract_price
        .checked_add(collateral)
        .map_err(|_| NegotiationError::Communication("payout overflowed computing required host proceeds".into()))?;
    if req.terms.host_valid_payout != required || req.terms.host_missed_payout != required {
        return Err(NegotiationError::Communication(
            "host-side valid/missed proof outputs do not equal contract_price + collateral".into(),
        ));
    }

    let size_estimate: u64 = req.transaction_set.iter().map(|t| t.len() as u64).sum();
    if !ctx.pool.clears_minimum_fee(size_estimate, req.offered_fee) {
        return Err(NegotiationError::Communication(
            "offered fee does not clear the current mempool minimum".into(),
        ));
    }

    let host_signature = ctx
        .wallet
        .sign_transaction(&req.terms.id.0)
        .map_err(|e| NegotiationError::Wallet(e.to_string()))?;
    let mut signed_transaction_set = req.transaction_set.clone();
    signed_transaction_set.push(host_signature);

    ctx.pool
        .submit(signed_transaction_set.clone())
        .map_err(|e| NegotiationError::Pool(e.to_string()))?;

    let origin_bytes = serde_json::to_vec(&signed_transaction_set).expect("transaction set is serializable");
    let mut renewed = StorageObligation::new(
        req.terms.id,
        origin_bytes,
        ctx.height.get(),
        req.terms.window_start,
        req.terms.window_end,
        ObligationAccounting {
            locked_collateral: collateral,
            risked_collateral: collateral,
            contract_cost: settings.contract_price,
            ..Default::default()
        },
    );
    renewed.sector_roots = prior.sector_roots.clone();
    // Carry every sector forward by registering a fresh expiry tied to the
    // renewed window. The prior obligation is left untouched: it is not
    // modified or finalized here, only superseded going forward, per the
    // "old obligation is not modified; a new obligation is created" rule.
    // The sector engine only inspects `bytes`' length on this path: a
    // virtual reference onto an already-stored sector never rewrites
    // content.
    let dummy = vec![0u8; settings.sector_size as usize];
    let new_expiry = renewed.window_start.saturating_add(ctx.params.reorg_depth);
    for root in prior.sector_roots.iter() {
        ctx.sectors.add_sector(*root, new_expiry, &dummy)?;
    }
    ctx.obligations.add_obligation(renewed)?;

    write_json(conn, &FormContractResponse { transaction_set: signed_transaction_set }).await?;
    conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use host_clock::BlockHeight;
    use host_obligation_store::ObligationStatus;
    use host_settings::SignedExternalSettings;
    use host_types::{Currency, FileContractId, UnlockHash};

    use super::*;
    use crate::json_io::read_json;
    use crate::messages::ProposedContractTerms;
    use crate::test_support::setup;

    #[tokio::test]
    async fn renewing_replaces_the_prior_obligation_and_echoes_the_transaction_set() {
        let ctx = setup();
        ctx.settings.set_accepting_contracts(true).unwrap();

        let prior_id = FileContractId([1u8; 32]);
        let prior = StorageObligation::new(
            prior_id,
            b"origin".to_vec(),
            BlockHeight::new(0),
            BlockHeight::new(20),
            BlockHeight::new(40),
            ObligationAccounting::default(),
        );
        ctx.obligations.add_obligation(prior).unwrap();

        let (mut host_side, mut client_side) = tokio::io::duplex(16 * 1024);
        let server_ctx = ctx.clone();
        let server = tokio::spawn(async move { handle(&mut host_side, &*server_ctx).await });

        let _quote: SignedExternalSettings = read_json(&mut client_side, 64 * 1024).await.unwrap();
        host_wire::write_fixed(&mut client_side, &[1u8]).await.unwrap();

        let request = RenewContractRequest {
            prior_obligation_id: prior_id,
            accept: true,
            terms: ProposedContractTerms {
                id: FileContractId([2u8; 32]),
                file_size: 0,
                file_merkle_root: [0u8; 32],
                window_start: BlockHeight::new(10),
                window_end: BlockHeight::new(30),
                unlock_hash: UnlockHash([3u8; 32]),
                renter_payout: Currency::from_coins(5),
                host_valid_payout: Currency::ZERO,
                host_missed_payout: Currency::ZERO,
            },
            transaction_set: Vec::new(),
            offered_fee: Currency::ZERO,
        };
        write_json(&mut client_side, &request).await.unwrap();

        let response: FormContractResponse = read_json(&mut client_side, 64 * 1024).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(response.transaction_set.len(), 1);
        let old_lock = ctx.obligations.lock(prior_id).unwrap();
        let old = ctx.obligations.get(&old_lock).unwrap();
        assert!(!old.status.is_terminal());
        assert_eq!(old.status, ObligationStatus::Unresolved);

        let new_lock = ctx.obligations.lock(FileContractId([2u8; 32])).unwrap();
        assert!(!ctx.obligations.get(&new_lock).unwrap().status.is_terminal());
    }
}
