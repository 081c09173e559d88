// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Form-contract sub-protocol (spec component 4.F, step 1-5).

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_obligation_store::{ObligationAccounting, StorageObligation};
use host_types::Currency;

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::json_io::{read_json, write_json};
use crate::messages::{FormContractRequest, FormContractResponse, ProposedContractTerms};

/// Computes the host's collateral contribution for a contract whose total
/// payout is `renter_payout`: `min(max_collateral, payout * fraction /
/// (fraction + 1_000_000))`.
pub fn collateral_contribution(renter_payout: Currency, max_collateral: Currency, collateral_fraction: u64) -> Currency {
    let share = renter_payout
        .mul_div(u128::from(collateral_fraction), u128::from(collateral_fraction) + 1_000_000)
        .unwrap_or(Currency::ZERO);
    share.min(max_collateral)
}

fn validate_terms(
    terms: &ProposedContractTerms,
    current_height: host_clock::BlockHeight,
    revision_submission_buffer: u64,
    window_size: u64,
    contract_price: Currency,
    collateral: Currency,
) -> Result<(), NegotiationError> {
    if terms.file_size != 0 {
        return Err(NegotiationError::Communication(
            "form-contract's file contract must start at zero size".into(),
        ));
    }
    if terms.window_start.as_u64() <= current_height.saturating_add(revision_submission_buffer).as_u64() {
        return Err(NegotiationError::Communication(
            "window_start leaves no room for a revision-submission buffer".into(),
        ));
    }
    if terms.window_end.as_u64().saturating_sub(terms.window_start.as_u64()) < window_size {
        return Err(NegotiationError::Communication(
            "proof window is narrower than the host's configured window_size".into(),
        ));
    }
    let required = contract_price
        .checked_add(collateral)
        .map_err(|_| NegotiationError::Communication("payout overflowed computing required host proceeds".into()))?;
    if terms.host_valid_payout != required || terms.host_missed_payout != required {
        return Err(NegotiationError::Communication(
            "host-side valid/missed proof outputs do not equal contract_price + collateral".into(),
        ));
    }
    // Full 2-of-2 `UnlockHash([renter_key, host_key])` derivation is a
    // chain-specific detail of the out-of-scope consensus engine (see
    // DESIGN.md); the host only checks the renter proposed a real address.
    if terms.unlock_hash.0 == [0u8; 32] {
        return Err(NegotiationError::Communication("contract unlock hash is empty".into()));
    }
    Ok(())
}

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
    let req: FormContractRequest = read_json(conn, ctx.params.max_contract_len as u64).await?;

    let collateral = collateral_contribution(
        req.terms.renter_payout,
        settings.max_collateral,
        ctx.settings.internal().collateral_fraction,
    );
    validate_terms(
        &req.terms,
        ctx.height.get(),
        ctx.params.revision_submission_buffer,
        settings.window_size,
        settings.contract_price,
        collateral,
    )?;

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
    let so = StorageObligation::new(
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
    ctx.obligations.add_obligation(so)?;

    write_json(conn, &FormContractResponse { transaction_set: signed_transaction_set }).await?;
    conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use host_clock::BlockHeight;
    use host_settings::SignedExternalSettings;
    use host_types::{FileContractId, UnlockHash};

    use super::*;
    use crate::json_io::read_json;
    use crate::test_support::setup;

    #[test]
    fn collateral_is_capped_at_max_collateral() {
        let payout = Currency::from_coins(100);
        let max = Currency::from_coins(1);
        let got = collateral_contribution(payout, max, 1_000_000);
        assert_eq!(got, max);
    }

    #[test]
    fn collateral_is_zero_with_a_zero_fraction() {
        let payout = Currency::from_coins(100);
        let max = Currency::from_coins(50);
        assert_eq!(collateral_contribution(payout, max, 0), Currency::ZERO);
    }

    fn minimal_terms() -> ProposedContractTerms {
        ProposedContractTerms {
            id: FileContractId([7u8; 32]),
            file_size: 0,
            file_merkle_root: [0u8; 32],
            window_start: BlockHeight::new(20),
            window_end: BlockHeight::new(40),
            unlock_hash: UnlockHash([1u8; 32]),
            renter_payout: Currency::from_coins(10),
            host_valid_payout: Currency::ZERO,
            host_missed_payout: Currency::ZERO,
        }
    }

    #[tokio::test]
    async fn accepting_a_contract_stores_an_obligation_and_echoes_the_transaction_set() {
        let ctx = setup();
        ctx.settings.set_accepting_contracts(true).unwrap();
        let (mut host_side, mut client_side) = tokio::io::duplex(16 * 1024);

        let server = tokio::spawn(async move { handle(&mut host_side, &*ctx).await });

        let _quote: SignedExternalSettings = read_json(&mut client_side, 64 * 1024).await.unwrap();
        host_wire::write_fixed(&mut client_side, &[1u8]).await.unwrap();

        let request = FormContractRequest {
            accept: true,
            terms: minimal_terms(),
            transaction_set: Vec::new(),
            offered_fee: Currency::ZERO,
        };
        write_json(&mut client_side, &request).await.unwrap();

        let response: FormContractResponse = read_json(&mut client_side, 64 * 1024).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(response.transaction_set.len(), 1, "host appends its own signature");
    }

    #[tokio::test]
    async fn declining_the_quote_ends_the_exchange_without_an_obligation() {
        let ctx = setup();
        let (mut host_side, mut client_side) = tokio::io::duplex(16 * 1024);

        let server = tokio::spawn(async move { handle(&mut host_side, &*ctx).await });

        let _quote: SignedExternalSettings = read_json(&mut client_side, 64 * 1024).await.unwrap();
        host_wire::write_fixed(&mut client_side, &[0u8]).await.unwrap();

        server.await.unwrap().unwrap();
    }
}
