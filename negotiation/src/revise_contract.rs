// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RPCReviseContract` (spec component 4.F): an iterated session in which
//! the renter appends or removes sectors one at a time, each iteration
//! strictly increasing the obligation's revision number.

use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_types::Currency;

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::json_io::{read_json, write_json};
use crate::messages::{ProposedRevisionTerms, ReviseAck, ReviseContractBegin, ReviseIteration, RevisionSnapshot};

/// The host-side payout increase this iteration's sector delta must be
/// covered by: upload bytes charged once, storage charged for the bytes
/// added over the contract's remaining window.
fn required_payout_increase(
    added_bytes: u64,
    remaining_window_blocks: u64,
    upload_price: Currency,
    storage_price: Currency,
) -> Result<Currency, NegotiationError> {
    let upload_charge = upload_price
        .checked_mul(u128::from(added_bytes))
        .map_err(|_| NegotiationError::Communication("upload charge overflowed".into()))?;
    let storage_charge = storage_price
        .checked_mul(u128::from(added_bytes))
        .and_then(|c| c.checked_mul(u128::from(remaining_window_blocks)))
        .map_err(|_| NegotiationError::Communication("storage charge overflowed".into()))?;
    upload_charge
        .checked_add(storage_charge)
        .map_err(|_| NegotiationError::Communication("payout increase overflowed".into()))
}

/// Sum of every term the host currently has a financial claim on; the
/// baseline a revision's increased payout is checked against.
fn host_due(accounting: &host_obligation_store::ObligationAccounting) -> Currency {
    [
        accounting.locked_collateral,
        accounting.contract_cost,
        accounting.potential_storage_revenue,
        accounting.potential_upload_revenue,
        accounting.potential_download_revenue,
    ]
    .into_iter()
    .sum()
}

fn validate_iteration(
    terms: &ProposedRevisionTerms,
    so: &host_obligation_store::StorageObligation,
    required_increase: Currency,
) -> Result<(), NegotiationError> {
    if terms.contract_id != so.id {
        return Err(NegotiationError::Communication("revision names a different contract".into()));
    }
    if terms.revision_number <= so.revision_number {
        return Err(NegotiationError::Communication(
            "revision number does not strictly increase".into(),
        ));
    }
    if terms.window_start != so.window_start || terms.window_end != so.window_end {
        return Err(NegotiationError::Communication(
            "a plain revision cannot change the proof window; renew instead".into(),
        ));
    }
    let required_total = host_due(&so.accounting)
        .checked_add(required_increase)
        .map_err(|_| NegotiationError::Communication("required payout overflowed".into()))?;
    if terms.host_valid_payout < required_total || terms.host_missed_payout < required_total {
        return Err(NegotiationError::Communication(
            "revision's host-side payout does not cover the uploaded and stored bytes".into(),
        ));
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
    let begin: ReviseContractBegin = read_json(conn, ctx.params.max_contract_len as u64).await?;
    let lock = ctx.obligations.lock(begin.contract_id)?;
    let mut so = ctx.obligations.get(&lock)?;
    if so.status.is_terminal() {
        let err = NegotiationError::Communication("obligation is already finalized".into());
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
        return Err(err);
    }

    write_json(
        conn,
        &RevisionSnapshot {
            terms: None,
            revision_transaction_set: so.revision_transaction_set.clone(),
        },
    )
    .await?;

    let settings = ctx.settings.internal();
    let connection_budget = Duration::from_secs(ctx.params.iterated_connection_time_secs);
    let per_iteration_budget = Duration::from_secs(ctx.params.iterated_per_iteration_secs);
    let started = Instant::now();

    loop {
        if ctx.is_closed() {
            return Err(NegotiationError::HostClosed);
        }
        if started.elapsed() >= connection_budget {
            return Ok(());
        }

        let iteration: ReviseIteration = match timeout(per_iteration_budget, read_json(conn, ctx.params.max_revision_size))
            .await
        {
            Ok(Ok(msg)) => msg,
            Ok(Err(err)) => return Err(err),
            Err(_) => return Err(NegotiationError::Timeout),
        };
        // A zero-size terms with no added/removed roots signals the renter
        // is done; the empty delta still confirms the final revision.
        let finished = iteration.added_roots.is_empty()
            && iteration.removed_roots.is_empty()
            && iteration.terms.revision_number == so.revision_number;

        if finished {
            return Ok(());
        }

        let result = process_one(conn, ctx, &lock, &mut so, iteration, &settings).await;
        match result {
            Ok(()) => {
                write_json(
                    conn,
                    &ReviseAck {
                        accepted: true,
                        reason: None,
                        revision_transaction_set: so.revision_transaction_set.clone(),
                    },
                )
                .await?;
                conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
            }
            Err(err) => {
                write_json(
                    conn,
                    &ReviseAck {
                        accepted: false,
                        reason: Some(err.renter_facing_message()),
                        revision_transaction_set: so.revision_transaction_set.clone(),
                    },
                )
                .await?;
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_increase_combines_upload_and_storage_charges() {
        let got = required_payout_increase(100, 10, Currency::from_base_units(2), Currency::from_base_units(1)).unwrap();
        // upload: 100 * 2 = 200; storage: 100 * 1 * 10 = 1000
        assert_eq!(got, Currency::from_base_units(1_200));
    }

    #[test]
    fn host_due_sums_every_accounting_field() {
        let accounting = host_obligation_store::ObligationAccounting {
            locked_collateral: Currency::from_base_units(1),
            risked_collateral: Currency::from_base_units(99), // not part of host_due
            potential_storage_revenue: Currency::from_base_units(2),
            potential_upload_revenue: Currency::from_base_units(3),
            potential_download_revenue: Currency::from_base_units(4),
            contract_cost: Currency::from_base_units(5),
        };
        assert_eq!(host_due(&accounting), Currency::from_base_units(15));
    }
}

async fn process_one<Conn, S, W, P>(
    conn: &mut Conn,
    ctx: &HostContext<S, W, P>,
    lock: &host_obligation_store::ObligationLock<'_>,
    so: &mut host_obligation_store::StorageObligation,
    iteration: ReviseIteration,
    settings: &host_settings::InternalSettings,
) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let sector_size = ctx.params.sector_size;
    let expected_len = iteration.added_roots.len() as u64 * sector_size;
    if iteration.delta_len != expected_len {
        return Err(NegotiationError::Communication(
            "delta length does not match one sector per added root".into(),
        ));
    }

    let mut chunks = Vec::with_capacity(iteration.added_roots.len());
    for root in &iteration.added_roots {
        let mut bytes = vec![0u8; sector_size as usize];
        conn.read_exact(&mut bytes).await.map_err(|e| NegotiationError::Wire(e.into()))?;
        if host_crypto::merkle::sector_root(&bytes) != *root {
            return Err(NegotiationError::Communication(
                "uploaded sector does not hash to its declared root".into(),
            ));
        }
        chunks.push(bytes);
    }

    let remaining_window = so.window_end.saturating_sub(ctx.height.get().as_u64()).as_u64();
    let added_bytes = iteration.added_roots.len() as u64 * sector_size;
    let required_increase =
        required_payout_increase(added_bytes, remaining_window, settings.min_upload_price, settings.min_storage_price)?;
    validate_iteration(&iteration.terms, so, required_increase)?;

    let mut projected_roots = so.sector_roots.clone();
    projected_roots.extend(iteration.added_roots.iter().copied());
    for removed in &iteration.removed_roots {
        projected_roots.retain(|r| r != removed);
    }
    if host_crypto::merkle::file_root(&projected_roots) != iteration.terms.new_file_merkle_root {
        return Err(NegotiationError::Communication(
            "revision's new_file_merkle_root does not match the updated sector list".into(),
        ));
    }

    let chunk_refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
    let mut new_so = so.clone();
    new_so.accounting.potential_upload_revenue = new_so
        .accounting
        .potential_upload_revenue
        .checked_add(
            settings
                .min_upload_price
                .checked_mul(u128::from(added_bytes))
                .unwrap_or(Currency::ZERO),
        )
        .unwrap_or(new_so.accounting.potential_upload_revenue);
    let total_bytes_after =
        (new_so.sector_roots.len() + iteration.added_roots.len()).saturating_sub(iteration.removed_roots.len()) as u64
            * sector_size;
    new_so.accounting.potential_storage_revenue = settings
        .min_storage_price
        .checked_mul(u128::from(total_bytes_after))
        .and_then(|c| c.checked_mul(u128::from(remaining_window)))
        .unwrap_or(new_so.accounting.potential_storage_revenue);
    new_so.revision_number = iteration.terms.revision_number;

    let revision_bytes = serde_json::to_vec(&iteration.terms).expect("revision terms are serializable");
    ctx.obligations.modify_obligation(
        lock,
        new_so,
        &iteration.added_roots,
        &chunk_refs,
        &iteration.removed_roots,
        revision_bytes,
    )?;
    *so = ctx.obligations.get(lock)?;
    Ok(())
}
