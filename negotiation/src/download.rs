// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `RPCDownload` (spec component 4.F): the renter supplies a revision whose
//! increased payout covers the requested ranges, the host streams the
//! sector bytes back.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_types::{Currency, SectorRoot};

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::json_io::{read_json, write_json};
use crate::messages::DownloadRequest;

/// Validates that `terms` covers `requested_bytes` worth of new download
/// revenue over what the obligation already recorded, at the host's
/// current download price.
fn required_download_charge(requested_bytes: u64, download_price: Currency) -> Result<Currency, NegotiationError> {
    download_price
        .checked_mul(u128::from(requested_bytes))
        .map_err(|_| NegotiationError::Communication("download charge overflowed".into()))
}

pub async fn handle<Conn, S, W, P>(conn: &mut Conn, ctx: &HostContext<S, W, P>) -> Result<(), NegotiationError>
where
    Conn: AsyncRead + AsyncWrite + Unpin,
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let req: DownloadRequest = read_json(conn, ctx.params.max_contract_len as u64).await?;

    let batch_bytes: u64 = req.ranges.iter().map(|r| r.length).sum();
    if batch_bytes > ctx.params.default_max_download_batch_size {
        let err = NegotiationError::Communication("requested batch exceeds the host's download batch limit".into());
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
        return Err(err);
    }

    let lock = ctx.obligations.lock(req.contract_id)?;
    let so = ctx.obligations.get(&lock)?;
    if so.status.is_terminal() {
        let err = NegotiationError::Communication("obligation is already finalized".into());
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
        return Err(err);
    }
    if req.terms.contract_id != req.contract_id || req.terms.revision_number <= so.revision_number {
        let err = NegotiationError::Communication("revision number does not strictly increase".into());
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
        return Err(err);
    }

    let download_price = ctx.settings.internal().min_download_price;
    let required_increase = required_download_charge(batch_bytes, download_price)?;
    let prior_total = [
        so.accounting.locked_collateral,
        so.accounting.contract_cost,
        so.accounting.potential_storage_revenue,
        so.accounting.potential_upload_revenue,
        so.accounting.potential_download_revenue,
    ]
    .into_iter()
    .sum::<Currency>();
    let required_total = prior_total
        .checked_add(required_increase)
        .map_err(|_| NegotiationError::Communication("required payout overflowed".into()))?;
    if req.terms.host_valid_payout < required_total || req.terms.host_missed_payout < required_total {
        let err = NegotiationError::Communication(
            "revision's host-side payout does not cover the requested download".into(),
        );
        host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
        return Err(err);
    }

    for range in &req.ranges {
        let Some(root) = so.sector_roots.get(range.sector_index).copied() else {
            let err = NegotiationError::Communication("sector index out of range for this contract".into());
            host_wire::write_error_message(conn, &err.renter_facing_message()).await?;
            return Err(err);
        };
        let sector = read_range(ctx, root, range.offset, range.length)?;
        host_wire::write_length_prefixed(conn, &sector).await?;
    }

    let mut updated = so.clone();
    updated.accounting.potential_download_revenue = updated
        .accounting
        .potential_download_revenue
        .checked_add(required_increase)
        .unwrap_or(updated.accounting.potential_download_revenue);
    updated.revision_number = req.terms.revision_number;
    ctx.obligations.modify_obligation(
        &lock,
        updated,
        &[],
        &[],
        &[],
        req.revision_transaction_set.clone(),
    )?;

    write_json(conn, &req.terms.revision_number).await?;
    conn.flush().await.map_err(|e| NegotiationError::Wire(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charges_price_times_requested_bytes() {
        let got = required_download_charge(1_000, Currency::from_base_units(3)).unwrap();
        assert_eq!(got, Currency::from_base_units(3_000));
    }

    #[test]
    fn rejects_an_overflowing_charge() {
        assert!(required_download_charge(u64::MAX, Currency::from_base_units(2)).is_err());
    }
}

fn read_range<S, W, P>(
    ctx: &HostContext<S, W, P>,
    root: SectorRoot,
    offset: u64,
    length: u64,
) -> Result<Vec<u8>, NegotiationError>
where
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let sector = ctx.sectors.read_sector(root)?;
    let start = usize::try_from(offset).map_err(|_| NegotiationError::Communication("range offset too large".into()))?;
    let end = start
        .checked_add(usize::try_from(length).map_err(|_| NegotiationError::Communication("range length too large".into()))?)
        .ok_or_else(|| NegotiationError::Communication("range overflowed sector bounds".into()))?;
    sector
        .get(start..end)
        .map(|s| s.to_vec())
        .ok_or_else(|| NegotiationError::Communication("range is out of bounds for the sector".into()))
}
