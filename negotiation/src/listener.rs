// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accept loop: reads the 16-byte RPC specifier off each new connection and
//! dispatches to the matching sub-protocol handler, under a deadline sized
//! to that RPC.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, warn};

use host_db::Store;
use host_errors::LogRateLimiter;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_wire::RpcSpecifier;

use crate::context::HostContext;
use crate::errors::NegotiationError;
use crate::{download, form_contract, renew_contract, revise_contract, revision_request, settings_rpc};

/// Drives the accept loop until [`HostContext::is_closed`] observes the
/// shutdown flag. Each accepted connection is handled on its own task so a
/// slow or stuck renter cannot stall others.
pub async fn serve<S, W, P>(
    listener: TcpListener,
    ctx: Arc<HostContext<S, W, P>>,
    limiter: Arc<LogRateLimiter>,
) -> Result<(), NegotiationError>
where
    S: Store + Send + Sync + 'static,
    W: Wallet + 'static,
    P: TransactionPool + 'static,
{
    let ratelimit = Duration::from_millis(ctx.params.rpc_ratelimit_ms);
    loop {
        if ctx.is_closed() {
            return Ok(());
        }
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                if limiter.should_log(host_errors::ErrorClass::Connection) {
                    warn!(error = %e, "accept failed");
                }
                continue;
            }
        };
        debug!(%peer, "accepted connection");

        let ctx = ctx.clone();
        let limiter = limiter.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &ctx).await {
                if limiter.should_log(err.class()) {
                    warn!(%peer, error = %err, "negotiation RPC failed");
                }
            }
        });

        if !ratelimit.is_zero() {
            tokio::time::sleep(ratelimit).await;
        }
    }
}

async fn handle_connection<S, W, P>(mut stream: TcpStream, ctx: &HostContext<S, W, P>) -> Result<(), NegotiationError>
where
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    let initial_deadline = Duration::from_secs(ctx.params.initial_accept_deadline_secs);
    let specifier_bytes = timeout(initial_deadline, host_wire::read_fixed::<_, 16>(&mut stream))
        .await
        .map_err(|_| NegotiationError::Timeout)??;
    let specifier = RpcSpecifier::from_bytes(specifier_bytes);

    let deadline_secs = match specifier {
        s if s == RpcSpecifier::SETTINGS => ctx.params.settings_deadline_secs,
        s if s == RpcSpecifier::REVISION_REQUEST => ctx.params.settings_deadline_secs,
        s if s == RpcSpecifier::FORM_CONTRACT => ctx.params.form_contract_deadline_secs,
        s if s == RpcSpecifier::RENEW_CONTRACT => ctx.params.form_contract_deadline_secs,
        s if s == RpcSpecifier::DOWNLOAD => ctx.params.form_contract_deadline_secs,
        s if s == RpcSpecifier::REVISE_CONTRACT => ctx.params.iterated_connection_time_secs,
        _ => return Err(NegotiationError::Communication(format!("unrecognized RPC specifier {specifier:?}"))),
    };

    let deadline = Duration::from_secs(deadline_secs);
    let result = timeout(deadline, dispatch(specifier, &mut stream, ctx)).await;
    match result {
        Ok(inner) => inner,
        Err(_) => Err(NegotiationError::Timeout),
    }
}

async fn dispatch<S, W, P>(
    specifier: RpcSpecifier,
    stream: &mut TcpStream,
    ctx: &HostContext<S, W, P>,
) -> Result<(), NegotiationError>
where
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    if specifier == RpcSpecifier::SETTINGS {
        settings_rpc::handle(stream, ctx).await
    } else if specifier == RpcSpecifier::FORM_CONTRACT {
        form_contract::handle(stream, ctx).await
    } else if specifier == RpcSpecifier::RENEW_CONTRACT {
        renew_contract::handle(stream, ctx).await
    } else if specifier == RpcSpecifier::REVISE_CONTRACT {
        revise_contract::handle(stream, ctx).await
    } else if specifier == RpcSpecifier::DOWNLOAD {
        download::handle(stream, ctx).await
    } else if specifier == RpcSpecifier::REVISION_REQUEST {
        revision_request::handle(stream, ctx).await
    } else {
        Err(NegotiationError::Communication(format!("unrecognized RPC specifier {specifier:?}")))
    }
}
