//! Trade Coordinator
//!
//! Runs one trade attempt per BUY verdict through
//! FeeSelection -> QuoteRequested -> RouteSigned -> Submitted -> Confirmed | Failed.
//! No automatic retries. Gas settings become sticky only after a confirmed
//! trade; a failure at any stage leaves them untouched.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::{GasPolicy, GasSettings, StickyGas, TradeFailure, TradeOutcome, TradeStage};
use crate::ports::{
    notify, ChainPort, ExecutionError, NotificationPort, PortError, QuoteParams, RouterPort,
    TransactionSigner, TxStatus,
};

/// Wrapped SOL mint, the default spend asset
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct TradeSettings {
    pub input_mint: String,
    /// Fixed spend per trade, in smallest units of the input asset
    pub spend_amount: u64,
    pub slippage_bps: u16,
    /// Deadline for each router and RPC call
    pub request_timeout: Duration,
    /// Deadline for confirmation after submission
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            input_mint: WSOL_MINT.to_string(),
            spend_amount: LAMPORTS_PER_SOL / 10, // 0.1 SOL
            slippage_bps: 100,
            request_timeout: Duration::from_secs(10),
            confirm_timeout: Duration::from_secs(60),
            confirm_poll_interval: Duration::from_millis(500),
        }
    }
}

pub struct TradeCoordinator {
    router: Arc<dyn RouterPort>,
    signer: Arc<dyn TransactionSigner>,
    chain: Arc<dyn ChainPort>,
    notifier: Arc<dyn NotificationPort>,
    gas_policy: GasPolicy,
    sticky_gas: StickyGas,
    settings: TradeSettings,
    stage: Mutex<TradeStage>,
    /// Serializes submissions from one wallet
    trade_lock: tokio::sync::Mutex<()>,
    /// Outcome notifications still being delivered
    notifications: Mutex<JoinSet<()>>,
}

impl TradeCoordinator {
    pub fn new(
        router: Arc<dyn RouterPort>,
        signer: Arc<dyn TransactionSigner>,
        chain: Arc<dyn ChainPort>,
        notifier: Arc<dyn NotificationPort>,
        gas_policy: GasPolicy,
        settings: TradeSettings,
    ) -> Self {
        Self {
            router,
            signer,
            chain,
            notifier,
            gas_policy,
            sticky_gas: StickyGas::new(),
            settings,
            stage: Mutex::new(TradeStage::Idle),
            trade_lock: tokio::sync::Mutex::new(()),
            notifications: Mutex::new(JoinSet::new()),
        }
    }

    pub fn sticky_gas(&self) -> Option<GasSettings> {
        self.sticky_gas.get()
    }

    pub fn current_stage(&self) -> TradeStage {
        *self.stage.lock()
    }

    pub fn settings(&self) -> &TradeSettings {
        &self.settings
    }

    /// Run one attempt to completion and notify the outcome
    pub async fn execute(&self, token_id: &str) -> TradeOutcome {
        let _lock = self.trade_lock.lock().await;

        self.enter(token_id, TradeStage::FeeSelection);
        let gas = self.select_gas().await;

        let outcome = match self.run(token_id, &gas).await {
            Ok(signature) => {
                self.sticky_gas.record_success(gas);
                self.enter(token_id, TradeStage::Confirmed);
                info!(token = token_id, signature = %signature, gas = %gas, "Trade confirmed");
                TradeOutcome::confirmed(token_id, signature, gas)
            }
            Err((signature, failure)) => {
                self.enter(token_id, TradeStage::Failed);
                warn!(
                    token = token_id,
                    stage = %failure.stage(),
                    error = %failure,
                    "Trade failed"
                );
                TradeOutcome::failed(token_id, signature, failure, gas)
            }
        };

        *self.stage.lock() = TradeStage::Idle;
        self.spawn_notification(outcome.message());
        outcome
    }

    /// Fire-and-forget delivery so slow sinks never hold up the next trade
    fn spawn_notification(&self, message: String) {
        let notifier = Arc::clone(&self.notifier);
        let mut pending = self.notifications.lock();
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            notify(notifier.as_ref(), &message).await;
        });
    }

    /// Wait for every outcome notification sent so far
    pub async fn flush_notifications(&self) {
        let mut pending = std::mem::take(&mut *self.notifications.lock());
        while pending.join_next().await.is_some() {}
    }

    fn enter(&self, token_id: &str, stage: TradeStage) {
        *self.stage.lock() = stage;
        info!(token = token_id, stage = %stage, "Trade stage");
    }

    async fn select_gas(&self) -> GasSettings {
        if let Some(sticky) = self.sticky_gas.get() {
            debug!(gas = %sticky, "Reusing gas settings from last confirmed trade");
            return sticky;
        }

        match tokio::time::timeout(self.settings.request_timeout, self.chain.recent_priority_fees()).await {
            Ok(Ok(fees)) => {
                let gas = self.gas_policy.from_observed_fees(&fees);
                debug!(samples = fees.len(), gas = %gas, "Gas settings from network fees");
                gas
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Priority fee query failed, using floor");
                self.gas_policy.fallback()
            }
            Err(_) => {
                warn!("Priority fee query timed out, using floor");
                self.gas_policy.fallback()
            }
        }
    }

    async fn run(
        &self,
        token_id: &str,
        gas: &GasSettings,
    ) -> Result<String, (Option<String>, TradeFailure)> {
        let timeout = self.settings.request_timeout;

        self.enter(token_id, TradeStage::QuoteRequested);
        let params = QuoteParams {
            input_mint: self.settings.input_mint.clone(),
            output_mint: token_id.to_string(),
            amount: self.settings.spend_amount,
            slippage_bps: self.settings.slippage_bps,
        };
        let route = tokio::time::timeout(timeout, self.router.quote(&params))
            .await
            .map_err(|_| ExecutionError::Timeout("quote".to_string()))
            .and_then(|r| r)
            .map_err(|e| (None, TradeFailure::QuoteUnavailable(e.to_string())))?;

        debug!(
            token = token_id,
            in_amount = route.in_amount,
            out_amount = route.out_amount,
            price_impact = route.price_impact_pct,
            "Route received"
        );

        let signer_pubkey = self.signer.pubkey();
        let unsigned = tokio::time::timeout(
            timeout,
            self.router.swap_transaction(&route, &signer_pubkey, gas),
        )
        .await
        .map_err(|_| ExecutionError::Timeout("swap".to_string()))
        .and_then(|r| r)
        .map_err(|e| (None, TradeFailure::QuoteUnavailable(e.to_string())))?;

        let signed = self
            .signer
            .sign(&unsigned, gas)
            .map_err(|e| (None, TradeFailure::SigningFailed(e.to_string())))?;
        self.enter(token_id, TradeStage::RouteSigned);

        let signature = match tokio::time::timeout(timeout, self.chain.send_transaction(&signed.wire)).await {
            Ok(Ok(sig)) => sig,
            Ok(Err(PortError::Timeout(e))) => {
                return Err((Some(signed.signature), TradeFailure::SubmissionTimeout(e)))
            }
            Ok(Err(e)) => return Err((Some(signed.signature), TradeFailure::Rejected(e.to_string()))),
            Err(_) => {
                return Err((
                    Some(signed.signature),
                    TradeFailure::SubmissionTimeout("send timed out".to_string()),
                ))
            }
        };
        self.enter(token_id, TradeStage::Submitted);

        match tokio::time::timeout(self.settings.confirm_timeout, self.await_confirmation(&signature)).await {
            Ok(Ok(())) => Ok(signature),
            Ok(Err(reason)) => Err((Some(signature), TradeFailure::Rejected(reason))),
            Err(_) => Err((
                Some(signature),
                TradeFailure::SubmissionTimeout(format!(
                    "not confirmed within {:?}",
                    self.settings.confirm_timeout
                )),
            )),
        }
    }

    /// Poll until confirmed or failed on chain. Status query errors are retried.
    async fn await_confirmation(&self, signature: &str) -> Result<(), String> {
        loop {
            match self.chain.signature_status(signature).await {
                Ok(TxStatus::Confirmed) => return Ok(()),
                Ok(TxStatus::Failed(err)) => return Err(err),
                Ok(TxStatus::Pending) => {}
                Err(e) => debug!(signature, error = %e, "Status query failed"),
            }
            tokio::time::sleep(self.settings.confirm_poll_interval).await;
        }
    }
}
