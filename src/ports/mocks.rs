//! Recording mocks for every port, usable from unit and integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::analysis::{
    CredibilityPort, CredibilityReport, SafetyCheckPort, SafetyReport, TokenAnalysis,
    TokenAnalysisPort,
};
use super::chain::{ChainPort, TxStatus};
use super::chain_logs::{LogNotification, LogSubscription, LogSubscriptionPort, SubscriptionId};
use super::execution::{
    ExecutionError, QuoteParams, RouteQuote, RouterPort, SignedTransaction, TransactionSigner,
};
use super::models::{Commitment, PortError, PortResult};
use super::notifier::NotificationPort;
use super::social::SocialStreamPort;
use crate::domain::{GasSettings, SocialPost};

const MOCK_CHANNEL_CAPACITY: usize = 64;

/// Log subscription whose notifications are pushed by the test
#[derive(Debug, Default, Clone)]
pub struct MockLogSubscription {
    senders: Arc<Mutex<HashMap<SubscriptionId, mpsc::Sender<LogNotification>>>>,
    subscribed: Arc<Mutex<Vec<String>>>,
    unsubscribed: Arc<Mutex<Vec<SubscriptionId>>>,
    next_id: Arc<Mutex<SubscriptionId>>,
}

impl MockLogSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a notification to every open subscription
    pub async fn push(&self, notification: LogNotification) {
        let senders: Vec<_> = self.senders.lock().values().cloned().collect();
        for tx in senders {
            let _ = tx.send(notification.clone()).await;
        }
    }

    pub fn subscribed_programs(&self) -> Vec<String> {
        self.subscribed.lock().clone()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.lock().clone()
    }

    pub fn open_subscriptions(&self) -> usize {
        self.senders.lock().len()
    }
}

#[async_trait]
impl LogSubscriptionPort for MockLogSubscription {
    async fn subscribe(&self, program_id: &str, _commitment: Commitment) -> PortResult<LogSubscription> {
        let (tx, rx) = mpsc::channel(MOCK_CHANNEL_CAPACITY);
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.senders.lock().insert(id, tx);
        self.subscribed.lock().push(program_id.to_string());
        Ok(LogSubscription {
            id,
            notifications: rx,
        })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> PortResult<()> {
        self.senders.lock().remove(&id);
        self.unsubscribed.lock().push(id);
        Ok(())
    }
}

/// Social stream whose posts are pushed by the test
#[derive(Debug, Default, Clone)]
pub struct MockSocialStream {
    sender: Arc<Mutex<Option<mpsc::Sender<SocialPost>>>>,
    rules: Arc<Mutex<Vec<String>>>,
    disconnects: Arc<Mutex<usize>>,
}

impl MockSocialStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the stream is not connected
    pub async fn push(&self, post: SocialPost) -> bool {
        let tx = self.sender.lock().clone();
        match tx {
            Some(tx) => tx.send(post).await.is_ok(),
            None => false,
        }
    }

    pub fn rules(&self) -> Vec<String> {
        self.rules.lock().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        *self.disconnects.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.sender.lock().is_some()
    }
}

#[async_trait]
impl SocialStreamPort for MockSocialStream {
    async fn connect(&self, keyword_rules: &[String]) -> PortResult<mpsc::Receiver<SocialPost>> {
        let (tx, rx) = mpsc::channel(MOCK_CHANNEL_CAPACITY);
        *self.sender.lock() = Some(tx);
        *self.rules.lock() = keyword_rules.to_vec();
        Ok(rx)
    }

    async fn disconnect(&self) -> PortResult<()> {
        *self.sender.lock() = None;
        *self.disconnects.lock() += 1;
        Ok(())
    }
}

/// Router returning a canned quote and transaction
#[derive(Debug, Clone)]
pub struct MockRouter {
    quote_error: Option<ExecutionError>,
    delay: Option<Duration>,
    quotes: Arc<Mutex<Vec<QuoteParams>>>,
    swaps: Arc<Mutex<Vec<(String, GasSettings)>>>,
}

impl Default for MockRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRouter {
    pub fn new() -> Self {
        Self {
            quote_error: None,
            delay: None,
            quotes: Arc::new(Mutex::new(Vec::new())),
            swaps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: ExecutionError) -> Self {
        Self {
            quote_error: Some(error),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn quote_calls(&self) -> Vec<QuoteParams> {
        self.quotes.lock().clone()
    }

    pub fn swap_calls(&self) -> Vec<(String, GasSettings)> {
        self.swaps.lock().clone()
    }
}

#[async_trait]
impl RouterPort for MockRouter {
    async fn quote(&self, params: &QuoteParams) -> Result<RouteQuote, ExecutionError> {
        self.quotes.lock().push(params.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.quote_error {
            return Err(err.clone());
        }
        Ok(RouteQuote {
            input_mint: params.input_mint.clone(),
            output_mint: params.output_mint.clone(),
            in_amount: params.amount,
            out_amount: params.amount * 1_000,
            price_impact_pct: 0.1,
            raw: serde_json::json!({ "outputMint": params.output_mint }),
        })
    }

    async fn swap_transaction(
        &self,
        route: &RouteQuote,
        signer_pubkey: &str,
        gas: &GasSettings,
    ) -> Result<Vec<u8>, ExecutionError> {
        self.swaps.lock().push((signer_pubkey.to_string(), *gas));
        Ok(format!("unsigned:{}", route.output_mint).into_bytes())
    }
}

/// Signer that prefixes the payload instead of signing
#[derive(Debug, Clone, Default)]
pub struct MockSigner {
    fail: bool,
    signed: Arc<Mutex<Vec<GasSettings>>>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn signed_with(&self) -> Vec<GasSettings> {
        self.signed.lock().clone()
    }
}

impl TransactionSigner for MockSigner {
    fn pubkey(&self) -> String {
        "MockSigner1111111111111111111111111111111111".to_string()
    }

    fn sign(&self, unsigned: &[u8], gas: &GasSettings) -> Result<SignedTransaction, ExecutionError> {
        if self.fail {
            return Err(ExecutionError::SigningError("mock signer refused".to_string()));
        }
        self.signed.lock().push(*gas);
        let mut wire = b"signed:".to_vec();
        wire.extend_from_slice(unsigned);
        Ok(SignedTransaction {
            signature: format!("MockSig{}", self.signed.lock().len()),
            wire,
        })
    }
}

/// Chain RPC with canned fees, submission result and confirmation
#[derive(Debug, Clone)]
pub struct MockChain {
    fees: Result<Vec<u64>, PortError>,
    send_error: Option<PortError>,
    status: TxStatus,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fee_queries: Arc<Mutex<usize>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            fees: Ok(vec![5_000, 20_000, 15_000]),
            send_error: None,
            status: TxStatus::Confirmed,
            sent: Arc::new(Mutex::new(Vec::new())),
            fee_queries: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_fees(mut self, fees: Vec<u64>) -> Self {
        self.fees = Ok(fees);
        self
    }

    pub fn with_fee_error(mut self, err: PortError) -> Self {
        self.fees = Err(err);
        self
    }

    pub fn with_send_error(mut self, err: PortError) -> Self {
        self.send_error = Some(err);
        self
    }

    pub fn with_status(mut self, status: TxStatus) -> Self {
        self.status = status;
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    pub fn fee_queries(&self) -> usize {
        *self.fee_queries.lock()
    }
}

#[async_trait]
impl ChainPort for MockChain {
    async fn recent_priority_fees(&self) -> PortResult<Vec<u64>> {
        *self.fee_queries.lock() += 1;
        self.fees.clone()
    }

    async fn send_transaction(&self, wire: &[u8]) -> PortResult<String> {
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }
        let mut sent = self.sent.lock();
        sent.push(wire.to_vec());
        Ok(format!("MockTx{}", sent.len()))
    }

    async fn signature_status(&self, _signature: &str) -> PortResult<TxStatus> {
        Ok(self.status.clone())
    }
}

/// Canned response for an analysis mock: value, error, and optional delay
#[derive(Debug, Clone)]
struct Canned<T> {
    response: Result<T, PortError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl<T: Clone> Canned<T> {
    fn new(response: Result<T, PortError>) -> Self {
        Self {
            response,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn respond(&self, key: &str) -> PortResult<T> {
        self.calls.lock().push(key.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockTokenAnalysis(Canned<TokenAnalysis>);

impl MockTokenAnalysis {
    pub fn returning(analysis: TokenAnalysis) -> Self {
        Self(Canned::new(Ok(analysis)))
    }

    pub fn failing(err: PortError) -> Self {
        Self(Canned::new(Err(err)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.0.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.calls.lock().clone()
    }
}

#[async_trait]
impl TokenAnalysisPort for MockTokenAnalysis {
    async fn token_analysis(&self, token_id: &str) -> PortResult<TokenAnalysis> {
        self.0.respond(token_id).await
    }
}

#[derive(Debug, Clone)]
pub struct MockSafetyCheck(Canned<SafetyReport>);

impl MockSafetyCheck {
    pub fn returning(risk_score: f64) -> Self {
        Self(Canned::new(Ok(SafetyReport { risk_score })))
    }

    pub fn failing(err: PortError) -> Self {
        Self(Canned::new(Err(err)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.0.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.calls.lock().clone()
    }
}

#[async_trait]
impl SafetyCheckPort for MockSafetyCheck {
    async fn safety_check(&self, token_id: &str) -> PortResult<SafetyReport> {
        self.0.respond(token_id).await
    }
}

#[derive(Debug, Clone)]
pub struct MockCredibility(Canned<CredibilityReport>);

impl MockCredibility {
    pub fn returning(score: f64) -> Self {
        Self(Canned::new(Ok(CredibilityReport { score })))
    }

    pub fn failing(err: PortError) -> Self {
        Self(Canned::new(Err(err)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.0.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.calls.lock().clone()
    }
}

#[async_trait]
impl CredibilityPort for MockCredibility {
    async fn credibility(&self, author_id: &str) -> PortResult<CredibilityReport> {
        self.0.respond(author_id).await
    }
}

/// Notifier that records every message
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn send(&self, message: &str) -> PortResult<()> {
        self.messages.lock().push(message.to_string());
        if self.fail {
            return Err(PortError::Communication("mock sink down".to_string()));
        }
        Ok(())
    }
}
