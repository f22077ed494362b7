//! Event Pipeline
//!
//! Wires the two producers (chain logs, social posts) through the mention
//! filter, aggregator and decision policy into a single sequential trade
//! worker, with bounded channels between stages and one cancellation token
//! for shutdown. Every subscription opened here is released on every exit
//! path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::trade_coordinator::TradeCoordinator;
use crate::domain::{
    Candidate, Decision, DecisionPolicy, MentionFilter, SocialPost, SwapEventTracker,
};
use crate::ports::{
    Commitment, LogSubscription, LogSubscriptionPort, PortError, SocialStreamPort, SwapLogDecoder,
};
use crate::strategy::SignalAggregator;

/// Default capacity of the candidate and trade queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default trend report interval
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Chain log subscription failed: {0}")]
    Subscribe(PortError),

    #[error("Social stream connection failed: {0}")]
    Connect(PortError),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub program_id: String,
    pub pool_id: String,
    pub commitment: Commitment,
    /// Rules installed on the social stream
    pub keyword_rules: Vec<String>,
    pub report_interval: Duration,
    pub queue_capacity: usize,
}

/// Counters for the lifetime of one run
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub notifications: AtomicU64,
    pub swaps_ingested: AtomicU64,
    pub posts: AtomicU64,
    pub mentions: AtomicU64,
    pub candidates: AtomicU64,
    pub aggregations: AtomicU64,
    pub buys: AtomicU64,
    pub skips: AtomicU64,
    pub trades_confirmed: AtomicU64,
    pub trades_failed: AtomicU64,
    pub buys_discarded: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub notifications: u64,
    pub swaps_ingested: u64,
    pub posts: u64,
    pub mentions: u64,
    pub candidates: u64,
    pub aggregations: u64,
    pub buys: u64,
    pub skips: u64,
    pub trades_confirmed: u64,
    pub trades_failed: u64,
    pub buys_discarded: u64,
}

impl PipelineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            notifications: get(&self.notifications),
            swaps_ingested: get(&self.swaps_ingested),
            posts: get(&self.posts),
            mentions: get(&self.mentions),
            candidates: get(&self.candidates),
            aggregations: get(&self.aggregations),
            buys: get(&self.buys),
            skips: get(&self.skips),
            trades_confirmed: get(&self.trades_confirmed),
            trades_failed: get(&self.trades_failed),
            buys_discarded: get(&self.buys_discarded),
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    logs: Arc<dyn LogSubscriptionPort>,
    decoder: Arc<dyn SwapLogDecoder>,
    social: Arc<dyn SocialStreamPort>,
    tracker: Arc<SwapEventTracker>,
    filter: Arc<MentionFilter>,
    aggregator: Arc<SignalAggregator>,
    policy: Arc<DecisionPolicy>,
    coordinator: Arc<TradeCoordinator>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        logs: Arc<dyn LogSubscriptionPort>,
        decoder: Arc<dyn SwapLogDecoder>,
        social: Arc<dyn SocialStreamPort>,
        filter: MentionFilter,
        aggregator: SignalAggregator,
        policy: DecisionPolicy,
        coordinator: Arc<TradeCoordinator>,
        tracker: Arc<SwapEventTracker>,
    ) -> Self {
        Self {
            config,
            logs,
            decoder,
            social,
            tracker,
            filter: Arc::new(filter),
            aggregator: Arc::new(aggregator),
            policy: Arc::new(policy),
            coordinator,
            stats: Arc::new(PipelineStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    pub fn tracker(&self) -> Arc<SwapEventTracker> {
        Arc::clone(&self.tracker)
    }

    /// Run until `shutdown` is cancelled. Fails only if a producer cannot start.
    pub async fn run(self, shutdown: CancellationToken) -> Result<StatsSnapshot, PipelineError> {
        let subscription = self
            .logs
            .subscribe(&self.config.program_id, self.config.commitment)
            .await
            .map_err(PipelineError::Subscribe)?;
        info!(
            program = %self.config.program_id,
            pool = %self.config.pool_id,
            subscription = subscription.id,
            "Subscribed to chain logs"
        );

        let posts = match self.social.connect(&self.config.keyword_rules).await {
            Ok(rx) => rx,
            Err(e) => {
                release_subscription(self.logs.as_ref(), subscription.id).await;
                return Err(PipelineError::Connect(e));
            }
        };
        info!(rules = ?self.config.keyword_rules, "Connected to social stream");

        let capacity = self.config.queue_capacity.max(1);
        let (candidate_tx, candidate_rx) = mpsc::channel::<Candidate>(capacity);
        let (trade_tx, trade_rx) = mpsc::channel::<String>(capacity);

        let mut tasks = JoinSet::new();

        tasks.spawn(chain_task(
            subscription,
            Arc::clone(&self.logs),
            Arc::clone(&self.decoder),
            Arc::clone(&self.tracker),
            self.config.pool_id.clone(),
            Arc::clone(&self.stats),
            shutdown.clone(),
        ));

        tasks.spawn(social_task(
            posts,
            Arc::clone(&self.social),
            Arc::clone(&self.filter),
            candidate_tx,
            Arc::clone(&self.stats),
            shutdown.clone(),
        ));

        tasks.spawn(correlation_task(
            candidate_rx,
            Arc::clone(&self.aggregator),
            Arc::clone(&self.policy),
            trade_tx,
            Arc::clone(&self.stats),
            shutdown.clone(),
        ));

        tasks.spawn(trade_worker(
            trade_rx,
            Arc::clone(&self.coordinator),
            Arc::clone(&self.stats),
            shutdown.clone(),
        ));

        tasks.spawn(trend_reporter(
            Arc::clone(&self.tracker),
            self.config.report_interval,
            shutdown.clone(),
        ));

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Pipeline task panicked");
                shutdown.cancel();
            }
        }

        let stats = self.stats.snapshot();
        info!(?stats, "Pipeline stopped");
        Ok(stats)
    }
}

async fn release_subscription(logs: &dyn LogSubscriptionPort, id: u64) {
    match logs.unsubscribe(id).await {
        Ok(()) => info!(subscription = id, "Unsubscribed from chain logs"),
        Err(e) => warn!(subscription = id, error = %e, "Unsubscribe failed"),
    }
}

async fn chain_task(
    mut subscription: LogSubscription,
    logs: Arc<dyn LogSubscriptionPort>,
    decoder: Arc<dyn SwapLogDecoder>,
    tracker: Arc<SwapEventTracker>,
    pool_id: String,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = subscription.notifications.recv() => {
                let Some(notification) = received else {
                    warn!("Chain log stream closed");
                    break;
                };
                PipelineStats::bump(&stats.notifications);

                if !notification.is_swap_for_pool(&pool_id) {
                    continue;
                }
                if let Some(event) = decoder.decode(&pool_id, &notification) {
                    if tracker.ingest(event) {
                        PipelineStats::bump(&stats.swaps_ingested);
                    }
                } else {
                    debug!(signature = %notification.signature, "Swap log not decoded");
                }
            }
        }
    }

    // Unblocks a producer stuck on a full channel
    let id = subscription.id;
    drop(subscription);
    release_subscription(logs.as_ref(), id).await;
}

async fn social_task(
    mut posts: mpsc::Receiver<SocialPost>,
    social: Arc<dyn SocialStreamPort>,
    filter: Arc<MentionFilter>,
    candidates: mpsc::Sender<Candidate>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    loop {
        let post = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = posts.recv() => match received {
                Some(post) => post,
                None => {
                    warn!("Social stream closed");
                    break;
                }
            },
        };
        PipelineStats::bump(&stats.posts);

        let Some(mention) = filter.process(&post) else {
            continue;
        };
        PipelineStats::bump(&stats.mentions);

        let Some(candidate) = Candidate::from_mention(mention) else {
            debug!(post = %post.post_id, "Mention without token address");
            continue;
        };
        PipelineStats::bump(&stats.candidates);
        info!(
            token = %candidate.token_id,
            author = %candidate.author_id(),
            followers = candidate.originating_mention.author_follower_count,
            "Candidate surfaced"
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            sent = candidates.send(candidate) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    drop(posts);
    match social.disconnect().await {
        Ok(()) => info!("Disconnected from social stream"),
        Err(e) => warn!(error = %e, "Social stream disconnect failed"),
    }
}

async fn correlation_task(
    mut candidates: mpsc::Receiver<Candidate>,
    aggregator: Arc<SignalAggregator>,
    policy: Arc<DecisionPolicy>,
    trades: mpsc::Sender<String>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = done {
                    error!(error = %e, "Aggregation task panicked");
                }
            }
            received = candidates.recv() => {
                let Some(candidate) = received else { break };
                let aggregator = Arc::clone(&aggregator);
                let policy = Arc::clone(&policy);
                let trades = trades.clone();
                let stats = Arc::clone(&stats);

                in_flight.spawn(async move {
                    let Some(score) = aggregator.evaluate_once(&candidate).await else {
                        return;
                    };
                    PipelineStats::bump(&stats.aggregations);

                    match policy.decide(&score) {
                        Decision::Buy => {
                            PipelineStats::bump(&stats.buys);
                            info!(token = %score.token_id, composite = score.composite, "Decision: BUY");
                            if trades.send(score.token_id.clone()).await.is_err() {
                                PipelineStats::bump(&stats.buys_discarded);
                                warn!(token = %score.token_id, "Trade queue closed, BUY dropped");
                            }
                        }
                        Decision::Skip(reason) => {
                            PipelineStats::bump(&stats.skips);
                            info!(token = %score.token_id, %reason, "Decision: SKIP");
                        }
                    }
                });
            }
        }
    }

    // Let in-flight aggregations finish; each evaluator is bounded by its timeout
    while let Some(done) = in_flight.join_next().await {
        if let Err(e) = done {
            error!(error = %e, "Aggregation task panicked");
        }
    }
}

async fn trade_worker(
    mut trades: mpsc::Receiver<String>,
    coordinator: Arc<TradeCoordinator>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    loop {
        let token_id = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = trades.recv() => match received {
                Some(token_id) => token_id,
                None => break,
            },
        };

        // Not cancellable once started; bounded by the stage timeouts
        let outcome = coordinator.execute(&token_id).await;
        if outcome.succeeded {
            PipelineStats::bump(&stats.trades_confirmed);
        } else {
            PipelineStats::bump(&stats.trades_failed);
        }
    }

    trades.close();
    while let Ok(token_id) = trades.try_recv() {
        PipelineStats::bump(&stats.buys_discarded);
        warn!(token = %token_id, "Shutdown: discarding queued BUY");
    }

    // Each sink is bounded by its own request timeout
    coordinator.flush_notifications().await;
}

async fn trend_reporter(tracker: Arc<SwapEventTracker>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = tracker.snapshot();
                info!(
                    samples = snapshot.samples,
                    "Volume Trend: {} | Total Volume: {} SOL",
                    snapshot.trend,
                    snapshot.total_volume
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::trade_coordinator::TradeSettings;
    use crate::domain::{GasPolicy, MentionFilterConfig, SwapEvent};
    use crate::ports::mocks::{
        MockChain, MockCredibility, MockLogSubscription, MockRouter, MockSafetyCheck, MockSigner,
        MockSocialStream, MockTokenAnalysis, RecordingNotifier,
    };
    use crate::ports::{LogNotification, NullSwapDecoder, TokenAnalysis};
    use crate::domain::{CooldownGate, RugPullRisk};
    use crate::strategy::{SafetyEvaluator, TokenAnalysisEvaluator, WeightedScoring};
    use rust_decimal::Decimal;

    const POOL: &str = "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2";
    const PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

    struct FixedDecoder;

    impl SwapLogDecoder for FixedDecoder {
        fn decode(&self, pool_id: &str, _notification: &LogNotification) -> Option<SwapEvent> {
            Some(SwapEvent::new(pool_id, Decimal::ONE))
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            program_id: PROGRAM.to_string(),
            pool_id: POOL.to_string(),
            commitment: Commitment::Confirmed,
            keyword_rules: vec!["memecoin".to_string()],
            report_interval: Duration::from_millis(50),
            queue_capacity: 8,
        }
    }

    fn pipeline(
        logs: &MockLogSubscription,
        social: &MockSocialStream,
        decoder: Arc<dyn SwapLogDecoder>,
    ) -> Pipeline {
        let coordinator = Arc::new(TradeCoordinator::new(
            Arc::new(MockRouter::new()),
            Arc::new(MockSigner::new()),
            Arc::new(MockChain::new()),
            Arc::new(RecordingNotifier::new()),
            GasPolicy::default(),
            TradeSettings::default(),
        ));
        let aggregator = SignalAggregator::new(
            Arc::new(WeightedScoring::default()),
            Duration::from_secs(1),
            Arc::new(CooldownGate::new(Duration::from_secs(60))),
        )
        .with_evaluator(Arc::new(TokenAnalysisEvaluator::new(
            Arc::new(MockTokenAnalysis::returning(TokenAnalysis {
                liquidity: 1.0,
                smart_money_activity: 0.0,
                holder_count: 1,
                rug_risk: RugPullRisk::High,
            })),
            10.0,
        )))
        .with_evaluator(Arc::new(SafetyEvaluator::new(
            Arc::new(MockSafetyCheck::returning(90.0)),
            30.0,
        )));

        Pipeline::new(
            config(),
            Arc::new(logs.clone()),
            decoder,
            Arc::new(social.clone()),
            MentionFilter::new(MentionFilterConfig::default()).unwrap(),
            aggregator,
            DecisionPolicy::new(70.0, vec!["rug_safe".to_string()]),
            coordinator,
            Arc::new(SwapEventTracker::new(POOL)),
        )
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn test_releases_subscriptions_on_shutdown() {
        let logs = MockLogSubscription::new();
        let social = MockSocialStream::new();
        let p = pipeline(&logs, &social, Arc::new(NullSwapDecoder));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(p.run(shutdown.clone()));

        wait_until(|| social.is_connected()).await;
        assert_eq!(logs.subscribed_programs(), vec![PROGRAM.to_string()]);

        shutdown.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(logs.unsubscribed().len(), 1);
        assert_eq!(logs.open_subscriptions(), 0);
        assert_eq!(social.disconnect_count(), 1);
        assert_eq!(social.rules(), vec!["memecoin".to_string()]);
    }

    #[tokio::test]
    async fn test_only_matching_swap_logs_reach_tracker() {
        let logs = MockLogSubscription::new();
        let social = MockSocialStream::new();
        let p = pipeline(&logs, &social, Arc::new(FixedDecoder));
        let tracker = p.tracker();
        let stats = p.stats();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(p.run(shutdown.clone()));
        wait_until(|| logs.open_subscriptions() == 1).await;

        let note = |lines: Vec<String>| LogNotification {
            signature: "sig".to_string(),
            logs: lines,
            slot: 1,
        };
        logs.push(note(vec![format!("pool {}", POOL), "Instruction: Swap".to_string()])).await;
        logs.push(note(vec!["Instruction: Swap".to_string()])).await;
        logs.push(note(vec![format!("pool {}", POOL)])).await;

        wait_until(|| stats.snapshot().notifications == 3).await;
        assert_eq!(tracker.len(), 1);
        assert_eq!(stats.snapshot().swaps_ingested, 1);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_risky_candidate_skipped() {
        let logs = MockLogSubscription::new();
        let social = MockSocialStream::new();
        let p = pipeline(&logs, &social, Arc::new(NullSwapDecoder));
        let stats = p.stats();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(p.run(shutdown.clone()));
        wait_until(|| social.is_connected()).await;

        social
            .push(SocialPost {
                post_id: "1".to_string(),
                text: "memecoin ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC".to_string(),
                author_id: "a".to_string(),
                author_username: None,
                author_follower_count: 500,
                created_at: chrono::Utc::now(),
            })
            .await;

        wait_until(|| stats.snapshot().skips == 1).await;
        assert_eq!(stats.snapshot().buys, 0);

        shutdown.cancel();
        let final_stats = handle.await.unwrap().unwrap();
        assert_eq!(final_stats.candidates, 1);
        assert_eq!(final_stats.aggregations, 1);
    }

    #[tokio::test]
    async fn test_connect_failure_releases_chain_subscription() {
        struct DownSocial;

        #[async_trait::async_trait]
        impl SocialStreamPort for DownSocial {
            async fn connect(&self, _rules: &[String]) -> crate::ports::PortResult<mpsc::Receiver<SocialPost>> {
                Err(PortError::Authentication("bad token".into()))
            }

            async fn disconnect(&self) -> crate::ports::PortResult<()> {
                Ok(())
            }
        }

        let logs = MockLogSubscription::new();
        let social = MockSocialStream::new();
        let mut p = pipeline(&logs, &social, Arc::new(NullSwapDecoder));
        p.social = Arc::new(DownSocial);

        let result = p.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::Connect(_))));
        assert_eq!(logs.unsubscribed().len(), 1);
    }

    /// Producers whose release waits for the consumer to drop its receiver,
    /// the way a real reader blocked on a full channel does
    #[derive(Default)]
    struct BlockingProducers {
        posts: parking_lot::Mutex<Option<mpsc::Sender<SocialPost>>>,
        logs: parking_lot::Mutex<Option<mpsc::Sender<LogNotification>>>,
    }

    #[async_trait::async_trait]
    impl SocialStreamPort for BlockingProducers {
        async fn connect(&self, _rules: &[String]) -> crate::ports::PortResult<mpsc::Receiver<SocialPost>> {
            let (tx, rx) = mpsc::channel(1);
            *self.posts.lock() = Some(tx);
            Ok(rx)
        }

        async fn disconnect(&self) -> crate::ports::PortResult<()> {
            let tx = self.posts.lock().take();
            if let Some(tx) = tx {
                tx.closed().await;
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl LogSubscriptionPort for BlockingProducers {
        async fn subscribe(
            &self,
            _program_id: &str,
            _commitment: Commitment,
        ) -> crate::ports::PortResult<LogSubscription> {
            let (tx, rx) = mpsc::channel(1);
            *self.logs.lock() = Some(tx);
            Ok(LogSubscription { id: 1, notifications: rx })
        }

        async fn unsubscribe(&self, _id: u64) -> crate::ports::PortResult<()> {
            let tx = self.logs.lock().take();
            if let Some(tx) = tx {
                tx.closed().await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_drops_receivers_before_release() {
        let logs = MockLogSubscription::new();
        let social = MockSocialStream::new();
        let producers = Arc::new(BlockingProducers::default());
        let mut p = pipeline(&logs, &social, Arc::new(NullSwapDecoder));
        p.logs = producers.clone() as Arc<dyn LogSubscriptionPort>;
        p.social = producers.clone() as Arc<dyn SocialStreamPort>;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(p.run(shutdown.clone()));
        wait_until(|| producers.posts.lock().is_some()).await;
        // Let the producer tasks start reading before cancelling
        tokio::time::sleep(Duration::from_millis(20)).await;

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("pipeline shutdown blocked on a producer")
            .unwrap()
            .unwrap();
        assert!(producers.posts.lock().is_none());
        assert!(producers.logs.lock().is_none());
    }
}
