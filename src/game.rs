use crate::{
    api::{
        ApiError,
        ApiResult,
        GameApi,
        PlayOutcome,
    },
    history::HistoryLog,
    ledger::{
        ActionRefusal,
        BalanceLedger,
    },
    model::{
        CoinSide,
        GameOutcomeRecord,
    },
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::sleep,
};

/// Minimum time between placing a bet and showing its result. The server
/// round-trip runs concurrently; the reveal happens at the later of the
/// two, so a fast server never cuts the flip animation short and a slow
/// one simply extends it.
pub const REVEAL_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundPhase {
    Idle,
    /// Bet accepted, coin spinning, server call in flight or already back.
    Flipping,
}

/// What the round task reports back once both the server response and the
/// reveal delay are in.
#[derive(Debug)]
pub struct RoundMessage {
    pub stake: u64,
    pub choice: CoinSide,
    pub result: ApiResult<PlayOutcome>,
}

#[derive(Debug)]
pub enum Settlement {
    Settled(GameOutcomeRecord),
    /// The round never happened server-side; the stake came back in full.
    Failed { stake: u64, error: ApiError },
}

/// Drives one bet round at a time: debits the ledger up front, runs the
/// server call and the reveal timer concurrently on a spawned task, and
/// settles whichever way the server answered. Round results arrive on the
/// receiver returned by the constructor so the main loop can `select!` on
/// them alongside everything else.
pub struct GameController {
    phase: RoundPhase,
    tx: mpsc::Sender<RoundMessage>,
    reveal_delay: Duration,
}

impl GameController {
    pub fn new() -> (Self, mpsc::Receiver<RoundMessage>) {
        Self::with_reveal_delay(REVEAL_DELAY)
    }

    pub fn with_reveal_delay(reveal_delay: Duration) -> (Self, mpsc::Receiver<RoundMessage>) {
        let (tx, rx) = mpsc::channel(4);
        (
            Self {
                phase: RoundPhase::Idle,
                tx,
                reveal_delay,
            },
            rx,
        )
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn flipping(&self) -> bool {
        self.phase == RoundPhase::Flipping
    }

    /// Debit the stake and kick off the round. Refusals are local and
    /// instant; once this returns `Ok` a [`RoundMessage`] will arrive on
    /// the round receiver no sooner than the reveal delay.
    pub fn place_bet<G>(
        &mut self,
        api: &G,
        ledger: &mut BalanceLedger,
        stake: u64,
        choice: CoinSide,
    ) -> Result<u64, ActionRefusal>
    where
        G: GameApi + Clone + Send + Sync + 'static,
    {
        let remaining = ledger.begin_bet(stake)?;
        self.phase = RoundPhase::Flipping;

        let api = api.clone();
        let tx = self.tx.clone();
        let delay = self.reveal_delay;
        tokio::spawn(async move {
            let (result, ()) = tokio::join!(api.play(stake, choice), sleep(delay));
            let _ = tx.send(RoundMessage {
                stake,
                choice,
                result,
            })
            .await;
        });
        Ok(remaining)
    }

    /// Apply the server's verdict: credit or confirm the debit on the
    /// ledger, and record the round in the history log. A failed round
    /// refunds the stake and leaves no history entry.
    pub fn settle(
        &mut self,
        round: RoundMessage,
        ledger: &mut BalanceLedger,
        history: &mut HistoryLog,
    ) -> Settlement {
        self.phase = RoundPhase::Idle;
        match round.result {
            Ok(outcome) => {
                ledger.resolve_bet(outcome.won, outcome.payout);
                let record = GameOutcomeRecord::settled(
                    round.choice,
                    outcome.outcome,
                    round.stake,
                    outcome.payout,
                    outcome.timestamp,
                    outcome.server_id,
                );
                history.prepend(record.clone());
                Settlement::Settled(record)
            }
            Err(error) => {
                ledger.resolve_bet_failure();
                Settlement::Failed {
                    stake: round.stake,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{
        Arc,
        Mutex,
    };
    use tokio::time::Instant;

    #[derive(Clone)]
    struct FakeGame {
        response: Arc<Mutex<Option<ApiResult<PlayOutcome>>>>,
        delay: Duration,
    }

    impl FakeGame {
        fn responding(result: ApiResult<PlayOutcome>, delay: Duration) -> Self {
            Self {
                response: Arc::new(Mutex::new(Some(result))),
                delay,
            }
        }
    }

    impl GameApi for FakeGame {
        fn play(
            &self,
            _stake: u64,
            _choice: CoinSide,
        ) -> impl Future<Output = ApiResult<PlayOutcome>> + Send {
            let response = Arc::clone(&self.response);
            let delay = self.delay;
            async move {
                sleep(delay).await;
                response.lock().unwrap().take().expect("one play per fake")
            }
        }

        fn full_history(&self) -> impl Future<Output = ApiResult<Vec<GameOutcomeRecord>>> + Send {
            async move { Ok(Vec::new()) }
        }
    }

    fn win(payout: u64) -> ApiResult<PlayOutcome> {
        Ok(PlayOutcome {
            outcome: CoinSide::Heads,
            won: true,
            payout,
            timestamp: Utc::now(),
            server_id: Some(1),
        })
    }

    fn loss() -> ApiResult<PlayOutcome> {
        Ok(PlayOutcome {
            outcome: CoinSide::Tails,
            won: false,
            payout: 0,
            timestamp: Utc::now(),
            server_id: Some(2),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn won_round_credits_stake_plus_payout() {
        let api = FakeGame::responding(win(500), Duration::ZERO);
        let (mut game, mut rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);
        let mut history = HistoryLog::new();

        game.place_bet(&api, &mut ledger, 500, CoinSide::Heads)
            .unwrap();
        assert_eq!(ledger.balance(), 500, "stake debited immediately");
        assert!(game.flipping());

        let round = rounds.recv().await.unwrap();
        match game.settle(round, &mut ledger, &mut history) {
            Settlement::Settled(record) => {
                assert!(record.won);
                assert_eq!(record.net_delta, 500);
            }
            other => panic!("expected a settled round, got {other:?}"),
        }
        assert_eq!(ledger.balance(), 1500);
        assert_eq!(history.quick().len(), 1);
        assert!(!game.flipping());
    }

    #[tokio::test(start_paused = true)]
    async fn lost_round_keeps_the_debit() {
        let api = FakeGame::responding(loss(), Duration::ZERO);
        let (mut game, mut rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);
        let mut history = HistoryLog::new();

        game.place_bet(&api, &mut ledger, 500, CoinSide::Heads)
            .unwrap();
        let round = rounds.recv().await.unwrap();
        game.settle(round, &mut ledger, &mut history);

        assert_eq!(ledger.balance(), 500);
        assert_eq!(history.quick()[0].net_delta, -500);
    }

    #[tokio::test(start_paused = true)]
    async fn overdrawn_bet_is_refused_locally() {
        // no request, no debit, no phase change
        let api = FakeGame::responding(win(0), Duration::ZERO);
        let (mut game, _rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);

        let refusal = game
            .place_bet(&api, &mut ledger, 1500, CoinSide::Heads)
            .unwrap_err();
        assert_eq!(refusal, ActionRefusal::InsufficientFunds);
        assert_eq!(ledger.balance(), 1000);
        assert!(!game.flipping());
        assert!(api.response.lock().unwrap().is_some(), "server never called");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_round_refunds_and_leaves_no_record() {
        let api = FakeGame::responding(
            Err(ApiError::Payload("connection reset".into())),
            Duration::ZERO,
        );
        let (mut game, mut rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);
        let mut history = HistoryLog::new();

        game.place_bet(&api, &mut ledger, 500, CoinSide::Heads)
            .unwrap();
        let round = rounds.recv().await.unwrap();
        match game.settle(round, &mut ledger, &mut history) {
            Settlement::Failed { stake, .. } => assert_eq!(stake, 500),
            other => panic!("expected a failed round, got {other:?}"),
        }
        assert_eq!(ledger.balance(), 1000);
        assert!(history.quick().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_never_happens_before_the_delay() {
        // Server answers instantly; the reveal still waits out the timer.
        let api = FakeGame::responding(win(100), Duration::ZERO);
        let (mut game, mut rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);

        let placed_at = Instant::now();
        game.place_bet(&api, &mut ledger, 100, CoinSide::Heads)
            .unwrap();
        rounds.recv().await.unwrap();
        assert!(placed_at.elapsed() >= REVEAL_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_server_extends_the_reveal() {
        let api = FakeGame::responding(win(100), Duration::from_secs(5));
        let (mut game, mut rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);

        let placed_at = Instant::now();
        game.place_bet(&api, &mut ledger, 100, CoinSide::Heads)
            .unwrap();
        rounds.recv().await.unwrap();
        assert!(placed_at.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn second_bet_is_refused_while_one_is_flipping() {
        let api = FakeGame::responding(win(100), Duration::ZERO);
        let (mut game, _rounds) = GameController::new();
        let mut ledger = BalanceLedger::new(1000);

        game.place_bet(&api, &mut ledger, 100, CoinSide::Heads)
            .unwrap();
        let refusal = game
            .place_bet(&api, &mut ledger, 100, CoinSide::Tails)
            .unwrap_err();
        assert_eq!(refusal, ActionRefusal::ActionInProgress);
        assert_eq!(ledger.balance(), 900, "only the first stake is debited");
    }
}
