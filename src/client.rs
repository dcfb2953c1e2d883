use crate::{
    api::{
        ApiClient,
        ApiError,
    },
    game::{
        GameController,
        RoundMessage,
        Settlement,
    },
    history::HistoryLog,
    ledger::BalanceLedger,
    model::{
        AdminGameStats,
        CoinSide,
        GameOutcomeRecord,
        ManagedUser,
        SessionPatch,
        TransactionRecord,
        UserSession,
        WithdrawalRecord,
    },
    session::SessionStore,
    sync,
    ui,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    io::{
        self,
        Write,
    },
    path::PathBuf,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    error,
    info,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Stake tiers offered at the table.
pub const STAKE_OPTIONS: [u64; 4] = [100, 1_000, 5_000, 10_000];

pub const HISTORY_PAGE_SIZE: usize = 10;

const REFRESH_INTERVAL: Duration = Duration::from_secs(10);
const FLIP_FRAME_INTERVAL: Duration = Duration::from_millis(120);
const MAX_ERRORS: usize = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_url: String,
    pub state_dir: Option<PathBuf>,
}

/// Privileged data for the admin screen, fetched on demand.
#[derive(Clone, Debug, Default)]
pub struct AdminData {
    pub stats: Vec<AdminGameStats>,
    pub withdrawals: Vec<WithdrawalRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub users: Vec<ManagedUser>,
}

/// Everything the UI needs for one frame. Rebuilt after every loop turn;
/// the draw layer never reaches back into the controller.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub server: String,
    pub session: UserSession,
    pub is_admin: bool,
    pub selected_choice: CoinSide,
    pub selected_stake: u64,
    pub flipping: bool,
    pub flip_frame: usize,
    pub quick_history: Vec<GameOutcomeRecord>,
    pub history_page: Vec<GameOutcomeRecord>,
    pub history_page_idx: usize,
    pub history_page_count: usize,
    pub withdrawals: Vec<WithdrawalRecord>,
    pub admin: Option<AdminData>,
    pub status: String,
    pub errors: Vec<String>,
}

enum AuthFlow {
    Authenticated,
    Quit,
}

enum SessionEnd {
    Quit,
    LoggedOut,
}

pub struct AppController {
    api: ApiClient,
    store: SessionStore,
    ledger: BalanceLedger,
    game: GameController,
    history: HistoryLog,
    selected_choice: CoinSide,
    stake_idx: usize,
    history_page: usize,
    withdrawals: Vec<WithdrawalRecord>,
    admin: Option<AdminData>,
    flip_frame: usize,
    status: String,
    errors: Vec<String>,
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let api = ApiClient::new(&config.server_url).wrap_err("building http client failed")?;
    let store = match config.state_dir.clone() {
        Some(dir) => SessionStore::open(dir),
        None => SessionStore::in_memory(),
    };
    if let Some(token) = store.token() {
        api.set_token(Some(token));
    }
    let mut controller = AppController::new(api, store);

    loop {
        if controller.store.current().is_none() {
            match authenticate(&mut controller).await? {
                AuthFlow::Quit => return Ok(()),
                AuthFlow::Authenticated => {}
            }
        }
        let mut rounds = controller.begin_session();

        let mut ui_state = ui::UiState::default();
        let mut input_events = ui::input_event_stream();
        info!("entering table view");
        ui::terminal_enter(&mut ui_state)?;
        let outcome =
            run_session(&mut controller, &mut rounds, &mut ui_state, &mut input_events).await;
        ui::terminal_exit()?;
        match outcome? {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::LoggedOut => {
                println!("logged out");
            }
        }
    }
}

/// Plain-terminal login/register prompts, before the alternate screen.
async fn authenticate(controller: &mut AppController) -> Result<AuthFlow> {
    println!("flipside — {}", controller.api);
    loop {
        let choice = prompt_line("[l]og in, [r]egister, [f]orgot password, [q]uit: ")?;
        match choice.trim() {
            "l" | "login" => {
                if try_login(controller).await? {
                    return Ok(AuthFlow::Authenticated);
                }
            }
            "r" | "register" => {
                if try_register(controller).await? {
                    return Ok(AuthFlow::Authenticated);
                }
            }
            "f" | "forgot" => try_password_reset(controller).await?,
            "q" | "quit" | "" => return Ok(AuthFlow::Quit),
            other => println!("unrecognized option: {other}"),
        }
    }
}

async fn try_login(controller: &mut AppController) -> Result<bool> {
    let username = prompt_line("username: ")?;
    let password = rpassword::prompt_password("password: ")?;
    match controller.api.login(username.trim(), &password).await {
        Ok((token, session)) => {
            info!(username = %session.username, "logged in");
            controller.api.set_token(Some(token.clone()));
            controller.store.set_authenticated(session, token);
            Ok(true)
        }
        Err(e) => {
            println!("login failed: {e}");
            Ok(false)
        }
    }
}

async fn try_register(controller: &mut AppController) -> Result<bool> {
    let username = prompt_line("username: ")?;
    let email = prompt_line("email: ")?;
    let password = rpassword::prompt_password("password: ")?;
    match controller
        .api
        .register(username.trim(), &password, email.trim())
        .await
    {
        Ok((token, session)) => {
            info!(username = %session.username, "registered");
            controller.api.set_token(Some(token.clone()));
            controller.store.set_authenticated(session, token);
            Ok(true)
        }
        Err(e @ ApiError::DuplicateUsername) => {
            println!("{e}");
            Ok(false)
        }
        Err(e) => {
            println!("registration failed: {e}");
            Ok(false)
        }
    }
}

/// Request a reset link, then walk the emailed token through validation
/// and the new password. Backs out to the auth menu at every step; a
/// successful reset still requires a normal login afterwards.
async fn try_password_reset(controller: &mut AppController) -> Result<()> {
    let email = prompt_line("email: ")?;
    if email.trim().is_empty() {
        return Ok(());
    }
    match controller.api.forgot_password(email.trim()).await {
        Ok(message) => println!("{message}"),
        Err(e) => {
            println!("reset request failed: {e}");
            return Ok(());
        }
    }
    let token = prompt_line("reset token (blank to go back): ")?;
    let token = token.trim();
    if token.is_empty() {
        return Ok(());
    }
    match controller.api.validate_reset_token(token).await {
        Ok(true) => {}
        Ok(false) => {
            println!("invalid or expired token");
            return Ok(());
        }
        Err(e) => {
            println!("token check failed: {e}");
            return Ok(());
        }
    }
    let password = rpassword::prompt_password("new password: ")?;
    match controller.api.reset_password(token, &password).await {
        Ok(message) => println!("{message}"),
        Err(e) => println!("password reset failed: {e}"),
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(String::new());
    }
    Ok(line.trim_end().to_string())
}

async fn run_session(
    controller: &mut AppController,
    rounds: &mut mpsc::Receiver<RoundMessage>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventStream,
) -> Result<SessionEnd> {
    if !controller.initial_refresh().await {
        return Ok(SessionEnd::LoggedOut);
    }

    let mut refresh_ticker = time::interval(REFRESH_INTERVAL);
    refresh_ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick fires immediately and the initial refresh just ran.
    refresh_ticker.tick().await;
    let mut flip_ticker = time::interval(FLIP_FRAME_INTERVAL);

    ui::draw(ui_state, &controller.snapshot()).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = refresh_ticker.tick() => {
                if !controller.refresh_session().await {
                    return Ok(SessionEnd::LoggedOut);
                }
            }
            _ = flip_ticker.tick() => {
                if !controller.game.flipping() {
                    continue;
                }
                controller.flip_frame = controller.flip_frame.wrapping_add(1);
            }
            maybe_round = rounds.recv() => {
                let Some(round) = maybe_round else {
                    continue;
                };
                controller.settle_round(round);
            }
            _ = tokio::signal::ctrl_c() => {
                return Ok(SessionEnd::Quit);
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                if let Some(end) = controller.handle_event(ev).await {
                    return Ok(end);
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot()).wrap_err("drawing frame failed")?;
    }
}

impl AppController {
    fn new(api: ApiClient, store: SessionStore) -> Self {
        // Replaced with a live channel by `begin_session`.
        let (game, _) = GameController::new();
        Self {
            api,
            store,
            ledger: BalanceLedger::new(0),
            game,
            history: HistoryLog::new(),
            selected_choice: CoinSide::Heads,
            stake_idx: 0,
            history_page: 0,
            withdrawals: Vec::new(),
            admin: None,
            flip_frame: 0,
            status: String::from("Ready"),
            errors: Vec::new(),
        }
    }

    /// Reset per-session state after a login; the ledger adopts the balance
    /// the session snapshot carries. The game controller and its round
    /// channel are rebuilt from scratch: a round spawned before a logout
    /// belongs to the previous account, and its late message must land in
    /// the abandoned channel, never in the new session's.
    fn begin_session(&mut self) -> mpsc::Receiver<RoundMessage> {
        let (game, rounds) = GameController::new();
        self.game = game;
        let balance = self.store.current().map(|s| s.balance).unwrap_or(0);
        self.ledger = BalanceLedger::new(balance);
        self.history = HistoryLog::new();
        self.selected_choice = CoinSide::Heads;
        self.stake_idx = 0;
        self.history_page = 0;
        self.withdrawals.clear();
        self.admin = None;
        self.flip_frame = 0;
        self.status = String::from("Ready");
        self.errors.clear();
        rounds
    }

    fn is_admin(&self) -> bool {
        self.store.current().is_some_and(|s| s.is_admin())
    }

    fn snapshot(&self) -> AppSnapshot {
        let session = self.store.current().unwrap_or_default();
        let is_admin = session.is_admin();
        AppSnapshot {
            server: self.api.to_string(),
            session,
            is_admin,
            selected_choice: self.selected_choice,
            selected_stake: STAKE_OPTIONS[self.stake_idx],
            flipping: self.game.flipping(),
            flip_frame: self.flip_frame,
            quick_history: self.history.quick().to_vec(),
            history_page: self
                .history
                .page(self.history_page, HISTORY_PAGE_SIZE)
                .to_vec(),
            history_page_idx: self.history_page,
            history_page_count: self.history.page_count(HISTORY_PAGE_SIZE),
            withdrawals: self.withdrawals.clone(),
            admin: self.admin.clone(),
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
        }
    }

    fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.errors.push(message);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    /// Record an API failure; true means the session is gone and the loop
    /// should fall back to the login prompt.
    fn note_api_error(&mut self, context: &str, error: ApiError) -> bool {
        if error.is_auth_failure() {
            self.logout();
            return true;
        }
        self.push_error(format!("{context}: {error}"));
        false
    }

    fn logout(&mut self) {
        self.store.clear();
        self.api.set_token(None);
    }

    /// First refresh of a session; also seeds the history log from the
    /// server so the quick view is not empty at the first frame.
    async fn initial_refresh(&mut self) -> bool {
        if !self.refresh_session().await {
            return false;
        }
        if !self.history.full_loaded() {
            match crate::api::GameApi::full_history(&self.api).await {
                Ok(records) => self.history.set_full(records),
                Err(e) => {
                    if self.note_api_error("loading game history", e) {
                        return false;
                    }
                }
            }
        }
        true
    }

    async fn refresh_session(&mut self) -> bool {
        let api = self.api.clone();
        sync::refresh(&api, &mut self.store, &mut self.ledger).await;
        if self.store.token().is_none() {
            self.api.set_token(None);
            return false;
        }
        true
    }

    fn place_selected_bet(&mut self) {
        let stake = STAKE_OPTIONS[self.stake_idx];
        let choice = self.selected_choice;
        match self
            .game
            .place_bet(&self.api, &mut self.ledger, stake, choice)
        {
            Ok(remaining) => {
                self.store.update(SessionPatch::balance_only(remaining));
                self.flip_frame = 0;
                self.status = format!("Flipping {stake} on {choice}...");
            }
            // Refused bets never leave the client; show why inline.
            Err(refusal) => self.status = refusal.to_string(),
        }
    }

    fn settle_round(&mut self, round: RoundMessage) {
        match self.game.settle(round, &mut self.ledger, &mut self.history) {
            Settlement::Settled(record) => {
                let mut stats = self.store.current().map(|s| s.stats).unwrap_or_default();
                stats.absorb(&record);
                self.store.update(SessionPatch {
                    balance: Some(self.ledger.balance()),
                    stats: Some(stats),
                    ..SessionPatch::default()
                });
                self.status = if record.won {
                    format!("{} — won {}", record.outcome, record.net_delta)
                } else {
                    format!("{} — lost {}", record.outcome, record.stake)
                };
            }
            Settlement::Failed { stake, error } => {
                self.store
                    .update(SessionPatch::balance_only(self.ledger.balance()));
                self.status = String::from("Round failed");
                self.push_error(format!("bet of {stake} refunded: {error}"));
            }
        }
    }

    async fn deposit(&mut self, amount: u64) -> bool {
        if let Err(refusal) = self.ledger.begin_deposit(amount) {
            self.status = refusal.to_string();
            return false;
        }
        match crate::api::ProfileApi::deposit(&self.api, amount).await {
            Ok(patch) => {
                let merged = self.store.update(patch);
                let balance = merged
                    .map(|s| s.balance)
                    .unwrap_or_else(|| self.ledger.balance());
                self.ledger.resolve_deposit(balance);
                self.status = format!("Deposited {amount}");
                false
            }
            Err(e) => {
                self.ledger.resolve_deposit_failure();
                self.note_api_error("deposit", e)
            }
        }
    }

    async fn request_withdrawal(&mut self, amount: u64, method: String, details: String) -> bool {
        match self.api.request_withdrawal(amount, &method, &details).await {
            Ok(record) => {
                self.status = format!("Withdrawal of {} requested", record.amount);
                self.refresh_withdrawals().await
            }
            Err(e) => self.note_api_error("withdrawal request", e),
        }
    }

    async fn refresh_withdrawals(&mut self) -> bool {
        match self.api.withdrawal_history().await {
            Ok(records) => {
                self.withdrawals = records;
                false
            }
            Err(e) => self.note_api_error("loading withdrawals", e),
        }
    }

    async fn load_full_history(&mut self) -> bool {
        match crate::api::GameApi::full_history(&self.api).await {
            Ok(records) => {
                self.history.set_full(records);
                self.history_page = 0;
                false
            }
            Err(e) => self.note_api_error("loading game history", e),
        }
    }

    async fn refresh_admin(&mut self) -> bool {
        if !self.is_admin() {
            self.status = String::from("Admin access required");
            return false;
        }
        let fetched = tokio::try_join!(
            self.api.admin_stats(),
            self.api.admin_withdrawals(),
            self.api.admin_transactions(),
            self.api.admin_users(),
        );
        match fetched {
            Ok((stats, withdrawals, transactions, users)) => {
                self.admin = Some(AdminData {
                    stats,
                    withdrawals,
                    transactions,
                    users,
                });
                false
            }
            Err(e) => self.note_api_error("loading admin data", e),
        }
    }

    /// Dispatch one interpreted key event. Returns how the session ends,
    /// if it does.
    async fn handle_event(&mut self, ev: ui::UserEvent) -> Option<SessionEnd> {
        use ui::UserEvent::*;
        let logged_out = match ev {
            Quit => return Some(SessionEnd::Quit),
            Logout => {
                self.logout();
                return Some(SessionEnd::LoggedOut);
            }
            ToggleChoice => {
                self.selected_choice = self.selected_choice.other();
                false
            }
            NextStake => {
                self.stake_idx = (self.stake_idx + 1) % STAKE_OPTIONS.len();
                false
            }
            PrevStake => {
                self.stake_idx = (self.stake_idx + STAKE_OPTIONS.len() - 1) % STAKE_OPTIONS.len();
                false
            }
            PlaceBet => {
                self.place_selected_bet();
                false
            }
            ConfirmDeposit(amount) => self.deposit(amount).await,
            ConfirmWithdraw {
                amount,
                method,
                details,
            } => self.request_withdrawal(amount, method, details).await,
            ShowHistory => {
                if self.history.full_loaded() {
                    false
                } else {
                    self.load_full_history().await
                }
            }
            ShowWithdrawals => self.refresh_withdrawals().await,
            ShowAdmin => self.refresh_admin().await,
            HistoryNext => {
                let last = self.history.page_count(HISTORY_PAGE_SIZE).saturating_sub(1);
                self.history_page = (self.history_page + 1).min(last);
                false
            }
            HistoryPrev => {
                self.history_page = self.history_page.saturating_sub(1);
                false
            }
            RefreshNow => !self.refresh_session().await,
            ApproveWithdrawal(id) => match self.api.admin_approve_withdrawal(id).await {
                Ok(()) => {
                    self.status = format!("Withdrawal {id} approved");
                    self.refresh_admin().await
                }
                Err(e) => self.note_api_error("approving withdrawal", e),
            },
            RejectWithdrawal(id) => match self.api.admin_reject_withdrawal(id).await {
                Ok(()) => {
                    self.status = format!("Withdrawal {id} rejected");
                    self.refresh_admin().await
                }
                Err(e) => self.note_api_error("rejecting withdrawal", e),
            },
            SetUserStatus { ref id, status } => {
                match self.api.admin_set_user_status(id, status).await {
                    Ok(()) => {
                        self.status = format!("User status set to {status}");
                        self.refresh_admin().await
                    }
                    Err(e) => self.note_api_error("updating user status", e),
                }
            }
            ShowGame | ShowProfile | Redraw => false,
        };
        logged_out.then_some(SessionEnd::LoggedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{
            ApiResult,
            PlayOutcome,
        },
        model::{
            AccountStatus,
            GameStats,
        },
    };
    use chrono::Utc;

    fn session_with_balance(balance: u64) -> UserSession {
        UserSession {
            id: "1".into(),
            username: "rupa".into(),
            email: "rupa@example.com".into(),
            balance,
            roles: vec!["ROLE_USER".into()],
            status: AccountStatus::Active,
            created_at: None,
            stats: GameStats::default(),
        }
    }

    fn controller_with_session(balance: u64) -> AppController {
        let api = ApiClient::new("http://localhost:1").unwrap();
        let mut store = SessionStore::in_memory();
        store.set_authenticated(session_with_balance(balance), "jwt".into());
        let mut controller = AppController::new(api, store);
        controller.begin_session();
        controller
    }

    fn settled(stake: u64, choice: CoinSide, outcome: CoinSide, payout: u64) -> RoundMessage {
        let won = choice == outcome;
        RoundMessage {
            stake,
            choice,
            result: Ok(PlayOutcome {
                outcome,
                won,
                payout,
                timestamp: Utc::now(),
                server_id: Some(1),
            }),
        }
    }

    fn failed(stake: u64) -> RoundMessage {
        let result: ApiResult<PlayOutcome> = Err(ApiError::Payload("connection reset".into()));
        RoundMessage {
            stake,
            choice: CoinSide::Heads,
            result,
        }
    }

    #[tokio::test]
    async fn settlement_updates_session_balance_and_stats() {
        let mut controller = controller_with_session(1000);
        controller.ledger.begin_bet(500).unwrap();

        controller.settle_round(settled(500, CoinSide::Heads, CoinSide::Heads, 500));

        let session = controller.store.current().unwrap();
        assert_eq!(session.balance, 1500);
        assert_eq!(session.stats.total_games, 1);
        assert_eq!(session.stats.games_won, 1);
        assert_eq!(session.stats.lifetime_earnings, 500);
        assert_eq!(session.stats.highest_win, 500);
        assert_eq!(controller.history.quick().len(), 1);
    }

    #[tokio::test]
    async fn failed_round_restores_balance_without_history() {
        let mut controller = controller_with_session(1000);
        controller.ledger.begin_bet(500).unwrap();
        controller
            .store
            .update(SessionPatch::balance_only(controller.ledger.balance()));

        controller.settle_round(failed(500));

        let session = controller.store.current().unwrap();
        assert_eq!(session.balance, 1000);
        assert_eq!(session.stats.total_games, 0);
        assert!(controller.history.quick().is_empty());
        assert_eq!(controller.errors.len(), 1);
    }

    #[tokio::test]
    async fn stake_selection_wraps_both_ways() {
        let mut controller = controller_with_session(1000);
        assert!(
            controller
                .handle_event(ui::UserEvent::PrevStake)
                .await
                .is_none()
        );
        assert_eq!(
            controller.snapshot().selected_stake,
            STAKE_OPTIONS[STAKE_OPTIONS.len() - 1]
        );
        assert!(
            controller
                .handle_event(ui::UserEvent::NextStake)
                .await
                .is_none()
        );
        assert_eq!(controller.snapshot().selected_stake, STAKE_OPTIONS[0]);
    }

    #[tokio::test]
    async fn snapshot_surfaces_the_newest_errors_first() {
        let mut controller = controller_with_session(0);
        for n in 0..60 {
            controller.push_error(format!("error {n}"));
        }
        assert_eq!(controller.errors.len(), MAX_ERRORS);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.errors.len(), 5);
        assert_eq!(snapshot.errors[0], "error 59");
    }

    #[derive(Clone)]
    struct InstantLoss;

    impl crate::api::GameApi for InstantLoss {
        fn play(
            &self,
            _stake: u64,
            _choice: CoinSide,
        ) -> impl Future<Output = ApiResult<PlayOutcome>> + Send {
            async move {
                Ok(PlayOutcome {
                    outcome: CoinSide::Tails,
                    won: false,
                    payout: 0,
                    timestamp: Utc::now(),
                    server_id: None,
                })
            }
        }

        fn full_history(&self) -> impl Future<Output = ApiResult<Vec<GameOutcomeRecord>>> + Send {
            async move { Ok(Vec::new()) }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_rounds_never_reach_the_next_session() {
        let api = ApiClient::new("http://localhost:1").unwrap();
        let mut store = SessionStore::in_memory();
        store.set_authenticated(session_with_balance(1000), "jwt".into());
        let mut controller = AppController::new(api, store);
        let mut old_rounds = controller.begin_session();

        controller
            .game
            .place_bet(&InstantLoss, &mut controller.ledger, 100, CoinSide::Heads)
            .unwrap();
        let end = controller.handle_event(ui::UserEvent::Logout).await;
        assert!(matches!(end, Some(SessionEnd::LoggedOut)));

        controller
            .store
            .set_authenticated(session_with_balance(2000), "jwt-2".into());
        let mut rounds = controller.begin_session();
        assert!(!controller.game.flipping(), "new session starts idle");

        // The round spawned before the logout settles only now, well into
        // the next session.
        tokio::time::sleep(crate::game::REVEAL_DELAY * 2).await;

        assert!(
            rounds.try_recv().is_err(),
            "the late round must not surface in the new session"
        );
        assert!(
            old_rounds.try_recv().is_ok(),
            "it landed in the abandoned channel instead"
        );
        assert!(controller.history.quick().is_empty());
        assert_eq!(controller.store.current().unwrap().stats.total_games, 0);
        assert_eq!(controller.ledger.balance(), 2000);
    }

    #[tokio::test]
    async fn logout_clears_session_and_token() {
        let mut controller = controller_with_session(1000);
        let end = controller.handle_event(ui::UserEvent::Logout).await;
        assert!(matches!(end, Some(SessionEnd::LoggedOut)));
        assert!(controller.store.current().is_none());
        assert!(!controller.api.has_token());
    }
}
