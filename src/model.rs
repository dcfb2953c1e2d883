use chrono::{
    DateTime,
    NaiveDateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// Side of the coin a player can call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "heads" => Some(CoinSide::Heads),
            "tails" => Some(CoinSide::Tails),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Blocked,
}

impl AccountStatus {
    /// The backend is inconsistent about casing ("ACTIVE" from the profile
    /// endpoint, "active" from the admin endpoints); accept both.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "suspended" => AccountStatus::Suspended,
            "blocked" => AccountStatus::Blocked,
            _ => AccountStatus::Active,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Suspended => write!(f, "suspended"),
            AccountStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// Aggregate play statistics carried on the session snapshot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_games: u64,
    pub games_won: u64,
    pub games_lost: u64,
    pub lifetime_earnings: i64,
    pub highest_win: u64,
}

impl GameStats {
    /// Fold one settled round into the aggregates. Server-side stats are
    /// adopted wholesale on the next profile refresh; this keeps the local
    /// numbers plausible in between.
    pub fn absorb(&mut self, record: &GameOutcomeRecord) {
        self.total_games += 1;
        if record.won {
            self.games_won += 1;
            self.highest_win = self.highest_win.max(record.net_delta.max(0) as u64);
        } else {
            self.games_lost += 1;
        }
        self.lifetime_earnings += record.net_delta;
    }
}

/// Snapshot of the authenticated user. Every numeric field has already been
/// normalized at the transport boundary; downstream code never re-checks for
/// absence or string-typed numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: String,
    pub username: String,
    pub email: String,
    pub balance: u64,
    pub roles: Vec<String>,
    pub status: AccountStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub stats: GameStats,
}

impl UserSession {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("ROLE_ADMIN") || self.has_role("ADMIN")
    }

    /// Merge a partial update, favoring new values and keeping the previous
    /// value for every field the payload does not carry.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(roles) = patch.roles {
            self.roles = roles;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = Some(created_at);
        }
        if let Some(stats) = patch.stats {
            self.stats = stats;
        }
    }
}

/// Partial session update. `None` means "the payload did not mention this
/// field", never "reset it".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionPatch {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub balance: Option<u64>,
    pub roles: Option<Vec<String>>,
    pub status: Option<AccountStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub stats: Option<GameStats>,
}

impl SessionPatch {
    pub fn balance_only(balance: u64) -> Self {
        SessionPatch {
            balance: Some(balance),
            ..SessionPatch::default()
        }
    }

    /// Drop the balance from the patch. Used while a bet is in flight so a
    /// racing profile refresh cannot clobber the optimistic balance.
    pub fn without_balance(mut self) -> Self {
        self.balance = None;
        self
    }
}

/// One settled bet, newest-first in the history log. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameOutcomeRecord {
    pub choice: CoinSide,
    pub outcome: CoinSide,
    pub won: bool,
    pub stake: u64,
    pub net_delta: i64,
    pub timestamp: DateTime<Utc>,
    pub server_id: Option<u64>,
}

impl GameOutcomeRecord {
    /// `payout` is the net gain on a win (winnings only, stake excluded).
    pub fn settled(
        choice: CoinSide,
        outcome: CoinSide,
        stake: u64,
        payout: u64,
        timestamp: DateTime<Utc>,
        server_id: Option<u64>,
    ) -> Self {
        let won = choice == outcome;
        let net_delta = if won {
            payout as i64
        } else {
            -(stake as i64)
        };
        GameOutcomeRecord {
            choice,
            outcome,
            won,
            stake,
            net_delta,
            timestamp,
            server_id,
        }
    }
}

/// One withdrawal request as the backend reports it.
#[derive(Clone, Debug, PartialEq)]
pub struct WithdrawalRecord {
    pub id: u64,
    pub username: String,
    pub amount: u64,
    pub method: String,
    pub details: String,
    pub status: WithdrawalStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => WithdrawalStatus::Approved,
            "rejected" => WithdrawalStatus::Rejected,
            _ => WithdrawalStatus::Pending,
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalStatus::Pending => write!(f, "pending"),
            WithdrawalStatus::Approved => write!(f, "approved"),
            WithdrawalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Per-stake-tier aggregates from the admin stats endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdminGameStats {
    pub bet_amount: u64,
    pub games_played: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub house_profit: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    pub id: String,
    pub username: String,
    pub kind: String,
    pub amount: u64,
    pub status: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManagedUser {
    pub id: String,
    pub username: String,
    pub balance: u64,
    pub status: AccountStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub total_games: u64,
    pub profit_loss: i64,
}

/// Backend timestamps arrive either as RFC 3339 or as a bare
/// `LocalDateTime` with no offset; treat the latter as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Lenient numeric deserializers for the transport boundary. The backend
/// serializes some numbers as JSON strings and omits others entirely; every
/// numeric field coerces here, once, with a fallback of zero.
pub mod lenient {
    use serde::{
        Deserialize,
        Deserializer,
    };
    use serde_json::Value;

    pub fn u64_or_zero<'de, D>(de: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(de)?;
        Ok(value.as_ref().map(u64_from_value).unwrap_or(0))
    }

    pub fn i64_or_zero<'de, D>(de: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(de)?;
        Ok(value.as_ref().map(i64_from_value).unwrap_or(0))
    }

    fn u64_from_value(value: &Value) -> u64 {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
                .unwrap_or(0),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64))
                .unwrap_or(0),
            _ => 0,
        }
    }

    fn i64_from_value(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient::u64_or_zero")]
        balance: u64,
        #[serde(default, deserialize_with = "lenient::i64_or_zero")]
        earnings: i64,
    }

    #[test]
    fn lenient_numbers_accept_strings_numbers_and_absence() {
        let p: Probe = serde_json::from_str(r#"{"balance": 1500, "earnings": -20}"#).unwrap();
        assert_eq!(p.balance, 1500);
        assert_eq!(p.earnings, -20);

        let p: Probe = serde_json::from_str(r#"{"balance": "2500.00", "earnings": "-75"}"#).unwrap();
        assert_eq!(p.balance, 2500);
        assert_eq!(p.earnings, -75);

        let p: Probe = serde_json::from_str(r#"{"balance": null}"#).unwrap();
        assert_eq!(p.balance, 0);
        assert_eq!(p.earnings, 0);

        let p: Probe = serde_json::from_str(r#"{"balance": "garbage", "earnings": true}"#).unwrap();
        assert_eq!(p.balance, 0);
        assert_eq!(p.earnings, 0);
    }

    #[test]
    fn patch_preserves_fields_it_does_not_carry() {
        let mut session = UserSession {
            id: "7".into(),
            username: "rupa".into(),
            email: "rupa@example.com".into(),
            balance: 1000,
            roles: vec!["ROLE_USER".into()],
            status: AccountStatus::Active,
            created_at: None,
            stats: GameStats {
                total_games: 12,
                games_won: 5,
                games_lost: 7,
                lifetime_earnings: -200,
                highest_win: 5000,
            },
        };

        session.apply(SessionPatch::balance_only(800));

        assert_eq!(session.balance, 800);
        assert_eq!(session.username, "rupa");
        assert_eq!(session.email, "rupa@example.com");
        assert_eq!(session.stats.total_games, 12);
        assert_eq!(session.stats.highest_win, 5000);
    }

    #[test]
    fn outcome_record_invariant_holds() {
        let now = Utc::now();
        let win =
            GameOutcomeRecord::settled(CoinSide::Heads, CoinSide::Heads, 500, 500, now, Some(1));
        assert!(win.won);
        assert_eq!(win.net_delta, 500);

        let loss = GameOutcomeRecord::settled(CoinSide::Tails, CoinSide::Heads, 500, 0, now, None);
        assert!(!loss.won);
        assert_eq!(loss.net_delta, -500);
    }

    #[test]
    fn timestamps_parse_with_and_without_offset() {
        assert!(parse_timestamp("2024-03-01T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:30:00.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn account_status_accepts_both_casings() {
        assert_eq!(AccountStatus::parse("ACTIVE"), AccountStatus::Active);
        assert_eq!(AccountStatus::parse("suspended"), AccountStatus::Suspended);
        assert_eq!(AccountStatus::parse("Blocked"), AccountStatus::Blocked);
    }
}
