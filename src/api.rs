use crate::model::{
    self,
    AccountStatus,
    AdminGameStats,
    CoinSide,
    GameOutcomeRecord,
    GameStats,
    ManagedUser,
    SessionPatch,
    TransactionRecord,
    UserSession,
    WithdrawalRecord,
    WithdrawalStatus,
};
use chrono::{
    DateTime,
    Utc,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        RwLock,
    },
};
use thiserror::Error;

/// Error type for backend calls. Callers branch on the auth cases; server
/// business errors carry the server's own message verbatim since it holds
/// domain detail (limits, cooldowns) the client cannot compute.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("invalid or expired credentials")]
    Unauthorized,
    #[error("username already taken")]
    DuplicateUsername,
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response payload: {0}")]
    Payload(String),
}

impl ApiError {
    /// True for failures that invalidate the stored credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated | ApiError::Unauthorized)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Outcome of a single play call, payout being the net gain on a win.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayOutcome {
    pub outcome: CoinSide,
    pub won: bool,
    pub payout: u64,
    pub timestamp: DateTime<Utc>,
    pub server_id: Option<u64>,
}

/// Seam for the profile collaborator; implemented by [`ApiClient`] and by
/// fakes in tests.
pub trait ProfileApi {
    fn refresh_profile(&self) -> impl Future<Output = ApiResult<SessionPatch>> + Send;
    fn deposit(&self, amount: u64) -> impl Future<Output = ApiResult<SessionPatch>> + Send;
}

/// Seam for the game collaborator.
pub trait GameApi {
    fn play(
        &self,
        stake: u64,
        choice: CoinSide,
    ) -> impl Future<Output = ApiResult<PlayOutcome>> + Send;
    fn full_history(&self) -> impl Future<Output = ApiResult<Vec<GameOutcomeRecord>>> + Send;
}

/// HTTP client for the betting backend. Cheap to clone; the bearer token is
/// shared across clones so a login on one handle is visible to all.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            http,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    fn bearer(&self) -> ApiResult<String> {
        self.token
            .read()
            .expect("token lock poisoned")
            .clone()
            .ok_or(ApiError::NotAuthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_authed(&self, path: &str) -> ApiResult<Value> {
        let token = self.bearer()?;
        let res = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        decode_body(res).await
    }

    async fn post_authed(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let token = self.bearer()?;
        let res = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        decode_body(res).await
    }

    async fn put_authed(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let token = self.bearer()?;
        let res = self
            .http
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        decode_body(res).await
    }

    // --- auth ---

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<(String, UserSession)> {
        let body = serde_json::json!({ "username": username, "password": password });
        let res = self
            .http
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await?;
        let value = decode_body(res).await?;
        let auth = parse_auth_response(value)?;
        self.set_token(Some(auth.0.clone()));
        Ok(auth)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> ApiResult<(String, UserSession)> {
        let body =
            serde_json::json!({ "username": username, "password": password, "email": email });
        let res = self
            .http
            .post(self.url("/auth/register"))
            .json(&body)
            .send()
            .await?;
        if res.status() == StatusCode::CONFLICT {
            return Err(ApiError::DuplicateUsername);
        }
        let value = decode_body(res).await?;
        let auth = parse_auth_response(value)?;
        self.set_token(Some(auth.0.clone()));
        Ok(auth)
    }

    // --- password reset (unauthenticated) ---

    /// The server answers the same whether or not the email is registered,
    /// so the acknowledgement is all there is to show.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        let body = serde_json::json!({ "email": email });
        let res = self
            .http
            .post(self.url("/auth/password/forgot"))
            .json(&body)
            .send()
            .await?;
        let value = decode_body(res).await?;
        Ok(ack_message(&value))
    }

    /// Check a reset token before asking the user for a new password. The
    /// server reports an expired token as a 400; that is a plain `false`
    /// here, not an error.
    pub async fn validate_reset_token(&self, token: &str) -> ApiResult<bool> {
        let res = self
            .http
            .get(self.url("/auth/password/validate"))
            .query(&[("token", token)])
            .send()
            .await?;
        match decode_body(res).await {
            Ok(value) => Ok(valid_flag(&value)),
            Err(ApiError::Server { status, .. }) if status == StatusCode::BAD_REQUEST => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<String> {
        let body = serde_json::json!({ "token": token, "newPassword": new_password });
        let res = self
            .http
            .post(self.url("/auth/password/reset"))
            .json(&body)
            .send()
            .await?;
        let value = decode_body(res).await?;
        Ok(ack_message(&value))
    }

    // --- withdrawals ---

    pub async fn request_withdrawal(
        &self,
        amount: u64,
        method: &str,
        details: &str,
    ) -> ApiResult<WithdrawalRecord> {
        let body = serde_json::json!({
            "amount": amount,
            "method": method,
            "details": details,
        });
        let value = self.post_authed("/withdrawals", &body).await?;
        let dto: WithdrawalDto = from_value(value)?;
        Ok(dto.into())
    }

    pub async fn withdrawal_history(&self) -> ApiResult<Vec<WithdrawalRecord>> {
        let value = self.get_authed("/withdrawals").await?;
        let dtos: Vec<WithdrawalDto> = from_value(value)?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    // --- admin (privileged) ---

    pub async fn admin_stats(&self) -> ApiResult<Vec<AdminGameStats>> {
        let value = self.get_authed("/admin/stats").await?;
        let dtos: Vec<AdminStatsDto> = from_value(value)?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    pub async fn admin_transactions(&self) -> ApiResult<Vec<TransactionRecord>> {
        let value = self.get_authed("/admin/transactions").await?;
        let dtos: Vec<TransactionDto> = from_value(value)?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    pub async fn admin_withdrawals(&self) -> ApiResult<Vec<WithdrawalRecord>> {
        let value = self.get_authed("/admin/withdrawals").await?;
        let dtos: Vec<WithdrawalDto> = from_value(value)?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    pub async fn admin_users(&self) -> ApiResult<Vec<ManagedUser>> {
        let value = self.get_authed("/admin/users").await?;
        let dtos: Vec<ManagedUserDto> = from_value(value)?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    pub async fn admin_set_user_status(
        &self,
        user_id: &str,
        status: AccountStatus,
    ) -> ApiResult<()> {
        let body = serde_json::json!({ "status": status.to_string() });
        self.put_authed(&format!("/admin/users/{user_id}/status"), &body)
            .await?;
        Ok(())
    }

    pub async fn admin_approve_withdrawal(&self, id: u64) -> ApiResult<()> {
        self.post_authed(&format!("/admin/withdrawals/{id}/approve"), &Value::Null)
            .await?;
        Ok(())
    }

    pub async fn admin_reject_withdrawal(&self, id: u64) -> ApiResult<()> {
        self.post_authed(&format!("/admin/withdrawals/{id}/reject"), &Value::Null)
            .await?;
        Ok(())
    }
}

impl ProfileApi for ApiClient {
    async fn refresh_profile(&self) -> ApiResult<SessionPatch> {
        let value = self.get_authed("/user/profile/detailed").await?;
        let dto: ProfileDto = from_value(unwrap_nested(value))?;
        Ok(dto.into_patch(true))
    }

    async fn deposit(&self, amount: u64) -> ApiResult<SessionPatch> {
        let body = serde_json::json!({ "amount": amount });
        let value = self.post_authed("/user/deposit", &body).await?;
        let dto: ProfileDto = from_value(unwrap_nested(value))?;
        Ok(dto.into_patch(false))
    }
}

impl GameApi for ApiClient {
    async fn play(&self, stake: u64, choice: CoinSide) -> ApiResult<PlayOutcome> {
        let body = serde_json::json!({
            "betAmount": stake,
            "choice": choice.to_string(),
        });
        let value = self.post_authed("/game/play", &body).await?;
        let dto: GameRecordDto = from_value(value)?;
        dto.into_outcome()
    }

    async fn full_history(&self) -> ApiResult<Vec<GameOutcomeRecord>> {
        let value = self.get_authed("/game/history").await?;
        let dtos: Vec<GameRecordDto> = from_value(value)?;
        Ok(dtos.into_iter().filter_map(|d| d.into_record()).collect())
    }
}

impl fmt::Display for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// Decode a response body, translating HTTP failures into the error
/// taxonomy. 401 means the credential is invalid regardless of endpoint.
async fn decode_body(res: reqwest::Response) -> ApiResult<Value> {
    let status = res.status();
    let bytes = res.bytes().await?;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Server {
            status,
            message: server_message(&bytes, status),
        });
    }
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Payload(e.to_string()))
}

/// Pull the server's own message out of an error body when there is one.
fn server_message(bytes: &[u8], status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        format!("server responded with {status}")
    } else {
        text.trim().to_string()
    }
}

/// Acknowledgement bodies carry a human-readable `message`.
fn ack_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("done")
        .to_string()
}

fn valid_flag(value: &Value) -> bool {
    value.get("valid").and_then(Value::as_bool).unwrap_or(false)
}

/// Some backend revisions nest the payload under `data`/`user`/`profile`.
fn unwrap_nested(value: Value) -> Value {
    if let Value::Object(ref map) = value {
        for key in ["data", "user", "profile"] {
            if let Some(inner) = map.get(key) {
                if inner.is_object() {
                    return inner.clone();
                }
            }
        }
    }
    value
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Payload(e.to_string()))
}

fn parse_auth_response(value: Value) -> ApiResult<(String, UserSession)> {
    let dto: AuthResponseDto = from_value(value)?;
    if dto.token.is_empty() {
        return Err(ApiError::Payload("auth response carried no token".into()));
    }
    let mut session = UserSession {
        id: dto.id.to_string(),
        username: dto.username,
        email: dto.email.unwrap_or_default(),
        balance: dto.balance,
        roles: dto.roles.unwrap_or_default(),
        status: AccountStatus::Active,
        created_at: dto.created_at.as_deref().and_then(model::parse_timestamp),
        stats: GameStats::default(),
    };
    if session.roles.is_empty() {
        if let Some(role) = dto.role {
            session.roles.push(role);
        }
    }
    Ok((dto.token, session))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponseDto {
    #[serde(default)]
    token: String,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    id: u64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    balance: u64,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    id: u64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    balance: u64,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    total_games: u64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    games_won: u64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    games_lost: u64,
    #[serde(default, deserialize_with = "model::lenient::i64_or_zero")]
    lifetime_earnings: i64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    highest_win: u64,
}

impl ProfileDto {
    /// The basic profile endpoint omits the aggregate stats; only the
    /// detailed one may overwrite them.
    fn into_patch(self, with_stats: bool) -> SessionPatch {
        let roles = match (self.roles, self.role) {
            (Some(roles), _) if !roles.is_empty() => Some(roles),
            (_, Some(role)) => Some(vec![role]),
            _ => None,
        };
        SessionPatch {
            id: (self.id != 0).then(|| self.id.to_string()),
            username: self.username,
            email: self.email,
            balance: Some(self.balance),
            roles,
            status: self.status.as_deref().map(AccountStatus::parse),
            created_at: self.created_at.as_deref().and_then(model::parse_timestamp),
            stats: with_stats.then_some(GameStats {
                total_games: self.total_games,
                games_won: self.games_won,
                games_lost: self.games_lost,
                lifetime_earnings: self.lifetime_earnings,
                highest_win: self.highest_win,
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRecordDto {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    bet_amount: u64,
    #[serde(default)]
    choice: String,
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    won: Option<bool>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    win_amount: u64,
    #[serde(default)]
    played_at: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl GameRecordDto {
    fn sides(&self) -> ApiResult<(CoinSide, CoinSide)> {
        let choice = CoinSide::parse(&self.choice)
            .ok_or_else(|| ApiError::Payload(format!("unknown choice {:?}", self.choice)))?;
        let outcome = CoinSide::parse(&self.outcome)
            .ok_or_else(|| ApiError::Payload(format!("unknown outcome {:?}", self.outcome)))?;
        Ok((choice, outcome))
    }

    fn parsed_timestamp(&self) -> DateTime<Utc> {
        self.played_at
            .as_deref()
            .or(self.timestamp.as_deref())
            .and_then(model::parse_timestamp)
            .unwrap_or_else(Utc::now)
    }

    fn into_outcome(self) -> ApiResult<PlayOutcome> {
        let (choice, outcome) = self.sides()?;
        let won = choice == outcome;
        if let Some(flag) = self.won {
            if flag != won {
                tracing::warn!(
                    choice = %choice,
                    outcome = %outcome,
                    server_won = flag,
                    "server win flag disagrees with the sides; trusting the sides"
                );
            }
        }
        Ok(PlayOutcome {
            outcome,
            won,
            payout: if won { self.win_amount } else { 0 },
            timestamp: self.parsed_timestamp(),
            server_id: self.id,
        })
    }

    /// History rows with unparseable sides are dropped rather than failing
    /// the whole page.
    fn into_record(self) -> Option<GameOutcomeRecord> {
        let (choice, outcome) = self.sides().ok()?;
        let timestamp = self.parsed_timestamp();
        let payout = if choice == outcome { self.win_amount } else { 0 };
        Some(GameOutcomeRecord::settled(
            choice,
            outcome,
            self.bet_amount,
            payout,
            timestamp,
            self.id,
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalDto {
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    id: u64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    amount: u64,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<WithdrawalDto> for WithdrawalRecord {
    fn from(dto: WithdrawalDto) -> Self {
        WithdrawalRecord {
            id: dto.id,
            username: dto.username.unwrap_or_default(),
            amount: dto.amount,
            method: dto.method.unwrap_or_default(),
            details: dto.details.unwrap_or_default(),
            status: dto
                .status
                .as_deref()
                .map(WithdrawalStatus::parse)
                .unwrap_or(WithdrawalStatus::Pending),
            timestamp: dto.timestamp.as_deref().and_then(model::parse_timestamp),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminStatsDto {
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    bet_amount: u64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    games_played: u64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    total_wagered: u64,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    total_won: u64,
    #[serde(default, deserialize_with = "model::lenient::i64_or_zero")]
    house_profit: i64,
}

impl From<AdminStatsDto> for AdminGameStats {
    fn from(dto: AdminStatsDto) -> Self {
        AdminGameStats {
            bet_amount: dto.bet_amount,
            games_played: dto.games_played,
            total_wagered: dto.total_wagered,
            total_won: dto.total_won,
            house_profit: dto.house_profit,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionDto {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    amount: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl From<TransactionDto> for TransactionRecord {
    fn from(dto: TransactionDto) -> Self {
        TransactionRecord {
            id: dto.id.map(value_to_id).unwrap_or_default(),
            username: dto.username.unwrap_or_default(),
            kind: dto.kind.unwrap_or_default(),
            amount: dto.amount,
            status: dto.status.unwrap_or_default(),
            timestamp: dto.timestamp.as_deref().and_then(model::parse_timestamp),
            method: dto.method,
            details: dto.details,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedUserDto {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    username: String,
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    balance: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    stats: Option<ManagedUserStatsDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedUserStatsDto {
    #[serde(default, deserialize_with = "model::lenient::u64_or_zero")]
    total_games: u64,
    #[serde(default, deserialize_with = "model::lenient::i64_or_zero")]
    profit_loss: i64,
}

impl From<ManagedUserDto> for ManagedUser {
    fn from(dto: ManagedUserDto) -> Self {
        let (total_games, profit_loss) = dto
            .stats
            .map(|s| (s.total_games, s.profit_loss))
            .unwrap_or((0, 0));
        ManagedUser {
            id: dto.id.map(value_to_id).unwrap_or_default(),
            username: dto.username,
            balance: dto.balance,
            status: dto
                .status
                .as_deref()
                .map(AccountStatus::parse)
                .unwrap_or_default(),
            created_at: dto.created_at.as_deref().and_then(model::parse_timestamp),
            roles: dto.roles.unwrap_or_default(),
            total_games,
            profit_loss,
        }
    }
}

fn value_to_id(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detailed_profile_coerces_string_stats() {
        let raw = serde_json::json!({
            "id": 7,
            "username": "rupa",
            "balance": "1500.00",
            "role": "USER",
            "totalGames": "42",
            "gamesWon": 20,
            "gamesLost": "22",
            "lifetimeEarnings": "-300",
            "highestWin": null,
            "status": "ACTIVE",
        });
        let dto: ProfileDto = from_value(raw).unwrap();
        let patch = dto.into_patch(true);
        assert_eq!(patch.balance, Some(1500));
        let stats = patch.stats.unwrap();
        assert_eq!(stats.total_games, 42);
        assert_eq!(stats.games_won, 20);
        assert_eq!(stats.games_lost, 22);
        assert_eq!(stats.lifetime_earnings, -300);
        assert_eq!(stats.highest_win, 0);
        assert_eq!(patch.status, Some(AccountStatus::Active));
    }

    #[test]
    fn basic_profile_never_overwrites_stats() {
        let raw = serde_json::json!({ "id": 7, "username": "rupa", "balance": 900 });
        let dto: ProfileDto = from_value(raw).unwrap();
        assert!(dto.into_patch(false).stats.is_none());
    }

    #[test]
    fn deposit_payload_may_nest_under_user() {
        let raw = serde_json::json!({
            "user": { "id": 7, "username": "rupa", "balance": 2000 }
        });
        let dto: ProfileDto = from_value(unwrap_nested(raw)).unwrap();
        let patch = dto.into_patch(false);
        assert_eq!(patch.balance, Some(2000));
        assert_eq!(patch.username.as_deref(), Some("rupa"));
    }

    #[test]
    fn play_response_win_flag_is_derived_from_sides() {
        let raw = serde_json::json!({
            "id": 99,
            "betAmount": 500,
            "choice": "heads",
            "outcome": "heads",
            "won": true,
            "winAmount": "500",
            "playedAt": "2024-03-01T10:30:00",
        });
        let dto: GameRecordDto = from_value(raw).unwrap();
        let outcome = dto.into_outcome().unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.payout, 500);
        assert_eq!(outcome.server_id, Some(99));
    }

    #[test]
    fn lost_play_has_zero_payout_whatever_the_server_sent() {
        let raw = serde_json::json!({
            "betAmount": 500,
            "choice": "tails",
            "outcome": "heads",
            "won": false,
            "winAmount": 500,
        });
        let dto: GameRecordDto = from_value(raw).unwrap();
        let outcome = dto.into_outcome().unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.payout, 0);
    }

    #[test]
    fn history_rows_with_garbage_sides_are_dropped() {
        let dto: GameRecordDto = from_value(serde_json::json!({
            "betAmount": 100,
            "choice": "edge",
            "outcome": "heads",
        }))
        .unwrap();
        assert!(dto.into_record().is_none());
    }

    #[test]
    fn auth_response_falls_back_to_singular_role() {
        let (token, session) = parse_auth_response(serde_json::json!({
            "token": "jwt-abc",
            "id": 3,
            "username": "admin",
            "role": "ROLE_ADMIN",
            "balance": 0,
        }))
        .unwrap();
        assert_eq!(token, "jwt-abc");
        assert!(session.is_admin());
    }

    #[test]
    fn reset_acknowledgements_surface_the_server_message() {
        let value = serde_json::json!({
            "message": "Password has been reset successfully"
        });
        assert_eq!(ack_message(&value), "Password has been reset successfully");
        assert_eq!(ack_message(&Value::Null), "done");
    }

    #[test]
    fn reset_token_validity_defaults_to_invalid() {
        assert!(valid_flag(&serde_json::json!({ "valid": true })));
        assert!(!valid_flag(&serde_json::json!({ "valid": false })));
        assert!(!valid_flag(&serde_json::json!({ "message": "no flag" })));
    }

    #[test]
    fn server_error_message_is_surfaced_verbatim() {
        let msg = server_message(
            br#"{"message": "Withdrawal exceeds daily limit of 50000"}"#,
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(msg, "Withdrawal exceeds daily limit of 50000");
    }
}
