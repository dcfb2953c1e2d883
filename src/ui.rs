use crate::{
    client::AppSnapshot,
    model::{
        AccountStatus,
        GameOutcomeRecord,
        WithdrawalStatus,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;

const WITHDRAW_METHODS: [&str; 3] = ["bank", "paypal", "crypto"];
const FLIP_FRAMES: [&str; 4] = ["( o )", "( O )", "( 0 )", "( O )"];

pub enum UserEvent {
    Quit,
    Logout,
    ToggleChoice,
    NextStake,
    PrevStake,
    PlaceBet,
    ConfirmDeposit(u64),
    ConfirmWithdraw {
        amount: u64,
        method: String,
        details: String,
    },
    ShowGame,
    ShowHistory,
    ShowProfile,
    ShowWithdrawals,
    ShowAdmin,
    HistoryNext,
    HistoryPrev,
    RefreshNow,
    ApproveWithdrawal(u64),
    RejectWithdrawal(u64),
    SetUserStatus {
        id: String,
        status: AccountStatus,
    },
    Redraw,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Screen {
    #[default]
    Game,
    History,
    Profile,
    Withdrawals,
    Admin,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    DepositModal(AmountState),
    WithdrawModal(WithdrawForm),
    QuitModal,
}

#[derive(Clone, Copy, Debug, Default)]
struct AmountState {
    amount: u64,
}

#[derive(Clone, Debug, Default)]
struct WithdrawForm {
    amount: u64,
    method_idx: usize,
    details: String,
    focus: WithdrawField,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum WithdrawField {
    #[default]
    Amount,
    Method,
    Details,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum AdminPane {
    #[default]
    Withdrawals,
    Users,
}

pub struct UiState {
    mode: Mode,
    screen: Screen,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    admin_pane: AdminPane,
    admin_idx: usize,
    // Caches refreshed on every draw so key handling can name targets.
    pending_withdrawal_ids: Vec<u64>,
    managed_users: Vec<(String, AccountStatus)>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            screen: Screen::Game,
            terminal: None,
            admin_pane: AdminPane::Withdrawals,
            admin_idx: 0,
            pending_withdrawal_ids: Vec::new(),
            managed_users: Vec::new(),
        }
    }
}

pub type InputEventStream = EventStream;

pub fn input_event_stream() -> InputEventStream {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventStream) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("input event stream closed")),
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Translate a raw terminal event into a high-level action. Keys that only
/// move modal or selection state are absorbed here and come back as
/// `Redraw`; anything with side effects goes to the controller.
pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(_, _) => return Some(UserEvent::Redraw),
        _ => return None,
    };

    match &mut state.mode {
        Mode::DepositModal(ds) => match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let amount = ds.amount;
                state.mode = Mode::Normal;
                if amount > 0 {
                    Some(UserEvent::ConfirmDeposit(amount))
                } else {
                    Some(UserEvent::Redraw)
                }
            }
            KeyCode::Backspace => {
                ds.amount /= 10;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let d = u64::from(c.to_digit(10).unwrap_or(0));
                ds.amount = ds.amount.saturating_mul(10).saturating_add(d);
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::WithdrawModal(ws) => match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Tab => {
                ws.focus = match ws.focus {
                    WithdrawField::Amount => WithdrawField::Method,
                    WithdrawField::Method => WithdrawField::Details,
                    WithdrawField::Details => WithdrawField::Amount,
                };
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let form = ws.clone();
                state.mode = Mode::Normal;
                if form.amount > 0 {
                    Some(UserEvent::ConfirmWithdraw {
                        amount: form.amount,
                        method: WITHDRAW_METHODS[form.method_idx].to_string(),
                        details: form.details,
                    })
                } else {
                    Some(UserEvent::Redraw)
                }
            }
            KeyCode::Left if ws.focus == WithdrawField::Method => {
                ws.method_idx = (ws.method_idx + WITHDRAW_METHODS.len() - 1) % WITHDRAW_METHODS.len();
                Some(UserEvent::Redraw)
            }
            KeyCode::Right if ws.focus == WithdrawField::Method => {
                ws.method_idx = (ws.method_idx + 1) % WITHDRAW_METHODS.len();
                Some(UserEvent::Redraw)
            }
            KeyCode::Backspace => {
                match ws.focus {
                    WithdrawField::Amount => ws.amount /= 10,
                    WithdrawField::Details => {
                        ws.details.pop();
                    }
                    WithdrawField::Method => {}
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) => {
                match ws.focus {
                    WithdrawField::Amount if c.is_ascii_digit() => {
                        let d = u64::from(c.to_digit(10).unwrap_or(0));
                        ws.amount = ws.amount.saturating_mul(10).saturating_add(d);
                    }
                    WithdrawField::Details => ws.details.push(c),
                    _ => {}
                }
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::QuitModal => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => interpret_normal(state, key.code),
    }
}

fn interpret_normal(state: &mut UiState, code: KeyCode) -> Option<UserEvent> {
    // Screen switching and global actions first.
    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('1') => {
            state.screen = Screen::Game;
            return Some(UserEvent::ShowGame);
        }
        KeyCode::Char('2') => {
            state.screen = Screen::History;
            return Some(UserEvent::ShowHistory);
        }
        KeyCode::Char('3') => {
            state.screen = Screen::Profile;
            return Some(UserEvent::ShowProfile);
        }
        KeyCode::Char('4') => {
            state.screen = Screen::Withdrawals;
            return Some(UserEvent::ShowWithdrawals);
        }
        KeyCode::Char('5') => {
            state.screen = Screen::Admin;
            state.admin_idx = 0;
            return Some(UserEvent::ShowAdmin);
        }
        KeyCode::Char('d') => {
            state.mode = Mode::DepositModal(AmountState::default());
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('w') => {
            state.mode = Mode::WithdrawModal(WithdrawForm::default());
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('r') => return Some(UserEvent::RefreshNow),
        KeyCode::Char('o') => return Some(UserEvent::Logout),
        _ => {}
    }

    match state.screen {
        Screen::Game => match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                Some(UserEvent::ToggleChoice)
            }
            KeyCode::Up | KeyCode::Char('k') => Some(UserEvent::NextStake),
            KeyCode::Down | KeyCode::Char('j') => Some(UserEvent::PrevStake),
            KeyCode::Enter | KeyCode::Char(' ') => Some(UserEvent::PlaceBet),
            _ => None,
        },
        Screen::History => match code {
            KeyCode::Right | KeyCode::Char('n') => Some(UserEvent::HistoryNext),
            KeyCode::Left | KeyCode::Char('p') => Some(UserEvent::HistoryPrev),
            _ => None,
        },
        Screen::Admin => match code {
            KeyCode::Tab => {
                state.admin_pane = match state.admin_pane {
                    AdminPane::Withdrawals => AdminPane::Users,
                    AdminPane::Users => AdminPane::Withdrawals,
                };
                state.admin_idx = 0;
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.admin_idx = state.admin_idx.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = match state.admin_pane {
                    AdminPane::Withdrawals => state.pending_withdrawal_ids.len(),
                    AdminPane::Users => state.managed_users.len(),
                };
                state.admin_idx = (state.admin_idx + 1).min(len.saturating_sub(1));
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('y') if state.admin_pane == AdminPane::Withdrawals => state
                .pending_withdrawal_ids
                .get(state.admin_idx)
                .copied()
                .map(UserEvent::ApproveWithdrawal),
            KeyCode::Char('x') if state.admin_pane == AdminPane::Withdrawals => state
                .pending_withdrawal_ids
                .get(state.admin_idx)
                .copied()
                .map(UserEvent::RejectWithdrawal),
            KeyCode::Char('s') if state.admin_pane == AdminPane::Users => {
                state
                    .managed_users
                    .get(state.admin_idx)
                    .cloned()
                    .map(|(id, status)| UserEvent::SetUserStatus {
                        id,
                        status: match status {
                            AccountStatus::Active => AccountStatus::Suspended,
                            _ => AccountStatus::Active,
                        },
                    })
            }
            _ => None,
        },
        Screen::Profile | Screen::Withdrawals => None,
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(admin) = &snap.admin {
        state.pending_withdrawal_ids = admin
            .withdrawals
            .iter()
            .filter(|w| w.status == WithdrawalStatus::Pending)
            .map(|w| w.id)
            .collect();
        state.managed_users = admin
            .users
            .iter()
            .map(|u| (u.id.clone(), u.status))
            .collect();
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, chunks[0], state, snap);
    match state.screen {
        Screen::Game => draw_game(f, chunks[1], snap),
        Screen::History => draw_history(f, chunks[1], snap),
        Screen::Profile => draw_profile(f, chunks[1], snap),
        Screen::Withdrawals => draw_withdrawals(f, chunks[1], snap),
        Screen::Admin => draw_admin(f, chunks[1], state, snap),
    }
    draw_status(f, chunks[2], snap);
    draw_help(f, chunks[3], state);
    draw_modals(f, state);
}

fn draw_header(f: &mut Frame, area: Rect, state: &UiState, snap: &AppSnapshot) {
    let tabs = [
        (Screen::Game, "1 Game"),
        (Screen::History, "2 History"),
        (Screen::Profile, "3 Profile"),
        (Screen::Withdrawals, "4 Withdrawals"),
        (Screen::Admin, "5 Admin"),
    ];
    let mut spans = vec![Span::raw(format!(
        "{} | balance {} | ",
        snap.session.username, snap.session.balance
    ))];
    for (screen, label) in tabs {
        if screen == Screen::Admin && !snap.is_admin {
            continue;
        }
        let style = if screen == state.screen {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{label}  "), style));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(snap.server.clone()));
    f.render_widget(header, area);
}

fn draw_game(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let coin_text = if snap.flipping {
        let frame = FLIP_FRAMES[snap.flip_frame % FLIP_FRAMES.len()];
        format!("\n\n     {frame}\n\n   flipping...")
    } else {
        match snap.quick_history.first() {
            Some(last) => format!(
                "\n\n     [ {} ]\n\n   last flip: {}",
                last.outcome,
                if last.won { "won" } else { "lost" }
            ),
            None => String::from("\n\n     [ ? ]\n\n   place a bet"),
        }
    };
    let table = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(5)])
        .split(cols[0]);
    let coin = Paragraph::new(coin_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Coin"));
    f.render_widget(coin, table[0]);

    let bet_lines = vec![
        Line::from(vec![
            Span::raw("call: "),
            Span::styled(
                snap.selected_choice.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   (←/→ to switch)"),
        ]),
        Line::from(vec![
            Span::raw("stake: "),
            Span::styled(
                snap.selected_stake.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   (↑/↓ to change, Enter to flip)"),
        ]),
    ];
    let bet = Paragraph::new(bet_lines)
        .block(Block::default().borders(Borders::ALL).title("Your Bet"));
    f.render_widget(bet, table[1]);

    let mut rows = Vec::new();
    for record in &snap.quick_history {
        rows.push(history_line(record));
    }
    if rows.is_empty() {
        rows.push(Line::styled(
            "no games yet",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let recent = Paragraph::new(rows)
        .block(Block::default().borders(Borders::ALL).title("Recent Flips"));
    f.render_widget(recent, cols[1]);
}

fn history_line(record: &GameOutcomeRecord) -> Line<'static> {
    let sign = if record.net_delta >= 0 { "+" } else { "" };
    let style = if record.won {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    Line::styled(
        format!(
            "{}  {} vs {}  stake {}  {}{}",
            record.timestamp.format("%m-%d %H:%M:%S"),
            record.choice,
            record.outcome,
            record.stake,
            sign,
            record.net_delta,
        ),
        style,
    )
}

fn draw_history(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    for record in &snap.history_page {
        lines.push(history_line(record));
    }
    if lines.is_empty() {
        lines.push(Line::styled(
            "no games recorded",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let title = format!(
        "Game History — page {}/{} (←/→ to page)",
        snap.history_page_idx + 1,
        snap.history_page_count.max(1)
    );
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn draw_profile(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let session = &snap.session;
    let member_since = session
        .created_at
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| String::from("unknown"));
    let stats = &session.stats;
    let win_rate = if stats.total_games > 0 {
        format!(
            "{:.1}%",
            stats.games_won as f64 * 100.0 / stats.total_games as f64
        )
    } else {
        String::from("n/a")
    };
    let lines = vec![
        Line::from(format!("username:  {}", session.username)),
        Line::from(format!("email:     {}", session.email)),
        Line::from(format!("status:    {}", session.status)),
        Line::from(format!("member:    {member_since}")),
        Line::from(format!("roles:     {}", session.roles.join(", "))),
        Line::from(""),
        Line::from(format!("balance:           {}", session.balance)),
        Line::from(format!("games played:      {}", stats.total_games)),
        Line::from(format!(
            "won / lost:        {} / {}",
            stats.games_won, stats.games_lost
        )),
        Line::from(format!("win rate:          {win_rate}")),
        Line::from(format!("lifetime earnings: {}", stats.lifetime_earnings)),
        Line::from(format!("highest win:       {}", stats.highest_win)),
    ];
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(widget, area);
}

fn draw_withdrawals(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    for w in &snap.withdrawals {
        let style = match w.status {
            WithdrawalStatus::Pending => Style::default().fg(Color::Yellow),
            WithdrawalStatus::Approved => Style::default().fg(Color::Green),
            WithdrawalStatus::Rejected => Style::default().fg(Color::Red),
        };
        let when = w
            .timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        lines.push(Line::styled(
            format!(
                "#{}  {}  {} via {}  {}",
                w.id, when, w.amount, w.method, w.status
            ),
            style,
        ));
    }
    if lines.is_empty() {
        lines.push(Line::styled(
            "no withdrawal requests — press w to make one",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Withdrawals"));
    f.render_widget(widget, area);
}

fn draw_admin(f: &mut Frame, area: Rect, state: &UiState, snap: &AppSnapshot) {
    let Some(admin) = &snap.admin else {
        let widget = Paragraph::new("admin data not loaded")
            .block(Block::default().borders(Borders::ALL).title("Admin"));
        f.render_widget(widget, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(6),
            Constraint::Length(6),
        ])
        .split(area);

    let mut stat_lines = Vec::new();
    for s in &admin.stats {
        stat_lines.push(Line::from(format!(
            "stake {:>6}: {} games, wagered {}, paid out {}, house {}",
            s.bet_amount, s.games_played, s.total_wagered, s.total_won, s.house_profit
        )));
    }
    if stat_lines.is_empty() {
        stat_lines.push(Line::from("no games recorded"));
    }
    let stats = Paragraph::new(stat_lines)
        .block(Block::default().borders(Borders::ALL).title("House Stats"));
    f.render_widget(stats, rows[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let mut wd_lines = Vec::new();
    let mut pending_row = 0usize;
    for w in &admin.withdrawals {
        let cursor = if w.status == WithdrawalStatus::Pending {
            let marker = if state.admin_pane == AdminPane::Withdrawals
                && pending_row == state.admin_idx
            {
                ">"
            } else {
                " "
            };
            pending_row += 1;
            marker
        } else {
            " "
        };
        wd_lines.push(Line::from(format!(
            "{cursor} #{}  {}  {}  {}",
            w.id, w.username, w.amount, w.status
        )));
    }
    if wd_lines.is_empty() {
        wd_lines.push(Line::from("none"));
    }
    let wd_title = if state.admin_pane == AdminPane::Withdrawals {
        "Withdrawals [y approve, x reject]"
    } else {
        "Withdrawals"
    };
    let wd = Paragraph::new(wd_lines)
        .block(Block::default().borders(Borders::ALL).title(wd_title));
    f.render_widget(wd, panes[0]);

    let mut user_lines = Vec::new();
    for (i, u) in admin.users.iter().enumerate() {
        let cursor = if state.admin_pane == AdminPane::Users && i == state.admin_idx {
            ">"
        } else {
            " "
        };
        user_lines.push(Line::from(format!(
            "{cursor} {}  balance {}  {} games  {}",
            u.username, u.balance, u.total_games, u.status
        )));
    }
    if user_lines.is_empty() {
        user_lines.push(Line::from("none"));
    }
    let users_title = if state.admin_pane == AdminPane::Users {
        "Users [s toggle status]"
    } else {
        "Users"
    };
    let users = Paragraph::new(user_lines)
        .block(Block::default().borders(Borders::ALL).title(users_title));
    f.render_widget(users, panes[1]);

    let mut tx_lines = Vec::new();
    for t in admin.transactions.iter().take(4) {
        let when = t
            .timestamp
            .map(|ts| ts.format("%m-%d %H:%M").to_string())
            .unwrap_or_default();
        tx_lines.push(Line::from(format!(
            "{when}  {}  {}  {}  {}",
            t.username, t.kind, t.amount, t.status
        )));
    }
    if tx_lines.is_empty() {
        tx_lines.push(Line::from("none"));
    }
    let txs = Paragraph::new(tx_lines)
        .block(Block::default().borders(Borders::ALL).title("Recent Transactions"));
    f.render_widget(txs, rows[2]);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let widget = if snap.errors.is_empty() {
        Paragraph::new(snap.status.clone())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap.errors.iter().map(|e| Line::from(e.clone())).collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect, state: &UiState) {
    let help = match state.screen {
        Screen::Game => "←/→ side | ↑/↓ stake | Enter flip | d deposit | w withdraw | 1-5 screens | r refresh | o logout | q quit",
        Screen::History => "←/→ page | 1-5 screens | r refresh | o logout | q quit",
        Screen::Admin => "Tab pane | ↑/↓ move | y/x withdrawal | s user status | 1-5 screens | q quit",
        _ => "d deposit | w withdraw | 1-5 screens | r refresh | o logout | q quit",
    };
    let widget =
        Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(widget, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    match &state.mode {
        Mode::DepositModal(ds) => {
            let area = centered_rect(40, 25, f.area());
            let block = Block::default().borders(Borders::ALL).title("Deposit");
            let p = Paragraph::new(format!(
                "Amount: {}\nEnter=confirm Esc=cancel, digits to edit",
                ds.amount
            ));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::WithdrawModal(ws) => {
            let area = centered_rect(50, 35, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Request Withdrawal");
            let mark = |field| if ws.focus == field { ">" } else { " " };
            let lines = vec![
                Line::from(format!("{} amount:  {}", mark(WithdrawField::Amount), ws.amount)),
                Line::from(format!(
                    "{} method:  {}  (←/→)",
                    mark(WithdrawField::Method),
                    WITHDRAW_METHODS[ws.method_idx]
                )),
                Line::from(format!(
                    "{} details: {}",
                    mark(WithdrawField::Details),
                    ws.details
                )),
                Line::from(""),
                Line::from("Tab=next field Enter=submit Esc=cancel"),
            ];
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Leave the table? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
