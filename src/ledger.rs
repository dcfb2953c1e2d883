use thiserror::Error;

/// Why the ledger refused to start an action. These are local validation
/// outcomes, surfaced as inline messages; no network call has happened.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ActionRefusal {
    #[error("another action is still in progress")]
    ActionInProgress,
    #[error("insufficient balance")]
    InsufficientFunds,
    #[error("amount must be greater than zero")]
    ZeroAmount,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Bet,
    Deposit,
}

#[derive(Clone, Copy, Debug)]
struct PendingAction {
    kind: ActionKind,
    amount: u64,
}

/// Optimistic balance bookkeeping. A bet debits the visible balance the
/// moment it is placed; the server response then either confirms the
/// settlement or rolls the debit back in full. Deposits are never applied
/// optimistically; the server-confirmed balance is adopted verbatim.
///
/// Invariant: the balance never diverges from the last known server truth
/// by more than one outstanding speculative delta, and at most one action
/// is in flight at a time.
#[derive(Debug)]
pub struct BalanceLedger {
    balance: u64,
    pending: Option<PendingAction>,
}

impl BalanceLedger {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            pending: None,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn bet_in_flight(&self) -> bool {
        matches!(
            self.pending,
            Some(PendingAction {
                kind: ActionKind::Bet,
                ..
            })
        )
    }

    pub fn action_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Debit the stake speculatively and lock out further actions until the
    /// round settles.
    pub fn begin_bet(&mut self, stake: u64) -> Result<u64, ActionRefusal> {
        if self.pending.is_some() {
            return Err(ActionRefusal::ActionInProgress);
        }
        if stake == 0 {
            return Err(ActionRefusal::ZeroAmount);
        }
        if stake > self.balance {
            return Err(ActionRefusal::InsufficientFunds);
        }
        self.balance -= stake;
        self.pending = Some(PendingAction {
            kind: ActionKind::Bet,
            amount: stake,
        });
        Ok(self.balance)
    }

    /// Settle the in-flight bet against the server's verdict. `payout` is
    /// the net gain: on a win the stake comes back plus the payout, on a
    /// loss the speculative debit already is the result.
    pub fn resolve_bet(&mut self, won: bool, payout: u64) -> u64 {
        let Some(pending) = self.take_pending(ActionKind::Bet) else {
            return self.balance;
        };
        if won {
            self.balance = self
                .balance
                .saturating_add(pending.amount)
                .saturating_add(payout);
        }
        self.balance
    }

    /// Roll the speculative debit back in full after a transport or server
    /// failure; the user is never short-changed by a failed request.
    pub fn resolve_bet_failure(&mut self) -> u64 {
        if let Some(pending) = self.take_pending(ActionKind::Bet) {
            self.balance = self.balance.saturating_add(pending.amount);
        }
        self.balance
    }

    pub fn begin_deposit(&mut self, amount: u64) -> Result<(), ActionRefusal> {
        if self.pending.is_some() {
            return Err(ActionRefusal::ActionInProgress);
        }
        if amount == 0 {
            return Err(ActionRefusal::ZeroAmount);
        }
        self.pending = Some(PendingAction {
            kind: ActionKind::Deposit,
            amount,
        });
        Ok(())
    }

    pub fn resolve_deposit(&mut self, server_balance: u64) -> u64 {
        if self.take_pending(ActionKind::Deposit).is_some() {
            self.balance = server_balance;
        }
        self.balance
    }

    pub fn resolve_deposit_failure(&mut self) {
        self.take_pending(ActionKind::Deposit);
    }

    /// Adopt the server's balance from a profile refresh. Refused while a
    /// bet is in flight so the refresh cannot clobber the optimistic debit
    /// of a round the server has not yet seen.
    pub fn adopt_server_balance(&mut self, balance: u64) -> bool {
        if self.bet_in_flight() {
            return false;
        }
        self.balance = balance;
        true
    }

    fn take_pending(&mut self, kind: ActionKind) -> Option<PendingAction> {
        match self.pending {
            Some(pending) if pending.kind == kind => {
                self.pending = None;
                Some(pending)
            }
            _ => None,
        }
    }
}
