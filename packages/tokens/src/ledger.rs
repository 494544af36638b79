//! The token issuance ledger.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use pattern_discovery_tokens_models::{
    RewardKind, TokenBalance, TokenSupplyState, TokenTransaction, TransactionKind,
};
use uuid::Uuid;

use crate::TokenError;

/// Default hard cap on minted tokens.
pub const DEFAULT_MAX_SUPPLY: f64 = 21_000_000.0;
/// Default number of minted tokens between halvings.
pub const DEFAULT_HALVING_INTERVAL: f64 = 2_100_000.0;
/// Default reward multiplier before the first halving.
pub const DEFAULT_GENESIS_REWARD: f64 = 1.0;
/// Default lower bound for the reward multiplier.
pub const DEFAULT_MIN_REWARD_FLOOR: f64 = 0.01;

/// Issuance schedule parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerConfig {
    /// Hard cap on `total_supply`.
    pub max_supply: f64,
    /// Tokens minted between halvings. Non-positive disables halving.
    pub halving_interval: f64,
    /// Initial reward multiplier.
    pub genesis_reward: f64,
    /// Halving never takes the multiplier below this.
    pub min_reward_floor: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_supply: DEFAULT_MAX_SUPPLY,
            halving_interval: DEFAULT_HALVING_INTERVAL,
            genesis_reward: DEFAULT_GENESIS_REWARD,
            min_reward_floor: DEFAULT_MIN_REWARD_FLOOR,
        }
    }
}

#[derive(Debug)]
struct LedgerState {
    supply: TokenSupplyState,
    balances: BTreeMap<String, TokenBalance>,
    transactions: Vec<TokenTransaction>,
}

/// Process-wide token ledger.
///
/// Share it behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct TokenLedger {
    config: LedgerConfig,
    state: Mutex<LedgerState>,
}

fn check_amount(amount: f64) -> Result<f64, TokenError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(TokenError::InvalidAmount { amount })
    }
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl TokenLedger {
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        let supply = TokenSupplyState {
            total_supply: 0.0,
            tokens_in_circulation: 0.0,
            current_reward_multiplier: config.genesis_reward,
            last_halving_at: 0.0,
            next_halving_at: config.halving_interval,
            is_cap_reached: false,
        };
        Self {
            config,
            state: Mutex::new(LedgerState {
                supply,
                balances: BTreeMap::new(),
                transactions: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, TokenError> {
        self.state.lock().map_err(|_| TokenError::Poisoned)
    }

    /// Awards `base_rate × quality_multiplier × current multiplier` tokens.
    ///
    /// Returns the amount actually minted: the full proposal, whatever
    /// headroom remains below the cap, or 0 once the cap has been reached.
    ///
    /// # Errors
    ///
    /// * [`TokenError::InvalidAmount`] if a rate is negative or not finite
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn award(
        &self,
        session_id: &str,
        kind: RewardKind,
        base_rate: f64,
        quality_multiplier: f64,
    ) -> Result<f64, TokenError> {
        self.mint(
            session_id,
            kind,
            base_rate,
            quality_multiplier,
            kind.to_string(),
        )
    }

    /// Awards a base amount of tokens for a contribution, recording why.
    ///
    /// # Errors
    ///
    /// * [`TokenError::InvalidAmount`] if the amount is negative or not finite
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn award_tokens(
        &self,
        session_id: &str,
        kind: RewardKind,
        amount: f64,
        reason: impl Into<String>,
    ) -> Result<f64, TokenError> {
        self.mint(session_id, kind, amount, 1.0, reason.into())
    }

    fn mint(
        &self,
        session_id: &str,
        kind: RewardKind,
        base_rate: f64,
        quality_multiplier: f64,
        reason: String,
    ) -> Result<f64, TokenError> {
        let base_rate = check_amount(base_rate)?;
        let quality_multiplier = check_amount(quality_multiplier)?;

        let mut state = self.lock()?;
        let LedgerState {
            supply,
            balances,
            transactions,
        } = &mut *state;

        if supply.is_cap_reached {
            return Ok(0.0);
        }

        self.apply_halvings(supply);

        let proposed = base_rate * quality_multiplier * supply.current_reward_multiplier;
        let headroom = self.config.max_supply - supply.total_supply;
        let awarded = if proposed >= headroom {
            log::info!(
                "Token supply cap of {} reached; awarding final {headroom} tokens",
                self.config.max_supply
            );
            supply.is_cap_reached = true;
            supply.current_reward_multiplier = 0.0;
            headroom.max(0.0)
        } else {
            proposed
        };

        if awarded <= 0.0 {
            return Ok(0.0);
        }

        supply.total_supply += awarded;
        supply.tokens_in_circulation += awarded;

        let balance = balances.entry(session_id.to_string()).or_default();
        balance.balance += awarded;
        balance.total_earned += awarded;

        transactions.push(TokenTransaction {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            kind: TransactionKind::Award { reward: kind },
            amount: awarded,
            reason,
            created_at: Utc::now(),
        });

        log::debug!(
            "Awarded {awarded} tokens to {session_id} for {kind}; supply now {}",
            supply.total_supply
        );

        Ok(awarded)
    }

    /// Halves the multiplier once per threshold the supply has crossed.
    ///
    /// The loop ends because `next_halving_at` grows by a positive interval
    /// each pass while `total_supply` stays fixed.
    fn apply_halvings(&self, supply: &mut TokenSupplyState) {
        if self.config.halving_interval <= 0.0 {
            return;
        }
        while supply.total_supply >= supply.next_halving_at {
            let halved = (supply.current_reward_multiplier / 2.0).max(self.config.min_reward_floor);
            log::info!(
                "Halving at supply {}: reward multiplier {} -> {halved}",
                supply.total_supply,
                supply.current_reward_multiplier
            );
            supply.current_reward_multiplier = halved;
            supply.last_halving_at = supply.total_supply;
            supply.next_halving_at += self.config.halving_interval;
        }
    }

    /// Debits a session's balance.
    ///
    /// Returns `false` without changing anything when the balance is too
    /// low. Spending moves tokens out of circulation but never changes
    /// `total_supply`.
    /// A zero amount succeeds for any session and records nothing.
    ///
    /// # Errors
    ///
    /// * [`TokenError::InvalidAmount`] if the amount is negative or not finite
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn spend(&self, session_id: &str, amount: f64) -> Result<bool, TokenError> {
        self.spend_tokens(session_id, amount, "spend")
    }

    /// Debits a session's balance, recording why.
    ///
    /// # Errors
    ///
    /// * [`TokenError::InvalidAmount`] if the amount is negative or not finite
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn spend_tokens(
        &self,
        session_id: &str,
        amount: f64,
        reason: impl Into<String>,
    ) -> Result<bool, TokenError> {
        let amount = check_amount(amount)?;
        if amount <= 0.0 {
            return Ok(true);
        }

        let mut state = self.lock()?;
        let LedgerState {
            supply,
            balances,
            transactions,
        } = &mut *state;

        let Some(balance) = balances.get_mut(session_id) else {
            return Ok(false);
        };
        if balance.balance < amount {
            log::debug!(
                "Session {session_id} cannot spend {amount}; balance is {}",
                balance.balance
            );
            return Ok(false);
        }

        balance.balance -= amount;
        balance.total_spent += amount;
        supply.tokens_in_circulation -= amount;

        transactions.push(TokenTransaction {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            kind: TransactionKind::Spend,
            amount,
            reason: reason.into(),
            created_at: Utc::now(),
        });

        Ok(true)
    }

    /// Current balance of a session. Unknown sessions have an empty account.
    ///
    /// # Errors
    ///
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn balance(&self, session_id: &str) -> Result<TokenBalance, TokenError> {
        Ok(self
            .lock()?
            .balances
            .get(session_id)
            .copied()
            .unwrap_or_default())
    }

    /// Snapshot of the supply state.
    ///
    /// # Errors
    ///
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn supply(&self) -> Result<TokenSupplyState, TokenError> {
        Ok(self.lock()?.supply)
    }

    /// Every transaction recorded for a session, oldest first.
    ///
    /// # Errors
    ///
    /// * [`TokenError::Poisoned`] if the ledger lock is poisoned
    pub fn transactions(&self, session_id: &str) -> Result<Vec<TokenTransaction>, TokenError> {
        Ok(self
            .lock()?
            .transactions
            .iter()
            .filter(|tx| tx.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(max_supply: f64, halving_interval: f64) -> TokenLedger {
        TokenLedger::new(LedgerConfig {
            max_supply,
            halving_interval,
            genesis_reward: 1.0,
            min_reward_floor: 0.3,
        })
    }

    #[test]
    fn award_clamps_to_remaining_headroom_then_stops() {
        let ledger = ledger(140.0, 1_000_000.0);

        let first = ledger
            .award_tokens("s1", RewardKind::DataAnalysis, 100.0, "report")
            .unwrap();
        assert!((first - 100.0).abs() < f64::EPSILON);
        assert!(!ledger.supply().unwrap().is_cap_reached);

        let second = ledger
            .award_tokens("s1", RewardKind::DataAnalysis, 100.0, "report")
            .unwrap();
        assert!((second - 40.0).abs() < f64::EPSILON, "awarded {second}");

        let supply = ledger.supply().unwrap();
        assert!(supply.is_cap_reached);
        assert!(supply.current_reward_multiplier.abs() < f64::EPSILON);
        assert!((supply.total_supply - 140.0).abs() < f64::EPSILON);

        let third = ledger
            .award_tokens("s2", RewardKind::Vote, 1.0, "vote")
            .unwrap();
        assert!(third.abs() < f64::EPSILON);
        assert!(ledger.transactions("s2").unwrap().is_empty());
    }

    #[test]
    fn halving_divides_multiplier_by_two() {
        let ledger = ledger(1_000.0, 10.0);
        ledger.award("s1", RewardKind::Vote, 10.0, 1.0).unwrap();
        assert!((ledger.supply().unwrap().current_reward_multiplier - 1.0).abs() < f64::EPSILON);

        let awarded = ledger.award("s1", RewardKind::Vote, 4.0, 1.0).unwrap();
        assert!((awarded - 2.0).abs() < f64::EPSILON, "awarded {awarded}");

        let supply = ledger.supply().unwrap();
        assert!((supply.current_reward_multiplier - 0.5).abs() < f64::EPSILON);
        assert!((supply.last_halving_at - 10.0).abs() < f64::EPSILON);
        assert!((supply.next_halving_at - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn halving_stops_at_floor() {
        let ledger = ledger(1_000.0, 10.0);
        ledger.award("s1", RewardKind::Vote, 10.0, 1.0).unwrap();
        ledger.award("s1", RewardKind::Vote, 20.0, 1.0).unwrap();
        // supply is now 20; the next award halves 0.5 -> max(0.25, 0.3)
        ledger.award("s1", RewardKind::Vote, 1.0, 1.0).unwrap();
        let supply = ledger.supply().unwrap();
        assert!((supply.current_reward_multiplier - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn large_award_catches_up_on_every_crossed_threshold() {
        let ledger = ledger(1_000.0, 10.0);
        ledger.award("s1", RewardKind::Vote, 105.0, 1.0).unwrap();
        ledger.award("s1", RewardKind::Vote, 1.0, 1.0).unwrap();

        let supply = ledger.supply().unwrap();
        assert!((supply.next_halving_at - 110.0).abs() < f64::EPSILON);
        assert!((supply.last_halving_at - 105.0).abs() < f64::EPSILON);
        assert!((supply.current_reward_multiplier - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn concurrent_awards_never_exceed_cap() {
        let ledger = ledger(100.0, 1_000_000.0);

        let awarded: f64 = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let ledger = &ledger;
                    scope.spawn(move || {
                        let session = format!("s{t}");
                        (0..50)
                            .map(|_| {
                                ledger
                                    .award(&session, RewardKind::Comment, 0.7, 1.0)
                                    .unwrap()
                            })
                            .sum::<f64>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        let supply = ledger.supply().unwrap();
        assert!(supply.is_cap_reached);
        assert!(
            supply.total_supply <= 100.0 + 1e-9,
            "supply overshot: {}",
            supply.total_supply
        );
        assert!((awarded - supply.total_supply).abs() < 1e-9);
    }

    #[test]
    fn spend_requires_sufficient_balance() {
        let ledger = ledger(1_000.0, 1_000_000.0);
        ledger
            .award_tokens("s1", RewardKind::Suggestion, 5.0, "benches")
            .unwrap();

        assert!(!ledger.spend("s1", 6.0).unwrap());
        assert!(!ledger.spend("nobody", 1.0).unwrap());
        let untouched = ledger.balance("s1").unwrap();
        assert!((untouched.balance - 5.0).abs() < f64::EPSILON);

        assert!(ledger.spend_tokens("s1", 3.0, "badge").unwrap());
        let balance = ledger.balance("s1").unwrap();
        assert!((balance.balance - 2.0).abs() < f64::EPSILON);
        assert!((balance.total_earned - 5.0).abs() < f64::EPSILON);
        assert!((balance.total_spent - 3.0).abs() < f64::EPSILON);

        let supply = ledger.supply().unwrap();
        assert!((supply.total_supply - 5.0).abs() < f64::EPSILON);
        assert!((supply.tokens_in_circulation - 2.0).abs() < f64::EPSILON);

        let history = ledger.transactions("s1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].kind, TransactionKind::Spend);
        assert_eq!(history[1].reason, "badge");
    }

    #[test]
    fn zero_spend_succeeds_without_a_transaction() {
        let ledger = ledger(1_000.0, 1_000_000.0);
        ledger
            .award_tokens("s1", RewardKind::Comment, 1.0, "reply")
            .unwrap();

        assert!(ledger.spend("s1", 0.0).unwrap());
        assert!(ledger.spend("nobody", 0.0).unwrap());

        assert_eq!(ledger.transactions("s1").unwrap().len(), 1);
        assert!(ledger.transactions("nobody").unwrap().is_empty());
        let balance = ledger.balance("s1").unwrap();
        assert!((balance.balance - 1.0).abs() < f64::EPSILON);
        assert!(balance.total_spent.abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_amounts_are_rejected() {
        let ledger = TokenLedger::default();
        assert!(matches!(
            ledger.award("s1", RewardKind::Vote, -1.0, 1.0),
            Err(TokenError::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.award("s1", RewardKind::Vote, 1.0, f64::NAN),
            Err(TokenError::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.spend("s1", f64::INFINITY),
            Err(TokenError::InvalidAmount { .. })
        ));
    }
}
