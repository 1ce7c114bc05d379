//! Money exchange ledger
//!
//! Moves currency between two `Money` accounts. Agents flagged
//! `HouseholdProxy` never hold money themselves: their side of a transfer is
//! booked against the single `HouseholdAccount`, which acts as the economy's
//! unlimited reservoir (it may run a negative balance). Two parties that
//! resolve to the same account trade as a no-op.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

use crate::core::types::{EntityId, Tick};
use crate::ecs::components::{HouseholdAccount, HouseholdProxy, Money};
use crate::ecs::store::{ComponentKind, EntityStore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0} has no Money account")]
    MissingAccount(EntityId),

    #[error("no household account exists")]
    NoHousehold,

    #[error("{payer} cannot cover {amount} (balance {balance})")]
    InsufficientFunds {
        payer: EntityId,
        amount: i64,
        balance: i64,
    },

    #[error("negative transfer amount {0}")]
    NegativeAmount(i64),
}

/// Audit log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub tick: Tick,
    pub from: EntityId,
    pub to: EntityId,
    /// Account actually debited (the household when `from` is a proxy)
    pub payer_account: EntityId,
    /// Account actually credited
    pub payee_account: EntityId,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Moved { payer: EntityId, payee: EntityId },
    /// Both sides resolved to one account; nothing moved
    SameAccount,
}

/// The unique entity carrying the household marker and a balance
pub fn household_account(store: &EntityStore) -> Option<EntityId> {
    store
        .query(&[ComponentKind::HouseholdAccount, ComponentKind::Money])
        .first()
        .copied()
}

/// Account a party's side of a transfer is booked against
pub fn resolve_account(store: &EntityStore, party: EntityId) -> Result<EntityId, LedgerError> {
    if store.contains::<HouseholdProxy>(party) {
        household_account(store).ok_or(LedgerError::NoHousehold)
    } else {
        Ok(party)
    }
}

/// Transfer primitive plus a capped audit log of recent transfers
#[derive(Debug, Clone)]
pub struct Ledger {
    history: VecDeque<TransferRecord>,
    capacity: usize,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn transfer(
        &mut self,
        store: &mut EntityStore,
        tick: Tick,
        from: EntityId,
        to: EntityId,
        amount: i64,
    ) -> Result<TransferOutcome, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }

        let payer = resolve_account(store, from)?;
        let payee = resolve_account(store, to)?;
        let balance = store
            .get::<Money>(payer)
            .map(|m| m.amount)
            .ok_or(LedgerError::MissingAccount(payer))?;
        if !store.contains::<Money>(payee) {
            return Err(LedgerError::MissingAccount(payee));
        }

        let outcome = if payer == payee {
            TransferOutcome::SameAccount
        } else {
            let reservoir = store.contains::<HouseholdAccount>(payer);
            if !reservoir && balance < amount {
                return Err(LedgerError::InsufficientFunds {
                    payer,
                    amount,
                    balance,
                });
            }
            if let Some(money) = store.get_mut::<Money>(payer) {
                money.amount -= amount;
            }
            if let Some(money) = store.get_mut::<Money>(payee) {
                money.amount += amount;
            }
            TransferOutcome::Moved { payer, payee }
        };

        self.record(TransferRecord {
            tick,
            from,
            to,
            payer_account: payer,
            payee_account: payee,
            amount,
        });
        Ok(outcome)
    }

    fn record(&mut self, record: TransferRecord) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &TransferRecord> + '_ {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn last(&self) -> Option<&TransferRecord> {
        self.history.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(store: &mut EntityStore, amount: i64) -> EntityId {
        let id = store.create();
        store.attach(id, Money { amount });
        id
    }

    fn balance(store: &EntityStore, id: EntityId) -> i64 {
        store.get::<Money>(id).map(|m| m.amount).unwrap_or_default()
    }

    #[test]
    fn test_plain_transfer_conserves_money() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let a = account(&mut store, 30);
        let b = account(&mut store, 5);

        let outcome = ledger.transfer(&mut store, 1, a, b, 12).unwrap();
        assert_eq!(outcome, TransferOutcome::Moved { payer: a, payee: b });
        assert_eq!(balance(&store, a), 18);
        assert_eq!(balance(&store, b), 17);
    }

    #[test]
    fn test_proxy_routes_through_household() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let household = account(&mut store, 100);
        store.attach(household, HouseholdAccount);
        let proxy = account(&mut store, 7);
        store.attach(proxy, HouseholdProxy);
        let worker = account(&mut store, 0);

        ledger.transfer(&mut store, 3, proxy, worker, 20).unwrap();
        assert_eq!(balance(&store, household), 80);
        assert_eq!(balance(&store, worker), 20);
        // The proxy's own balance is untouched
        assert_eq!(balance(&store, proxy), 7);

        let record = ledger.last().unwrap();
        assert_eq!(record.payer_account, household);
        assert_eq!(record.from, proxy);
    }

    #[test]
    fn test_two_proxies_is_a_no_op() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let household = account(&mut store, 50);
        store.attach(household, HouseholdAccount);
        let p1 = account(&mut store, 0);
        let p2 = account(&mut store, 0);
        store.attach(p1, HouseholdProxy);
        store.attach(p2, HouseholdProxy);

        let outcome = ledger.transfer(&mut store, 0, p1, p2, 10).unwrap();
        assert_eq!(outcome, TransferOutcome::SameAccount);
        assert_eq!(balance(&store, household), 50);
    }

    #[test]
    fn test_household_may_overdraw() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let household = account(&mut store, 5);
        store.attach(household, HouseholdAccount);
        let worker = account(&mut store, 0);

        ledger.transfer(&mut store, 0, household, worker, 20).unwrap();
        assert_eq!(balance(&store, household), -15);
    }

    #[test]
    fn test_rejections_leave_balances_alone() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let poor = account(&mut store, 3);
        let rich = account(&mut store, 100);
        let broke = store.create();

        assert_eq!(
            ledger.transfer(&mut store, 0, poor, rich, 10),
            Err(LedgerError::InsufficientFunds {
                payer: poor,
                amount: 10,
                balance: 3
            })
        );
        assert_eq!(
            ledger.transfer(&mut store, 0, rich, broke, 10),
            Err(LedgerError::MissingAccount(broke))
        );
        assert_eq!(
            ledger.transfer(&mut store, 0, rich, poor, -1),
            Err(LedgerError::NegativeAmount(-1))
        );
        assert_eq!(balance(&store, poor), 3);
        assert_eq!(balance(&store, rich), 100);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_proxy_without_household_is_rejected() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(8);
        let proxy = account(&mut store, 10);
        store.attach(proxy, HouseholdProxy);
        let other = account(&mut store, 10);

        assert_eq!(
            ledger.transfer(&mut store, 0, proxy, other, 1),
            Err(LedgerError::NoHousehold)
        );
    }

    #[test]
    fn test_history_is_capped() {
        let mut store = EntityStore::new();
        let mut ledger = Ledger::new(3);
        let a = account(&mut store, 100);
        let b = account(&mut store, 0);

        for tick in 0..5 {
            ledger.transfer(&mut store, tick, a, b, 1).unwrap();
        }
        assert_eq!(ledger.len(), 3);
        let ticks: Vec<Tick> = ledger.history().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }
}
