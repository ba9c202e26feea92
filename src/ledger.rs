// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Account ledger.
//!
//! The [`Ledger`] owns every account in the system: its identifier, its
//! current balance and its per-account lock.
//!
//! # Synchronization
//!
//! Two independent layers:
//!
//! - The map structure is a [`DashMap`], so lookups, inserts and single-entry
//!   writes are safe from any thread and only contend per shard.
//! - Each account carries an [`AccountLock`]. Anything that changes balances
//!   (transfers) or needs a consistent multi-account view ([`Ledger::snapshot`])
//!   holds the relevant account locks, acquired in id order through a
//!   [`LockSet`].
//!
//! Account locks are never acquired while a map reference is held: handles
//! are cloned out of the map first, so a thread waiting on an account lock
//! never blocks a shard.

use crate::account::{Account, AccountLock};
use crate::base::AccountId;
use crate::error::LedgerError;
use crate::lock_order::LockSet;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug)]
struct AccountEntry {
    balance: Decimal,
    lock: AccountLock,
}

/// In-memory account repository.
///
/// # Invariants
///
/// - Account identifiers are unique.
/// - No balance is ever committed below zero.
/// - Balances are only written under the owning account's lock, through
///   [`Ledger::update_balance`] or the coordinator.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, AccountEntry>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger {
            accounts: DashMap::new(),
        }
    }

    /// Inserts a new account.
    ///
    /// The existence check and the insert are a single atomic step, so of
    /// two concurrent creations with the same id exactly one succeeds.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::BlankAccountId`] - Identifier is empty.
    /// - [`LedgerError::NegativeBalance`] - Initial balance is below zero.
    /// - [`LedgerError::DuplicateAccount`] - Identifier is already taken.
    pub fn create_account(&self, account: Account) -> Result<(), LedgerError> {
        if account.id().is_blank() {
            return Err(LedgerError::BlankAccountId);
        }
        if account.balance() < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance(account.id().clone()));
        }

        match self.accounts.entry(account.id().clone()) {
            Entry::Occupied(entry) => Err(LedgerError::DuplicateAccount(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(account = %account.id(), balance = %account.balance(), "account created");
                entry.insert(AccountEntry {
                    balance: account.balance(),
                    lock: AccountLock::new(),
                });
                Ok(())
            }
        }
    }

    /// Returns a snapshot of the account, or `None` if it does not exist.
    pub fn get_account(&self, id: &AccountId) -> Option<Account> {
        self.accounts
            .get(id)
            .map(|entry| Account::new(id.clone(), entry.balance))
    }

    /// Replaces the stored balance of an existing account.
    ///
    /// Takes the account's lock for the write, so it never lands between the
    /// read and the writes of an in-flight transfer on the same account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NegativeBalance`] - `new_balance` is below zero.
    /// - [`LedgerError::AccountNotFound`] - No such account.
    pub fn update_balance(&self, id: &AccountId, new_balance: Decimal) -> Result<(), LedgerError> {
        let lock = self
            .lock_handle(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;
        let _guard = lock.lock();
        self.write_balance(id, new_balance)
    }

    /// Unlocked balance write. Caller must already hold the account's lock.
    pub(crate) fn write_balance(
        &self,
        id: &AccountId,
        new_balance: Decimal,
    ) -> Result<(), LedgerError> {
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance(id.clone()));
        }
        let mut entry = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;
        entry.balance = new_balance;
        debug_assert!(
            entry.balance >= Decimal::ZERO,
            "Invariant violated: balance of {} went negative: {}",
            id,
            entry.balance
        );
        Ok(())
    }

    /// Removes every account. Reset hook for tests; not part of the
    /// transfer flow.
    pub fn clear_accounts(&self) {
        self.accounts.clear();
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns every account, sorted by id, as of a single point in time.
    ///
    /// All account locks are held while balances are read, so no transfer is
    /// ever half-visible in the result.
    pub fn snapshot(&self) -> Vec<Account> {
        let handles = self
            .accounts
            .iter()
            .map(|entry| (entry.key().clone(), entry.lock.clone()))
            .collect();
        let locks = LockSet::new(handles);
        let _guards = locks.acquire();

        locks
            .order()
            .filter_map(|id| self.get_account(id))
            .collect()
    }

    /// Sum of all balances, read from a consistent [`snapshot`](Self::snapshot).
    pub fn total_balance(&self) -> Decimal {
        self.snapshot().iter().map(Account::balance).sum()
    }

    /// Current balance without building an [`Account`].
    pub(crate) fn balance(&self, id: &AccountId) -> Option<Decimal> {
        self.accounts.get(id).map(|entry| entry.balance)
    }

    /// Clones the lock handle out of the map so it can be acquired without
    /// holding a shard reference.
    pub(crate) fn lock_handle(&self, id: &AccountId) -> Option<AccountLock> {
        self.accounts.get(id).map(|entry| entry.lock.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn account(id: &str, balance: Decimal) -> Account {
        Account::new(AccountId::from(id), balance)
    }

    #[test]
    fn lock_handle_is_stable_per_account() {
        let ledger = Ledger::new();
        ledger.create_account(account("Id-1", dec!(10))).unwrap();

        let first = ledger.lock_handle(&AccountId::from("Id-1")).unwrap();
        let second = ledger.lock_handle(&AccountId::from("Id-1")).unwrap();
        assert!(first.same_as(&second));
    }

    #[test]
    fn lock_handles_differ_between_accounts() {
        let ledger = Ledger::new();
        ledger.create_account(account("Id-1", dec!(10))).unwrap();
        ledger.create_account(account("Id-2", dec!(10))).unwrap();

        let a = ledger.lock_handle(&AccountId::from("Id-1")).unwrap();
        let b = ledger.lock_handle(&AccountId::from("Id-2")).unwrap();
        assert!(!a.same_as(&b));
    }

    #[test]
    fn write_balance_does_not_take_account_lock() {
        let ledger = Ledger::new();
        let id = AccountId::from("Id-1");
        ledger.create_account(account("Id-1", dec!(10))).unwrap();

        let lock = ledger.lock_handle(&id).unwrap();
        let _guard = lock.lock();
        ledger.write_balance(&id, dec!(5)).unwrap();
        assert_eq!(ledger.balance(&id), Some(dec!(5)));
    }

    #[test]
    fn update_balance_waits_for_account_lock() {
        let ledger = Arc::new(Ledger::new());
        let id = AccountId::from("Id-1");
        ledger.create_account(account("Id-1", dec!(10))).unwrap();

        let lock = ledger.lock_handle(&id).unwrap();
        let guard = lock.lock();

        let writer = {
            let ledger = Arc::clone(&ledger);
            let id = id.clone();
            thread::spawn(move || ledger.update_balance(&id, dec!(5)))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(ledger.balance(&id), Some(dec!(10)));
        assert!(!writer.is_finished());

        drop(guard);
        writer.join().expect("Thread panicked").unwrap();
        assert_eq!(ledger.balance(&id), Some(dec!(5)));
        assert!(!lock.is_locked());
    }

    #[test]
    fn snapshot_releases_account_locks() {
        let ledger = Ledger::new();
        ledger.create_account(account("Id-2", dec!(2))).unwrap();
        ledger.create_account(account("Id-1", dec!(1))).unwrap();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot[0].id(), &AccountId::from("Id-1"));
        assert_eq!(snapshot[1].id(), &AccountId::from("Id-2"));

        let lock = ledger.lock_handle(&AccountId::from("Id-1")).unwrap();
        assert!(!lock.is_locked());
    }
}
