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

//! Transfer coordinator.
//!
//! The [`TransferCoordinator`] moves money between two accounts of a
//! [`Ledger`] as one atomic unit.
//!
//! # Protocol
//!
//! 1. Validate the request shape (ids, amount).
//! 2. Resolve the sender; reject early if the amount overdraws it.
//! 3. Resolve the receiver.
//! 4. Acquire both account locks in ascending id order.
//! 5. Re-read both balances under lock and re-check the overdraft.
//! 6. Write both balances while still holding both locks, unless either
//!    result would be rounded.
//! 7. Release the locks.
//! 8. Notify both account holders.
//!
//! Steps 1-3 take no locks and change nothing, so every rejection before
//! step 4 is free of side effects. The check in step 2 is only a fast path;
//! the one in step 5 is authoritative.
//!
//! # Thread Safety
//!
//! There is no global lock. Transfers over disjoint account pairs run fully
//! in parallel; transfers sharing an account are serialized on that
//! account's lock. Lock order depends only on account ids, so opposite
//! direction transfers between the same pair cannot deadlock.

use crate::account::{Account, AccountLock};
use crate::base::AccountId;
use crate::error::{LedgerError, TransferError};
use crate::ledger::Ledger;
use crate::lock_order::LockSet;
use crate::notification::NotificationPort;
use crate::transfer::{TransferReceipt, TransferRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TransferCoordinator {
    ledger: Arc<Ledger>,
    notifier: Arc<dyn NotificationPort>,
}

impl TransferCoordinator {
    pub fn new(ledger: Arc<Ledger>, notifier: Arc<dyn NotificationPort>) -> Self {
        Self { ledger, notifier }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Opens a new account with `initial_balance`.
    pub fn create_account(
        &self,
        id: impl Into<AccountId>,
        initial_balance: Decimal,
    ) -> Result<(), LedgerError> {
        self.ledger.create_account(Account::new(id.into(), initial_balance))
    }

    pub fn get_account(&self, id: &AccountId) -> Option<Account> {
        self.ledger.get_account(id)
    }

    /// Moves `request.amount` from `request.from` to `request.to`.
    ///
    /// # Errors
    ///
    /// - [`TransferError::BlankAccountId`], [`TransferError::InvalidAmount`],
    ///   [`TransferError::SameAccount`] - Malformed request.
    /// - [`TransferError::InvalidAccount`] - Sender or receiver does not exist.
    /// - [`TransferError::InsufficientFunds`] - Sender balance is too low.
    /// - [`TransferError::BalanceOverflow`] - Receiver balance would overflow.
    /// - [`TransferError::PrecisionLoss`] - A new balance cannot hold the amount exactly.
    ///
    /// No balance changes on any error.
    pub fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        request.validate()?;

        let from = self
            .ledger
            .get_account(&request.from)
            .ok_or_else(|| TransferError::InvalidAccount(request.from.clone()))?;
        if from.balance() < request.amount {
            return Err(TransferError::InsufficientFunds);
        }
        if self.ledger.get_account(&request.to).is_none() {
            return Err(TransferError::InvalidAccount(request.to.clone()));
        }

        let locks = LockSet::new(vec![
            (request.from.clone(), self.lock_handle(&request.from)?),
            (request.to.clone(), self.lock_handle(&request.to)?),
        ]);
        let receipt = {
            let _guards = locks.acquire();
            self.settle(&request)?
        };

        debug!(
            from = %receipt.from,
            to = %receipt.to,
            amount = %receipt.amount,
            "transfer committed"
        );

        self.notify(
            Account::new(receipt.from.clone(), receipt.from_balance),
            format!("Your account is debited with amount {}", receipt.amount),
        );
        self.notify(
            Account::new(receipt.to.clone(), receipt.to_balance),
            format!("Your account is credited with amount {}", receipt.amount),
        );

        Ok(receipt)
    }

    /// Convenience wrapper around [`transfer`](Self::transfer).
    pub fn transfer_between(
        &self,
        from: impl Into<AccountId>,
        to: impl Into<AccountId>,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        self.transfer(TransferRequest::new(from, to, amount))
    }

    fn lock_handle(&self, id: &AccountId) -> Result<AccountLock, TransferError> {
        self.ledger
            .lock_handle(id)
            .ok_or_else(|| TransferError::InvalidAccount(id.clone()))
    }

    /// Applies the debit and credit. Caller holds both account locks.
    fn settle(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        let from_balance = self
            .ledger
            .balance(&request.from)
            .ok_or_else(|| TransferError::InvalidAccount(request.from.clone()))?;
        let to_balance = self
            .ledger
            .balance(&request.to)
            .ok_or_else(|| TransferError::InvalidAccount(request.to.clone()))?;

        let debited = from_balance
            .checked_sub(request.amount)
            .filter(|balance| *balance >= Decimal::ZERO)
            .ok_or(TransferError::InsufficientFunds)?;
        let credited = to_balance
            .checked_add(request.amount)
            .ok_or(TransferError::BalanceOverflow)?;
        // Results past 28 significant digits come back rounded, not as `None`.
        if from_balance - debited != request.amount || credited - to_balance != request.amount {
            return Err(TransferError::PrecisionLoss);
        }

        self.ledger
            .write_balance(&request.from, debited)
            .map_err(|_| TransferError::InvalidAccount(request.from.clone()))?;
        if self.ledger.write_balance(&request.to, credited).is_err() {
            // Receiver vanished after the debit was written; put it back.
            if let Err(e) = self.ledger.write_balance(&request.from, from_balance) {
                warn!(account = %request.from, error = %e, "failed to restore debited balance");
            }
            return Err(TransferError::InvalidAccount(request.to.clone()));
        }

        Ok(TransferReceipt {
            from: request.from.clone(),
            to: request.to.clone(),
            amount: request.amount,
            from_balance: debited,
            to_balance: credited,
        })
    }

    fn notify(&self, account: Account, message: String) {
        if let Err(e) = self.notifier.notify(&account, &message) {
            warn!(account = %account.id(), error = %e, "notification failed");
        }
    }
}
