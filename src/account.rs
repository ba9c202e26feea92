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

//! Account entity.
//!
//! An [`Account`] is a value snapshot: identifier plus balance at the time it
//! was read. The live balance is owned by the [`Ledger`](crate::Ledger), and
//! every account there is paired with an [`AccountLock`] that serializes
//! balance updates for that account.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use transfer_ledger_rs::{Account, AccountId};
//!
//! let account = Account::new(AccountId::from("Id-1"), dec!(123.45));
//! assert_eq!(account.balance(), dec!(123.45));
//! ```

use crate::base::AccountId;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "accountId")]
    id: AccountId,
    balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        Self { id, balance }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }
}

/// Per-account mutual-exclusion handle.
///
/// Holds no data: it only orders writers of one account's balance. Cloning
/// shares the same underlying mutex.
#[derive(Debug, Clone, Default)]
pub(crate) struct AccountLock(Arc<Mutex<()>>);

impl AccountLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock()
    }

    /// Returns `true` if both handles guard the same account.
    pub(crate) fn same_as(&self, other: &AccountLock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.0.is_locked()
    }
}
