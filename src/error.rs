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

//! Error types for ledger and transfer operations.

use crate::base::AccountId;
use thiserror::Error;

/// Ledger (account repository) errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// An account with this identifier already exists
    #[error("account id {0} already exists")]
    DuplicateAccount(AccountId),

    /// Account identifier is empty or whitespace
    #[error("account id must not be blank")]
    BlankAccountId,

    /// Balance would be committed below zero
    #[error("negative balance for account {0}")]
    NegativeBalance(AccountId),

    /// No account with this identifier
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
}

/// Transfer errors. Every variant is terminal for the call and leaves all
/// balances untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Referenced account does not exist
    #[error("invalid account id provided {0}")]
    InvalidAccount(AccountId),

    /// Debit would take the sender below zero
    #[error("requested amount to transfer is overdrafting account")]
    InsufficientFunds,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Sender or receiver identifier is empty
    #[error("account id must not be blank")]
    BlankAccountId,

    /// Sender and receiver are the same account
    #[error("cannot transfer to the same account")]
    SameAccount,

    /// Credit exceeds the representable decimal range
    #[error("balance overflow")]
    BalanceOverflow,

    /// A resulting balance would need more than 28 significant digits
    #[error("amount cannot be applied without rounding")]
    PrecisionLoss,
}
