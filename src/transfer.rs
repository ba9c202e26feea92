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

use crate::base::AccountId;
use crate::error::TransferError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to move `amount` from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "accountFrom")]
    pub from: AccountId,
    #[serde(rename = "accountTo")]
    pub to: AccountId,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(from: impl Into<AccountId>, to: impl Into<AccountId>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Checks the request shape. Does not touch the ledger.
    ///
    /// # Errors
    ///
    /// - [`TransferError::BlankAccountId`] - Either id is blank.
    /// - [`TransferError::InvalidAmount`] - Amount is zero or negative.
    /// - [`TransferError::SameAccount`] - Sender and receiver are equal.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.from.is_blank() || self.to.is_blank() {
            return Err(TransferError::BlankAccountId);
        }
        if self.amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount);
        }
        if self.from == self.to {
            return Err(TransferError::SameAccount);
        }
        Ok(())
    }
}

/// Outcome of a successful transfer, with the balances committed under lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}
