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

//! # Transfer Ledger
//!
//! This library keeps a set of monetary accounts in memory and moves money
//! between them under arbitrary concurrent access.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Owns all accounts, their balances and per-account locks
//! - [`TransferCoordinator`]: Deadlock-free, atomic transfers between two accounts
//! - [`NotificationPort`]: Capability notified after each committed transfer
//! - [`LedgerError`] / [`TransferError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use transfer_ledger_rs::{AccountId, Ledger, LogNotifier, TransferCoordinator, TransferRequest};
//! use rust_decimal_macros::dec;
//!
//! let coordinator = TransferCoordinator::new(Arc::new(Ledger::new()), Arc::new(LogNotifier));
//! coordinator.create_account("Id-1", dec!(123.45)).unwrap();
//! coordinator.create_account("Id-2", dec!(253.33)).unwrap();
//!
//! coordinator
//!     .transfer(TransferRequest::new("Id-1", "Id-2", dec!(100)))
//!     .unwrap();
//!
//! let account = coordinator.get_account(&AccountId::from("Id-1")).unwrap();
//! assert_eq!(account.balance(), dec!(23.45));
//! ```
//!
//! ## Thread Safety
//!
//! Balances are only written while the owning account's lock is held, and
//! multi-account operations take those locks in ascending id order. Transfers
//! over disjoint accounts proceed in parallel.

pub mod account;
mod base;
mod coordinator;
pub mod error;
mod ledger;
mod lock_order;
pub mod notification;
mod transfer;

pub use account::Account;
pub use base::AccountId;
pub use coordinator::TransferCoordinator;
pub use error::{LedgerError, TransferError};
pub use ledger::Ledger;
pub use notification::{LogNotifier, NotificationError, NotificationPort};
pub use transfer::{TransferReceipt, TransferRequest};
