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

//! Post-transfer notifications.
//!
//! The coordinator calls [`NotificationPort::notify`] once per affected
//! account after the transfer has committed and all account locks are
//! released. Failures are logged and dropped; they never undo a transfer.

use crate::account::Account;
use thiserror::Error;
use tracing::info;

/// Notification delivery failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Capability for telling an account holder about a balance change.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, account: &Account, message: &str) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, account: &Account, message: &str) -> Result<(), NotificationError> {
        info!(account = %account.id(), "sending notification: {message}");
        Ok(())
    }
}
