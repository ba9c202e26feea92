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

//! Ordered acquisition of account locks.
//!
//! Every caller that needs more than one account lock goes through a
//! [`LockSet`], which always acquires in ascending [`AccountId`] order. Two
//! transfers over the same pair of accounts, in either direction, therefore
//! contend on the same first lock and can never wait on each other in a cycle.

use crate::account::AccountLock;
use crate::base::AccountId;
use parking_lot::MutexGuard;

#[derive(Debug)]
pub(crate) struct LockSet {
    /// Handles sorted by account id, one per account.
    handles: Vec<(AccountId, AccountLock)>,
}

impl LockSet {
    pub(crate) fn new(mut handles: Vec<(AccountId, AccountLock)>) -> Self {
        handles.sort_by(|(a, _), (b, _)| a.cmp(b));
        // A repeated account must be locked once; parking_lot mutexes are not re-entrant.
        handles.dedup_by(|(a, a_lock), (b, b_lock)| a == b || a_lock.same_as(b_lock));
        Self { handles }
    }

    /// Blocks until every lock in the set is held. Locks are released when
    /// the returned guards are dropped.
    pub(crate) fn acquire(&self) -> Vec<MutexGuard<'_, ()>> {
        self.handles.iter().map(|(_, lock)| lock.lock()).collect()
    }

    pub(crate) fn order(&self) -> impl Iterator<Item = &AccountId> {
        self.handles.iter().map(|(id, _)| id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str) -> (AccountId, AccountLock) {
        (AccountId::from(id), AccountLock::new())
    }

    #[test]
    fn order_is_independent_of_call_direction() {
        let a = handle("Id-1000");
        let b = handle("Id-2000");

        let forward = LockSet::new(vec![a.clone(), b.clone()]);
        let backward = LockSet::new(vec![b, a]);

        let forward: Vec<_> = forward.order().cloned().collect();
        let backward: Vec<_> = backward.order().cloned().collect();
        assert_eq!(forward, backward);
        assert_eq!(forward[0], AccountId::from("Id-1000"));
    }

    #[test]
    fn same_account_is_locked_once() {
        let a = handle("Id-1");
        let set = LockSet::new(vec![a.clone(), a.clone()]);
        assert_eq!(set.len(), 1);

        // Would self-deadlock if the lock were taken twice.
        let guards = set.acquire();
        assert_eq!(guards.len(), 1);
        assert!(a.1.is_locked());
    }

    #[test]
    fn guards_release_on_drop() {
        let a = handle("Id-1");
        let b = handle("Id-2");
        let set = LockSet::new(vec![b.clone(), a.clone()]);

        {
            let _guards = set.acquire();
            assert!(a.1.is_locked());
            assert!(b.1.is_locked());
        }

        assert!(!a.1.is_locked());
        assert!(!b.1.is_locked());
    }
}
