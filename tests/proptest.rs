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

//! Property-based tests for the ledger and transfer coordinator.
//!
//! These tests verify invariants that should hold for any sequence of
//! transfers, valid or not.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use transfer_ledger_rs::{
    AccountId, Ledger, LogNotifier, TransferCoordinator, TransferError, TransferRequest,
};

const NUM_ACCOUNTS: usize = 4;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount (0.0001 to 1000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate a non-negative opening balance.
fn arb_balance() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate a transfer between two of the test accounts, possibly the same one.
fn arb_transfer() -> impl Strategy<Value = (usize, usize, Decimal)> {
    (0..NUM_ACCOUNTS, 0..NUM_ACCOUNTS, arb_amount())
}

fn id(i: usize) -> AccountId {
    AccountId::from(format!("acc-{i}"))
}

fn coordinator_with(balances: &[Decimal]) -> TransferCoordinator {
    let coordinator = TransferCoordinator::new(Arc::new(Ledger::new()), Arc::new(LogNotifier));
    for (i, balance) in balances.iter().enumerate() {
        coordinator.create_account(id(i), *balance).unwrap();
    }
    coordinator
}

fn balances(coordinator: &TransferCoordinator) -> Vec<Decimal> {
    coordinator
        .ledger()
        .snapshot()
        .iter()
        .map(|a| a.balance())
        .collect()
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Sum of balances is unchanged by any sequence of transfers.
    #[test]
    fn transfers_conserve_total(
        opening in prop::collection::vec(arb_balance(), NUM_ACCOUNTS),
        transfers in prop::collection::vec(arb_transfer(), 0..50),
    ) {
        let coordinator = coordinator_with(&opening);
        let expected_total: Decimal = opening.iter().copied().sum();

        for (from, to, amount) in transfers {
            let _ = coordinator.transfer(TransferRequest::new(id(from), id(to), amount));
        }

        prop_assert_eq!(coordinator.ledger().total_balance(), expected_total);
    }

    /// No balance goes negative.
    #[test]
    fn balances_never_negative(
        opening in prop::collection::vec(arb_balance(), NUM_ACCOUNTS),
        transfers in prop::collection::vec(arb_transfer(), 0..50),
    ) {
        let coordinator = coordinator_with(&opening);

        for (from, to, amount) in transfers {
            let _ = coordinator.transfer(TransferRequest::new(id(from), id(to), amount));
            for balance in balances(&coordinator) {
                prop_assert!(balance >= Decimal::ZERO);
            }
        }
    }

    /// A rejected transfer changes nothing; an accepted one moves exactly
    /// `amount` from sender to receiver.
    #[test]
    fn transfer_is_all_or_nothing(
        opening in prop::collection::vec(arb_balance(), NUM_ACCOUNTS),
        (from, to, amount) in arb_transfer(),
    ) {
        let coordinator = coordinator_with(&opening);
        let before = balances(&coordinator);

        let result = coordinator.transfer(TransferRequest::new(id(from), id(to), amount));
        let after = balances(&coordinator);

        match result {
            Ok(receipt) => {
                prop_assert_eq!(after[from], before[from] - amount);
                prop_assert_eq!(after[to], before[to] + amount);
                prop_assert_eq!(receipt.from_balance, after[from]);
                prop_assert_eq!(receipt.to_balance, after[to]);
            }
            Err(TransferError::SameAccount) => {
                prop_assert_eq!(from, to);
                prop_assert_eq!(after, before);
            }
            Err(TransferError::InsufficientFunds) => {
                prop_assert!(before[from] < amount);
                prop_assert_eq!(after, before);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    /// Transfers naming an unknown account never touch any balance.
    #[test]
    fn unknown_accounts_never_mutate(
        opening in prop::collection::vec(arb_balance(), NUM_ACCOUNTS),
        known in 0..NUM_ACCOUNTS,
        amount in arb_amount(),
        unknown_is_sender in any::<bool>(),
    ) {
        let coordinator = coordinator_with(&opening);
        let before = balances(&coordinator);
        let missing = AccountId::from("missing");

        let request = if unknown_is_sender {
            TransferRequest::new(missing.clone(), id(known), amount)
        } else {
            TransferRequest::new(id(known), missing.clone(), amount)
        };
        let result = coordinator.transfer(request);

        if unknown_is_sender {
            prop_assert_eq!(result, Err(TransferError::InvalidAccount(missing)));
        } else {
            prop_assert!(result.is_err());
        }
        prop_assert_eq!(balances(&coordinator), before);
    }

    /// Non-positive amounts are always rejected before anything else.
    #[test]
    fn non_positive_amounts_rejected(
        opening in prop::collection::vec(arb_balance(), NUM_ACCOUNTS),
        units in -10_000_000i64..=0,
        (from, to, _) in arb_transfer(),
    ) {
        let coordinator = coordinator_with(&opening);
        let before = balances(&coordinator);

        let result = coordinator.transfer(TransferRequest::new(id(from), id(to), Decimal::new(units, 4)));

        prop_assert_eq!(result, Err(TransferError::InvalidAmount));
        prop_assert_eq!(balances(&coordinator), before);
    }
}
