use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, ItemId, MovementId, OfficialId, UserId};

/// Stock-affecting event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Add,
    Remove,
    /// Stock handed to an official for field use; requires a recipient.
    Release,
    Return,
    /// Absolute override: quantity is set to the movement amount.
    Adjustment,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Release => "release",
            Self::Return => "return",
            Self::Adjustment => "adjustment",
        }
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "release" => Ok(Self::Release),
            "return" => Ok(Self::Return),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(DomainError::validation(format!(
                "unknown movement kind '{other}'"
            ))),
        }
    }
}

/// A requested stock movement, before it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub kind: MovementKind,
    /// Positive amount; for `Adjustment` this is the absolute target (>= 0).
    pub quantity: i64,
    pub note: Option<String>,
    /// Required for `Release`; must reference an active official.
    pub released_to: Option<OfficialId>,
    pub recorded_by: UserId,
}

/// Immutable ledger row: a movement as applied, with the resulting quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub kind: MovementKind,
    pub quantity: i64,
    /// Item quantity after this movement was applied.
    pub resulting_quantity: i64,
    pub note: Option<String>,
    pub released_to: Option<OfficialId>,
    pub recorded_by: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// Compute the quantity after applying `movement` to `current`.
///
/// Pure: no IO, no mutation. The infra-layer applier commits the returned
/// quantity together with the log row in a single transaction, so a rejected
/// movement leaves no trace.
pub fn apply_movement(current: i64, movement: &Movement) -> DomainResult<i64> {
    if movement.quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }

    if movement.kind == MovementKind::Adjustment {
        return Ok(movement.quantity);
    }

    if movement.quantity == 0 {
        return Err(DomainError::validation("quantity cannot be zero"));
    }
    if movement.kind == MovementKind::Release && movement.released_to.is_none() {
        return Err(DomainError::validation("release requires a recipient"));
    }

    match movement.kind {
        MovementKind::Add | MovementKind::Return => Ok(current + movement.quantity),
        MovementKind::Remove | MovementKind::Release => {
            let new = current - movement.quantity;
            if new < 0 {
                return Err(DomainError::invariant("insufficient stock"));
            }
            Ok(new)
        }
        MovementKind::Adjustment => Ok(movement.quantity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn movement(kind: MovementKind, quantity: i64) -> Movement {
        Movement {
            kind,
            quantity,
            note: None,
            released_to: match kind {
                MovementKind::Release => Some(OfficialId::new()),
                _ => None,
            },
            recorded_by: UserId::new(),
        }
    }

    #[test]
    fn add_and_return_increase_stock() {
        assert_eq!(apply_movement(10, &movement(MovementKind::Add, 3)), Ok(13));
        assert_eq!(apply_movement(10, &movement(MovementKind::Return, 2)), Ok(12));
    }

    #[test]
    fn remove_beyond_stock_is_rejected() {
        let err = apply_movement(7, &movement(MovementKind::Remove, 8)).unwrap_err();
        assert_eq!(err, DomainError::invariant("insufficient stock"));
    }

    #[test]
    fn oversized_release_is_rejected_after_partial_removal() {
        // Item starts at 10. Remove 3 -> 7. Release 10 -> rejected, still 7.
        let after_remove = apply_movement(10, &movement(MovementKind::Remove, 3)).unwrap();
        assert_eq!(after_remove, 7);
        let err = apply_movement(after_remove, &movement(MovementKind::Release, 10)).unwrap_err();
        assert_eq!(err, DomainError::invariant("insufficient stock"));
    }

    #[test]
    fn adjustment_is_absolute_including_zero() {
        assert_eq!(apply_movement(37, &movement(MovementKind::Adjustment, 12)), Ok(12));
        assert_eq!(apply_movement(37, &movement(MovementKind::Adjustment, 0)), Ok(0));
    }

    #[test]
    fn release_without_recipient_is_rejected() {
        let mut m = movement(MovementKind::Release, 1);
        m.released_to = None;
        let err = apply_movement(10, &m).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_quantity_is_rejected_for_every_kind() {
        for kind in [
            MovementKind::Add,
            MovementKind::Remove,
            MovementKind::Release,
            MovementKind::Return,
            MovementKind::Adjustment,
        ] {
            let err = apply_movement(10, &movement(kind, -5)).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "kind {kind:?}");
        }
    }

    #[test]
    fn zero_quantity_is_rejected_for_delta_kinds() {
        for kind in [
            MovementKind::Add,
            MovementKind::Remove,
            MovementKind::Release,
            MovementKind::Return,
        ] {
            assert!(apply_movement(10, &movement(kind, 0)).is_err(), "kind {kind:?}");
        }
    }

    #[test]
    fn movement_kind_round_trips_through_str() {
        for kind in [
            MovementKind::Add,
            MovementKind::Remove,
            MovementKind::Release,
            MovementKind::Return,
            MovementKind::Adjustment,
        ] {
            assert_eq!(kind.as_str().parse::<MovementKind>().unwrap(), kind);
        }
    }

    proptest! {
        /// Final quantity after a series of Add/Return movements equals
        /// initial + sum of amounts.
        #[test]
        fn add_return_sequences_sum(
            initial in 0i64..1_000,
            amounts in proptest::collection::vec(1i64..1_000, 0..20),
            kinds in proptest::collection::vec(prop_oneof![
                Just(MovementKind::Add),
                Just(MovementKind::Return),
            ], 20),
        ) {
            let mut quantity = initial;
            let mut total = 0i64;
            for (amount, kind) in amounts.iter().zip(kinds) {
                quantity = apply_movement(quantity, &movement(kind, *amount)).unwrap();
                total += amount;
            }
            prop_assert_eq!(quantity, initial + total);
        }

        /// Remove/Release never drive quantity negative: either the result is
        /// >= 0 or the movement is rejected and quantity is unchanged.
        #[test]
        fn remove_release_never_go_negative(
            initial in 0i64..100,
            amount in 1i64..200,
            release in proptest::bool::ANY,
        ) {
            let kind = if release { MovementKind::Release } else { MovementKind::Remove };
            match apply_movement(initial, &movement(kind, amount)) {
                Ok(next) => {
                    prop_assert_eq!(next, initial - amount);
                    prop_assert!(next >= 0);
                }
                Err(err) => {
                    prop_assert_eq!(err, DomainError::invariant("insufficient stock"));
                    prop_assert!(amount > initial);
                }
            }
        }

        /// Adjustment to V always yields V regardless of prior quantity.
        #[test]
        fn adjustment_is_absolute(prior in 0i64..10_000, target in 0i64..10_000) {
            prop_assert_eq!(
                apply_movement(prior, &movement(MovementKind::Adjustment, target)),
                Ok(target)
            );
        }
    }
}
