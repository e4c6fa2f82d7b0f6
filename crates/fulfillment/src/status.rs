//! Stock request status lifecycle.

use serde::{Deserialize, Serialize};

use stockline_core::{DomainError, DomainResult};

/// Replenishment request status.
///
/// `Completed` and `AcceptedWithChange` are terminal. Both rejected states
/// are re-enterable: the rejected cart can be resubmitted, which moves it
/// back to `Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockRequestStatus {
    Created,
    Processed,
    InDelivery,
    Completed,
    AcceptedWithChange,
    RejectedByWarehouse,
    RejectedByStore,
}

impl StockRequestStatus {
    pub const ALL: [StockRequestStatus; 7] = [
        Self::Created,
        Self::Processed,
        Self::InDelivery,
        Self::Completed,
        Self::AcceptedWithChange,
        Self::RejectedByWarehouse,
        Self::RejectedByStore,
    ];

    /// Target statuses reachable from `self` in one transition.
    pub fn allowed_transitions(self) -> &'static [StockRequestStatus] {
        match self {
            Self::Created => &[Self::Processed],
            Self::Processed => &[Self::InDelivery, Self::RejectedByWarehouse],
            Self::InDelivery => &[
                Self::Completed,
                Self::AcceptedWithChange,
                Self::RejectedByStore,
            ],
            Self::RejectedByStore => &[Self::Processed],
            Self::RejectedByWarehouse => &[Self::Processed],
            Self::Completed | Self::AcceptedWithChange => &[],
        }
    }

    pub fn can_transition_to(self, target: StockRequestStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Validate a transition, leaving the decision to mutate to the caller.
    pub fn ensure_transition(self, target: StockRequestStatus) -> DomainResult<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "invalid stock request transition: {self} -> {target}"
            )))
        }
    }
}

impl core::fmt::Display for StockRequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::Processed => "PROCESSED",
            Self::InDelivery => "IN_DELIVERY",
            Self::Completed => "COMPLETED",
            Self::AcceptedWithChange => "ACCEPTED_WITH_CHANGE",
            Self::RejectedByWarehouse => "REJECTED_BY_WAREHOUSE",
            Self::RejectedByStore => "REJECTED_BY_STORE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StockRequestStatus::*;

    #[test]
    fn happy_path_is_allowed() {
        assert!(Created.can_transition_to(Processed));
        assert!(Processed.can_transition_to(InDelivery));
        assert!(InDelivery.can_transition_to(Completed));
        assert!(InDelivery.can_transition_to(AcceptedWithChange));
    }

    #[test]
    fn rejected_states_are_re_enterable() {
        assert!(RejectedByStore.can_transition_to(Processed));
        assert!(RejectedByWarehouse.can_transition_to(Processed));
        assert!(!RejectedByStore.can_transition_to(InDelivery));
    }

    #[test]
    fn terminal_states_allow_nothing() {
        assert!(Completed.is_terminal());
        assert!(AcceptedWithChange.is_terminal());
        for target in StockRequestStatus::ALL {
            assert!(Completed.ensure_transition(target).is_err());
            assert!(AcceptedWithChange.ensure_transition(target).is_err());
        }
    }

    #[test]
    fn ensure_transition_reports_validation() {
        let err = Created
            .ensure_transition(Completed)
            .expect_err("CREATED -> COMPLETED must be refused");
        assert!(matches!(err, stockline_core::DomainError::Validation(_)));
    }

    mod transition_table {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = StockRequestStatus> {
            prop::sample::select(StockRequestStatus::ALL.to_vec())
        }

        // The full allowed table, written out so any change to
        // `allowed_transitions` has to be made in two places.
        fn allowed(from: StockRequestStatus, to: StockRequestStatus) -> bool {
            matches!(
                (from, to),
                (Created, Processed)
                    | (Processed, InDelivery)
                    | (Processed, RejectedByWarehouse)
                    | (InDelivery, Completed)
                    | (InDelivery, AcceptedWithChange)
                    | (InDelivery, RejectedByStore)
                    | (RejectedByStore, Processed)
                    | (RejectedByWarehouse, Processed)
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

            #[test]
            fn every_pair_matches_the_table(from in any_status(), to in any_status()) {
                prop_assert_eq!(from.can_transition_to(to), allowed(from, to));
                prop_assert_eq!(from.ensure_transition(to).is_ok(), allowed(from, to));
            }
        }
    }
}
