//! The transition table: single source of truth for which transitions exist
//!
//! A fixed, version-controlled list of transition definitions. The
//! domain is small and stable, so flexibility comes from swappable
//! guards and effects rather than a database-defined graph, and the hot
//! path stays free of extra storage round-trips. Extending the table
//! means adding an entry to [`canonical_transitions`] (or building a
//! custom table) and registering any new guard or effect keys.

use crate::{EngineError, EngineResult};
use orderflow_types::{OrderStatus, Transition};
use std::collections::HashSet;

/// Validated, immutable set of transition definitions
#[derive(Clone, Debug)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

impl TransitionTable {
    /// Build a table from definitions, validating structure first.
    pub fn new(transitions: Vec<Transition>) -> EngineResult<Self> {
        Self::validate(&transitions)?;
        Ok(Self { transitions })
    }

    /// The canonical order lifecycle table.
    pub fn canonical() -> Self {
        Self {
            transitions: canonical_transitions(),
        }
    }

    fn validate(transitions: &[Transition]) -> EngineResult<()> {
        let mut names = HashSet::new();
        let mut edges = HashSet::new();
        for transition in transitions {
            if transition.from_states.is_empty() {
                return Err(EngineError::InvalidTable(format!(
                    "transition '{}' has no source states",
                    transition.name
                )));
            }
            if !names.insert(transition.name.as_str()) {
                return Err(EngineError::InvalidTable(format!(
                    "duplicate transition name '{}'",
                    transition.name
                )));
            }
            for from in &transition.from_states {
                if from.is_terminal() {
                    return Err(EngineError::InvalidTable(format!(
                        "transition '{}' leaves terminal state {}",
                        transition.name, from
                    )));
                }
                if !edges.insert((*from, transition.to_state)) {
                    return Err(EngineError::InvalidTable(format!(
                        "duplicate edge {} to {}",
                        from, transition.to_state
                    )));
                }
            }
        }
        Ok(())
    }

    /// All transitions whose source set contains `state`.
    pub fn transitions_from(&self, state: OrderStatus) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.applies_from(state))
            .collect()
    }

    /// Find a transition by name.
    pub fn find(&self, name: &str) -> EngineResult<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::UnknownTransition(name.to_string()))
    }

    /// The unique transition connecting `from` to `to`, if defined.
    pub fn resolve(&self, from: OrderStatus, to: OrderStatus) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.to_state == to && t.applies_from(from))
    }

    /// Every definition in the table.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Number of definitions.
    pub fn count(&self) -> usize {
        self.transitions.len()
    }
}

/// The canonical order lifecycle:
/// pending to paid to shipped to fulfilled, cancel from pending/paid,
/// refund and return from fulfilled.
pub fn canonical_transitions() -> Vec<Transition> {
    vec![
        Transition::new("mark_paid", &[OrderStatus::Pending], OrderStatus::Paid)
            .with_guard("role_allowed")
            .with_guard("payment_authorized")
            .with_effect("capture_payment")
            .with_effect("reserve_inventory")
            .with_effect("send_email")
            .with_effect("emit_webhook")
            .with_description("Mark order as paid (captures authorized payment, reserves inventory)."),
        Transition::new("ship", &[OrderStatus::Paid], OrderStatus::Shipped)
            .with_guard("role_allowed")
            .with_guard("inventory_available")
            .with_effect("send_email")
            .with_effect("emit_webhook")
            .with_description("Mark order as shipped (notify customer)."),
        Transition::new("fulfill", &[OrderStatus::Shipped], OrderStatus::Fulfilled)
            .with_guard("role_allowed")
            .with_effect("send_email")
            .with_effect("emit_webhook")
            .with_description("Mark order as fulfilled (delivered/complete)."),
        Transition::new(
            "cancel",
            &[OrderStatus::Pending, OrderStatus::Paid],
            OrderStatus::Cancelled,
        )
        .with_guard("role_allowed")
        .with_effect("release_inventory")
        .with_effect("send_email")
        .with_effect("emit_webhook")
        .with_description("Cancel order (release inventory; refunds handled separately)."),
        Transition::new("refund", &[OrderStatus::Fulfilled], OrderStatus::Refunded)
            .with_guard("role_allowed")
            .with_effect("refund_payment")
            .with_effect("release_inventory")
            .with_effect("send_email")
            .with_effect("emit_webhook")
            .with_description("Refund order after fulfillment (may be partial based on params)."),
        Transition::new("return", &[OrderStatus::Fulfilled], OrderStatus::Returned)
            .with_guard("role_allowed")
            .with_effect("release_inventory")
            .with_effect("send_email")
            .with_effect("emit_webhook")
            .with_description("Mark order as returned (stock operations handled by effect)."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_is_valid() {
        let table = TransitionTable::new(canonical_transitions()).unwrap();
        assert_eq!(table.count(), 6);
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_transitions() {
        let table = TransitionTable::canonical();
        for state in OrderStatus::ALL {
            if state.is_terminal() {
                assert!(
                    table.transitions_from(state).is_empty(),
                    "{} must have no outgoing transitions",
                    state
                );
            }
        }
    }

    #[test]
    fn test_transitions_from_pending() {
        let table = TransitionTable::canonical();
        let names: Vec<&str> = table
            .transitions_from(OrderStatus::Pending)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["mark_paid", "cancel"]);
    }

    #[test]
    fn test_resolve() {
        let table = TransitionTable::canonical();

        let t = table
            .resolve(OrderStatus::Pending, OrderStatus::Paid)
            .unwrap();
        assert_eq!(t.name, "mark_paid");

        let t = table
            .resolve(OrderStatus::Paid, OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(t.name, "cancel");

        // Wrong direction and undefined edges both miss.
        assert!(table.resolve(OrderStatus::Paid, OrderStatus::Pending).is_none());
        assert!(table
            .resolve(OrderStatus::Fulfilled, OrderStatus::Cancelled)
            .is_none());
    }

    #[test]
    fn test_find_by_name() {
        let table = TransitionTable::canonical();
        assert_eq!(table.find("refund").unwrap().to_state, OrderStatus::Refunded);

        let result = table.find("warp");
        assert!(matches!(result, Err(EngineError::UnknownTransition(_))));
    }

    #[test]
    fn test_rejects_empty_sources() {
        let result = TransitionTable::new(vec![Transition::new(
            "broken",
            &[],
            OrderStatus::Paid,
        )]);
        assert!(matches!(result, Err(EngineError::InvalidTable(_))));
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let result = TransitionTable::new(vec![
            Transition::new("ship", &[OrderStatus::Paid], OrderStatus::Shipped),
            Transition::new("ship", &[OrderStatus::Shipped], OrderStatus::Fulfilled),
        ]);
        assert!(matches!(result, Err(EngineError::InvalidTable(_))));
    }

    #[test]
    fn test_rejects_terminal_source() {
        let result = TransitionTable::new(vec![Transition::new(
            "reopen",
            &[OrderStatus::Cancelled],
            OrderStatus::Pending,
        )]);
        assert!(matches!(result, Err(EngineError::InvalidTable(_))));
    }

    #[test]
    fn test_rejects_duplicate_edge() {
        let result = TransitionTable::new(vec![
            Transition::new("ship", &[OrderStatus::Paid], OrderStatus::Shipped),
            Transition::new("ship_express", &[OrderStatus::Paid], OrderStatus::Shipped),
        ]);
        assert!(matches!(result, Err(EngineError::InvalidTable(_))));
    }
}
