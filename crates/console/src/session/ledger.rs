//! Presence & assignment ledger
//!
//! In-memory record of every customer the session has seen, their
//! presence state, and which one is currently selected. Per customer the
//! state machine is `Unknown -> Waiting <-> Assigned`; customers released
//! by a drop either return to the waiting pool or are forgotten, depending
//! on the configured retention policy.

use std::collections::BTreeMap;

/// Presence state of one known customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Waiting for an agent to pick them up
    Waiting,
    /// Claimed by this agent session
    Assigned,
    /// Known (seen joining) but neither waiting nor assigned
    Idle,
}

/// The customer set and the active selection, exclusively owned by one
/// agent session
#[derive(Debug)]
pub struct PresenceLedger {
    customers: BTreeMap<String, Presence>,
    selected: Option<String>,
    forget_on_drop: bool,
}

impl PresenceLedger {
    pub fn new(forget_on_drop: bool) -> Self {
        Self {
            customers: BTreeMap::new(),
            selected: None,
            forget_on_drop,
        }
    }

    /// A customer announced themselves (JOIN). Idempotent: re-observing a
    /// known customer changes nothing. Returns true when newly added.
    pub fn observe(&mut self, customer_id: &str) -> bool {
        if self.customers.contains_key(customer_id) {
            return false;
        }
        self.customers.insert(customer_id.to_string(), Presence::Idle);
        tracing::debug!(customer_id = %customer_id, "Customer joined the ledger");
        true
    }

    /// A "customer waiting" notification arrived. Returns true when the
    /// customer newly entered the waiting pool. A customer this agent has
    /// already assigned stays assigned; duplicate deliveries are no-ops.
    pub fn mark_waiting(&mut self, customer_id: &str) -> bool {
        match self.customers.get(customer_id) {
            Some(Presence::Assigned) | Some(Presence::Waiting) => false,
            Some(Presence::Idle) | None => {
                self.customers
                    .insert(customer_id.to_string(), Presence::Waiting);
                true
            }
        }
    }

    /// Claim a customer for this agent. Unknown customers are admitted
    /// first; a waiting notification may still be in flight when the agent
    /// clicks.
    pub fn assign(&mut self, customer_id: &str) {
        self.customers
            .insert(customer_id.to_string(), Presence::Assigned);
    }

    /// Release a claim. The customer returns to the waiting pool, or is
    /// forgotten entirely under the forget-on-drop retention policy.
    pub fn release(&mut self, customer_id: &str) {
        if self.selected.as_deref() == Some(customer_id) {
            self.selected = None;
        }
        if self.forget_on_drop {
            self.customers.remove(customer_id);
            return;
        }
        if let Some(state) = self.customers.get_mut(customer_id) {
            if *state == Presence::Assigned {
                *state = Presence::Waiting;
            }
        }
    }

    /// Make `customer_id` the active selection, returning the previously
    /// selected customer (whose claim must be dropped first). Selecting the
    /// already-selected customer returns `None` and changes nothing.
    pub fn select(&mut self, customer_id: &str) -> Option<String> {
        if self.selected.as_deref() == Some(customer_id) {
            return None;
        }
        self.selected.replace(customer_id.to_string())
    }

    pub fn clear_selection(&mut self) -> Option<String> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn presence(&self, customer_id: &str) -> Option<Presence> {
        self.customers.get(customer_id).copied()
    }

    /// Customers currently in the waiting pool, in stable order
    pub fn waiting(&self) -> Vec<&str> {
        self.customers
            .iter()
            .filter(|(_, p)| **p == Presence::Waiting)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// All known customers with their presence, in stable order
    pub fn roster(&self) -> impl Iterator<Item = (&str, Presence)> {
        self.customers.iter().map(|(id, p)| (id.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_is_idempotent() {
        let mut ledger = PresenceLedger::new(false);
        assert!(ledger.observe("c1"));
        assert!(!ledger.observe("c1"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.presence("c1"), Some(Presence::Idle));
    }

    #[test]
    fn test_waiting_to_assigned_and_back() {
        let mut ledger = PresenceLedger::new(false);
        assert!(ledger.mark_waiting("c1"));
        assert_eq!(ledger.presence("c1"), Some(Presence::Waiting));

        ledger.assign("c1");
        assert_eq!(ledger.presence("c1"), Some(Presence::Assigned));

        // Duplicate waiting notification does not demote an assignment
        assert!(!ledger.mark_waiting("c1"));
        assert_eq!(ledger.presence("c1"), Some(Presence::Assigned));

        ledger.release("c1");
        assert_eq!(ledger.presence("c1"), Some(Presence::Waiting));
    }

    #[test]
    fn test_duplicate_waiting_is_noop() {
        let mut ledger = PresenceLedger::new(false);
        assert!(ledger.mark_waiting("c1"));
        assert!(!ledger.mark_waiting("c1"));
        assert_eq!(ledger.waiting(), vec!["c1"]);
    }

    #[test]
    fn test_release_never_removes_without_retention_policy() {
        let mut ledger = PresenceLedger::new(false);
        ledger.assign("c1");
        ledger.release("c1");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_forget_on_drop_purges_customer() {
        let mut ledger = PresenceLedger::new(true);
        ledger.assign("c1");
        ledger.release("c1");
        assert!(ledger.is_empty());
        assert_eq!(ledger.presence("c1"), None);
    }

    #[test]
    fn test_selection_returns_previous() {
        let mut ledger = PresenceLedger::new(false);
        ledger.mark_waiting("c1");
        ledger.mark_waiting("c2");

        assert_eq!(ledger.select("c1"), None);
        assert_eq!(ledger.selected(), Some("c1"));

        // Switching selection surfaces the customer whose claim must drop
        assert_eq!(ledger.select("c2"), Some("c1".to_string()));
        assert_eq!(ledger.selected(), Some("c2"));

        // Re-selecting the active customer is a no-op
        assert_eq!(ledger.select("c2"), None);
    }

    #[test]
    fn test_release_clears_matching_selection() {
        let mut ledger = PresenceLedger::new(false);
        ledger.assign("c1");
        ledger.select("c1");
        ledger.release("c1");
        assert_eq!(ledger.selected(), None);
    }

    #[test]
    fn test_assign_admits_unknown_customer() {
        // A waiting event may still be in flight when the agent clicks
        let mut ledger = PresenceLedger::new(false);
        ledger.assign("c9");
        assert_eq!(ledger.presence("c9"), Some(Presence::Assigned));
    }
}
