//! Identity store and switch state machine.
//!
//! ```text
//!            switch_to(other)              complete_switch(ticket)
//!   Idle ─────────────────────▶ Switching ─────────────────────────▶ Idle
//!                                   │ switch_to(_) ⇒ dropped (InFlight)
//! ```
//!
//! The store is plain data. Scheduling the deferred completion is the
//! caller's job (see [`crate::shell::ShellController::switch_to`]); the store
//! only guards that a single switch is in flight and that a completion
//! applies to the switch it was issued for.

use serde::{Deserialize, Serialize};

use super::profile::{CitizenProfile, ProfileId, Roster};
use crate::errors::ShellError;
use crate::payload::ImagePayload;

/// Switch state machine phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchPhase {
    #[default]
    Idle,
    Switching,
}

/// Identifies one accepted switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchTicket(u64);

/// The switch currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSwitch {
    pub ticket: SwitchTicket,
    pub target: CitizenProfile,
}

/// Result of a switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Accepted; the caller must schedule `complete_switch(ticket)`.
    Started(SwitchTicket),
    /// Candidate is already the active profile.
    AlreadyActive,
    /// Another switch is in flight; request dropped.
    InFlight,
}

/// Active profile plus the switchable roster.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    roster: Roster,
    active: CitizenProfile,
    pending: Option<PendingSwitch>,
    next_ticket: u64,
}

impl IdentityStore {
    /// Create a store whose active profile is `default` from the roster.
    pub fn new(roster: Roster, default: &ProfileId) -> Result<Self, ShellError> {
        let active = roster
            .get(default)
            .cloned()
            .ok_or_else(|| ShellError::UnknownProfile(default.clone()))?;
        Ok(Self {
            roster,
            active,
            pending: None,
            next_ticket: 1,
        })
    }

    /// Create a store starting at the roster's first profile.
    pub fn with_first(roster: Roster) -> Self {
        let active = roster.first().clone();
        Self {
            roster,
            active,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn active(&self) -> &CitizenProfile {
        &self.active
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn phase(&self) -> SwitchPhase {
        if self.pending.is_some() {
            SwitchPhase::Switching
        } else {
            SwitchPhase::Idle
        }
    }

    pub fn is_switching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingSwitch> {
        self.pending.as_ref()
    }

    /// Guarded switch request.
    pub fn begin_switch(&mut self, candidate: CitizenProfile) -> SwitchOutcome {
        if candidate.id == self.active.id {
            return SwitchOutcome::AlreadyActive;
        }
        if self.pending.is_some() {
            return SwitchOutcome::InFlight;
        }
        let ticket = SwitchTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(PendingSwitch {
            ticket,
            target: candidate,
        });
        SwitchOutcome::Started(ticket)
    }

    /// Apply the deferred completion for `ticket`. Returns the new active
    /// profile id, or `None` when the ticket is not the one in flight.
    pub fn complete_switch(&mut self, ticket: SwitchTicket) -> Option<ProfileId> {
        match self.pending.take() {
            Some(pending) if pending.ticket == ticket => {
                self.active = pending.target;
                Some(self.active.id.clone())
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Replace only the active profile's photo.
    pub fn set_active_photo(&mut self, payload: ImagePayload) {
        self.active.photo = Some(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IdentityStore {
        let roster = Roster::new(vec![
            CitizenProfile::new("a", "Ayu", "Warga", "ayu"),
            CitizenProfile::new("b", "Bima", "Ketua RT", "bima"),
            CitizenProfile::new("c", "Citra", "Kader", "citra"),
        ])
        .unwrap();
        IdentityStore::with_first(roster)
    }

    fn candidate(store: &IdentityStore, id: &str) -> CitizenProfile {
        store.roster().get(&id.into()).unwrap().clone()
    }

    #[test]
    fn test_switch_to_active_is_noop() {
        let mut store = store();
        let a = candidate(&store, "a");
        assert_eq!(store.begin_switch(a), SwitchOutcome::AlreadyActive);
        assert_eq!(store.phase(), SwitchPhase::Idle);
        assert_eq!(store.active().id.as_str(), "a");
    }

    #[test]
    fn test_switch_completes_with_matching_ticket() {
        let mut store = store();
        let b = candidate(&store, "b");
        let SwitchOutcome::Started(ticket) = store.begin_switch(b) else {
            panic!("switch should start");
        };
        assert_eq!(store.phase(), SwitchPhase::Switching);
        assert_eq!(store.active().id.as_str(), "a");

        assert_eq!(store.complete_switch(ticket), Some("b".into()));
        assert_eq!(store.phase(), SwitchPhase::Idle);
        assert_eq!(store.active().name, "Bima");
    }

    #[test]
    fn test_second_switch_is_dropped_while_in_flight() {
        let mut store = store();
        let b = candidate(&store, "b");
        let c = candidate(&store, "c");
        let SwitchOutcome::Started(ticket) = store.begin_switch(b) else {
            panic!("switch should start");
        };
        assert_eq!(store.begin_switch(c), SwitchOutcome::InFlight);
        assert_eq!(store.pending().unwrap().target.id.as_str(), "b");

        store.complete_switch(ticket);
        assert_eq!(store.active().id.as_str(), "b");
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut store = store();
        let b = candidate(&store, "b");
        let SwitchOutcome::Started(first) = store.begin_switch(b) else {
            panic!("switch should start");
        };
        store.complete_switch(first);

        let c = candidate(&store, "c");
        let SwitchOutcome::Started(second) = store.begin_switch(c) else {
            panic!("switch should start");
        };
        assert_eq!(store.complete_switch(first), None);
        assert!(store.is_switching());
        assert_eq!(store.complete_switch(second), Some("c".into()));
    }

    #[test]
    fn test_photo_update_keeps_switch_state() {
        let mut store = store();
        let b = candidate(&store, "b");
        store.begin_switch(b);

        let photo = ImagePayload::encode("image/jpeg", b"frame");
        store.set_active_photo(photo.clone());
        assert_eq!(store.active().photo.as_ref(), Some(&photo));
        assert_eq!(store.phase(), SwitchPhase::Switching);
    }

    #[test]
    fn test_unknown_default_is_rejected() {
        let roster = store().roster().clone();
        let err = IdentityStore::new(roster, &"zz".into()).unwrap_err();
        assert_eq!(err, ShellError::UnknownProfile("zz".into()));
    }
}
