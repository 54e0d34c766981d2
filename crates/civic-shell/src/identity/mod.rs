//! # Identity
//!
//! The active citizen profile, the immutable roster of switchable profiles,
//! and the single-flight switch state machine.

mod profile;
mod store;

pub use profile::{CitizenProfile, ProfileId, Roster, RosterError};
pub use store::{IdentityStore, PendingSwitch, SwitchOutcome, SwitchPhase, SwitchTicket};
