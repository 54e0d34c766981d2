//! # Service Trigger Bus
//!
//! One global slot through which any module asks the fulfillment dialog to
//! open. Not a queue: the last `open` wins, and `close` keeps the last
//! request so the dialog can still show what was asked for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fulfillment services the dialog can be opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    /// Parcel pickup or delivery
    Package,
    /// Passenger ride
    Ride,
    /// Cash pickup or transfer
    Cash,
    /// Waste collection
    Trash,
    /// Document courier
    #[serde(rename = "DOCS")]
    Documents,
}

impl ServiceKind {
    /// Stable tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Package => "PACKAGE",
            Self::Ride => "RIDE",
            Self::Cash => "CASH",
            Self::Trash => "TRASH",
            Self::Documents => "DOCS",
        }
    }

    /// Every kind, in dialog order
    pub fn all() -> &'static [ServiceKind] {
        &[
            ServiceKind::Package,
            ServiceKind::Ride,
            ServiceKind::Cash,
            ServiceKind::Trash,
            ServiceKind::Documents,
        ]
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Unrecognized service tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown service kind: {0}")]
pub struct UnknownServiceKind(pub String);

impl FromStr for ServiceKind {
    type Err = UnknownServiceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        ServiceKind::all()
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag || (tag == "DOCUMENTS" && *kind == Self::Documents))
            .ok_or_else(|| UnknownServiceKind(s.to_string()))
    }
}

/// Snapshot of the trigger slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTrigger {
    pub open: bool,
    /// Requested service; `None` opens the dialog on its chooser
    pub service_kind: Option<ServiceKind>,
    /// Free-text note prefilled into the dialog
    pub note: String,
}

/// Owner of the single trigger slot.
#[derive(Debug, Clone, Default)]
pub struct ServiceTriggerBus {
    current: ServiceTrigger,
}

impl ServiceTriggerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot and mark it open. Last caller wins.
    pub fn open(&mut self, service_kind: Option<ServiceKind>, note: impl Into<String>) {
        self.current = ServiceTrigger {
            open: true,
            service_kind,
            note: note.into(),
        };
        tracing::debug!(
            service = ?self.current.service_kind,
            note_len = self.current.note.len(),
            "service trigger opened"
        );
    }

    /// Mark the slot closed, keeping kind and note.
    pub fn close(&mut self) {
        self.current.open = false;
        tracing::debug!("service trigger closed");
    }

    pub fn is_open(&self) -> bool {
        self.current.open
    }

    pub fn snapshot(&self) -> ServiceTrigger {
        self.current.clone()
    }
}
