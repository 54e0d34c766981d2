//! Shell state container and its published snapshot.

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureController, CaptureState};
use crate::effects::ScheduledTask;
use crate::identity::{CitizenProfile, IdentityStore, ProfileId, SwitchPhase};
use crate::notice::{Notice, NoticeQueue};
use crate::router::{Screen, ViewRouter};
use crate::trigger::{ServiceTrigger, ServiceTriggerBus};

/// Boot phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootPhase {
    /// Bootloader still showing
    #[default]
    Booting,
    Ready,
}

/// Presentational flags owned by the shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromeState {
    pub sidebar_collapsed: bool,
    /// Ambient ("TV") mode; hides header and bottom navigation
    pub ambient_mode: bool,
    pub assistant_open: bool,
    pub profile_menu_open: bool,
}

/// Everything the shell owns, behind the controller's single lock.
pub(crate) struct ShellState {
    pub(crate) boot: BootPhase,
    pub(crate) identity: IdentityStore,
    pub(crate) capture: CaptureController,
    pub(crate) trigger: ServiceTriggerBus,
    pub(crate) notices: NoticeQueue,
    pub(crate) router: ViewRouter,
    pub(crate) chrome: ChromeState,
    /// Completion handle of the switch in flight. Kept, never cancelled.
    pub(crate) switch_task: Option<ScheduledTask>,
}

impl ShellState {
    pub(crate) fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            boot: self.boot,
            active_view: self.router.active(),
            active_profile: self.identity.active().clone(),
            switch_phase: self.identity.phase(),
            switch_target: self.identity.pending().map(|p| p.target.id.clone()),
            camera: self.capture.state(),
            service: self.trigger.snapshot(),
            chrome: self.chrome,
            notices: self.notices.pending().cloned().collect(),
        }
    }
}

/// Observable shell state, published after every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellSnapshot {
    pub boot: BootPhase,
    pub active_view: Screen,
    pub active_profile: CitizenProfile,
    pub switch_phase: SwitchPhase,
    /// Profile being switched to, while `Switching`
    pub switch_target: Option<ProfileId>,
    pub camera: CaptureState,
    pub service: ServiceTrigger,
    pub chrome: ChromeState,
    pub notices: Vec<Notice>,
}
