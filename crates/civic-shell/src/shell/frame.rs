//! Per-frame props for the shell's presentational collaborators.
//!
//! A [`ShellFrame`] is plain data. Interactions go through
//! [`super::ShellCommands`].

use serde::{Deserialize, Serialize};

use super::state::{BootPhase, ShellState};
use crate::capture::CaptureState;
use crate::identity::{CitizenProfile, ProfileId};
use crate::notice::Notice;
use crate::router::{Rendered, Screen};
use crate::trigger::ServiceKind;

/// Headline of the switching overlay.
pub const SWITCHING_HEADLINE: &str = "Switching Identity...";

/// Identity as shown in chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBadge {
    pub id: ProfileId,
    pub name: String,
    pub role: String,
    pub avatar_url: String,
}

impl ProfileBadge {
    pub fn of(profile: &CitizenProfile, avatar_base_url: &str) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            role: profile.role.clone(),
            avatar_url: profile.avatar_url(avatar_base_url),
        }
    }
}

/// One navigation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub screen: Screen,
    pub title: String,
    pub active: bool,
}

impl NavItem {
    fn list(screens: &[Screen], active: Screen) -> Vec<NavItem> {
        screens
            .iter()
            .map(|screen| NavItem {
                screen: *screen,
                title: screen.title().to_string(),
                active: *screen == active,
            })
            .collect()
    }
}

/// Entry in the identity switch menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMenuEntry {
    pub profile: ProfileBadge,
    pub active: bool,
}

/// Top bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderProps {
    pub title: String,
    pub profile: ProfileBadge,
    /// Roster entries while the profile menu is open
    pub profile_menu: Option<Vec<ProfileMenuEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarProps {
    pub active_view: Screen,
    pub collapsed: bool,
    pub ambient_mode: bool,
    pub items: Vec<NavItem>,
    pub profile: ProfileBadge,
}

/// Blocking overlay shown while a switch is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchingOverlay {
    pub headline: String,
    /// Role of the profile still active during the switch
    pub role: String,
    pub target: ProfileId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOverlay {
    pub state: CaptureState,
    /// Shutter enabled
    pub can_capture: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDialogProps {
    pub open: bool,
    pub service_kind: Option<ServiceKind>,
    pub note: String,
    pub profile: ProfileBadge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantProps {
    pub open: bool,
}

/// Everything a frontend needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellFrame {
    pub boot: BootPhase,
    pub active_view: Screen,
    pub active_profile: CitizenProfile,
    /// Hidden in ambient mode
    pub header: Option<HeaderProps>,
    pub content: Rendered,
    pub sidebar: SidebarProps,
    /// Hidden in ambient mode
    pub bottom_nav: Option<Vec<NavItem>>,
    pub switching: Option<SwitchingOverlay>,
    pub camera: Option<CameraOverlay>,
    pub service_dialog: ServiceDialogProps,
    pub assistant: AssistantProps,
    pub notices: Vec<Notice>,
}

impl ShellFrame {
    /// Assemble a frame around already rendered content.
    pub(crate) fn build(state: &ShellState, avatar_base_url: &str, content: Rendered) -> Self {
        let active = state.identity.active();
        let view = state.router.active();
        let badge = ProfileBadge::of(active, avatar_base_url);
        let ambient = state.chrome.ambient_mode;

        let header = (!ambient).then(|| HeaderProps {
            title: view.title().to_string(),
            profile: badge.clone(),
            profile_menu: state.chrome.profile_menu_open.then(|| {
                state
                    .identity
                    .roster()
                    .iter()
                    .map(|p| ProfileMenuEntry {
                        profile: ProfileBadge::of(p, avatar_base_url),
                        active: p.id == active.id,
                    })
                    .collect()
            }),
        });

        let switching = state.identity.pending().map(|pending| SwitchingOverlay {
            headline: SWITCHING_HEADLINE.to_string(),
            role: active.role.clone(),
            target: pending.target.id.clone(),
        });

        let camera = match state.capture.state() {
            CaptureState::Closed => None,
            camera_state => Some(CameraOverlay {
                state: camera_state,
                can_capture: camera_state == CaptureState::Streaming,
            }),
        };

        let trigger = state.trigger.snapshot();

        Self {
            boot: state.boot,
            active_view: view,
            active_profile: active.clone(),
            header,
            content,
            sidebar: SidebarProps {
                active_view: view,
                collapsed: state.chrome.sidebar_collapsed,
                ambient_mode: ambient,
                items: NavItem::list(Screen::all(), view),
                profile: badge.clone(),
            },
            bottom_nav: (!ambient).then(|| NavItem::list(Screen::bottom_nav(), view)),
            switching,
            camera,
            service_dialog: ServiceDialogProps {
                open: trigger.open,
                service_kind: trigger.service_kind,
                note: trigger.note,
                profile: badge,
            },
            assistant: AssistantProps {
                open: state.chrome.assistant_open,
            },
            notices: state.notices.pending().cloned().collect(),
        }
    }
}
