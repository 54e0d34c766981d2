//! # View Router
//!
//! Holds the single active module and dispatches rendering to the view
//! registered for it. Navigation is always legal: no history, no guards.
//! A screen with no registered view renders a fixed placeholder.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::views::{ViewContent, ViewNeeds, ViewRegistry, ViewWiring};

/// Placeholder text for modules without a registered view.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Modul sedang dalam pengembangan.";

/// Module identifiers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    /// Personalized overview
    Dashboard,
    /// Village governance and announcements
    Governance,
    /// Office workspace and correspondence
    EOffice,
    /// Payments and local economy
    Economy,
    /// Citizen empowerment programs
    Empowerment,
    /// Community market
    Market,
    /// Parking management
    #[default]
    Parking,
    /// Health services
    Health,
    /// Environment and waste
    Environment,
    /// Social programs
    Social,
    /// Smart gateway (supports ambient mode)
    Gateway,
    /// Neighborhood security post
    SecurityPost,
    /// Education services
    Education,
    /// Preferences
    Settings,
}

impl Screen {
    /// Stable identifier used in configuration
    pub fn tag(&self) -> &'static str {
        match self {
            Screen::Dashboard => "dashboard",
            Screen::Governance => "governance",
            Screen::EOffice => "e-office",
            Screen::Economy => "economy",
            Screen::Empowerment => "empowerment",
            Screen::Market => "market",
            Screen::Parking => "parking",
            Screen::Health => "health",
            Screen::Environment => "environment",
            Screen::Social => "social",
            Screen::Gateway => "gateway",
            Screen::SecurityPost => "security-post",
            Screen::Education => "education",
            Screen::Settings => "settings",
        }
    }

    /// Header title
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Cognitive Dashboard",
            Screen::Governance => "Tata Kelola",
            Screen::EOffice => "Workspace",
            Screen::Economy => "Ekonomi",
            Screen::Empowerment => "Warga Berdaya",
            Screen::Market => "Pasar Payungi",
            Screen::Parking => "Parkir",
            Screen::Health => "Kesehatan",
            Screen::Environment => "Lingkungan",
            Screen::Social => "Sosial",
            Screen::Gateway => "Smart Gateway",
            Screen::SecurityPost => "Keamanan",
            Screen::Education => "Pendidikan",
            Screen::Settings => "Pengaturan",
        }
    }

    /// Get all screens in order
    pub fn all() -> &'static [Screen] {
        &[
            Screen::Dashboard,
            Screen::Governance,
            Screen::EOffice,
            Screen::Economy,
            Screen::Empowerment,
            Screen::Market,
            Screen::Parking,
            Screen::Health,
            Screen::Environment,
            Screen::Social,
            Screen::Gateway,
            Screen::SecurityPost,
            Screen::Education,
            Screen::Settings,
        ]
    }

    /// Entries of the compact bottom navigation, left to right.
    pub fn bottom_nav() -> &'static [Screen] {
        &[
            Screen::Dashboard,
            Screen::Empowerment,
            Screen::Economy,
            Screen::Social,
            Screen::Environment,
        ]
    }

    /// Handles this module receives unless registered otherwise.
    pub fn default_needs(&self) -> ViewNeeds {
        match self {
            Screen::Dashboard => ViewNeeds::PROFILE.with_navigate(),
            Screen::EOffice => ViewNeeds::NONE.with_service(),
            Screen::Economy | Screen::Empowerment | Screen::Environment => {
                ViewNeeds::PROFILE.with_service()
            }
            Screen::Market
            | Screen::Parking
            | Screen::Health
            | Screen::SecurityPost
            | Screen::Education => ViewNeeds::PROFILE,
            Screen::Gateway => ViewNeeds::PROFILE.with_ambient(),
            Screen::Governance | Screen::Social | Screen::Settings => ViewNeeds::NONE,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Unrecognized screen tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown screen: {0}")]
pub struct UnknownScreen(pub String);

impl FromStr for Screen {
    type Err = UnknownScreen;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Screen::all()
            .iter()
            .copied()
            .find(|screen| screen.tag() == tag)
            .ok_or_else(|| UnknownScreen(s.to_string()))
    }
}

/// Stand-in content for a screen with no registered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub screen: Screen,
    pub message: String,
}

/// Result of rendering the active screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rendered {
    View(ViewContent),
    Fallback(Placeholder),
}

impl Rendered {
    pub fn screen(&self) -> Screen {
        match self {
            Rendered::View(content) => content.screen,
            Rendered::Fallback(placeholder) => placeholder.screen,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback(_))
    }
}

/// Active screen plus the registry it dispatches into.
#[derive(Clone, Debug)]
pub struct ViewRouter {
    active: Screen,
    registry: Arc<ViewRegistry>,
    fallback_message: String,
}

impl ViewRouter {
    /// Create a router starting at the given screen
    pub fn new(start: Screen, registry: ViewRegistry) -> Self {
        Self {
            active: start,
            registry: Arc::new(registry),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Replace the placeholder text. Blank text keeps the default.
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.fallback_message = message;
        }
        self
    }

    /// Get the current screen
    pub fn active(&self) -> Screen {
        self.active
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Replace the active screen. Returns the previous one.
    pub fn set_view(&mut self, screen: Screen) -> Screen {
        let previous = std::mem::replace(&mut self.active, screen);
        if previous != screen {
            tracing::debug!(from = %previous, to = %screen, "view changed");
        }
        previous
    }

    /// Render the active screen.
    pub fn render_active(&self, wiring: &ViewWiring) -> Rendered {
        self.render(self.active, wiring)
    }

    /// Render a given screen, falling back to the placeholder.
    pub fn render(&self, screen: Screen, wiring: &ViewWiring) -> Rendered {
        match self.registry.get(screen) {
            Some(registered) => {
                let ctx = wiring.context_for(screen, registered.needs);
                Rendered::View(registered.view.render(&ctx))
            }
            None => {
                tracing::debug!(screen = %screen, "no view registered, rendering placeholder");
                Rendered::Fallback(Placeholder {
                    screen,
                    message: self.fallback_message.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CitizenProfile;
    use crate::views::ViewContext;
    use proptest::prelude::*;
    use serde_json::json;

    fn wiring() -> ViewWiring {
        ViewWiring {
            profile: CitizenProfile::new("a", "Ayu", "Warga", "ayu"),
            navigate: Arc::new(|_| {}),
            open_service: Arc::new(|_, _| {}),
            ambient_enabled: false,
            set_ambient: Arc::new(|_| {}),
        }
    }

    fn echo_registry() -> ViewRegistry {
        let mut registry = ViewRegistry::new();
        for screen in Screen::all() {
            registry.register_with(*screen, ViewNeeds::PROFILE, |ctx: &ViewContext<'_>| {
                ViewContent::new(
                    ctx.screen,
                    json!({ "profile": ctx.profile.map(|p| p.id.as_str()) }),
                )
            });
        }
        registry
    }

    #[test]
    fn test_screen_tags_round_trip() {
        for screen in Screen::all() {
            assert_eq!(screen.tag().parse::<Screen>(), Ok(*screen));
            assert_eq!(
                serde_json::to_string(screen).unwrap(),
                format!("\"{}\"", screen.tag())
            );
        }
        assert!("lobby".parse::<Screen>().is_err());
    }

    #[test]
    fn test_unregistered_screen_renders_placeholder() {
        let router = ViewRouter::new(Screen::Health, ViewRegistry::new());
        let rendered = router.render_active(&wiring());
        assert_eq!(
            rendered,
            Rendered::Fallback(Placeholder {
                screen: Screen::Health,
                message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            })
        );
    }

    #[test]
    fn test_blank_fallback_message_keeps_default() {
        let router =
            ViewRouter::new(Screen::Health, ViewRegistry::new()).with_fallback_message("   ");
        let Rendered::Fallback(placeholder) = router.render_active(&wiring()) else {
            panic!("expected placeholder");
        };
        assert_eq!(placeholder.message, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_set_view_returns_previous() {
        let mut router = ViewRouter::new(Screen::Parking, ViewRegistry::new());
        assert_eq!(router.set_view(Screen::Market), Screen::Parking);
        assert_eq!(router.set_view(Screen::Market), Screen::Market);
        assert_eq!(router.active(), Screen::Market);
    }

    proptest! {
        #[test]
        fn prop_last_set_view_is_rendered(
            path in prop::collection::vec(prop::sample::select(Screen::all().to_vec()), 1..20)
        ) {
            let mut router = ViewRouter::new(Screen::default(), echo_registry());
            for screen in &path {
                router.set_view(*screen);
            }
            let last = *path.last().unwrap();
            let rendered = router.render_active(&wiring());
            prop_assert_eq!(rendered.screen(), last);
            prop_assert_eq!(
                rendered,
                Rendered::View(ViewContent::new(last, json!({ "profile": "a" })))
            );
        }
    }
}
