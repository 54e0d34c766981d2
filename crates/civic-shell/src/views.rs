//! # View Contracts
//!
//! What an external module view receives and what it gives back.
//!
//! Views never reach into the shell. Each one is handed a [`ViewContext`]
//! holding only what its [`ViewNeeds`] ask for: a read-only profile, a
//! navigate callback, a service-trigger callback, or the ambient mode
//! control. Callbacks are plain `Arc<dyn Fn>` values so a frontend can clone
//! them into its own event handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::CitizenProfile;
use crate::router::Screen;
use crate::trigger::ServiceKind;

/// Callback with no arguments
pub type NoArgCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback taking a flag
pub type FlagCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Callback requesting a view change
pub type NavigateCallback = Arc<dyn Fn(Screen) + Send + Sync>;

/// Callback opening the fulfillment dialog
pub type ServiceCallback = Arc<dyn Fn(Option<ServiceKind>, String) + Send + Sync>;

/// Which shell handles a view is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewNeeds {
    pub profile: bool,
    pub navigate: bool,
    pub service: bool,
    pub ambient: bool,
}

impl ViewNeeds {
    /// Nothing but the screen identifier
    pub const NONE: ViewNeeds = ViewNeeds {
        profile: false,
        navigate: false,
        service: false,
        ambient: false,
    };

    /// Only the read-only profile
    pub const PROFILE: ViewNeeds = ViewNeeds {
        profile: true,
        navigate: false,
        service: false,
        ambient: false,
    };

    pub fn with_profile(mut self) -> Self {
        self.profile = true;
        self
    }

    pub fn with_navigate(mut self) -> Self {
        self.navigate = true;
        self
    }

    pub fn with_service(mut self) -> Self {
        self.service = true;
        self
    }

    pub fn with_ambient(mut self) -> Self {
        self.ambient = true;
        self
    }
}

/// Ambient ("TV") mode state and setter, for views that own the toggle.
#[derive(Clone)]
pub struct AmbientControl {
    pub enabled: bool,
    pub set: FlagCallback,
}

impl fmt::Debug for AmbientControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientControl")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Everything the shell can hand to a view; filtered per view by [`ViewNeeds`].
#[derive(Clone)]
pub struct ViewWiring {
    pub profile: CitizenProfile,
    pub navigate: NavigateCallback,
    pub open_service: ServiceCallback,
    pub ambient_enabled: bool,
    pub set_ambient: FlagCallback,
}

impl ViewWiring {
    /// Build the context one view is allowed to see.
    pub fn context_for(&self, screen: Screen, needs: ViewNeeds) -> ViewContext<'_> {
        ViewContext {
            screen,
            profile: needs.profile.then_some(&self.profile),
            navigate: needs.navigate.then(|| Arc::clone(&self.navigate)),
            open_service: needs.service.then(|| Arc::clone(&self.open_service)),
            ambient: needs.ambient.then(|| AmbientControl {
                enabled: self.ambient_enabled,
                set: Arc::clone(&self.set_ambient),
            }),
        }
    }
}

/// Input to a single view render.
#[derive(Clone)]
pub struct ViewContext<'a> {
    pub screen: Screen,
    pub profile: Option<&'a CitizenProfile>,
    pub navigate: Option<NavigateCallback>,
    pub open_service: Option<ServiceCallback>,
    pub ambient: Option<AmbientControl>,
}

impl ViewContext<'_> {
    /// Ask the shell to show another module. No-op if not wired.
    pub fn navigate(&self, screen: Screen) {
        if let Some(navigate) = &self.navigate {
            navigate(screen);
        }
    }

    /// Ask the shell to open the fulfillment dialog. No-op if not wired.
    pub fn open_service(&self, kind: Option<ServiceKind>, note: impl Into<String>) {
        if let Some(open) = &self.open_service {
            open(kind, note.into());
        }
    }
}

/// View model produced by a module view, passed through to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewContent {
    pub screen: Screen,
    pub model: serde_json::Value,
}

impl ViewContent {
    pub fn new(screen: Screen, model: serde_json::Value) -> Self {
        Self { screen, model }
    }
}

/// An external module screen.
pub trait ModuleView: Send + Sync {
    fn render(&self, ctx: &ViewContext<'_>) -> ViewContent;
}

impl<F> ModuleView for F
where
    F: Fn(&ViewContext<'_>) -> ViewContent + Send + Sync,
{
    fn render(&self, ctx: &ViewContext<'_>) -> ViewContent {
        self(ctx)
    }
}

/// A registered view and the handles it receives.
#[derive(Clone)]
pub struct RegisteredView {
    pub needs: ViewNeeds,
    pub view: Arc<dyn ModuleView>,
}

/// Map from screen to the view that renders it.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: HashMap<Screen, RegisteredView>,
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut screens: Vec<_> = self.views.keys().map(Screen::tag).collect();
        screens.sort_unstable();
        f.debug_struct("ViewRegistry")
            .field("screens", &screens)
            .finish()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view with the screen's default needs.
    pub fn register(&mut self, screen: Screen, view: impl ModuleView + 'static) -> &mut Self {
        self.register_with(screen, screen.default_needs(), view)
    }

    /// Register a view with explicit needs, replacing any earlier registration.
    pub fn register_with(
        &mut self,
        screen: Screen,
        needs: ViewNeeds,
        view: impl ModuleView + 'static,
    ) -> &mut Self {
        self.views.insert(
            screen,
            RegisteredView {
                needs,
                view: Arc::new(view),
            },
        );
        self
    }

    pub fn get(&self, screen: Screen) -> Option<&RegisteredView> {
        self.views.get(&screen)
    }

    pub fn contains(&self, screen: Screen) -> bool {
        self.views.contains_key(&screen)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
