//! Switch and Routing Property Tests
//!
//! Random command sequences run against the shell and against a small
//! reference model. After every step the shell's observable state must
//! match the model.
//!
//! ## Properties
//!
//! 1. **Single flight**: at most one switch is in flight; requests made while
//!    switching never change the outcome
//! 2. **Latency**: a started switch completes exactly when the latency
//!    window has elapsed
//! 3. **Routing**: the active view is always the last one set
//! 4. **Trigger**: the trigger slot reflects only the last open/close

use std::sync::Arc;
use std::time::Duration;

use civic_shell::identity::{CitizenProfile, ProfileId, SwitchPhase};
use civic_shell::router::Screen;
use civic_shell::shell::{ShellController, ShellEffects};
use civic_shell::testing::{ManualScheduler, MemoryFileReader, ScriptedCamera};
use civic_shell::trigger::{ServiceKind, ServiceTrigger};
use civic_shell::views::ViewRegistry;
use civic_shell::ShellConfig;
use proptest::prelude::*;

const LATENCY_MS: u64 = 1500;
const IDS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Command {
    Switch(usize),
    Advance(u64),
    SetView(Screen),
    OpenService(Option<ServiceKind>, String),
    CloseService,
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0..IDS.len()).prop_map(Command::Switch),
        prop_oneof![Just(LATENCY_MS), 0u64..2000].prop_map(Command::Advance),
        prop::sample::select(Screen::all().to_vec()).prop_map(Command::SetView),
        (
            prop::option::of(prop::sample::select(ServiceKind::all().to_vec())),
            "[a-z ]{0,12}"
        )
            .prop_map(|(kind, note)| Command::OpenService(kind, note)),
        Just(Command::CloseService),
    ]
}

#[derive(Debug)]
struct Model {
    now: u64,
    active: usize,
    pending: Option<(usize, u64)>,
    view: Screen,
    trigger: ServiceTrigger,
}

impl Model {
    fn apply(&mut self, command: &Command) {
        match command {
            Command::Switch(target) => {
                if *target != self.active && self.pending.is_none() {
                    self.pending = Some((*target, self.now + LATENCY_MS));
                }
            }
            Command::Advance(ms) => {
                self.now += ms;
                if let Some((target, due)) = self.pending {
                    if due <= self.now {
                        self.active = target;
                        self.pending = None;
                    }
                }
            }
            Command::SetView(screen) => self.view = *screen,
            Command::OpenService(kind, note) => {
                self.trigger = ServiceTrigger {
                    open: true,
                    service_kind: *kind,
                    note: note.clone(),
                };
            }
            Command::CloseService => self.trigger.open = false,
        }
    }
}

fn shell() -> (ShellController, ManualScheduler) {
    let config = ShellConfig {
        roster: IDS
            .iter()
            .map(|id| CitizenProfile::new(*id, id.to_uppercase(), "Warga", *id))
            .collect(),
        switch_latency_ms: LATENCY_MS,
        ..ShellConfig::default()
    };
    let scheduler = ManualScheduler::new();
    let effects = ShellEffects::new(
        Arc::new(ScriptedCamera::new()),
        Arc::new(MemoryFileReader::new()),
        Arc::new(scheduler.clone()),
    );
    let shell = ShellController::new(config, ViewRegistry::new(), effects).unwrap();
    (shell, scheduler)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_shell_matches_model(commands in prop::collection::vec(command_strategy(), 1..40)) {
        let (shell, scheduler) = shell();
        let mut model = Model {
            now: 0,
            active: 0,
            pending: None,
            view: Screen::default(),
            trigger: ServiceTrigger::default(),
        };

        for command in &commands {
            match command {
                Command::Switch(target) => {
                    shell.switch_to_id(&ProfileId::new(IDS[*target])).unwrap();
                }
                Command::Advance(ms) => {
                    scheduler.advance(Duration::from_millis(*ms));
                }
                Command::SetView(screen) => {
                    shell.set_view(*screen);
                }
                Command::OpenService(kind, note) => shell.open_service(*kind, note.clone()),
                Command::CloseService => shell.close_service(),
            }
            model.apply(command);

            let snapshot = shell.snapshot();
            prop_assert_eq!(snapshot.active_profile.id.as_str(), IDS[model.active]);
            prop_assert_eq!(
                snapshot.switch_phase == SwitchPhase::Switching,
                model.pending.is_some()
            );
            prop_assert_eq!(
                snapshot.switch_target.as_ref().map(ProfileId::as_str),
                model.pending.map(|(target, _)| IDS[target])
            );
            prop_assert!(scheduler.pending_count() <= 1);
            prop_assert_eq!(snapshot.active_view, model.view);
            prop_assert_eq!(&snapshot.service, &model.trigger);
        }
    }

    #[test]
    fn prop_redundant_requests_never_reschedule(repeats in 1usize..10) {
        let (shell, scheduler) = shell();
        for _ in 0..repeats {
            shell.switch_to_id(&ProfileId::new("a")).unwrap();
            shell.switch_to_id(&ProfileId::new("b")).unwrap();
            shell.switch_to_id(&ProfileId::new("c")).unwrap();
        }
        prop_assert_eq!(scheduler.pending_count(), 1);
        scheduler.run_all();
        let active = shell.active_profile();
        prop_assert_eq!(active.id.as_str(), "b");
    }
}
