//! Callback factory for frontend collaborators.
//!
//! Views, the header, the sidebar and the dialogs never hold the controller.
//! They get these callbacks, which hold a weak reference and do nothing once
//! the shell is gone. Commands that await a capability run as background
//! work on the scheduler capability.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use super::{ShellController, ShellInner};
use crate::effects::{FileHandle, UploadedFile};
use crate::identity::ProfileId;
use crate::router::Screen;
use crate::trigger::ServiceKind;
use crate::views::{FlagCallback, NavigateCallback, NoArgCallback, ServiceCallback};

/// Callback requesting an identity switch
pub type SwitchCallback = Arc<dyn Fn(ProfileId) + Send + Sync>;

/// Callback handing over file content that is already read
pub type FileCallback = Arc<dyn Fn(Option<UploadedFile>) + Send + Sync>;

/// Callback handing over a file selection still to be read
pub type SelectionCallback = Arc<dyn Fn(Option<FileHandle>) + Send + Sync>;

/// All shell commands exposed as callbacks.
#[derive(Clone)]
pub struct ShellCommands {
    /// Show another module
    pub navigate: NavigateCallback,
    /// Open the fulfillment dialog
    pub open_service: ServiceCallback,
    /// Close the fulfillment dialog
    pub close_service: NoArgCallback,
    /// Enter or leave ambient mode
    pub set_ambient: FlagCallback,
    pub toggle_sidebar: NoArgCallback,
    pub toggle_assistant: NoArgCallback,
    pub close_assistant: NoArgCallback,
    pub toggle_profile_menu: NoArgCallback,
    /// Switch to a roster member. Unknown ids are logged and ignored.
    pub switch_to: SwitchCallback,
    /// Request the camera in the background
    pub open_camera: NoArgCallback,
    pub close_camera: NoArgCallback,
    /// Shutter. Failures surface as notices.
    pub capture_photo: NoArgCallback,
    pub ingest_file: FileCallback,
    /// Read a selection in the background, then use it as the photo
    pub upload: SelectionCallback,
    /// Bootloader finished
    pub complete_boot: NoArgCallback,
}

impl fmt::Debug for ShellCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCommands").finish_non_exhaustive()
    }
}

fn with_shell(weak: &Weak<ShellInner>, f: impl FnOnce(ShellController)) {
    match weak.upgrade() {
        Some(inner) => f(ShellController { inner }),
        None => tracing::debug!("shell command after teardown ignored"),
    }
}

/// Hand async work to the scheduler. The shell stays alive until it ends.
fn in_background<F, Fut>(weak: &Weak<ShellInner>, work: F)
where
    F: FnOnce(ShellController) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    with_shell(weak, |shell| {
        let scheduler = Arc::clone(&shell.inner.effects.scheduler);
        scheduler.spawn(Box::pin(work(shell)));
    });
}

impl ShellCommands {
    pub(crate) fn new(inner: Weak<ShellInner>) -> Self {
        let navigate: NavigateCallback = {
            let weak = inner.clone();
            Arc::new(move |screen: Screen| with_shell(&weak, |shell| {
                shell.set_view(screen);
            }))
        };
        let open_service: ServiceCallback = {
            let weak = inner.clone();
            Arc::new(move |kind: Option<ServiceKind>, note: String| {
                with_shell(&weak, |shell| shell.open_service(kind, note))
            })
        };
        let close_service: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| shell.close_service()))
        };
        let set_ambient: FlagCallback = {
            let weak = inner.clone();
            Arc::new(move |on: bool| with_shell(&weak, |shell| shell.set_ambient_mode(on)))
        };
        let toggle_sidebar: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| {
                shell.toggle_sidebar();
            }))
        };
        let toggle_assistant: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| {
                shell.toggle_assistant();
            }))
        };
        let close_assistant: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| shell.close_assistant()))
        };
        let toggle_profile_menu: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| {
                shell.toggle_profile_menu();
            }))
        };
        let switch_to: SwitchCallback = {
            let weak = inner.clone();
            Arc::new(move |id: ProfileId| with_shell(&weak, |shell| {
                if let Err(err) = shell.switch_to_id(&id) {
                    tracing::warn!(profile = %id, code = err.code(), "switch request ignored");
                }
            }))
        };
        let open_camera: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || {
                in_background(&weak, |shell: ShellController| async move {
                    if let Err(err) = shell.open_camera().await {
                        tracing::debug!(code = err.code(), "camera request ignored");
                    }
                })
            })
        };
        let close_camera: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| {
                shell.close_camera();
            }))
        };
        let capture_photo: NoArgCallback = {
            let weak = inner.clone();
            Arc::new(move || with_shell(&weak, |shell| {
                let _ = shell.capture_photo();
            }))
        };
        let ingest_file: FileCallback = {
            let weak = inner.clone();
            Arc::new(move |file: Option<UploadedFile>| with_shell(&weak, |shell| {
                shell.ingest_file(file.as_ref());
            }))
        };
        let upload: SelectionCallback = {
            let weak = inner.clone();
            Arc::new(move |handle: Option<FileHandle>| {
                in_background(&weak, move |shell: ShellController| async move {
                    // Read failures are already queued as notices.
                    let _ = shell.upload_from(handle.as_ref()).await;
                })
            })
        };
        let complete_boot: NoArgCallback =
            Arc::new(move || with_shell(&inner, |shell| shell.complete_boot()));

        Self {
            navigate,
            open_service,
            close_service,
            set_ambient,
            toggle_sidebar,
            toggle_assistant,
            close_assistant,
            toggle_profile_menu,
            switch_to,
            open_camera,
            close_camera,
            capture_photo,
            ingest_file,
            upload,
            complete_boot,
        }
    }
}
