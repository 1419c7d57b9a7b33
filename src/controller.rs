// Controller: the load / upload / delete / download flows, written against
// the `LibraryApi` seam and a `Notifier` standing in for alert/confirm
// dialogs. Mutations report an outcome and never reload by themselves;
// `LibraryController::refresh` is the caller's explicit follow-up.

use crate::api::{download_target, LibraryApi};
use crate::model::{Mode, UploadForm};
use crate::view::{build_view, LibraryView};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const MSG_NO_FILE: &str = "Please select a file.";
pub const MSG_UPLOADED: &str = "Uploaded!";
pub const MSG_UPLOAD_FAILED: &str = "Failed to upload";
pub const MSG_DELETE_FAILED: &str = "Delete failed";
pub const PROMPT_DELETE: &str = "Delete this file?";

/// Blocking user dialogs.
pub trait Notifier {
    /// Show a message to the user. Returns once it has been shown.
    fn notify(&self, message: &str);

    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Result of a mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change; the listing of `refresh` is stale.
    Completed { refresh: Mode },
    /// Nothing was sent (no file selected, or the user declined).
    Aborted,
    /// The request was sent and failed; the user has been notified.
    Failed,
}

/// One lock per listing mode. Holding a mode's gate means owning the only
/// in-flight request for that container.
#[derive(Default)]
struct ModeGates {
    public: Mutex<()>,
    private: Mutex<()>,
}

impl ModeGates {
    fn enter(&self, mode: Mode) -> MutexGuard<'_, ()> {
        let gate = match mode {
            Mode::Public => &self.public,
            Mode::Private => &self.private,
        };
        // The guarded value is `()`, a panicked holder leaves nothing
        // inconsistent behind.
        gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct LibraryController<A, N> {
    api: A,
    notifier: N,
    gates: ModeGates,
}

impl<A: LibraryApi, N: Notifier> LibraryController<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        LibraryController {
            api,
            notifier,
            gates: ModeGates::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetch the listing for `mode` and build the view that replaces the
    /// mode's container. Listing failures are returned to the caller.
    pub fn load(&self, mode: Mode) -> Result<LibraryView> {
        let records = {
            let _gate = self.gates.enter(mode);
            self.api.list(mode)?
        };
        tracing::info!(%mode, count = records.len(), "library loaded");
        Ok(build_view(mode, &records))
    }

    pub fn upload(&self, form: UploadForm) -> MutationOutcome {
        let Some(upload) = form.into_upload() else {
            self.notifier.notify(MSG_NO_FILE);
            return MutationOutcome::Aborted;
        };

        let sent = {
            let _gate = self.gates.enter(Mode::Private);
            self.api.upload(&upload)
        };
        match sent {
            Ok(()) => {
                tracing::info!(file = %upload.file.display(), public = upload.public, "uploaded");
                self.notifier.notify(MSG_UPLOADED);
                MutationOutcome::Completed {
                    refresh: Mode::Private,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed");
                self.notifier.notify(MSG_UPLOAD_FAILED);
                MutationOutcome::Failed
            }
        }
    }

    /// Ask for confirmation, then delete `path` on the server. A failing
    /// confirmation dialog is returned as an error.
    pub fn delete(&self, path: &str) -> Result<MutationOutcome> {
        if !self.notifier.confirm(PROMPT_DELETE)? {
            return Ok(MutationOutcome::Aborted);
        }

        let sent = {
            let _gate = self.gates.enter(Mode::Private);
            self.api.delete(path)
        };
        match sent {
            Ok(()) => {
                tracing::info!(path, "deleted");
                Ok(MutationOutcome::Completed {
                    refresh: Mode::Private,
                })
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "delete failed");
                self.notifier.notify(MSG_DELETE_FAILED);
                Ok(MutationOutcome::Failed)
            }
        }
    }

    /// Reload the listing a completed mutation made stale. Returns `None`
    /// without any request for aborted or failed outcomes.
    pub fn refresh(&self, outcome: MutationOutcome) -> Result<Option<LibraryView>> {
        match outcome {
            MutationOutcome::Completed { refresh } => self.load(refresh).map(Some),
            MutationOutcome::Aborted | MutationOutcome::Failed => Ok(None),
        }
    }

    /// Save the media file behind `path` into `dir`.
    pub fn download(&self, path: &str, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let dest = download_target(dir, path);
        let bytes = self.api.download(path, &dest)?;
        tracing::info!(path, dest = %dest.display(), bytes, "downloaded");
        Ok(dest)
    }
}
