// Data model shared by the API client, the view-model and the controller.
// Records are owned by the server; nothing here is persisted locally.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which listing is active: the read-only public library or the user's
/// private library, where files can be deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Public,
    Private,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Public, Mode::Private];

    /// Value sent as the `mode` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Public => "public",
            Mode::Private => "private",
        }
    }

    /// Identifier of the display region a listing of this mode replaces.
    pub fn container_id(self) -> &'static str {
        match self {
            Mode::Public => "musicContainer",
            Mode::Private => "manageContainer",
        }
    }

    pub fn allows_delete(self) -> bool {
        matches!(self, Mode::Private)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Mode::Public),
            "private" => Ok(Mode::Private),
            other => Err(anyhow!("Unknown library mode: {:?}", other)),
        }
    }
}

/// One audio file as exposed by `/get_library`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub category: String,
    pub path: String,
}

impl Record {
    /// Server-relative media URL, e.g. `/static/a.mp3`.
    pub fn media_url(&self) -> String {
        media_url(&self.path)
    }
}

pub fn media_url(path: &str) -> String {
    format!("/static/{}", path.trim_start_matches('/'))
}

/// Raw state of the upload form controls. `file` is `None` when nothing
/// was selected.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<PathBuf>,
    pub category: String,
    pub public: bool,
}

impl UploadForm {
    /// Returns the upload to send, or `None` when no file was selected.
    pub fn into_upload(self) -> Option<AudioUpload> {
        let file = self.file?;
        Some(AudioUpload {
            file,
            category: self.category,
            public: self.public,
        })
    }
}

/// A submittable upload: the file is known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub file: PathBuf,
    pub category: String,
    pub public: bool,
}

/// Body of `POST /delete_audio`.
#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteRequest<'a> {
    pub path: &'a str,
}
