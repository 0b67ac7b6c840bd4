use anyhow::{anyhow, ensure, Context};
use derive_builder::Builder;
use directories::UserDirs;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use crate::{args::Args, error::Rejection};

/// Template cloned when neither `--template`, `TPLNEW_TEMPLATE` nor the
/// config file name one.
pub const DEFAULT_TEMPLATE: &str = "git@git.koolearn-inc.com:zhaoshichao/project-tpl.git";

/// Subdirectory of the project root the template is cloned into.
pub const FETCH_DIR: &str = ".tplnew-fetch";

/// Version written to the manifest of a freshly created project.
pub const INITIAL_VERSION: &str = "0.1.0";

pub const MANIFEST: &str = "package.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create a brand new project from the template.
    Create,
    /// Refresh the configuration files of an existing project.
    Update,
}

/// Everything a run needs, resolved once from the command line, the
/// environment and the config file.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(setter(into))]
pub struct Invocation {
    root: PathBuf,
    original_dir: PathBuf,
    template: String,
    mode: Mode,
    #[builder(default)]
    verbose: bool,
    #[builder(default)]
    debug: bool,
}

impl Invocation {
    /// Create a new [`Invocation`] builder
    #[must_use]
    pub fn builder() -> InvocationBuilder {
        InvocationBuilder::create_empty()
    }

    /// Resolves the parsed arguments against the current directory and the
    /// user settings.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MissingProjectName`] when no project directory
    /// was given outside update mode.
    pub fn from_args(args: &Args, cwd: &Path, settings: &Settings) -> anyhow::Result<Self> {
        let mode = if args.update {
            Mode::Update
        } else {
            Mode::Create
        };

        let root = match (&args.project_directory, mode) {
            (Some(dir), _) => normalize(&cwd.join(dir)),
            (None, Mode::Update) => normalize(cwd),
            (None, Mode::Create) => return Err(Rejection::MissingProjectName.into()),
        };

        let template = args
            .template
            .clone()
            .or_else(|| settings.template.clone())
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

        Ok(Self {
            root,
            original_dir: cwd.to_path_buf(),
            template,
            mode,
            verbose: args.verbose,
            debug: args.debug,
        })
    }

    /// Absolute path of the project directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Directory the tool was started from.
    #[must_use]
    pub fn original_dir(&self) -> &Path {
        self.original_dir.as_path()
    }

    /// Base name of [`Self::root`], which becomes the package name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        self.root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Template as handed to `git clone`. The clone runs inside the project
    /// root, so a relative path to a local checkout is resolved against
    /// [`Self::original_dir`] first. Remote addresses are returned as given.
    #[must_use]
    pub fn template_source(&self) -> String {
        let local = Path::new(&self.template);

        if local.is_relative() {
            let resolved = self.original_dir.join(local);
            if resolved.exists() {
                return normalize(&resolved).to_string_lossy().into_owned();
            }
        }

        self.template.clone()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn fetch_dir(&self) -> PathBuf {
        self.root.join(FETCH_DIR)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST)
    }
}

/// Lexically resolves `.` and `..` without touching the filesystem, since
/// the target usually does not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }

    out
}

/// Settings read from the user's config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Template used when none is given on the command line.
    pub template: Option<String>,
}

impl Settings {
    /// Loads the first config file found by [`Self::locate`], or the
    /// defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        match Self::locate()? {
            Some(path) => {
                crate::trace!("Reading settings from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Looks for the config file, in order:
    /// - `$XDG_CONFIG_HOME/tplnew/config.json`
    /// - `~/.config/tplnew/config.json`
    /// - `~/.tplnew.json`
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the user's home directory cannot be found or a
    /// candidate path exists but is not a file.
    pub fn locate() -> anyhow::Result<Option<PathBuf>> {
        let home = UserDirs::new()
            .context("Failed to get user's home directory")?
            .home_dir()
            .to_owned();
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);

        for candidate in Self::candidates(&home, xdg.as_deref()) {
            if candidate.exists() {
                ensure!(
                    candidate.is_file(),
                    anyhow!("Path {} is not a file", candidate.display())
                );
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    #[must_use]
    pub fn candidates(home: &Path, xdg_config_home: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(3);

        if let Some(xdg) = xdg_config_home {
            candidates.push(xdg.join("tplnew").join("config.json"));
        }
        candidates.push(home.join(".config").join("tplnew").join("config.json"));
        candidates.push(home.join(".tplnew.json"));

        candidates.dedup();
        candidates
    }

    /// # Errors
    ///
    /// Returns an [`Err`] if `path` cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }
}
