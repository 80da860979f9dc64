use crate::error::{Result, RulzError};
use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Directory the engine owns inside a workspace.
pub const RULZ_DIR: &str = ".rulz";
const RULES_FILENAME: &str = "rules.json";

/// Resolved storage locations for one engine session.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    /// Root of the open workspace, when one was found.
    pub project_root: Option<PathBuf>,
    /// Per-user data directory used when no workspace is open.
    pub global_dir: PathBuf,
}

/// Find the workspace root by walking up from cwd. A directory that already
/// carries a .rulz store wins, even above a nested repo; otherwise the first
/// directory with .git is used. Returns None if nothing matches before the
/// home directory or the volume root.
pub fn find_workspace_root(cwd: &Path) -> Option<PathBuf> {
    let home_dir = BaseDirs::new().map(|bd| bd.home_dir().to_path_buf());
    let mut current = cwd.to_path_buf();
    let mut git_root: Option<PathBuf> = None;

    loop {
        // An existing rule store binds tighter than a bare repo
        if current.join(RULZ_DIR).exists() {
            return Some(current);
        }

        if git_root.is_none() && current.join(".git").exists() {
            git_root = Some(current.clone());
        }

        // Check stop conditions: reached home dir or volume root
        if let Some(ref home) = home_dir {
            if &current == home {
                break;
            }
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => {
                // Reached filesystem root
                break;
            }
        }
    }

    git_root
}

impl WorkspacePaths {
    /// Discover paths starting from `cwd`.
    pub fn discover(cwd: &Path) -> Result<Self> {
        let project_root = find_workspace_root(cwd);
        let proj_dirs = ProjectDirs::from("com", "rulz", "rulz").ok_or_else(|| {
            RulzError::StorageUnavailable("could not determine a user data directory".to_string())
        })?;

        Ok(Self {
            project_root,
            global_dir: proj_dirs.data_dir().to_path_buf(),
        })
    }

    /// Build paths from known roots, for embedders that already resolved them.
    pub fn new(project_root: Option<PathBuf>, global_dir: PathBuf) -> Self {
        Self {
            project_root,
            global_dir,
        }
    }

    /// Where the local rule file lives for this session.
    pub fn rules_file(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.join(RULZ_DIR).join(RULES_FILENAME),
            None => self.global_dir.join(RULES_FILENAME),
        }
    }

    /// Directory that holds this session's config.json.
    pub fn config_dir(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.join(RULZ_DIR),
            None => self.global_dir.clone(),
        }
    }
}
