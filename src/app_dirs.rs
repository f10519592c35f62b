use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mindflow";

/// Centralized application directory resolution
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppDirs {
    /// Platform locations: the config dir for settings, `$HOME/.local/state`
    /// (or the platform data dir) for stats and the log file.
    pub fn resolve() -> Self {
        let project = ProjectDirs::from("", "", APP_NAME);

        let config_dir = project
            .as_ref()
            .map(|pd| pd.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let state_dir = if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("state").join(APP_NAME)
        } else {
            project
                .as_ref()
                .map(|pd| pd.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        };

        Self {
            config_dir,
            state_dir,
        }
    }

    /// Keep everything under one directory (used by `--data-dir` and tests).
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            config_dir: root.clone(),
            state_dir: root,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.state_dir.join("stats.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("mindflow.log")
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_paths_share_one_directory() {
        let dirs = AppDirs::rooted_at("/tmp/flow");
        assert_eq!(dirs.config_path(), PathBuf::from("/tmp/flow/config.json"));
        assert_eq!(dirs.stats_path(), PathBuf::from("/tmp/flow/stats.json"));
        assert_eq!(dirs.log_path(), PathBuf::from("/tmp/flow/mindflow.log"));
    }

    #[test]
    fn resolved_entries_have_expected_names() {
        let dirs = AppDirs::resolve();
        assert!(dirs.config_path().ends_with("config.json"));
        assert!(dirs.stats_path().ends_with("stats.json"));
    }
}
