use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Well-known branch names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchesConfig {
    /// Stable branch; commits and amends are only allowed here
    #[serde(default = "default_trunk")]
    pub trunk: String,
    /// Shared staging branch that trunk is merged into
    #[serde(default = "default_integration")]
    pub integration: String,
}

fn default_trunk() -> String {
    "master".to_string()
}

fn default_integration() -> String {
    "integrate".to_string()
}

impl Default for BranchesConfig {
    fn default() -> Self {
        Self {
            trunk: default_trunk(),
            integration: default_integration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote every mutating operation publishes to
    #[serde(default = "default_remote")]
    pub name: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: default_remote(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Working tree the workflow operates on
    #[serde(default = "default_repo_path")]
    pub path: String,
    /// Pathspec handed to `git add` before committing
    #[serde(default = "default_stage_path")]
    pub stage_path: String,
}

fn default_repo_path() -> String {
    ".".to_string()
}

fn default_stage_path() -> String {
    ".".to_string()
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            stage_path: default_stage_path(),
        }
    }
}

/// External collaborators run before integrating, plus toolchain requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Commands run in order before `integrate` (e.g. "cargo clippy", "cargo test")
    #[serde(default)]
    pub commands: Vec<String>,
    /// Minimum git version accepted by `doctor`, as "major.minor"
    #[serde(default = "default_min_git_version")]
    pub min_git_version: String,
}

fn default_min_git_version() -> String {
    "2.0".to_string()
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            min_git_version: default_min_git_version(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to a file instead of stderr
    #[serde(default)]
    pub to_file: bool,

    /// Directory for log files, relative to the repository
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    ".trunkflow/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Path to the per-repository config file
    pub fn repo_config_path() -> PathBuf {
        PathBuf::from(".trunkflow.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, None)
    }

    /// Load with an explicit environment map in place of the process
    /// environment. `None` reads the real environment.
    fn load_with_env(
        config_path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        // Start with embedded defaults so trunkflow works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config in ~/.config/trunkflow/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trunkflow").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Repository config
        let repo_config = Self::repo_config_path();
        if repo_config.exists() {
            builder = builder.add_source(config::File::from(repo_config));
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. TRUNKFLOW_BRANCHES__TRUNK=main or
        // TRUNKFLOW_CHECKS__COMMANDS="cargo clippy,cargo test"
        builder = builder.add_source(
            config::Environment::with_prefix("TRUNKFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("checks.commands")
                .source(env),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Write the configuration to `.trunkflow.toml`, refusing to overwrite
    pub fn init(&self) -> Result<PathBuf> {
        let path = Self::repo_config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        std::fs::write(path, self.to_toml()?).context("Failed to write config file")?;
        Ok(())
    }

    /// Get absolute path to the repository
    pub fn repo_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.repo.path);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.dir);
        if path.is_absolute() {
            path
        } else {
            self.repo_path().join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.branches.trunk, "master");
        assert_eq!(config.branches.integration, "integrate");
        assert_eq!(config.remote.name, "origin");
        assert_eq!(config.repo.stage_path, ".");
        assert!(config.checks.commands.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.to_file);
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trunkflow.toml");
        std::fs::write(
            &path,
            r#"
[branches]
trunk = "main"

[checks]
commands = ["cargo test"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.branches.trunk, "main");
        // Unset keys keep their defaults
        assert_eq!(config.branches.integration, "integrate");
        assert_eq!(config.checks.commands, vec!["cargo test".to_string()]);
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_overrides_scalar_keys() {
        let config = Config::load_with_env(
            None,
            env(&[
                ("TRUNKFLOW_BRANCHES__TRUNK", "main"),
                ("TRUNKFLOW_REMOTE__NAME", "upstream"),
                ("TRUNKFLOW_LOGGING__TO_FILE", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.branches.trunk, "main");
        assert_eq!(config.remote.name, "upstream");
        assert!(config.logging.to_file);
        assert_eq!(config.branches.integration, "integrate");
    }

    #[test]
    fn test_env_check_commands_split_on_commas() {
        let config = Config::load_with_env(
            None,
            env(&[("TRUNKFLOW_CHECKS__COMMANDS", "cargo clippy -- -D warnings,cargo test")]),
        )
        .unwrap();

        assert_eq!(
            config.checks.commands,
            vec![
                "cargo clippy -- -D warnings".to_string(),
                "cargo test".to_string()
            ]
        );
    }

    #[test]
    fn test_env_single_check_command() {
        let config = Config::load_with_env(
            None,
            env(&[("TRUNKFLOW_CHECKS__COMMANDS", "cargo test")]),
        )
        .unwrap();

        assert_eq!(config.checks.commands, vec!["cargo test".to_string()]);
    }

    #[test]
    fn test_env_takes_precedence_over_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trunkflow.toml");
        std::fs::write(
            &path,
            r#"
[branches]
trunk = "main"
integration = "staging"

[checks]
commands = ["make lint"]
"#,
        )
        .unwrap();

        let config = Config::load_with_env(
            Some(path.to_str().unwrap()),
            env(&[
                ("TRUNKFLOW_BRANCHES__TRUNK", "trunk"),
                ("TRUNKFLOW_CHECKS__COMMANDS", "make test"),
            ]),
        )
        .unwrap();

        // env wins where set, the file wins over defaults elsewhere
        assert_eq!(config.branches.trunk, "trunk");
        assert_eq!(config.branches.integration, "staging");
        assert_eq!(config.checks.commands, vec!["make test".to_string()]);
        assert_eq!(config.remote.name, "origin");
    }

    #[test]
    fn test_unrelated_env_vars_are_ignored() {
        let config = Config::load_with_env(
            None,
            env(&[("PATH", "/usr/bin"), ("TRUNKFLOWX", "1")]),
        )
        .unwrap();

        assert_eq!(config.branches.trunk, "master");
    }

    #[test]
    fn test_toml_round_trip_keeps_branches() {
        let mut config = Config::default();
        config.branches.integration = "staging".to_string();

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("integration = \"staging\""));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.branches.integration, "staging");
    }

    #[test]
    fn test_save_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".trunkflow.toml");

        Config::default().save_to(&path).unwrap();
        assert!(path.exists());
        assert!(Config::default().save_to(&path).is_err());
    }

    #[test]
    fn test_logs_path_relative_to_repo() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.repo.path = temp_dir.path().to_string_lossy().to_string();

        let logs = config.logs_path();
        assert!(logs.starts_with(temp_dir.path()));
        assert!(logs.ends_with(".trunkflow/logs"));
    }
}
