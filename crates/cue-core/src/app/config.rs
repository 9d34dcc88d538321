//! Config - スキル定義とランタイム設定（JSON）
//!
//! # スキル定義
//! ```json
//! {
//!   "name": "slash",
//!   "tasks": [
//!     { "type": "find_target", "mode": "single", "rule": "nearest" },
//!     { "type": "play_animation", "animation": "Attack01", "section": "Recover" }
//!   ]
//! }
//! ```
//! 省略したフィールドは各タスクのデフォルト値になります。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::tasks::{FindTargetConfig, PlayAnimationConfig, TurnToConfig};
use crate::typed::ScratchPadPool;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One task entry of a skill description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskSpec {
    FindTarget(FindTargetConfig),
    TurnTo(TurnToConfig),
    PlayAnimation(PlayAnimationConfig),
}

impl TaskSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            TaskSpec::FindTarget(_) => "find_target",
            TaskSpec::TurnTo(_) => "turn_to",
            TaskSpec::PlayAnimation(_) => "play_animation",
        }
    }
}

/// A skill as authored: a name and its tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSpec {
    pub name: String,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl SkillSpec {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let spec: SkillSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&read(path.as_ref())?)
    }

    /// Checks that do not need registries or assets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("skill name is empty".into()));
        }
        for (index, task) in self.tasks.iter().enumerate() {
            let timing = match task {
                TaskSpec::FindTarget(c) => c.timing,
                TaskSpec::TurnTo(c) => c.timing,
                TaskSpec::PlayAnimation(c) => c.timing,
            };
            if timing.end_time < timing.start_time {
                return Err(ConfigError::Invalid(format!(
                    "task #{index} ({}) ends at {} before it starts at {}",
                    task.type_name(),
                    timing.end_time,
                    timing.start_time
                )));
            }
            if let TaskSpec::FindTarget(c) = task
                && c.targeting.rule_names().is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "task #{index} (find_target) has no rules"
                )));
            }
        }
        Ok(())
    }
}

fn default_pool_capacity() -> usize {
    ScratchPadPool::DEFAULT_CAPACITY_PER_KIND
}

fn default_log_filter() -> String {
    "warn".to_string()
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Released pads kept per kind.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity_per_kind: usize,

    /// `tracing` filter used when neither the command line nor the
    /// environment sets one.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pool_capacity_per_kind: default_pool_capacity(),
            log_filter: default_log_filter(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&read(path.as_ref())?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
