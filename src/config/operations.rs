//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::{StoreKind, TaskConfig};
use crate::duration::parse_duration;
use crate::error::{Result, SchedLockError};
use crate::locks::{LockConfiguration, default_holder_id, validate_table_name};
use crate::scheduler::CronSchedule;
use crate::task::ShellTask;
use std::collections::HashSet;
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the schedlock.yaml file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(SchedLockError::UserError)` - The file could not be read
    /// * `Err(SchedLockError::ConfigInvalid)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SchedLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            SchedLockError::ConfigInvalid(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `default_lock_at_most_for` must parse
    /// - `holder_id`, if set, must be non-empty
    /// - the store table must be a plain identifier; a sqlite path must be set
    /// - task names must be non-empty and unique
    /// - each task's cron, durations (`at_least <= at_most`) and command must parse
    pub fn validate(&self) -> Result<()> {
        parse_duration(&self.default_lock_at_most_for).map_err(|e| {
            SchedLockError::ConfigInvalid(format!("default_lock_at_most_for: {}", e))
        })?;

        if let Some(holder) = &self.holder_id
            && holder.trim().is_empty()
        {
            return Err(SchedLockError::ConfigInvalid(
                "holder_id must not be empty when set".to_string(),
            ));
        }

        validate_table_name(&self.store.table)?;
        if self.store.kind == StoreKind::Sqlite && self.store.path.as_os_str().is_empty() {
            return Err(SchedLockError::ConfigInvalid(
                "store.path must be set for the sqlite store".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if task.name.trim().is_empty() {
                return Err(SchedLockError::ConfigInvalid(
                    "task name must not be empty".to_string(),
                ));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(SchedLockError::ConfigInvalid(format!(
                    "task '{}' is defined more than once",
                    task.name
                )));
            }

            CronSchedule::parse(&task.cron)?;
            self.lock_configuration(task)?;
            task.shell_task().map_err(|e| match e {
                SchedLockError::ConfigInvalid(msg) => {
                    SchedLockError::ConfigInvalid(format!("task '{}': {}", task.name, msg))
                }
                other => other,
            })?;
        }

        Ok(())
    }

    /// The holder identity to record in `locked_by`.
    pub fn holder_id(&self) -> String {
        self.holder_id.clone().unwrap_or_else(default_holder_id)
    }

    /// Look up a task by name.
    pub fn find_task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// A task's at-most window, falling back to `default_lock_at_most_for`.
    pub fn lock_at_most_for<'a>(&'a self, task: &'a TaskConfig) -> &'a str {
        task.lock_at_most_for
            .as_deref()
            .unwrap_or(&self.default_lock_at_most_for)
    }

    /// Lock bounds for a task, applying `default_lock_at_most_for`.
    pub fn lock_configuration(&self, task: &TaskConfig) -> Result<LockConfiguration> {
        LockConfiguration::parse(&task.name, self.lock_at_most_for(task), &task.lock_at_least_for)
    }
}

impl TaskConfig {
    /// The task body: the configured command with its directory and environment.
    pub fn shell_task(&self) -> Result<ShellTask> {
        let mut task = ShellTask::new(&self.command)?.with_env(self.env.clone());
        if let Some(dir) = &self.working_dir {
            task = task.with_working_dir(dir);
        }
        Ok(task)
    }
}
