//! Programmatic tasks: Rust code run as a patch.
//!
//! A YAML patch with `kind: task` names a task; the name is resolved against
//! a [`TaskRegistry`] when the patch is dispatched.

use crate::error::TaskError;
use pl_core::Patch;
use pl_db::{Database, DbResult, SqlValue};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Result of running a task
pub type TaskResult = Result<(), TaskError>;

/// What a task sees while it runs.
pub struct TaskContext<'a> {
    db: &'a dyn Database,
    patch: &'a Patch,
    params: &'a BTreeMap<String, serde_yaml::Value>,
    affected_rows: usize,
}

impl<'a> TaskContext<'a> {
    pub fn new(
        db: &'a dyn Database,
        patch: &'a Patch,
        params: &'a BTreeMap<String, serde_yaml::Value>,
    ) -> Self {
        Self {
            db,
            patch,
            params,
            affected_rows: 0,
        }
    }

    /// The connection the patch runs on.
    pub fn db(&self) -> &'a dyn Database {
        self.db
    }

    pub fn patch_name(&self) -> &str {
        self.patch.name.as_str()
    }

    pub fn version(&self) -> u64 {
        self.patch.version
    }

    /// Parameters declared in the patch file.
    pub fn params(&self) -> &BTreeMap<String, serde_yaml::Value> {
        self.params
    }

    pub fn param(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.params.get(key)
    }

    /// String parameter, `None` if absent or not a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(|v| v.as_str())
    }

    /// Path of a file next to the patch.
    pub fn resource(&self, relative: &str) -> PathBuf {
        self.patch.resolve_resource(relative)
    }

    /// Execute one statement, counting affected rows.
    pub fn execute(&mut self, sql: &str) -> DbResult<usize> {
        let n = self.db.execute(sql)?;
        self.affected_rows += n;
        Ok(n)
    }

    /// Execute one parameterised statement, counting affected rows.
    pub fn execute_with_params(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        let n = self.db.execute_with_params(sql, params)?;
        self.affected_rows += n;
        Ok(n)
    }

    /// Rows affected through this context so far.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }
}

/// A unit of Rust code applied as a patch.
pub trait PatchTask {
    fn migrate(&self, ctx: &mut TaskContext<'_>) -> TaskResult;
}

impl<F> PatchTask for F
where
    F: Fn(&mut TaskContext<'_>) -> TaskResult,
{
    fn migrate(&self, ctx: &mut TaskContext<'_>) -> TaskResult {
        self(ctx)
    }
}

/// Tasks available to `kind: task` patches, keyed by name.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Box<dyn PatchTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, task: impl PatchTask + 'static) -> &mut Self {
        self.tasks.insert(name.into(), Box::new(task));
        self
    }

    /// Register a closure under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, task: F) -> &mut Self
    where
        F: Fn(&mut TaskContext<'_>) -> TaskResult + 'static,
    {
        self.register(name, task)
    }

    pub fn get(&self, name: &str) -> Option<&dyn PatchTask> {
        self.tasks.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod tests;
