//! Patch dispatcher: executes one patch on one connection.

use crate::error::{MigrateError, MigrateResult, PatchFailure};
use crate::task::{TaskContext, TaskRegistry};
use pl_core::{DataLoadSpec, LoadMode, Patch, PatchPayload, TaskRef};
use pl_db::sql_utils::{delete_by_key_statement, insert_statement};
use pl_db::{with_transaction, Database, DuckDbTabularReader, SqlValue, Table, TabularOptions, TabularReader};

/// Executes patches by kind.
pub struct PatchDispatcher {
    tasks: TaskRegistry,
    reader: Box<dyn TabularReader>,
}

impl Default for PatchDispatcher {
    fn default() -> Self {
        Self::new(TaskRegistry::new())
    }
}

impl PatchDispatcher {
    /// Dispatcher resolving tasks from `tasks` and reading files with DuckDB.
    pub fn new(tasks: TaskRegistry) -> Self {
        Self {
            tasks,
            reader: Box::new(DuckDbTabularReader::new()),
        }
    }

    /// Replace the reader used for data-load patches.
    pub fn with_reader(mut self, reader: impl TabularReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Apply `patch` to `db`. The ledger is not touched.
    pub fn execute(&self, patch: &Patch, db: &dyn Database) -> MigrateResult<()> {
        let outcome = match &patch.payload {
            PatchPayload::SqlScript(sql) => db.execute_batch(sql).map_err(PatchFailure::from),
            PatchPayload::DataLoad(spec) => self.load_data(patch, spec, db),
            PatchPayload::Task(task) => self.run_task(patch, task, db),
        };
        outcome.map_err(|cause| MigrateError::PatchExecution {
            version: patch.version,
            name: patch.name.to_string(),
            cause,
        })
    }

    fn load_data(
        &self,
        patch: &Patch,
        spec: &DataLoadSpec,
        db: &dyn Database,
    ) -> Result<(), PatchFailure> {
        let options = TabularOptions::from(spec);
        let table = match &spec.inline {
            Some(text) => self.reader.read_text(&spec.source, text, &options)?,
            None => self
                .reader
                .read(&patch.resolve_resource(&spec.source), &options)?,
        };
        let plan = LoadPlan::new(spec, &table)?;

        let rows = with_transaction(db, |db| {
            for row in &table.rows {
                if spec.mode == LoadMode::Upsert {
                    db.execute_with_params(&plan.delete_sql, &plan.key_values(row))?;
                }
                db.execute_with_params(&plan.insert_sql, &plan.values(row))?;
            }
            Ok(table.rows.len())
        })?;

        log::debug!(
            "Loaded {} rows from {} into {} ({})",
            rows,
            spec.source,
            spec.table,
            spec.mode
        );
        Ok(())
    }

    fn run_task(&self, patch: &Patch, task_ref: &TaskRef, db: &dyn Database) -> Result<(), PatchFailure> {
        let name = task_ref.task.as_str();
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| PatchFailure::UnknownTask(name.to_string()))?;

        let mut ctx = TaskContext::new(db, patch, &task_ref.params);
        task.migrate(&mut ctx).map_err(|error| PatchFailure::Task {
            task: name.to_string(),
            error,
        })?;
        log::debug!("Task '{}' affected {} rows", name, ctx.affected_rows());
        Ok(())
    }
}

/// Column positions and statements for loading one table.
struct LoadPlan {
    /// Source column index for each inserted target column
    sources: Vec<usize>,
    /// Source column index for each key column
    keys: Vec<usize>,
    insert_sql: String,
    delete_sql: String,
}

impl LoadPlan {
    fn new(spec: &DataLoadSpec, table: &Table) -> Result<Self, PatchFailure> {
        for source in spec.columns.keys() {
            if table.column_index(source).is_none() {
                return Err(PatchFailure::Data(format!(
                    "column '{}' is not present in {}",
                    source, spec.source
                )));
            }
        }

        let mut sources = Vec::new();
        let mut targets = Vec::new();
        for (idx, column) in table.columns.iter().enumerate() {
            if let Some(target) = spec.target_column(column) {
                sources.push(idx);
                targets.push(target);
            }
        }
        if targets.is_empty() {
            return Err(PatchFailure::Data(format!(
                "{} has no columns to load",
                spec.source
            )));
        }

        let mut keys = Vec::new();
        for key in &spec.key_columns {
            let pos = targets.iter().position(|t| t == key).ok_or_else(|| {
                PatchFailure::Data(format!(
                    "key column '{}' is not loaded from {}",
                    key, spec.source
                ))
            })?;
            keys.push(sources[pos]);
        }

        let key_refs: Vec<&str> = spec.key_columns.iter().map(String::as_str).collect();
        Ok(Self {
            insert_sql: insert_statement(&spec.table, &targets),
            delete_sql: delete_by_key_statement(&spec.table, &key_refs),
            sources,
            keys,
        })
    }

    fn values(&self, row: &[SqlValue]) -> Vec<SqlValue> {
        Self::pick(row, &self.sources)
    }

    fn key_values(&self, row: &[SqlValue]) -> Vec<SqlValue> {
        Self::pick(row, &self.keys)
    }

    fn pick(row: &[SqlValue], indices: &[usize]) -> Vec<SqlValue> {
        indices
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(SqlValue::Null))
            .collect()
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
