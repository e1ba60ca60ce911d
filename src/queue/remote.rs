//! Typed remote procedure calls over an injected executor

use crate::queue::error::QueueResult;
use crate::queue::executor::{SqlExecutor, Value};
use crate::queue::marshal::{self, FromRow, FromValue};
use crate::queue::sql::procedure_name;
use std::sync::Arc;

/// Shared call path for every queue component
///
/// Holds the executor and turns raw results into typed values. Errors from
/// the executor are wrapped as `QueueError::Backend` and nothing else.
#[derive(Clone)]
pub(crate) struct Remote {
    executor: Arc<dyn SqlExecutor>,
}

impl Remote {
    pub(crate) fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    fn trace(statement: &str, params: &[Value]) {
        log::debug!(
            "pgq call {} with {} argument(s)",
            procedure_name(statement),
            params.len()
        );
        log::trace!("statement: {} params: {:?}", statement, params);
    }

    pub(crate) async fn value(&self, statement: &str, params: &[Value]) -> QueueResult<Value> {
        Self::trace(statement, params);
        Ok(self.executor.select_value(statement, params).await?)
    }

    pub(crate) async fn scalar<T: FromValue>(
        &self,
        statement: &str,
        params: &[Value],
    ) -> QueueResult<T> {
        let value = self.value(statement, params).await?;
        marshal::scalar(procedure_name(statement), &value)
    }

    pub(crate) async fn flag(&self, statement: &str, params: &[Value]) -> QueueResult<bool> {
        let value = self.value(statement, params).await?;
        marshal::flag(procedure_name(statement), &value)
    }

    pub(crate) async fn scalars<T: FromValue>(
        &self,
        statement: &str,
        params: &[Value],
    ) -> QueueResult<Vec<T>> {
        Self::trace(statement, params);
        let values = self.executor.select_values(statement, params).await?;
        let procedure = procedure_name(statement);
        values
            .iter()
            .map(|value| marshal::scalar(procedure, value))
            .collect()
    }

    pub(crate) async fn row<T: FromRow>(
        &self,
        statement: &str,
        params: &[Value],
    ) -> QueueResult<Option<T>> {
        Self::trace(statement, params);
        match self.executor.select_one(statement, params).await? {
            Some(row) => T::from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn rows<T: FromRow>(
        &self,
        statement: &str,
        params: &[Value],
    ) -> QueueResult<Vec<T>> {
        Self::trace(statement, params);
        let rows = self.executor.select_all(statement, params).await?;
        rows.iter().map(T::from_row).collect()
    }

    pub(crate) async fn execute(&self, statement: &str, params: &[Value]) -> QueueResult<u64> {
        Self::trace(statement, params);
        Ok(self.executor.execute(statement, params).await?)
    }
}
