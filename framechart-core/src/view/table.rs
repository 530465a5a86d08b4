use crate::interpreter::InterpreterHandle;
use crate::view::{fetch_table, ViewOpts, ViewState};
use framechart_common::data::table::{ColumnarTable, TableColumn};
use framechart_common::error::{FrameChartError, Result};
use serde_json::Value;

/// Every named column of a dataset, as headers plus row records.
///
/// There is no axis selection, so the view goes straight from `Loading` to
/// `CoordinatesReady` once the rows are available.
pub struct TableView {
    handle: InterpreterHandle,
    opts: ViewOpts,
    state: ViewState,
    table: Option<ColumnarTable>,
}

impl TableView {
    pub fn new(handle: InterpreterHandle, opts: ViewOpts) -> Self {
        Self {
            handle,
            opts,
            state: ViewState::Uninitialized,
            table: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn table(&self) -> Option<&ColumnarTable> {
        self.table.as_ref()
    }

    pub async fn load(&mut self) -> Result<()> {
        self.table = None;
        self.state = ViewState::Loading;

        let table = match fetch_table(&self.handle, &self.opts.dataset).await {
            Ok(table) if !table.is_rectangular() => {
                let err = FrameChartError::row_count_mismatch(format!(
                    "{} is not rectangular",
                    self.opts.dataset
                ));
                self.fail(&err);
                return Err(err);
            }
            Ok(table) => table,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        let table = match self.opts.row_limit {
            Some(limit) => table.head(limit),
            None => table,
        };

        self.state = if table.num_columns() == 0 {
            ViewState::Empty
        } else {
            ViewState::CoordinatesReady
        };
        self.table = Some(table);
        Ok(())
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.load().await
    }

    pub fn columns(&self) -> Vec<TableColumn> {
        self.table
            .as_ref()
            .map(|t| t.table_columns())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> Result<Value> {
        match &self.table {
            Some(table) => table.to_json_rows(),
            None => Ok(Value::Array(Vec::new())),
        }
    }

    fn fail(&mut self, err: &FrameChartError) {
        log::warn!("Table view of {} failed: {err}", self.opts.dataset);
        self.state = ViewState::Failed {
            message: err.to_string(),
        };
    }
}
