//! Consumers of the column adapter.
//!
//! Each view owns the data it loaded and walks through `ViewState`. Views never
//! share mutable state; they only share an `InterpreterHandle`, so a failure in one
//! view leaves its siblings untouched.
mod histogram;
mod scatter;
mod table;

pub use histogram::{FetchTicket, HistogramView};
pub use scatter::ScatterView;
pub use table::TableView;

use crate::adapter::table_from_value;
use crate::interpreter::InterpreterHandle;
use framechart_common::data::table::ColumnarTable;
use framechart_common::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Uninitialized,
    Loading,
    ColumnsDiscovered,
    CoordinatesReady,
    /// Not enough numeric columns to build the view
    Empty,
    Failed { message: String },
}

impl ViewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::CoordinatesReady)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewOpts {
    /// Dataset expression evaluated to load the data frame
    pub dataset: String,
    /// Upper bound on rows kept by the table view
    pub row_limit: Option<usize>,
    /// Requested histogram bin count, `None` lets the interpreter decide
    pub breaks: Option<usize>,
}

impl Default for ViewOpts {
    fn default() -> Self {
        Self {
            dataset: "iris".to_string(),
            row_limit: None,
            breaks: None,
        }
    }
}

impl ViewOpts {
    pub fn with_dataset<S: Into<String>>(dataset: S) -> Self {
        Self {
            dataset: dataset.into(),
            ..Default::default()
        }
    }
}

/// Evaluate the dataset expression and convert the resulting data frame
pub(crate) async fn fetch_table(handle: &InterpreterHandle, dataset: &str) -> Result<ColumnarTable> {
    let table = handle.with_value(dataset, table_from_value).await?;
    log::debug!(
        "Loaded {dataset}: {} columns, {} rows",
        table.num_columns(),
        table.num_rows()
    );
    Ok(table)
}
