use crate::adapter::{
    build_histogram_bins, default_selection, histogram_expression, list_numeric_columns, Axes,
    ColumnSelection,
};
use crate::interpreter::InterpreterHandle;
use crate::view::{fetch_table, ViewOpts, ViewState};
use framechart_common::data::coordinates::CoordinateSeries;
use framechart_common::data::table::ColumnarTable;
use framechart_common::error::{FrameChartError, Result};

/// Identifies the selection a bin fetch was started for.
///
/// A result is applied only while its ticket is still the view's current one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    column: String,
    expression: String,
    generation: u64,
}

impl FetchTicket {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One-axis view whose bins are computed by the interpreter for each selected column
pub struct HistogramView {
    handle: InterpreterHandle,
    opts: ViewOpts,
    state: ViewState,
    table: Option<ColumnarTable>,
    columns: Vec<String>,
    selection: Option<ColumnSelection>,
    generation: u64,
    bins: Option<CoordinateSeries>,
}

impl HistogramView {
    pub fn new(handle: InterpreterHandle, opts: ViewOpts) -> Self {
        Self {
            handle,
            opts,
            state: ViewState::Uninitialized,
            table: None,
            columns: Vec::new(),
            selection: None,
            generation: 0,
            bins: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn handle(&self) -> &InterpreterHandle {
        &self.handle
    }

    pub fn table(&self) -> Option<&ColumnarTable> {
        self.table.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn selection(&self) -> Option<&str> {
        match &self.selection {
            Some(ColumnSelection::Single(column)) => Some(column.as_str()),
            _ => None,
        }
    }

    pub fn bins(&self) -> Option<&CoordinateSeries> {
        self.bins.as_ref()
    }

    /// Fetch the dataset, pick the first numeric column and compute its bins
    pub async fn load(&mut self) -> Result<()> {
        // Tickets issued before the load become stale
        self.generation += 1;
        self.table = None;
        self.columns.clear();
        self.selection = None;
        self.bins = None;
        self.state = ViewState::Loading;

        let table = match fetch_table(&self.handle, &self.opts.dataset).await {
            Ok(table) => table,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        self.columns = list_numeric_columns(&table);
        self.table = Some(table);
        self.selection = default_selection(&self.columns, Axes::One);
        self.state = if self.selection.is_some() {
            ViewState::ColumnsDiscovered
        } else {
            ViewState::Empty
        };

        match self.current_ticket() {
            Some(ticket) => self.run(ticket).await,
            None => Ok(()),
        }
    }

    pub async fn reload(&mut self) -> Result<()> {
        log::debug!("Reloading histogram view of {}", self.opts.dataset);
        self.load().await
    }

    /// Switch to another column and return the ticket of the fetch it requires.
    ///
    /// Previous tickets become stale. Names outside `columns()` are rejected.
    pub fn select_column(&mut self, column: &str) -> Result<FetchTicket> {
        if self.table.is_none() {
            return Err(FrameChartError::internal(
                "Cannot select a column before the dataset is loaded",
            ));
        }
        let selection = ColumnSelection::Single(column.to_string());
        if !selection.is_within(&self.columns) {
            return Err(FrameChartError::column_not_found(format!(
                "{column} is not among [{}]",
                self.columns.join(", ")
            )));
        }

        self.selection = Some(selection);
        self.generation += 1;
        self.bins = None;
        self.state = ViewState::ColumnsDiscovered;
        self.current_ticket()
            .ok_or_else(|| FrameChartError::internal("Selection was not recorded"))
    }

    pub fn current_ticket(&self) -> Option<FetchTicket> {
        let column = self.selection()?;
        Some(FetchTicket {
            column: column.to_string(),
            expression: histogram_expression(&self.opts.dataset, column, self.opts.breaks),
            generation: self.generation,
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.selection() == Some(ticket.column())
    }

    /// Ask the interpreter for the bins of a ticket. Does not touch any view.
    pub async fn fetch(handle: &InterpreterHandle, ticket: &FetchTicket) -> Result<CoordinateSeries> {
        handle
            .with_value(&ticket.expression, |value| build_histogram_bins(&value))
            .await
    }

    /// Apply the outcome of a fetch.
    ///
    /// Returns `Ok(false)` when the ticket is stale; the result is then dropped,
    /// whether it succeeded or not.
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<CoordinateSeries>) -> Result<bool> {
        if !self.is_current(ticket) {
            log::debug!(
                "Discarding stale bins for {} (generation {}, current {})",
                ticket.column,
                ticket.generation,
                self.generation
            );
            return Ok(false);
        }

        match result {
            Ok(bins) => {
                self.bins = Some(bins);
                self.state = ViewState::CoordinatesReady;
                Ok(true)
            }
            Err(err) => {
                self.bins = None;
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Select a column and wait for its bins
    pub async fn select(&mut self, column: &str) -> Result<()> {
        let ticket = self.select_column(column)?;
        self.run(ticket).await
    }

    async fn run(&mut self, ticket: FetchTicket) -> Result<()> {
        let result = Self::fetch(&self.handle, &ticket).await;
        self.complete(&ticket, result).map(|_| ())
    }

    fn fail(&mut self, err: &FrameChartError) {
        log::warn!("Histogram view of {} failed: {err}", self.opts.dataset);
        self.state = ViewState::Failed {
            message: err.to_string(),
        };
    }
}
