use crate::adapter::{build_coordinates, default_selection, list_numeric_columns, Axes, ColumnSelection};
use crate::interpreter::InterpreterHandle;
use crate::view::{fetch_table, ViewOpts, ViewState};
use framechart_common::data::coordinates::CoordinateSeries;
use framechart_common::data::table::ColumnarTable;
use framechart_common::error::{FrameChartError, Result};

/// Two-axis view over a pair of numeric columns.
///
/// The dataset is fetched once per `load`; changing the selection only recomputes
/// coordinates from the table already in memory.
pub struct ScatterView {
    handle: InterpreterHandle,
    opts: ViewOpts,
    state: ViewState,
    table: Option<ColumnarTable>,
    columns: Vec<String>,
    selection: Option<ColumnSelection>,
    coordinates: Option<CoordinateSeries>,
}

impl ScatterView {
    pub fn new(handle: InterpreterHandle, opts: ViewOpts) -> Self {
        Self {
            handle,
            opts,
            state: ViewState::Uninitialized,
            table: None,
            columns: Vec::new(),
            selection: None,
            coordinates: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn opts(&self) -> &ViewOpts {
        &self.opts
    }

    pub fn table(&self) -> Option<&ColumnarTable> {
        self.table.as_ref()
    }

    /// Columns offered for selection
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn selection(&self) -> Option<(&str, &str)> {
        match &self.selection {
            Some(ColumnSelection::Pair { x, y }) => Some((x.as_str(), y.as_str())),
            _ => None,
        }
    }

    pub fn coordinates(&self) -> Option<&CoordinateSeries> {
        self.coordinates.as_ref()
    }

    /// Fetch the dataset, discover columns and build coordinates for the default pair.
    ///
    /// Any earlier table and selection are discarded first.
    pub async fn load(&mut self) -> Result<()> {
        self.table = None;
        self.columns.clear();
        self.selection = None;
        self.coordinates = None;
        self.state = ViewState::Loading;

        match fetch_table(&self.handle, &self.opts.dataset).await {
            Ok(table) => {
                self.table = Some(table);
                self.discover();
                self.recompute()
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn reload(&mut self) -> Result<()> {
        log::debug!("Reloading scatter view of {}", self.opts.dataset);
        self.load().await
    }

    /// Select both axes. Names outside `columns()` are rejected and leave the view as it was.
    pub fn select(&mut self, x: &str, y: &str) -> Result<()> {
        if self.table.is_none() {
            return Err(FrameChartError::internal(
                "Cannot select columns before the dataset is loaded",
            ));
        }
        let selection = ColumnSelection::Pair {
            x: x.to_string(),
            y: y.to_string(),
        };
        if !selection.is_within(&self.columns) {
            return Err(FrameChartError::column_not_found(format!(
                "{x}, {y} must both be among [{}]",
                self.columns.join(", ")
            )));
        }
        self.selection = Some(selection);
        self.state = ViewState::ColumnsDiscovered;
        self.recompute()
    }

    pub fn select_x(&mut self, x: &str) -> Result<()> {
        let y = self.current_y()?;
        self.select(x, &y)
    }

    pub fn select_y(&mut self, y: &str) -> Result<()> {
        let x = self.current_x()?;
        self.select(&x, y)
    }

    fn current_x(&self) -> Result<String> {
        self.selection()
            .map(|(x, _)| x.to_string())
            .ok_or_else(|| FrameChartError::internal("No columns are selected"))
    }

    fn current_y(&self) -> Result<String> {
        self.selection()
            .map(|(_, y)| y.to_string())
            .ok_or_else(|| FrameChartError::internal("No columns are selected"))
    }

    fn discover(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.columns = list_numeric_columns(table);
        self.selection = default_selection(&self.columns, Axes::Two);
        self.state = if self.selection.is_some() {
            ViewState::ColumnsDiscovered
        } else {
            log::debug!(
                "{} has {} numeric columns, scatter needs 2",
                self.opts.dataset,
                self.columns.len()
            );
            ViewState::Empty
        };
    }

    fn recompute(&mut self) -> Result<()> {
        // A stale selection is replaced by the defaults once before giving up
        let mut fell_back = false;
        loop {
            let result = match (&self.table, &self.selection) {
                (Some(table), Some(ColumnSelection::Pair { x, y })) => {
                    build_coordinates(table, x, y)
                }
                _ => return Ok(()),
            };

            match result {
                Ok(coordinates) => {
                    self.coordinates = Some(coordinates);
                    self.state = ViewState::CoordinatesReady;
                    return Ok(());
                }
                Err(err) if err.is_column_not_found() && !fell_back => {
                    log::warn!("Selection is stale, falling back to defaults: {err}");
                    fell_back = true;
                    self.discover();
                }
                Err(err) => {
                    self.coordinates = None;
                    self.fail(&err);
                    return Err(err);
                }
            }
        }
    }

    fn fail(&mut self, err: &FrameChartError) {
        log::warn!("Scatter view of {} failed: {err}", self.opts.dataset);
        self.state = ViewState::Failed {
            message: err.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::table_from_value;
    use crate::interpreter::InterpreterTrait;
    use crate::value::{RList, RObject, RValue};
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::Arc;

    /// Never reached: these tests work on a table already in memory
    struct OfflineInterpreter;

    #[async_trait]
    impl InterpreterTrait for OfflineInterpreter {
        fn as_any(&self) -> &dyn Any {
            self
        }

        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> Result<RObject> {
            Err(FrameChartError::interpreter(format!(
                "Cannot evaluate {expression} offline"
            )))
        }

        async fn to_value(&self, _object: &RObject) -> Result<RValue> {
            Err(FrameChartError::interpreter("No values offline"))
        }

        async fn release(&self, _object: RObject) -> Result<()> {
            Ok(())
        }
    }

    fn loaded_view() -> ScatterView {
        let value: RValue = RList::named(vec![
            ("height", RValue::from(vec![58.0, 59.0])),
            ("weight", RValue::from(vec![115.0, 117.0])),
        ])
        .with_class("data.frame")
        .into();
        let mut view = ScatterView::new(
            InterpreterHandle::new(Arc::new(OfflineInterpreter)),
            ViewOpts::with_dataset("women"),
        );
        view.table = Some(table_from_value(value).unwrap());
        view.discover();
        view
    }

    #[test]
    fn test_stale_selection_falls_back_to_defaults() {
        let mut view = loaded_view();
        view.selection = Some(ColumnSelection::Pair {
            x: "Sepal.Length".to_string(),
            y: "weight".to_string(),
        });

        view.recompute().unwrap();

        assert_eq!(view.state(), &ViewState::CoordinatesReady);
        assert_eq!(view.selection(), Some(("height", "weight")));
        assert_eq!(view.columns(), &["height", "weight"]);
        assert_eq!(view.coordinates().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_stale_selection_without_defaults_stays_empty() {
        let mut view = loaded_view();
        view.table = Some(
            table_from_value(RList::named(vec![("label", RValue::from(vec!["a"]))]).into())
                .unwrap(),
        );
        view.selection = Some(ColumnSelection::Pair {
            x: "height".to_string(),
            y: "weight".to_string(),
        });

        view.recompute().unwrap();

        assert_eq!(view.state(), &ViewState::Empty);
        assert!(view.selection().is_none());
        assert!(view.columns().is_empty());
    }
}
