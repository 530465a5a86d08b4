use clap::{Parser, Subcommand};
use framechart_common::data::coordinates::CoordinateSeries;
use framechart_common::data::table::TableColumn;
use framechart_common::error::{FrameChartError, Result};
use framechart_core::adapter::list_numeric_columns;
use framechart_core::interpreter::InterpreterHandle;
use framechart_core::view::{HistogramView, ScatterView, TableView, ViewOpts, ViewState};
use framechart_runtime::LocalInterpreter;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Data frame to load
    #[clap(long, default_value = "iris")]
    pub dataset: String,

    /// Pretty-print the JSON output
    #[clap(long, num_args = 0)]
    pub pretty: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every column and the ones usable as axes
    Columns,
    /// Print the rows of the data frame
    Table {
        /// Keep only the first N rows
        #[clap(long)]
        rows: Option<usize>,
    },
    /// Print x/y points for a pair of numeric columns
    Scatter {
        #[clap(long)]
        x: Option<String>,
        #[clap(long)]
        y: Option<String>,
    },
    /// Print histogram bins of one numeric column
    Histogram {
        #[clap(long)]
        column: Option<String>,
        /// Suggested number of bins
        #[clap(long)]
        breaks: Option<usize>,
    },
}

#[derive(Serialize)]
struct ColumnsOutput<'a> {
    dataset: &'a str,
    columns: Vec<String>,
    numeric: Vec<String>,
}

#[derive(Serialize)]
struct TableOutput<'a> {
    #[serde(flatten)]
    state: &'a ViewState,
    columns: Vec<TableColumn>,
    rows: Value,
}

#[derive(Serialize)]
struct PointsOutput<'a> {
    #[serde(flatten)]
    state: &'a ViewState,
    columns: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    selection: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<&'a CoordinateSeries>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Running {:?} on dataset {}", args.command, args.dataset);

    let handle = InterpreterHandle::new(Arc::new(LocalInterpreter::default()));
    let opts = ViewOpts::with_dataset(&args.dataset);

    let output = match args.command {
        Command::Columns => columns(handle, opts).await?,
        Command::Table { rows } => {
            let opts = ViewOpts {
                row_limit: rows,
                ..opts
            };
            table(handle, opts).await?
        }
        Command::Scatter { x, y } => scatter(handle, opts, x, y).await?,
        Command::Histogram { column, breaks } => {
            let opts = ViewOpts { breaks, ..opts };
            histogram(handle, opts, column).await?
        }
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

async fn columns(handle: InterpreterHandle, opts: ViewOpts) -> Result<Value> {
    let dataset = opts.dataset.clone();
    let mut view = TableView::new(handle, opts);
    view.load().await?;
    let table = view
        .table()
        .ok_or_else(|| FrameChartError::internal("Table view has no table after loading"))?;

    Ok(serde_json::to_value(ColumnsOutput {
        dataset: &dataset,
        columns: table.column_names(),
        numeric: list_numeric_columns(table),
    })?)
}

async fn table(handle: InterpreterHandle, opts: ViewOpts) -> Result<Value> {
    let mut view = TableView::new(handle, opts);
    view.load().await?;
    Ok(serde_json::to_value(TableOutput {
        state: view.state(),
        columns: view.columns(),
        rows: view.rows()?,
    })?)
}

async fn scatter(
    handle: InterpreterHandle,
    opts: ViewOpts,
    x: Option<String>,
    y: Option<String>,
) -> Result<Value> {
    let mut view = ScatterView::new(handle, opts);
    view.load().await?;
    if view.state().is_ready() {
        match (x, y) {
            (Some(x), Some(y)) => view.select(&x, &y)?,
            (Some(x), None) => view.select_x(&x)?,
            (None, Some(y)) => view.select_y(&y)?,
            (None, None) => {}
        }
    }

    let selection = view
        .selection()
        .map(|(x, y)| vec![x, y])
        .unwrap_or_default();
    Ok(serde_json::to_value(PointsOutput {
        state: view.state(),
        columns: view.columns(),
        selection,
        points: view.coordinates(),
    })?)
}

async fn histogram(
    handle: InterpreterHandle,
    opts: ViewOpts,
    column: Option<String>,
) -> Result<Value> {
    let mut view = HistogramView::new(handle, opts);
    view.load().await?;
    if let Some(column) = column {
        if view.selection() != Some(column.as_str()) {
            view.select(&column).await?;
        }
    }

    Ok(serde_json::to_value(PointsOutput {
        state: view.state(),
        columns: view.columns(),
        selection: view.selection().into_iter().collect(),
        points: view.bins(),
    })?)
}
