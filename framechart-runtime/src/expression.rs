//! The small subset of R expressions understood by `LocalInterpreter`:
//!
//! ```text
//! iris
//! iris$Sepal.Length      survey$`Sepal Length`
//! head(iris)            head(iris, 10)          head(iris, n = -5)
//! head(iris, 10)$Sepal.Width
//! hist(iris$Sepal.Length, plot = FALSE)
//! hist(head(iris, 10)$Sepal.Length, breaks = 20, plot = FALSE)
//! ```
use crate::stats::hist::MAX_CLASSES;
use framechart_common::error::{FrameChartError, Result};
use framechart_core::adapter::quote_name;
use regex::Regex;
use std::fmt::{Display, Formatter};

const IDENT: &str = r"[A-Za-z.][A-Za-z0-9._]*|`[^`]+`";
const DEFAULT_HEAD_ROWS: i64 = 6;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(&format!(r"^(?:{IDENT})$")).unwrap();
    static ref CALL_RE: Regex = Regex::new(&format!(r"^({IDENT})\s*\((.*)\)$")).unwrap();
    static ref NAMED_ARG_RE: Regex = Regex::new(&format!(r"^({IDENT})\s*=\s*(.+)$")).unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Symbol(String),
    Column {
        data: Box<Expr>,
        column: String,
    },
    /// First `n` rows, or all but the last `-n` rows when negative
    Head {
        data: Box<Expr>,
        n: i64,
    },
    Hist {
        data: Box<Expr>,
        column: String,
        breaks: Option<i64>,
    },
}

impl Expr {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if NAME_RE.is_match(text) {
            return Ok(Expr::Symbol(unquote(text).to_string()));
        }
        if let Some(&at) = top_level(text, '$')?.last() {
            let column = text[at + 1..].trim();
            if !NAME_RE.is_match(column) {
                return Err(FrameChartError::parse(format!(
                    "invalid column name after $: {column}"
                )));
            }
            return Ok(Expr::Column {
                data: Box::new(Expr::parse(&text[..at])?),
                column: unquote(column).to_string(),
            });
        }
        if let Some(caps) = CALL_RE.captures(text) {
            let args = Args::parse(&caps[2])?;
            return match unquote(&caps[1]) {
                "head" => parse_head(args),
                "hist" => parse_hist(args),
                function => Err(FrameChartError::parse(format!(
                    "could not find function \"{function}\""
                ))),
            };
        }
        Err(FrameChartError::parse(format!(
            "Unsupported expression: {text}"
        )))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Symbol(data) => write!(f, "{}", quote_name(data)),
            Expr::Column { data, column } => write!(f, "{data}${}", quote_name(column)),
            Expr::Head { data, n } => write!(f, "head({data}, {n})"),
            Expr::Hist {
                data,
                column,
                breaks: Some(breaks),
            } => write!(
                f,
                "hist({data}${}, breaks = {breaks}, plot = FALSE)",
                quote_name(column)
            ),
            Expr::Hist { data, column, .. } => {
                write!(f, "hist({data}${}, plot = FALSE)", quote_name(column))
            }
        }
    }
}

fn unquote(name: &str) -> &str {
    name.strip_prefix('`')
        .and_then(|name| name.strip_suffix('`'))
        .unwrap_or(name)
}

/// Byte offsets of `separator` outside parentheses, strings and backquoted names
fn top_level(text: &str, separator: char) -> Result<Vec<usize>> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '`' | '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    FrameChartError::parse(format!("unexpected ')' in {text}"))
                })?;
            }
            (None, c) if c == separator && depth == 0 => found.push(i),
            _ => {}
        }
    }
    if depth > 0 || quote.is_some() {
        return Err(FrameChartError::parse(format!(
            "unexpected end of input in {text}"
        )));
    }
    Ok(found)
}

#[derive(Debug, Default)]
struct Args<'a> {
    positional: Vec<&'a str>,
    named: Vec<(&'a str, &'a str)>,
}

impl<'a> Args<'a> {
    fn parse(text: &'a str) -> Result<Self> {
        let mut args = Args::default();
        if text.trim().is_empty() {
            return Ok(args);
        }

        let mut start = 0;
        let mut pieces = Vec::new();
        for at in top_level(text, ',')? {
            pieces.push(&text[start..at]);
            start = at + 1;
        }
        pieces.push(&text[start..]);

        for arg in pieces.into_iter().map(str::trim) {
            if arg.is_empty() {
                return Err(FrameChartError::parse("argument is missing"));
            }
            match NAMED_ARG_RE.captures(arg) {
                Some(caps) => {
                    let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                        return Err(FrameChartError::parse(format!("Malformed argument {arg}")));
                    };
                    args.named.push((unquote(name.as_str()), value.as_str().trim()));
                }
                None => args.positional.push(arg),
            }
        }
        Ok(args)
    }

    /// Value of an argument given either by name or at `position`
    fn take(&mut self, name: &str, position: usize) -> Option<&'a str> {
        if let Some(i) = self.named.iter().position(|(n, _)| *n == name) {
            return Some(self.named.remove(i).1);
        }
        if position < self.positional.len() {
            return Some(self.positional.remove(position));
        }
        None
    }

    fn ensure_consumed(&self, function: &str) -> Result<()> {
        if let Some((name, _)) = self.named.first() {
            return Err(FrameChartError::parse(format!(
                "unused argument ({name}) in {function}()"
            )));
        }
        if let Some(arg) = self.positional.first() {
            return Err(FrameChartError::parse(format!(
                "unused argument ({arg}) in {function}()"
            )));
        }
        Ok(())
    }
}

fn parse_head(mut args: Args) -> Result<Expr> {
    let data = args
        .take("x", 0)
        .ok_or_else(|| FrameChartError::parse("argument \"x\" is missing in head()"))?;
    let data = Box::new(Expr::parse(data)?);
    let n = match args.take("n", 0) {
        Some(n) => parse_integer(n, "n")?,
        None => DEFAULT_HEAD_ROWS,
    };
    args.ensure_consumed("head")?;
    Ok(Expr::Head { data, n })
}

fn parse_hist(mut args: Args) -> Result<Expr> {
    let x = args
        .take("x", 0)
        .ok_or_else(|| FrameChartError::parse("argument \"x\" is missing in hist()"))?;
    let (data, column) = match Expr::parse(x)? {
        Expr::Column { data, column } => (data, column),
        other => {
            return Err(FrameChartError::parse(format!(
                "hist() expects a data frame column, received {other}"
            )))
        }
    };

    let breaks = args
        .take("breaks", 0)
        .map(|breaks| parse_integer(breaks, "breaks"))
        .transpose()?;
    if let Some(breaks) = breaks.filter(|breaks| *breaks > MAX_CLASSES) {
        return Err(FrameChartError::parse(format!(
            "'breaks' must be at most {MAX_CLASSES}, found {breaks}"
        )));
    }

    let plot = match args.take("plot", 0) {
        Some(plot) => parse_logical(plot, "plot")?,
        None => true,
    };
    if plot {
        return Err(FrameChartError::parse(
            "hist() can only be evaluated with plot = FALSE, there is no graphics device",
        ));
    }

    args.ensure_consumed("hist")?;
    Ok(Expr::Hist {
        data,
        column,
        breaks,
    })
}

fn parse_integer(text: &str, name: &str) -> Result<i64> {
    let value: f64 = text
        .parse()
        .map_err(|_| FrameChartError::parse(format!("'{name}' must be a number, found {text}")))?;
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(FrameChartError::parse(format!(
            "'{name}' must be a whole number, found {text}"
        )));
    }
    Ok(value as i64)
}

fn parse_logical(text: &str, name: &str) -> Result<bool> {
    match text {
        "TRUE" | "T" => Ok(true),
        "FALSE" | "F" => Ok(false),
        _ => Err(FrameChartError::parse(format!(
            "'{name}' must be TRUE or FALSE, found {text}"
        ))),
    }
}
