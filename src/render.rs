//! # Cell Resolver and Formatter
//!
//! Maps the declarative schema onto an evaluation snapshot: each column
//! kind knows how to turn its aligned cell into a display value, and the
//! drivers walk sections, tables and rows producing plain data for an
//! external rendering layer. Nothing here draws anything.
//!
//! ## Dispatch
//!
//! One [`ColumnView`] implementation per column kind, selected by an
//! exhaustive match on the column variant, so adding a column kind is a
//! compile-checked decision here, and anything the schema knows but this
//! crate does not ([`Column::Unsupported`]) renders as an explicit
//! placeholder rather than failing the report.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::RenderConfig;
use crate::l10n::{localize, L10nError};
use crate::reducer::EvaluationState;
use crate::section::{Cell, Column, Row, RowGroup, Section, Table};
use crate::value::EvaluationValue;

/// What a single cell displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DisplayValue {
    /// A resolved, formatted value.
    Text(String),
    /// The referenced key has not arrived yet.
    Pending,
    /// The column kind is unknown, or the resolved value does not fit the
    /// column. Rendered as an explicit placeholder.
    Unsupported,
    /// The column contributes nothing visible in this position.
    Blank,
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Pending | Self::Blank => Ok(()),
            Self::Unsupported => write!(f, "?"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("localization failed: {0}")]
    L10n(#[from] L10nError),

    #[error("row {row} has {got} cells but the table has {expected} columns")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// A rendered section, ready for an external drawing layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderedSection {
    Table(RenderedTable),
    TextStream { stream: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTable {
    /// One header cell per column, in column order.
    pub column_headers: Vec<DisplayValue>,
    pub groups: Vec<RenderedGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedGroup {
    /// Localized group title, when the schema provides one.
    pub header: Option<String>,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    /// Classification labels contributed by `row_status` columns, for use
    /// as semantic/style hooks on the whole row.
    pub classes: Vec<String>,
    pub cells: Vec<DisplayValue>,
}

/// Everything a column view needs to produce one cell.
struct CellContext<'a> {
    column: &'a Column,
    cell: &'a Cell,
    state: &'a EvaluationState,
    config: &'a RenderConfig,
}

/// Per-column-kind rendering capability.
trait ColumnView {
    /// Header cell: the localized display name when the kind carries one.
    fn header(&self, column: &Column, config: &RenderConfig) -> RenderResult<DisplayValue> {
        match column.name() {
            Some(name) => Ok(DisplayValue::Text(
                localize(name, &config.locale)?.clone(),
            )),
            None => Ok(DisplayValue::Blank),
        }
    }

    /// Body cell.
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue>;

    /// Classification labels this cell contributes to its row.
    fn row_classes(&self, _ctx: &CellContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

/// Selects the view for a column. Exhaustive by construction.
fn column_view(column: &Column) -> &'static dyn ColumnView {
    match column {
        Column::RowName { .. } => &RowNameView,
        Column::RowNumber { .. } => &RowNumberView,
        Column::RowStatus => &RowStatusView,
        Column::TimeUsage { .. } => &TimeUsageView,
        Column::MemoryUsage { .. } => &MemoryUsageView,
        Column::Score { .. } => &ScoreView,
        Column::Percentage { .. } => &PercentageView,
        Column::Status { .. } => &StatusView,
        Column::Message { .. } => &MessageView,
        Column::Unsupported { .. } => &UnsupportedView,
    }
}

/// Outcome of resolving a cell's expression against the snapshot.
enum Resolved<'a> {
    Value(&'a EvaluationValue),
    /// The expression referenced a key that has not arrived yet.
    Pending,
    /// The cell shape carries no expression for this column kind.
    Mismatch,
}

fn resolve<'a>(ctx: &CellContext<'a>) -> Resolved<'a> {
    match ctx.cell {
        Cell::Value { value, .. } => match value.evaluate(ctx.state) {
            Some(value) => Resolved::Value(value),
            None => Resolved::Pending,
        },
        _ => Resolved::Mismatch,
    }
}

struct RowNameView;

impl ColumnView for RowNameView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match ctx.cell {
            Cell::Name { name } => Ok(DisplayValue::Text(
                localize(name, &ctx.config.locale)?.clone(),
            )),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct RowNumberView;

impl ColumnView for RowNumberView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match ctx.cell {
            Cell::Number { number } => Ok(DisplayValue::Text(number.to_string())),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

/// The one column kind with an effect beyond its own cell: it renders
/// nothing, but labels the owning row with the resolved status.
struct RowStatusView;

impl ColumnView for RowStatusView {
    fn cell(&self, _ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        Ok(DisplayValue::Blank)
    }

    fn row_classes(&self, ctx: &CellContext<'_>) -> Vec<String> {
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::Status { status }) => {
                vec!["row_status".to_string(), status.to_string()]
            }
            _ => vec!["row_status".to_string()],
        }
    }
}

struct TimeUsageView;

impl ColumnView for TimeUsageView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::TimeUsage { time_usage_seconds }) => Ok(
                DisplayValue::Text(format!("{time_usage_seconds:.3} s")),
            ),
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct MemoryUsageView;

impl ColumnView for MemoryUsageView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::MemoryUsage { memory_usage_bytes }) => {
                let kilobytes = (*memory_usage_bytes as f64 / 1e3).round() as u64;
                Ok(DisplayValue::Text(format!("{kilobytes} KB")))
            }
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct ScoreView;

impl ColumnView for ScoreView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        let (score_precision, max_score_precision) = match ctx.column {
            Column::Score {
                score_precision,
                max_score_precision,
                ..
            } => (score_precision.unwrap_or(0), *max_score_precision),
            _ => return Ok(DisplayValue::Unsupported),
        };
        let max_score = match ctx.cell {
            Cell::Value { max_score, .. } => *max_score,
            _ => None,
        };
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::Score { score }) => {
                let mut text = format!("{score:.score_precision$}");
                if let Some(max_score) = max_score {
                    // the max score inherits the value precision unless the
                    // column overrides it
                    let precision = max_score_precision.unwrap_or(score_precision);
                    text.push_str(&format!(" / {max_score:.precision$}"));
                }
                Ok(DisplayValue::Text(text))
            }
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct PercentageView;

impl ColumnView for PercentageView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        let precision = match ctx.column {
            Column::Percentage { precision, .. } => precision.unwrap_or(0),
            _ => return Ok(DisplayValue::Unsupported),
        };
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::Fraction { fraction }) => {
                let percent = fraction * 100.0;
                Ok(DisplayValue::Text(format!("{percent:.precision$}%")))
            }
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct StatusView;

impl ColumnView for StatusView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::Status { status }) => {
                Ok(DisplayValue::Text(status.to_string()))
            }
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct MessageView;

impl ColumnView for MessageView {
    fn cell(&self, ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        match resolve(ctx) {
            Resolved::Value(EvaluationValue::Message { message }) => Ok(DisplayValue::Text(
                localize(message, &ctx.config.locale)?.clone(),
            )),
            Resolved::Pending => Ok(DisplayValue::Pending),
            _ => Ok(DisplayValue::Unsupported),
        }
    }
}

struct UnsupportedView;

impl ColumnView for UnsupportedView {
    fn cell(&self, _ctx: &CellContext<'_>) -> RenderResult<DisplayValue> {
        Ok(DisplayValue::Unsupported)
    }
}

/// Renders one cell. Exposed for hosts that lay out tables themselves.
pub fn render_cell(
    column: &Column,
    cell: &Cell,
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<DisplayValue> {
    let ctx = CellContext {
        column,
        cell,
        state,
        config,
    };
    column_view(column).cell(&ctx)
}

/// Renders a whole table against a snapshot.
///
/// Fails only on schema-level problems (a row not matching the column
/// count) or a failed localization lookup; unresolved and unsupported
/// cells degrade to placeholders.
pub fn render_table(
    table: &Table,
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<RenderedTable> {
    let column_headers = table
        .columns
        .iter()
        .map(|column| column_view(column).header(column, config))
        .collect::<RenderResult<Vec<_>>>()?;

    let mut groups = Vec::with_capacity(table.groups.len());
    for group in &table.groups {
        groups.push(render_group(table, group, state, config)?);
    }

    Ok(RenderedTable {
        column_headers,
        groups,
    })
}

fn render_group(
    table: &Table,
    group: &RowGroup,
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<RenderedGroup> {
    let header = match &group.header {
        Some(header) => Some(localize(&header.title, &config.locale)?.clone()),
        None => None,
    };

    let mut rows = Vec::with_capacity(group.rows.len());
    for (index, row) in group.rows.iter().enumerate() {
        rows.push(render_row(table, row, index, state, config)?);
    }

    Ok(RenderedGroup { header, rows })
}

fn render_row(
    table: &Table,
    row: &Row,
    index: usize,
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<RenderedRow> {
    if row.cells.len() != table.columns.len() {
        return Err(RenderError::RowWidthMismatch {
            row: index,
            expected: table.columns.len(),
            got: row.cells.len(),
        });
    }

    let mut classes = Vec::new();
    let mut cells = Vec::with_capacity(row.cells.len());
    for (column, cell) in table.columns.iter().zip(&row.cells) {
        let view = column_view(column);
        let ctx = CellContext {
            column,
            cell,
            state,
            config,
        };
        classes.extend(view.row_classes(&ctx));
        cells.push(view.cell(&ctx)?);
    }

    Ok(RenderedRow { classes, cells })
}

/// Renders one section against a snapshot.
pub fn render_section(
    section: &Section,
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<RenderedSection> {
    match section {
        Section::Table(table) => Ok(RenderedSection::Table(render_table(table, state, config)?)),
        Section::TextStream { stream } => Ok(RenderedSection::TextStream {
            stream: stream.clone(),
            text: state.stream_contents(stream),
        }),
    }
}

/// Renders every section of a report in order.
pub fn render_sections(
    sections: &[Section],
    state: &EvaluationState,
    config: &RenderConfig,
) -> RenderResult<Vec<RenderedSection>> {
    sections
        .iter()
        .map(|section| render_section(section, state, config))
        .collect()
}
