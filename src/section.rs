//! # Presentation Schema
//!
//! Data-only description of how an evaluation report is laid out: an
//! ordered list of sections, each a table of typed columns over grouped
//! rows, or a raw text stream. The schema is authored with the task (not by
//! runtime code), loaded once from task metadata, and treated as immutable;
//! nothing here touches evaluation state.
//!
//! ## Forward compatibility
//!
//! Column kinds evolve with the schema. [`Column`] decodes through a raw
//! intermediate so that an unrecognized kind folds into
//! [`Column::Unsupported`] instead of failing the whole document; the
//! formatter renders such columns as an explicit placeholder.

use serde::{Deserialize, Serialize};

use crate::expr::ValueExpression;
use crate::l10n::Localized;

/// Task metadata as far as this crate is concerned: a localized title and
/// the ordered report sections. Statements, attachments and submission
/// forms live with external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub title: Localized<String>,
    #[serde(default)]
    pub evaluation_sections: Vec<Section>,
}

impl TaskMetadata {
    /// Decodes a metadata document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Table(Table),
    /// Renders the named output stream as raw text.
    TextStream { stream: String },
}

/// A table: ordered columns, rows clustered into titled groups (one per
/// subtask, typically). Every row's cells align positionally 1:1 with
/// `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub groups: Vec<RowGroup>,
}

/// A titled cluster of rows within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<RowGroupHeader>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroupHeader {
    pub title: Localized<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// # Column
///
/// A typed table column. The kind decides how the aligned cells resolve and
/// format; most kinds carry an optional localized display name for the
/// header. `row_status` is the odd one out: it contributes no visible cell,
/// only a classification label attached to the owning row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawColumn", into = "RawColumn")]
pub enum Column {
    RowName {
        name: Option<Localized<String>>,
    },
    RowNumber {
        name: Option<Localized<String>>,
    },
    RowStatus,
    TimeUsage {
        name: Option<Localized<String>>,
    },
    MemoryUsage {
        name: Option<Localized<String>>,
    },
    Score {
        name: Option<Localized<String>>,
        score_precision: Option<usize>,
        max_score_precision: Option<usize>,
    },
    Percentage {
        name: Option<Localized<String>>,
        precision: Option<usize>,
    },
    Status {
        name: Option<Localized<String>>,
    },
    Message {
        name: Option<Localized<String>>,
    },
    /// A kind this crate does not understand (e.g. `signal`,
    /// `return_code`). Kept so the rest of the table still renders.
    Unsupported {
        kind: String,
        name: Option<Localized<String>>,
    },
}

impl Column {
    /// The header display name, when the kind carries one.
    pub fn name(&self) -> Option<&Localized<String>> {
        match self {
            Self::RowName { name }
            | Self::RowNumber { name }
            | Self::TimeUsage { name }
            | Self::MemoryUsage { name }
            | Self::Score { name, .. }
            | Self::Percentage { name, .. }
            | Self::Status { name }
            | Self::Message { name }
            | Self::Unsupported { name, .. } => name.as_ref(),
            Self::RowStatus => None,
        }
    }

    /// The wire tag of this column kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::RowName { .. } => "row_name",
            Self::RowNumber { .. } => "row_number",
            Self::RowStatus => "row_status",
            Self::TimeUsage { .. } => "time_usage",
            Self::MemoryUsage { .. } => "memory_usage",
            Self::Score { .. } => "score",
            Self::Percentage { .. } => "percentage",
            Self::Status { .. } => "status",
            Self::Message { .. } => "message",
            Self::Unsupported { kind, .. } => kind,
        }
    }
}

/// Wire shape of a column: the tag plus the union of all per-kind options.
/// Deserializing through this shape is what lets unknown tags fold into
/// [`Column::Unsupported`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawColumn {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<Localized<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score_precision: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_score_precision: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    precision: Option<usize>,
}

impl From<RawColumn> for Column {
    fn from(raw: RawColumn) -> Self {
        match raw.kind.as_str() {
            "row_name" => Column::RowName { name: raw.name },
            "row_number" => Column::RowNumber { name: raw.name },
            "row_status" => Column::RowStatus,
            "time_usage" => Column::TimeUsage { name: raw.name },
            "memory_usage" => Column::MemoryUsage { name: raw.name },
            "score" => Column::Score {
                name: raw.name,
                score_precision: raw.score_precision,
                max_score_precision: raw.max_score_precision,
            },
            "percentage" => Column::Percentage {
                name: raw.name,
                precision: raw.precision,
            },
            "status" => Column::Status { name: raw.name },
            "message" => Column::Message { name: raw.name },
            _ => Column::Unsupported {
                kind: raw.kind,
                name: raw.name,
            },
        }
    }
}

impl From<Column> for RawColumn {
    fn from(column: Column) -> Self {
        let kind = column.kind().to_string();
        let mut raw = RawColumn {
            kind,
            name: None,
            score_precision: None,
            max_score_precision: None,
            precision: None,
        };
        match column {
            Column::Score {
                name,
                score_precision,
                max_score_precision,
            } => {
                raw.name = name;
                raw.score_precision = score_precision;
                raw.max_score_precision = max_score_precision;
            }
            Column::Percentage { name, precision } => {
                raw.name = name;
                raw.precision = precision;
            }
            Column::RowStatus => {}
            Column::RowName { name }
            | Column::RowNumber { name }
            | Column::TimeUsage { name }
            | Column::MemoryUsage { name }
            | Column::Status { name }
            | Column::Message { name }
            | Column::Unsupported { name, .. } => raw.name = name,
        }
        raw
    }
}

/// # Cell
///
/// One table cell, distinguished by shape rather than an explicit tag:
/// a literal row name, a literal row number, or an expression to resolve
/// against the snapshot (with an optional literal `max_score` under score
/// columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Value {
        value: ValueExpression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_score: Option<f64>,
    },
    Name { name: Localized<String> },
    Number { number: u64 },
}

impl Cell {
    pub fn value(expression: ValueExpression) -> Self {
        Self::Value {
            value: expression,
            max_score: None,
        }
    }

    pub fn scored(expression: ValueExpression, max_score: f64) -> Self {
        Self::Value {
            value: expression,
            max_score: Some(max_score),
        }
    }

    pub fn name(name: Localized<String>) -> Self {
        Self::Name { name }
    }

    pub fn number(number: u64) -> Self {
        Self::Number { number }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_column_kinds_decode() {
        let column: Column = serde_json::from_str(
            r#"{"type":"score","name":{"en":"Score"},"score_precision":2,"max_score_precision":0}"#,
        )
        .unwrap();
        assert_eq!(
            column,
            Column::Score {
                name: Some(Localized::new().with("en", "Score".to_string())),
                score_precision: Some(2),
                max_score_precision: Some(0),
            }
        );
    }

    #[test]
    fn test_unknown_column_kind_folds_to_unsupported() {
        let column: Column =
            serde_json::from_str(r#"{"type":"signal","name":{"default":"Signal"}}"#).unwrap();
        assert_eq!(
            column,
            Column::Unsupported {
                kind: "signal".to_string(),
                name: Some(Localized::unaware("Signal".to_string())),
            }
        );
        assert_eq!(column.kind(), "signal");
    }

    #[test]
    fn test_column_round_trip_preserves_options() {
        let column = Column::Percentage {
            name: None,
            precision: Some(1),
        };
        let json = serde_json::to_string(&column).unwrap();
        assert_eq!(json, r#"{"type":"percentage","precision":1}"#);
        let back: Column = serde_json::from_str(&json).unwrap();
        assert_eq!(back, column);
    }

    #[test]
    fn test_cell_shapes() {
        let value: Cell = serde_json::from_str(
            r#"{"value":{"type":"ref","ref":"subtask.1.score"},"max_score":60}"#,
        )
        .unwrap();
        assert_eq!(
            value,
            Cell::scored(ValueExpression::reference("subtask.1.score"), 60.0)
        );

        let name: Cell = serde_json::from_str(r#"{"name":{"en":"Test case 1"}}"#).unwrap();
        assert_eq!(
            name,
            Cell::name(Localized::new().with("en", "Test case 1".to_string()))
        );

        let number: Cell = serde_json::from_str(r#"{"number":3}"#).unwrap();
        assert_eq!(number, Cell::number(3));
    }

    #[test]
    fn test_section_decodes_table_and_text_stream() {
        let section: Section = serde_json::from_str(r#"{"type":"text_stream","stream":"stdout"}"#)
            .unwrap();
        assert_eq!(
            section,
            Section::TextStream {
                stream: "stdout".to_string()
            }
        );

        let table: Section = serde_json::from_str(
            r#"{
                "type": "table",
                "columns": [{"type": "row_number"}, {"type": "status"}],
                "groups": [{
                    "header": {"title": {"default": "Subtask 1"}},
                    "rows": [{"cells": [
                        {"number": 1},
                        {"value": {"type": "ref", "ref": "subtask.1.testcase.1.status"}}
                    ]}]
                }]
            }"#,
        )
        .unwrap();
        match table {
            Section::Table(table) => {
                assert_eq!(table.columns.len(), 2);
                assert_eq!(table.groups[0].rows[0].cells.len(), 2);
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_document() {
        let metadata = TaskMetadata::from_json(
            r#"{
                "title": {"en": "Test task", "it": "Task di prova"},
                "evaluation_sections": [{"type": "text_stream", "stream": "compilation"}]
            }"#,
        )
        .unwrap();
        assert_eq!(metadata.evaluation_sections.len(), 1);
    }
}
