//! Value expressions: the schema's way of pointing at snapshot data. A cell
//! holds either a literal value or a reference to a key that the evaluation
//! may or may not have produced yet.

use serde::{Deserialize, Serialize};

use crate::reducer::EvaluationState;
use crate::value::EvaluationValue;

/// A constant-or-reference expression, tagged on the wire by its `type`
/// field:
///
/// ```json
/// {"type": "constant", "constant": {"type": "score", "score": 60.0}}
/// {"type": "ref", "ref": "subtask.1.testcase.2.time_usage"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueExpression {
    Constant { constant: EvaluationValue },
    Ref {
        #[serde(rename = "ref")]
        key: String,
    },
}

impl ValueExpression {
    pub fn constant(value: EvaluationValue) -> Self {
        Self::Constant { constant: value }
    }

    pub fn reference(key: impl Into<String>) -> Self {
        Self::Ref { key: key.into() }
    }

    /// Resolves this expression against a snapshot.
    ///
    /// A constant resolves to itself regardless of state. A reference
    /// resolves to the bound value, or `None` when the key has not arrived
    /// yet; live evaluation delivers keys in no particular order, so a
    /// missing key is an expected intermediate condition, not an error.
    /// Safe to call repeatedly against successive snapshots.
    pub fn evaluate<'a>(&'a self, state: &'a EvaluationState) -> Option<&'a EvaluationValue> {
        match self {
            Self::Constant { constant } => Some(constant),
            Self::Ref { key } => state.value(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EvaluationEvent;
    use crate::reducer::EvaluationReducer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constant_ignores_state() {
        let expr = ValueExpression::constant(EvaluationValue::score(60.0));
        let empty = EvaluationState::default();

        let mut reducer = EvaluationReducer::initial();
        reducer
            .apply_event(&EvaluationEvent::value("k", EvaluationValue::score(1.0)))
            .unwrap();

        assert_eq!(expr.evaluate(&empty), Some(&EvaluationValue::score(60.0)));
        assert_eq!(
            expr.evaluate(reducer.state()),
            Some(&EvaluationValue::score(60.0))
        );
    }

    #[test]
    fn test_reference_resolves_or_is_none() {
        let expr = ValueExpression::reference("my_score");
        let empty = EvaluationState::default();
        assert_eq!(expr.evaluate(&empty), None);

        let mut reducer = EvaluationReducer::initial();
        reducer
            .apply_event(&EvaluationEvent::value(
                "my_score",
                EvaluationValue::score(2.4),
            ))
            .unwrap();
        assert_eq!(
            expr.evaluate(reducer.state()),
            Some(&EvaluationValue::score(2.4))
        );
    }

    #[test]
    fn test_wire_shape() {
        let expr = ValueExpression::reference("test_case.1.total_score");
        assert_eq!(
            serde_json::to_string(&expr).unwrap(),
            r#"{"type":"ref","ref":"test_case.1.total_score"}"#
        );

        let constant: ValueExpression =
            serde_json::from_str(r#"{"type":"constant","constant":{"type":"fraction","fraction":0.5}}"#)
                .unwrap();
        assert_eq!(
            constant,
            ValueExpression::constant(EvaluationValue::fraction(0.5))
        );
    }
}
