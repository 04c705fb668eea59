//! JSON formatter for syntax trees
//!
//! Branches serialize as `{"kind": "branch", "rule", "span", "children"}` and leaves as
//! `{"kind": "leaf", "tags", "text", "span"}`. Spans are dropped unless `show-spans` is set.

use crate::transmuter::formats::registry::{FormatError, FormatParams, Formatter};
use crate::transmuter::parsing::tree::SyntaxTree;
use serde_json::Value;

pub fn to_json_value(tree: &SyntaxTree, show_spans: bool) -> Result<Value, FormatError> {
    let mut value = serde_json::to_value(tree)
        .map_err(|err| FormatError::SerializationError(err.to_string()))?;
    if !show_spans {
        strip_spans(&mut value);
    }
    Ok(value)
}

fn strip_spans(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("span");
            map.values_mut().for_each(strip_spans);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_spans),
        _ => {}
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, tree: &SyntaxTree, params: &FormatParams) -> Result<String, FormatError> {
        let show_spans = params
            .get("show-spans")
            .map(|v| v != "false")
            .unwrap_or(false);
        let value = to_json_value(tree, show_spans)?;
        serde_json::to_string_pretty(&value)
            .map_err(|err| FormatError::SerializationError(err.to_string()))
    }

    fn description(&self) -> &str {
        "Pretty-printed JSON tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::parsing::tree::{Branch, Leaf, TreeNode};
    use crate::transmuter::range::{Position, Span};
    use serde_json::json;

    fn sample() -> SyntaxTree {
        let span = Span::new(Position::START, Position::new(1, 1, 2));
        SyntaxTree::new(Branch {
            rule: "Root".to_string(),
            span,
            children: vec![TreeNode::Leaf(Leaf {
                tags: vec!["A".to_string()],
                text: "a".to_string(),
                span,
            })],
        })
    }

    #[test]
    fn test_json_without_spans() {
        let value = to_json_value(&sample(), false).unwrap();
        assert_eq!(
            value,
            json!({
                "root": {
                    "rule": "Root",
                    "children": [
                        {"kind": "leaf", "tags": ["A"], "text": "a"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_json_with_spans() {
        let value = to_json_value(&sample(), true).unwrap();
        assert_eq!(value["root"]["span"]["end"]["column"], 2);
        assert_eq!(value["root"]["children"][0]["span"]["start"]["index"], 0);
    }
}
