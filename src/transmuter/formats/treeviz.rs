//! Treeviz formatter for syntax trees
//!
//! One line per node, nesting encoded as indentation with connectors, 2 columns per level:
//!
//!     § Root
//!     ├─ ◦ A "a"
//!     └─ § Tail
//!       └─ ◦ B "b"
//!
//! Branches show their rule name, leaves their tags (joined by `|`) and quoted text.
//! With `show-spans` each line ends with the node's `line:column` span.

use crate::transmuter::formats::registry::{FormatError, FormatParams, Formatter};
use crate::transmuter::parsing::tree::{SyntaxTree, TreeNode};
use crate::transmuter::range::Span;

const BRANCH_ICON: &str = "§";
const LEAF_ICON: &str = "◦";

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn label(node: &TreeNode) -> String {
    match node {
        TreeNode::Branch(branch) => format!("{} {}", BRANCH_ICON, branch.rule),
        TreeNode::Leaf(leaf) => format!(
            "{} {} {:?}",
            LEAF_ICON,
            leaf.tags.join("|"),
            truncate(&leaf.text, 30)
        ),
    }
}

fn span_suffix(span: Span, show_spans: bool) -> String {
    if show_spans {
        format!(" @{}", span)
    } else {
        String::new()
    }
}

fn format_node(node: &TreeNode, prefix: &str, is_last: bool, show_spans: bool, out: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    out.push_str(&format!(
        "{}{} {}{}\n",
        prefix,
        connector,
        label(node),
        span_suffix(node.span(), show_spans)
    ));

    if let TreeNode::Branch(branch) = node {
        let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
        let count = branch.children.len();
        for (i, child) in branch.children.iter().enumerate() {
            format_node(child, &child_prefix, i + 1 == count, show_spans, out);
        }
    }
}

pub fn to_treeviz_str(tree: &SyntaxTree) -> String {
    to_treeviz_str_with_params(tree, &FormatParams::new())
}

pub fn to_treeviz_str_with_params(tree: &SyntaxTree, params: &FormatParams) -> String {
    let show_spans = params
        .get("show-spans")
        .map(|v| v != "false")
        .unwrap_or(false);

    let mut output = format!(
        "{} {}{}\n",
        BRANCH_ICON,
        tree.rule(),
        span_suffix(tree.span(), show_spans)
    );
    let count = tree.children().len();
    for (i, child) in tree.children().iter().enumerate() {
        format_node(child, "", i + 1 == count, show_spans, &mut output);
    }
    output
}

pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn serialize(&self, tree: &SyntaxTree, params: &FormatParams) -> Result<String, FormatError> {
        Ok(to_treeviz_str_with_params(tree, params))
    }

    fn description(&self) -> &str {
        "Indented tree with one node per line"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::parsing::tree::{Branch, Leaf};
    use crate::transmuter::range::Position;

    fn span(from: usize, to: usize) -> Span {
        Span::new(Position::new(from, 1, from + 1), Position::new(to, 1, to + 1))
    }

    fn leaf(tag: &str, text: &str, from: usize) -> TreeNode {
        TreeNode::Leaf(Leaf {
            tags: vec![tag.to_string()],
            text: text.to_string(),
            span: span(from, from + text.len()),
        })
    }

    fn sample() -> SyntaxTree {
        SyntaxTree::new(Branch {
            rule: "Root".to_string(),
            span: span(0, 2),
            children: vec![
                leaf("A", "a", 0),
                TreeNode::Branch(Branch {
                    rule: "Tail".to_string(),
                    span: span(1, 2),
                    children: vec![leaf("B", "b", 1)],
                }),
            ],
        })
    }

    #[test]
    fn test_treeviz_layout() {
        insta::assert_snapshot!(to_treeviz_str(&sample()), @r###"
        § Root
        ├─ ◦ A "a"
        └─ § Tail
          └─ ◦ B "b"
        "###);
    }

    #[test]
    fn test_treeviz_spans() {
        let params = FormatParams::from([("show-spans".to_string(), "true".to_string())]);
        let output = to_treeviz_str_with_params(&sample(), &params);

        assert!(output.starts_with("§ Root @1:1..1:3\n"));
        assert!(output.contains("◦ B \"b\" @1:2..1:3"));
    }

    #[test]
    fn test_long_text_truncated() {
        let text = "x".repeat(40);
        let line = label(&leaf("Word", &text, 0));
        assert!(line.ends_with("...\""));
    }
}
