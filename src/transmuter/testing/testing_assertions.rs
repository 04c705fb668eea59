//! Fluent assertion API for syntax trees

use crate::transmuter::parsing::tree::{Branch, Leaf, SyntaxTree, TreeNode};

// ============================================================================
// Entry Point
// ============================================================================

/// Create an assertion builder for a tree, positioned on its root branch
pub fn assert_tree(tree: &SyntaxTree) -> BranchAssertion<'_> {
    BranchAssertion {
        branch: &tree.root,
        context: "root".to_string(),
    }
}

// ============================================================================
// Branch Assertions
// ============================================================================

pub struct BranchAssertion<'a> {
    branch: &'a Branch,
    context: String,
}

impl<'a> BranchAssertion<'a> {
    /// Assert the rule this branch instantiates
    pub fn rule(self, expected: &str) -> Self {
        assert_eq!(
            self.branch.rule, expected,
            "{}: Expected rule '{}', found '{}'",
            self.context, expected, self.branch.rule
        );
        self
    }

    /// Assert the number of direct children (tokens and sub-branches)
    pub fn child_count(self, expected: usize) -> Self {
        let actual = self.branch.children.len();
        assert_eq!(
            actual,
            expected,
            "{}: Expected {} children, found {}: [{}]",
            self.context,
            expected,
            actual,
            summarize_children(&self.branch.children)
        );
        self
    }

    /// Assert on a specific child by index
    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        assert!(
            index < self.branch.children.len(),
            "{}: Child index {} out of bounds (branch has {} children: [{}])",
            self.context,
            index,
            self.branch.children.len(),
            summarize_children(&self.branch.children)
        );
        assertion(NodeAssertion {
            node: &self.branch.children[index],
            context: format!("{}.children[{}]", self.context, index),
        });
        self
    }

    /// Assert the texts of every token below this branch, in order
    pub fn tokens(self, expected: &[&str]) -> Self {
        let leaves = self.branch.tokens();
        let actual: Vec<&str> = leaves.iter().map(|leaf| leaf.text.as_str()).collect();
        assert_eq!(actual, expected, "{}: Token texts differ", self.context);
        self
    }

    /// Assert the token texts joined by single spaces
    pub fn text(self, expected: &str) -> Self {
        let actual = self.branch.text();
        assert_eq!(actual, expected, "{}: Text differs", self.context);
        self
    }

    /// Assert how many branches below (and including) this one instantiate `rule`
    pub fn contains_rule(self, rule: &str, expected: usize) -> Self {
        let actual = self.branch.find_all(rule).len();
        assert_eq!(
            actual, expected,
            "{}: Expected {} '{}' branches, found {}",
            self.context, expected, rule, actual
        );
        self
    }

    /// Assert the covered character range, as indices into the input
    pub fn covers(self, start: usize, end: usize) -> Self {
        let span = self.branch.span;
        assert_eq!(
            (span.start.index, span.end.index),
            (start, end),
            "{}: Expected span {}..{}, found {}",
            self.context,
            start,
            end,
            span
        );
        self
    }

    pub fn is_empty(self) -> Self {
        assert!(
            self.branch.children.is_empty(),
            "{}: Expected an empty branch, found [{}]",
            self.context,
            summarize_children(&self.branch.children)
        );
        self
    }
}

// ============================================================================
// Node Assertions
// ============================================================================

pub struct NodeAssertion<'a> {
    node: &'a TreeNode,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn assert_branch(self) -> BranchAssertion<'a> {
        match self.node {
            TreeNode::Branch(branch) => BranchAssertion {
                branch,
                context: self.context,
            },
            other => panic!(
                "{}: Expected branch, found {}",
                self.context,
                summarize_node(other)
            ),
        }
    }

    pub fn assert_leaf(self) -> LeafAssertion<'a> {
        match self.node {
            TreeNode::Leaf(leaf) => LeafAssertion {
                leaf,
                context: self.context,
            },
            other => panic!(
                "{}: Expected leaf, found {}",
                self.context,
                summarize_node(other)
            ),
        }
    }
}

// ============================================================================
// Leaf Assertions
// ============================================================================

pub struct LeafAssertion<'a> {
    leaf: &'a Leaf,
    context: String,
}

impl LeafAssertion<'_> {
    /// Assert the token carries `expected` among its tags
    pub fn tag(self, expected: &str) -> Self {
        assert!(
            self.leaf.has_tag(expected),
            "{}: Expected tag '{}', found [{}]",
            self.context,
            expected,
            self.leaf.tags.join(", ")
        );
        self
    }

    /// Assert the exact tag set, in lexicon order
    pub fn tags(self, expected: &[&str]) -> Self {
        assert_eq!(self.leaf.tags, expected, "{}: Tags differ", self.context);
        self
    }

    pub fn text(self, expected: &str) -> Self {
        assert_eq!(
            self.leaf.text, expected,
            "{}: Expected text {:?}, found {:?}",
            self.context, expected, self.leaf.text
        );
        self
    }

    /// Assert the token starts at the given line and column
    pub fn starts_at(self, line: usize, column: usize) -> Self {
        let start = self.leaf.span.start;
        assert_eq!(
            (start.line, start.column),
            (line, column),
            "{}: Expected token to start at {}:{}, found {}",
            self.context,
            line,
            column,
            start
        );
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn summarize_node(node: &TreeNode) -> String {
    match node {
        TreeNode::Branch(branch) => format!("Branch({})", branch.rule),
        TreeNode::Leaf(leaf) => format!("Leaf({} {:?})", leaf.tags.join("|"), leaf.text),
    }
}

fn summarize_children(children: &[TreeNode]) -> String {
    children
        .iter()
        .map(summarize_node)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::range::{Position, Span};

    fn sample() -> SyntaxTree {
        let a = Span::new(Position::START, Position::new(1, 1, 2));
        let b = Span::new(Position::new(2, 1, 3), Position::new(3, 1, 4));
        SyntaxTree::new(Branch {
            rule: "Root".to_string(),
            span: a.cover(&b),
            children: vec![
                TreeNode::Leaf(Leaf {
                    tags: vec!["A".to_string()],
                    text: "a".to_string(),
                    span: a,
                }),
                TreeNode::Branch(Branch {
                    rule: "Tail".to_string(),
                    span: b,
                    children: vec![TreeNode::Leaf(Leaf {
                        tags: vec!["B".to_string()],
                        text: "b".to_string(),
                        span: b,
                    })],
                }),
            ],
        })
    }

    #[test]
    fn test_fluent_navigation() {
        let tree = sample();
        assert_tree(&tree)
            .rule("Root")
            .child_count(2)
            .covers(0, 3)
            .tokens(&["a", "b"])
            .text("a b")
            .contains_rule("Tail", 1)
            .child(0, |child| {
                child.assert_leaf().tag("A").text("a").starts_at(1, 1);
            })
            .child(1, |child| {
                child
                    .assert_branch()
                    .rule("Tail")
                    .child(0, |leaf| {
                        leaf.assert_leaf().tags(&["B"]).starts_at(1, 3);
                    });
            });
    }

    #[test]
    #[should_panic(expected = "root.children[0]: Expected branch, found Leaf(A \"a\")")]
    fn test_wrong_node_kind_names_path() {
        let tree = sample();
        assert_tree(&tree).child(0, |child| {
            child.assert_branch();
        });
    }

    #[test]
    #[should_panic(expected = "Expected 3 children, found 2: [Leaf(A \"a\"), Branch(Tail)]")]
    fn test_child_count_summarises_children() {
        let tree = sample();
        assert_tree(&tree).child_count(3);
    }
}
