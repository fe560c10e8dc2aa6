//! AST-backed rules for JSX tags and attributes.
//!
//! Text matching is unsafe for attribute surgery: formatting, attribute
//! order, and line breaks all vary. These rules parse the file with the
//! tree-sitter TSX grammar, locate elements by tag name, and rewrite matched
//! nodes as byte-span edits applied in reverse order. A file that fails to
//! parse is never mutated by a guess; the rule returns a parse error and the
//! engine reports the file as errored.

use crate::error::{CodemodError, Result};
use crate::rules::Rule;
use std::path::Path;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

fn tsx_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn parse_tsx(source: &str, path: &Path) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tsx_language())
        .map_err(|e| CodemodError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to set grammar: {e}"),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| CodemodError::Parse {
        path: path.to_path_buf(),
        message: "parser returned no tree".to_string(),
    })?;

    if tree.root_node().has_error() {
        return Err(CodemodError::Parse {
            path: path.to_path_buf(),
            message: "source contains syntax errors".to_string(),
        });
    }

    Ok(tree)
}

/// A pending byte-span replacement.
struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Applies edits right-to-left so earlier spans stay valid. Overlapping
/// edits are dropped; the fixpoint loop picks up whatever remains.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start));
    let mut result = source.to_string();
    let mut applied_start = usize::MAX;
    for edit in edits {
        if edit.end > applied_start {
            continue;
        }
        applied_start = edit.start;
        result.replace_range(edit.start..edit.end, &edit.replacement);
    }
    result
}

/// One attribute of a located element.
struct Attr<'a> {
    node: Node<'a>,
    name_node: Node<'a>,
    name: String,
    value_text: Option<String>,
}

fn element_attrs<'a>(element: Node<'a>, source: &str) -> Vec<Attr<'a>> {
    let mut attrs = Vec::new();
    let mut cursor = element.walk();
    for child in element.named_children(&mut cursor) {
        if child.kind() != "jsx_attribute" {
            continue;
        }
        let Some(name_node) = child.named_child(0) else {
            continue;
        };
        let name = source[name_node.byte_range()].to_string();
        let value_text = child
            .named_child(1)
            .map(|v| source[v.byte_range()].to_string());
        attrs.push(Attr {
            node: child,
            name_node,
            name,
            value_text,
        });
    }
    attrs
}

/// Span of an attribute plus the whitespace separating it from what precedes
/// it, so removal does not leave a double space behind.
fn attr_removal_span(attr: &Attr<'_>, source: &str) -> (usize, usize) {
    let bytes = source.as_bytes();
    let mut start = attr.node.start_byte();
    while start > 0 && bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    (start, attr.node.end_byte())
}

const OPENING_QUERY: &str = r"[
  (jsx_opening_element name: (identifier) @tag)
  (jsx_self_closing_element name: (identifier) @tag)
]";

/// An operation on one attribute of a matched tag.
enum AttrOp {
    Rename { from: String, to: String },
    Fold { from: String, into: String },
    Remove { name: String },
}

/// Renames, folds, or removes attributes on every element with a given tag
/// name, regardless of formatting or attribute order.
pub struct TagRewrite {
    id: String,
    tag: String,
    ops: Vec<AttrOp>,
}

impl TagRewrite {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            ops: Vec::new(),
        }
    }

    /// Renames an attribute. Elements that already carry the new name are
    /// left alone, which keeps the rule idempotent.
    pub fn rename_attr(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.ops.push(AttrOp::Rename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Folds one attribute's value into another: the source attribute is
    /// removed, and its value becomes the destination attribute's value
    /// (creating the destination if it is absent).
    pub fn fold_attr(mut self, from: impl Into<String>, into: impl Into<String>) -> Self {
        self.ops.push(AttrOp::Fold {
            from: from.into(),
            into: into.into(),
        });
        self
    }

    /// Removes an attribute outright.
    pub fn remove_attr(mut self, name: impl Into<String>) -> Self {
        self.ops.push(AttrOp::Remove { name: name.into() });
        self
    }

    fn edits_for_element(&self, element: Node<'_>, source: &str, edits: &mut Vec<Edit>) {
        let attrs = element_attrs(element, source);

        for op in &self.ops {
            match op {
                AttrOp::Rename { from, to } => {
                    if attrs.iter().any(|a| a.name == *to) {
                        continue;
                    }
                    for attr in attrs.iter().filter(|a| a.name == *from) {
                        edits.push(Edit {
                            start: attr.name_node.start_byte(),
                            end: attr.name_node.end_byte(),
                            replacement: to.clone(),
                        });
                    }
                }
                AttrOp::Fold { from, into } => {
                    let Some(src) = attrs.iter().find(|a| a.name == *from) else {
                        continue;
                    };
                    match attrs.iter().find(|a| a.name == *into) {
                        Some(dst) => {
                            let replacement = match &src.value_text {
                                Some(value) => format!("{into}={value}"),
                                None => into.clone(),
                            };
                            edits.push(Edit {
                                start: dst.node.start_byte(),
                                end: dst.node.end_byte(),
                                replacement,
                            });
                            let (start, end) = attr_removal_span(src, source);
                            edits.push(Edit {
                                start,
                                end,
                                replacement: String::new(),
                            });
                        }
                        None => {
                            edits.push(Edit {
                                start: src.name_node.start_byte(),
                                end: src.name_node.end_byte(),
                                replacement: into.clone(),
                            });
                        }
                    }
                }
                AttrOp::Remove { name } => {
                    for attr in attrs.iter().filter(|a| a.name == *name) {
                        let (start, end) = attr_removal_span(attr, source);
                        edits.push(Edit {
                            start,
                            end,
                            replacement: String::new(),
                        });
                    }
                }
            }
        }
    }
}

impl Rule for TagRewrite {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        source.contains(&format!("<{}", self.tag))
    }

    fn apply(&self, source: &str, path: &Path) -> Result<String> {
        let tree = parse_tsx(source, path)?;
        let query = Query::new(&tsx_language(), OPENING_QUERY)?;
        let source_bytes = source.as_bytes();

        let mut edits = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut query_matches = cursor.matches(&query, tree.root_node(), source_bytes);
        while let Some(query_match) = query_matches.next() {
            for capture in query_match.captures {
                let tag_node = capture.node;
                if &source[tag_node.byte_range()] != self.tag {
                    continue;
                }
                let Some(element) = tag_node.parent() else {
                    continue;
                };
                self.edits_for_element(element, source, &mut edits);
            }
        }

        Ok(apply_edits(source, edits))
    }

    fn describe(&self) -> String {
        format!("rewrite {} attribute(s) on <{}>", self.ops.len(), self.tag)
    }
}

/// Replaces a wrapper element with its children, e.g.
/// `<Layout>{page}</Layout>` becomes `{page}`.
///
/// Only the outermost matching element is unwrapped per pass; the engine's
/// fixpoint handles nested wrappers.
pub struct UnwrapTag {
    id: String,
    tag: String,
}

impl UnwrapTag {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}

impl Rule for UnwrapTag {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        source.contains(&format!("<{}", self.tag))
    }

    fn apply(&self, source: &str, path: &Path) -> Result<String> {
        let tree = parse_tsx(source, path)?;
        let query = Query::new(
            &tsx_language(),
            r"(jsx_element (jsx_opening_element name: (identifier) @tag)) @element",
        )?;
        let element_index = query
            .capture_index_for_name("element")
            .expect("query declares @element");
        let tag_index = query
            .capture_index_for_name("tag")
            .expect("query declares @tag");

        let mut spans: Vec<(usize, usize, String)> = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut query_matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
        while let Some(query_match) = query_matches.next() {
            let mut element: Option<Node<'_>> = None;
            let mut tag_matches = false;
            for capture in query_match.captures {
                if capture.index == element_index {
                    element = Some(capture.node);
                } else if capture.index == tag_index {
                    tag_matches = &source[capture.node.byte_range()] == self.tag;
                }
            }
            let (Some(element), true) = (element, tag_matches) else {
                continue;
            };
            if element.named_child_count() < 2 {
                continue;
            }
            let Some(opening) = element.named_child(0) else {
                continue;
            };
            let last = (element.named_child_count() - 1) as u32;
            let Some(closing) = element.named_child(last) else {
                continue;
            };
            if closing.kind() != "jsx_closing_element" {
                continue;
            }
            let inner = source[opening.end_byte()..closing.start_byte()]
                .trim()
                .to_string();
            spans.push((element.start_byte(), element.end_byte(), inner));
        }

        // Keep only outermost matches; nested wrappers are unwrapped by the
        // next fixpoint iteration.
        spans.sort_by_key(|(start, _, _)| *start);
        let mut edits = Vec::new();
        let mut last_end = 0usize;
        for (start, end, inner) in spans {
            if start < last_end {
                continue;
            }
            last_end = end;
            edits.push(Edit {
                start,
                end,
                replacement: inner,
            });
        }

        Ok(apply_edits(source, edits))
    }

    fn describe(&self) -> String {
        format!("unwrap <{}> elements, keeping their children", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("widget.tsx")
    }

    #[test]
    fn rename_attribute_ignores_formatting() {
        let source = "export const W = () => (\n  <ChartCard\n    legacy\n    data={rows}\n  />\n);\n";
        let rule = TagRewrite::new("chart-data-to-series", "ChartCard").rename_attr("data", "series");
        let out = rule.apply(source, &path()).unwrap();
        assert!(out.contains("series={rows}"));
        assert!(!out.contains("data={rows}"));
        assert!(out.contains("legacy"));
    }

    #[test]
    fn rename_skips_when_target_exists() {
        let source = "const W = () => <ChartCard data={a} series={b} />;\n";
        let rule = TagRewrite::new("chart-data-to-series", "ChartCard").rename_attr("data", "series");
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn rename_only_touches_named_tag() {
        let source = "const W = () => (<div><Other data={a} /><ChartCard data={b} /></div>);\n";
        let rule = TagRewrite::new("chart-data-to-series", "ChartCard").rename_attr("data", "series");
        let out = rule.apply(source, &path()).unwrap();
        assert!(out.contains("<Other data={a} />"));
        assert!(out.contains("<ChartCard series={b} />"));
    }

    #[test]
    fn remove_attribute() {
        let source = "const W = () => <ChartCard legacy data={rows} />;\n";
        let rule = TagRewrite::new("drop-legacy", "ChartCard").remove_attr("legacy");
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, "const W = () => <ChartCard data={rows} />;\n");
    }

    #[test]
    fn fold_into_existing_attribute() {
        let source = "const W = () => <ChartCard title=\"Revenue\" subtitle=\"Monthly\" />;\n";
        let rule = TagRewrite::new("fold-subtitle", "ChartCard").fold_attr("subtitle", "title");
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, "const W = () => <ChartCard title=\"Monthly\" />;\n");
    }

    #[test]
    fn fold_into_missing_attribute_renames() {
        let source = "const W = () => <ChartCard subtitle=\"Monthly\" />;\n";
        let rule = TagRewrite::new("fold-subtitle", "ChartCard").fold_attr("subtitle", "title");
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, "const W = () => <ChartCard title=\"Monthly\" />;\n");
    }

    #[test]
    fn fold_is_idempotent() {
        let source = "const W = () => <ChartCard title=\"A\" subtitle=\"B\" />;\n";
        let rule = TagRewrite::new("fold-subtitle", "ChartCard").fold_attr("subtitle", "title");
        let once = rule.apply(source, &path()).unwrap();
        let twice = rule.apply(&once, &path()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unwrap_keeps_children() {
        let source = "const page = (\n  <Layout>\n    <Dashboard />\n  </Layout>\n);\n";
        let rule = UnwrapTag::new("unwrap-layout", "Layout");
        let out = rule.apply(source, &path()).unwrap();
        assert!(out.contains("<Dashboard />"));
        assert!(!out.contains("Layout"));
    }

    #[test]
    fn unwrap_nested_needs_two_passes() {
        let source = "const page = (<Layout><Layout><X /></Layout></Layout>);\n";
        let rule = UnwrapTag::new("unwrap-layout", "Layout");
        let once = rule.apply(source, &path()).unwrap();
        assert!(once.contains("<Layout><X /></Layout>"));
        let twice = rule.apply(&once, &path()).unwrap();
        assert_eq!(twice, "const page = (<X />);\n");
    }

    #[test]
    fn parse_failure_is_an_error() {
        let source = "const broken = <ChartCard data={ ;\n";
        let rule = TagRewrite::new("drop-legacy", "ChartCard").remove_attr("legacy");
        let err = rule.apply(source, &path()).unwrap_err();
        assert!(matches!(err, CodemodError::Parse { .. }));
    }
}
