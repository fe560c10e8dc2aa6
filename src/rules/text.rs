//! Text-level rules built on regex matching and balanced-block extraction.

use super::Rule;
use crate::balance;
use crate::error::Result;
use log::warn;
use regex::Regex;
use std::path::Path;

/// Regex replacement rule.
///
/// The idempotence contract is on the pattern: the replacement text must not
/// itself match the pattern, otherwise the engine's bounded fixpoint will cut
/// the rule off after one pass per input byte.
pub struct PatternRule {
    id: String,
    pattern: Regex,
    replacement: String,
}

impl PatternRule {
    pub fn new(id: impl Into<String>, pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }
}

impl Rule for PatternRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        self.pattern.is_match(source)
    }

    fn apply(&self, source: &str, _path: &Path) -> Result<String> {
        Ok(self
            .pattern
            .replace_all(source, self.replacement.as_str())
            .into_owned())
    }

    fn describe(&self) -> String {
        format!(
            "replace pattern '{}' with '{}'",
            self.pattern.as_str(),
            self.replacement
        )
    }
}

/// Removes whole assignment statements whose extent is found by balanced
/// extraction rather than by pattern alone.
///
/// The anchor regex locates the head of the assignment (e.g.
/// `Foo.getLayout\s*=`); from the end of that match the scanner walks
/// balanced groups, strings, templates, and comments until the terminating
/// `;`. The removal covers whole lines and collapses at most one run of
/// blank lines left behind. An occurrence whose extent cannot be determined
/// is left byte-for-byte untouched; other occurrences still apply.
pub struct StripAssignmentRule {
    id: String,
    anchor: Regex,
}

impl StripAssignmentRule {
    pub fn new(id: impl Into<String>, anchor: &str) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            anchor: Regex::new(anchor)?,
        })
    }
}

impl Rule for StripAssignmentRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        self.anchor.is_match(source)
    }

    fn apply(&self, source: &str, path: &Path) -> Result<String> {
        let bytes = source.as_bytes();
        let mut out = String::with_capacity(source.len());
        let mut last = 0usize;

        for m in self.anchor.find_iter(source) {
            if m.start() < last {
                continue;
            }

            let end = match balance::statement_end(source, m.end()) {
                Ok(end) => end,
                Err(err) => {
                    warn!(
                        "{}: '{}' leaving occurrence at byte {} untouched: {}",
                        path.display(),
                        self.id,
                        m.start(),
                        err
                    );
                    continue;
                }
            };

            let line_start = source[..m.start()]
                .rfind('\n')
                .map(|p| p + 1)
                .unwrap_or(0);

            // Take the rest of the statement's final line with it.
            let mut cut_end = end;
            while cut_end < bytes.len()
                && (bytes[cut_end] == b' ' || bytes[cut_end] == b'\t' || bytes[cut_end] == b'\r')
            {
                cut_end += 1;
            }
            if cut_end < bytes.len() && bytes[cut_end] == b'\n' {
                cut_end += 1;
            }

            out.push_str(&source[last..line_start]);
            last = cut_end;

            // If the removal joined a blank line above to blank lines below,
            // keep a single blank line.
            if out.ends_with("\n\n") {
                while source[last..].starts_with('\n') {
                    last += 1;
                }
            }
        }

        out.push_str(&source[last..]);
        Ok(out)
    }

    fn describe(&self) -> String {
        format!("strip assignments anchored at '{}'", self.anchor.as_str())
    }
}

/// Deletes the import of a symbol once nothing else in the file refers to it.
///
/// Handles default imports, sole named imports (whole line removed), and a
/// symbol inside a multi-name import list (just the symbol removed). A file
/// that still uses the symbol anywhere outside import lines is left alone,
/// which is what makes this rule safe to order after the rules that remove
/// the symbol's uses.
pub struct RemoveImportRule {
    id: String,
    usage: Regex,
    whole_line: Regex,
    list_leading: Regex,
    list_trailing: Regex,
}

impl RemoveImportRule {
    pub fn new(id: impl Into<String>, symbol: &str) -> Result<Self> {
        let sym = regex::escape(symbol);
        Ok(Self {
            id: id.into(),
            usage: Regex::new(&format!(r"\b{sym}\b"))?,
            whole_line: Regex::new(&format!(
                r#"(?m)^[ \t]*import\s+(?:{sym}|\{{\s*{sym}\s*\}})\s+from\s+[^\n]*\n?"#
            ))?,
            list_leading: Regex::new(&format!(r"\b{sym}\b\s*,\s*"))?,
            list_trailing: Regex::new(&format!(r",\s*\b{sym}\b"))?,
        })
    }

    /// True when every occurrence of the symbol sits on an import line.
    fn unused(&self, source: &str) -> bool {
        for m in self.usage.find_iter(source) {
            let line_start = source[..m.start()].rfind('\n').map(|p| p + 1).unwrap_or(0);
            let line = source[line_start..].lines().next().unwrap_or("");
            if !line.trim_start().starts_with("import") {
                return false;
            }
        }
        true
    }
}

impl Rule for RemoveImportRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        self.usage.is_match(source) && self.unused(source)
    }

    fn apply(&self, source: &str, _path: &Path) -> Result<String> {
        if !self.unused(source) {
            return Ok(source.to_string());
        }
        let result = self.whole_line.replace_all(source, "").into_owned();
        let result = self.list_leading.replace_all(&result, "").into_owned();
        let result = self.list_trailing.replace_all(&result, "").into_owned();
        Ok(result)
    }

    fn describe(&self) -> String {
        format!("remove unused import matched by '{}'", self.usage.as_str())
    }
}

/// Ad-hoc rule from a matcher and transform closure pair.
pub struct ClosureRule {
    id: String,
    matcher: Box<dyn Fn(&str) -> bool + Send + Sync>,
    transform: Box<dyn Fn(&str) -> Result<String> + Send + Sync>,
}

impl ClosureRule {
    pub fn new(
        id: impl Into<String>,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        transform: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            matcher: Box::new(matcher),
            transform: Box::new(transform),
        }
    }
}

impl Rule for ClosureRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, source: &str) -> bool {
        (self.matcher)(source)
    }

    fn apply(&self, source: &str, _path: &Path) -> Result<String> {
        (self.transform)(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("page.tsx")
    }

    fn get_layout_rule() -> StripAssignmentRule {
        StripAssignmentRule::new(
            "remove-get-layout",
            r"(?m)^[ \t]*[A-Za-z_$][\w$]*\.getLayout\s*=",
        )
        .unwrap()
    }

    #[test]
    fn strips_layout_assignment_and_nothing_else() {
        let source = "import Foo from './foo';\n\nexport default function Foo() {\n  return <div />;\n}\n\nFoo.getLayout = (page) => (\n  <Layout>{page}</Layout>\n);\n\nexport const x = 1;\n";
        let rule = get_layout_rule();
        let out = rule.apply(source, &path()).unwrap();
        assert!(!out.contains("getLayout"));
        assert!(out.contains("export default function Foo()"));
        assert!(out.contains("export const x = 1;"));
        // one blank run collapsed, not two blank lines in a row
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn strip_is_idempotent() {
        let source = "Foo.getLayout = (page) => (\n  <Layout>{page}</Layout>\n);\nrest();\n";
        let rule = get_layout_rule();
        let once = rule.apply(source, &path()).unwrap();
        let twice = rule.apply(&once, &path()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn paren_inside_string_does_not_truncate_removal() {
        let source = "Foo.getLayout = (page) => (\"(\" + page);\nkeep();\n";
        let rule = get_layout_rule();
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, "keep();\n");
    }

    #[test]
    fn failed_extraction_preserves_occurrence() {
        let source =
            "A.getLayout = (broken;\nB.getLayout = (page) => (\n  <Layout>{page}</Layout>\n);\n";
        let rule = get_layout_rule();
        let out = rule.apply(source, &path()).unwrap();
        assert!(out.contains("A.getLayout = (broken;"));
        assert!(!out.contains("B.getLayout"));
    }

    #[test]
    fn pattern_rule_replaces_all() {
        let rule = PatternRule::new("use-next-link", r#"from 'old/link'"#, "from 'next/link'")
            .unwrap();
        let out = rule
            .apply("import A from 'old/link';\nimport B from 'old/link';\n", &path())
            .unwrap();
        assert_eq!(out, "import A from 'next/link';\nimport B from 'next/link';\n");
        assert!(!rule.matches(&out));
    }

    #[test]
    fn used_import_is_kept() {
        let source = "import Layout from '../components/Layout';\n\nexport default () => <Layout />;\n";
        let rule = RemoveImportRule::new("drop-layout-import", "Layout").unwrap();
        assert!(!rule.matches(source));
        assert_eq!(rule.apply(source, &path()).unwrap(), source);
    }

    #[test]
    fn unused_default_import_removed() {
        let source = "import Layout from '../components/Layout';\nimport Other from 'other';\n\nexport default () => <Other />;\n";
        let rule = RemoveImportRule::new("drop-layout-import", "Layout").unwrap();
        assert!(rule.matches(source));
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(
            out,
            "import Other from 'other';\n\nexport default () => <Other />;\n"
        );
    }

    #[test]
    fn symbol_removed_from_named_list() {
        let source = "import { Card, Layout, Grid } from 'ui';\n\nexport default () => <Card><Grid /></Card>;\n";
        let rule = RemoveImportRule::new("drop-layout-import", "Layout").unwrap();
        let out = rule.apply(source, &path()).unwrap();
        assert!(out.starts_with("import { Card, Grid } from 'ui';"));
        assert!(!out.contains("Layout"));
    }

    #[test]
    fn sole_named_import_removes_line() {
        let source = "import { Layout } from 'ui';\nbody();\n";
        let rule = RemoveImportRule::new("drop-layout-import", "Layout").unwrap();
        let out = rule.apply(source, &path()).unwrap();
        assert_eq!(out, "body();\n");
    }

    #[test]
    fn closure_rule_applies() {
        let rule = ClosureRule::new(
            "uppercase-todo",
            |s| s.contains("todo"),
            |s| Ok(s.replace("todo", "TODO")),
        );
        assert!(rule.matches("// todo later"));
        assert_eq!(rule.apply("// todo later", &path()).unwrap(), "// TODO later");
    }
}
