//! `<load>` include resolution.
//!
//! ```html
//! <load title="Contact" src="partials/section.html"></load>
//! ```
//!
//! The tag is replaced by the referenced file, with every `{{ key }}` token
//! in that file replaced by the matching tag attribute. Included content is
//! resolved recursively against its own directory before it is spliced in.
//!
//! # Resolution order
//!
//! Each document level is parsed once into a worklist of text and include
//! segments, which is then processed left to right. An include is fully
//! expanded (outer before inner) before the next sibling is looked at, so
//! every substitution sees a document state consistent with all earlier
//! ones.

use super::{BuildError, normalize};
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `<load ... src="..." ...>...</load>`, content between the tags is discarded.
static LOAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<load\s+((?:[^>]*?\s)?)src\s*=\s*["']([^"']+)["']([^>]*)>.*?</load\s*>"#,
    )
    .unwrap()
});

/// `name="value"` or `name='value'`
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// `{{ key }}`
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([\w:-]+)\s*\}\}").unwrap());

/// Attribute map of one include node. Lookups that miss yield `""`.
pub type Attributes = FxHashMap<String, String>;

/// An include reference discovered while scanning markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeNode {
    pub src: String,
    pub attrs: Attributes,
}

/// One piece of a parsed document level.
#[derive(Debug)]
enum Segment<'a> {
    Text(&'a str),
    Include(IncludeNode),
}

/// Outcome of resolving one document.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub html: String,
    /// Number of `<load>` tags replaced, across all levels.
    pub includes: usize,
    /// Deepest include nesting reached (0 when nothing was included).
    pub depth: usize,
}

/// Resolves `<load>` tags recursively with a pass guard.
#[derive(Debug, Clone, Copy)]
pub struct IncludeResolver {
    max_passes: usize,
}

impl IncludeResolver {
    pub const fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    /// Expand every include in `html`, reading files relative to `base`.
    pub fn resolve(&self, html: &str, base: &Path) -> Result<Resolved, BuildError> {
        let mut resolved = Resolved {
            html: String::new(),
            includes: 0,
            depth: 0,
        };
        resolved.html = self.expand(html, base, 0, &mut resolved)?;
        Ok(resolved)
    }

    fn expand(
        &self,
        html: &str,
        base: &Path,
        depth: usize,
        stats: &mut Resolved,
    ) -> Result<String, BuildError> {
        stats.depth = stats.depth.max(depth);

        let segments = parse_segments(html);
        if !segments.iter().any(|s| matches!(s, Segment::Include(_))) {
            return Ok(html.to_owned());
        }

        let mut out = String::with_capacity(html.len());
        let mut passes = 0usize;
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Include(node) => {
                    passes += 1;
                    if passes > self.max_passes {
                        return Err(self.limit_exceeded(&node, base));
                    }
                    stats.includes += 1;
                    out.push_str(&self.inline(&node, base, depth, stats)?);
                }
            }
        }
        Ok(out)
    }

    /// Read, substitute and fully expand a single include node.
    fn inline(
        &self,
        node: &IncludeNode,
        base: &Path,
        depth: usize,
        stats: &mut Resolved,
    ) -> Result<String, BuildError> {
        if depth + 1 > self.max_passes {
            return Err(self.limit_exceeded(node, base));
        }

        let path = normalize(&base.join(&node.src));
        let content =
            fs::read_to_string(&path).map_err(|source| BuildError::MissingIncludeFile {
                path: path.clone(),
                base: base.to_path_buf(),
                source,
            })?;

        let content = substitute(&content, &node.attrs);
        let dir = path.parent().map_or_else(|| base.to_path_buf(), PathBuf::from);
        self.expand(&content, &dir, depth + 1, stats)
    }

    /// Names the include that tripped the guard, not just where it was found.
    fn limit_exceeded(&self, node: &IncludeNode, base: &Path) -> BuildError {
        BuildError::RecursionLimitExceeded {
            include: normalize(&base.join(&node.src)),
            base: base.to_path_buf(),
            limit: self.max_passes,
        }
    }
}

/// Split one document level into text and include segments.
fn parse_segments(html: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in LOAD_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(&html[last..whole.start()]));
        }
        segments.push(Segment::Include(parse_node(&caps)));
        last = whole.end();
    }

    if last < html.len() {
        segments.push(Segment::Text(&html[last..]));
    }
    segments
}

fn parse_node(caps: &Captures<'_>) -> IncludeNode {
    let mut attrs = Attributes::default();
    for group in [1, 3] {
        if let Some(attr_str) = caps.get(group) {
            parse_attrs(attr_str.as_str(), &mut attrs);
        }
    }
    attrs.remove("src");

    IncludeNode {
        src: caps.get(2).map_or_else(String::new, |m| m.as_str().to_owned()),
        attrs,
    }
}

/// Best-effort attribute parse. Anything not shaped like `name="value"` is skipped.
fn parse_attrs(attr_str: &str, attrs: &mut Attributes) {
    for caps in ATTR_RE.captures_iter(attr_str) {
        let key = caps[1].trim();
        if key.is_empty() {
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        attrs.insert(key.to_owned(), value.to_owned());
    }
}

/// Replace `{{ key }}` tokens with attribute values.
pub fn substitute<'a>(content: &'a str, attrs: &Attributes) -> Cow<'a, str> {
    PLACEHOLDER_RE.replace_all(content, |caps: &Captures<'_>| {
        attrs.get(&caps[1]).cloned().unwrap_or_default()
    })
}
