//! Wikilink rewriting for `[[target]]` syntax.

use crate::config::ExportConfig;
use crate::link_index::LinkIndex;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

static WIKILINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn wikilink_regex() -> &'static Regex {
    WIKILINK_REGEX.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap())
}

/// How many wikilinks on a line were rewritten
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkCounts {
    pub resolved: usize,
    pub images: usize,
}

/// Resolves wikilinks against a completed [`LinkIndex`]
pub struct WikilinkResolver<'a> {
    index: &'a LinkIndex,
    config: &'a ExportConfig,
}

impl<'a> WikilinkResolver<'a> {
    pub fn new(index: &'a LinkIndex, config: &'a ExportConfig) -> Self {
        Self { index, config }
    }

    /// Rewrite every `[[text]]` on a line, left to right.
    ///
    /// - `text` is an indexed stem: `[text](</path/to/text.md>)`
    /// - `text` names an image: `[](</text>)`
    /// - otherwise the wikilink is kept verbatim
    pub fn resolve<'l>(&self, line: &'l str, counts: &mut LinkCounts) -> Cow<'l, str> {
        if !line.contains("[[") {
            return Cow::Borrowed(line);
        }

        wikilink_regex().replace_all(line, |caps: &Captures| {
            let text = &caps[1];
            if let Some(target) = self.index.get(text) {
                counts.resolved += 1;
                format!("[{text}]({target})")
            } else if self.config.is_image_link(text) {
                counts.images += 1;
                format!("[](</{text}>)")
            } else {
                caps[0].to_string()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LinkIndex {
        LinkIndex::from_iter([
            ("Rust Safety".to_string(), "</1 Intro/Rust Safety.md>".to_string()),
            ("Setup".to_string(), "</2 Setup/Setup.md>".to_string()),
        ])
    }

    #[test]
    fn test_simple_wikilink() {
        let index = index();
        let config = ExportConfig::default();
        let resolver = WikilinkResolver::new(&index, &config);
        let mut counts = LinkCounts::default();

        let line = resolver.resolve("Check out [[Rust Safety]]", &mut counts);

        assert_eq!(line, "Check out [Rust Safety](</1 Intro/Rust Safety.md>)");
        assert_eq!(counts.resolved, 1);
    }

    #[test]
    fn test_multiple_wikilinks_keep_surrounding_text() {
        let index = index();
        let config = ExportConfig::default();
        let resolver = WikilinkResolver::new(&index, &config);
        let mut counts = LinkCounts::default();

        let line = resolver.resolve("a [[Setup]] b [[Missing]] c [[Rust Safety]].", &mut counts);

        assert_eq!(
            line,
            "a [Setup](</2 Setup/Setup.md>) b [[Missing]] c [Rust Safety](</1 Intro/Rust Safety.md>)."
        );
        assert_eq!(counts.resolved, 2);
    }

    #[test]
    fn test_image_wikilink() {
        let index = index();
        let config = ExportConfig::default();
        let resolver = WikilinkResolver::new(&index, &config);
        let mut counts = LinkCounts::default();

        let line = resolver.resolve("![[diagram.png]] and [[photo.jpg]]", &mut counts);

        assert_eq!(line, "![](</diagram.png>) and [](</photo.jpg>)");
        assert_eq!(counts.images, 2);
    }

    #[test]
    fn test_unresolved_is_preserved() {
        let index = index();
        let config = ExportConfig::default();
        let resolver = WikilinkResolver::new(&index, &config);
        let mut counts = LinkCounts::default();

        let text = "See [[rust safety]] and [[Setup|alias]] and [[]]";
        let line = resolver.resolve(text, &mut counts);

        assert_eq!(line, text);
        assert_eq!(counts, LinkCounts::default());
    }

    #[test]
    fn test_line_without_links_is_borrowed() {
        let index = index();
        let config = ExportConfig::default();
        let resolver = WikilinkResolver::new(&index, &config);
        let mut counts = LinkCounts::default();

        assert!(matches!(
            resolver.resolve("plain text", &mut counts),
            Cow::Borrowed("plain text")
        ));
    }
}
