/// The bits of a page the backdrop needs: which target elements exist and
/// what the root custom properties are set to.
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct Page {
    classes: HashSet<String>,
    root_vars: HashMap<String, String>,
}

impl Page {
    /// Build from an HTML document plus any stylesheets it uses. Inline
    /// `<style>` blocks in the document are read as well.
    pub fn parse(html: &str, stylesheets: &[&str]) -> Self {
        let mut page = Self {
            classes: class_names(html),
            root_vars: HashMap::new(),
        };
        for block in style_blocks(html) {
            page.root_vars.extend(root_vars(block));
        }
        for css in stylesheets {
            page.root_vars.extend(root_vars(css));
        }
        page
    }

    #[cfg(test)]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.root_vars.insert(name.to_string(), value.to_string());
        self
    }

    /// True when some element carries `class`.
    pub fn has(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Trimmed value of a root custom property, `None` if unset or blank.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.root_vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

// ── HTML scanning ─────────────────────────────────────────────────────────────

fn class_names(html: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("class") {
        let start = from + pos;
        from = start + "class".len();
        // must be a whole attribute name
        let before = lower[..start].chars().next_back();
        if !matches!(before, Some(c) if c.is_whitespace()) {
            continue;
        }
        let rest = html[from..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else { continue };
        let rest = rest.trim_start();
        let value = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => rest[1..].split(q).next().unwrap_or(""),
            Some(_) => rest.split(|c: char| c.is_whitespace() || c == '>').next().unwrap_or(""),
            None => "",
        };
        out.extend(value.split_whitespace().map(str::to_string));
    }
    out
}

fn style_blocks(html: &str) -> Vec<&str> {
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(open) = lower[from..].find("<style") {
        let Some(gt) = lower[from + open..].find('>') else { break };
        let body_start = from + open + gt + 1;
        let Some(close) = lower[body_start..].find("</style") else { break };
        out.push(&html[body_start..body_start + close]);
        from = body_start + close;
    }
    out
}

// ── CSS scanning ──────────────────────────────────────────────────────────────

/// Custom properties declared in `:root` (or `html`) rules, including rules
/// nested in `@media`/`@supports` blocks.
fn root_vars(css: &str) -> HashMap<String, String> {
    let css = strip_comments(css);
    let mut out = HashMap::new();
    // one entry per open block: does it target the root element
    let mut open_blocks: Vec<bool> = Vec::new();
    let mut start = 0;
    for (i, c) in css.char_indices() {
        match c {
            '{' => {
                let selector = css[start..i].rsplit(';').next().unwrap_or("");
                open_blocks.push(targets_root(selector));
                start = i + 1;
            }
            '}' => {
                if open_blocks.pop() == Some(true) {
                    collect_custom_props(&css[start..i], &mut out);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    out
}

fn targets_root(selector: &str) -> bool {
    selector
        .split(',')
        .any(|s| matches!(s.trim(), ":root" | "html"))
}

fn collect_custom_props(body: &str, out: &mut HashMap<String, String>) {
    for decl in body.split(';') {
        let Some((name, value)) = decl.split_once(':') else { continue };
        let name = name.trim();
        if name.starts_with("--") {
            out.insert(name.to_string(), value.trim().to_string());
        }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_target_classes() {
        let html = r#"<html><body>
            <div class="bg-grid wide"></div>
            <section id="x" class='hero bg-sunset'>
            <p data-class="bg-nope">
        </body></html>"#;
        let page = Page::parse(html, &[]);
        assert!(page.has("bg-grid"));
        assert!(page.has("bg-sunset"));
        assert!(page.has("wide"));
        assert!(!page.has("bg-nope"));
    }

    #[test]
    fn test_no_targets() {
        let page = Page::parse("<html><body><div id=root></div></body></html>", &[]);
        assert!(!page.has("bg-grid"));
        assert!(!page.has("bg-sunset"));
    }

    #[test]
    fn test_root_vars_from_stylesheet_and_style_block() {
        let html = r#"<head><style>
            :root { --sun-core: #ffcc88; }
        </style></head><body class="bg-sunset"></body>"#;
        let css = r#"
            /* palette */
            body { --sun-core: #000; color: red; }
            html, :root {
                --sun-rim:  rgb(255, 0, 0) ;
                --blank:   ;
            }
        "#;
        let page = Page::parse(html, &[css]);
        assert_eq!(page.var("--sun-core"), Some("#ffcc88"));
        assert_eq!(page.var("--sun-rim"), Some("rgb(255, 0, 0)"));
        assert_eq!(page.var("--blank"), None);
        assert_eq!(page.var("--missing"), None);
    }

    #[test]
    fn test_root_vars_inside_at_rules() {
        let css = r#"
            @import url("base.css");
            @media (prefers-color-scheme: dark) {
                body { color: white; }
                :root { --sun-core: #ffaa00; }
            }
            @supports (display: grid) { :root { --sun-rim: #cc3300 } }
            .card { --sun-core: #000; }
        "#;
        let page = Page::parse("", &[css]);
        assert_eq!(page.var("--sun-core"), Some("#ffaa00"));
        assert_eq!(page.var("--sun-rim"), Some("#cc3300"));
    }

    #[test]
    fn test_later_stylesheet_wins() {
        let page = Page::parse("", &[":root{--a:1}", ":root{--a:2}"]);
        assert_eq!(page.var("--a"), Some("2"));
    }
}
