//! Minimal HTML querying over raw markup.
//!
//! The wiki pages this crate consumes are machine-generated and regular, so
//! class-token scanning over the raw string is enough; no DOM is built.
//! Lookups are case-insensitive on tag names and tolerate attributes quoted
//! with either quote character.

/// Tags that never have a closing counterpart.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A parsed HTML page.
pub struct Document {
    html: String,
}

impl Document {
    pub fn parse(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn root(&self) -> Fragment<'_> {
        Fragment { raw: &self.html }
    }

    /// First element whose `class` attribute contains the given token.
    pub fn fragment(&self, class_token: &str) -> Option<Fragment<'_>> {
        self.root().fragment(class_token)
    }

    /// First element with the given `id` attribute.
    pub fn fragment_by_id(&self, id: &str) -> Option<Fragment<'_>> {
        self.root().fragment_by_id(id)
    }

    /// All `<a>` elements in document order.
    pub fn anchors(&self) -> Vec<Anchor> {
        self.root().anchors()
    }

    /// Visible page text: script/style blocks removed, tags stripped,
    /// entities decoded, whitespace normalized.
    pub fn text(&self) -> String {
        self.root().text()
    }
}

/// A slice of markup: the inner HTML of one element (or the whole page).
#[derive(Clone, Copy)]
pub struct Fragment<'a> {
    raw: &'a str,
}

/// An `<a>` element: attributes plus flattened inner text.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub href: String,
    pub title: Option<String>,
    pub text: String,
    classes: String,
}

impl Anchor {
    pub fn has_class(&self, token: &str) -> bool {
        self.classes.split_whitespace().any(|c| c == token)
    }
}

impl<'a> Fragment<'a> {
    pub fn fragment(&self, class_token: &str) -> Option<Fragment<'a>> {
        self.find_elements(&|_, attrs| has_class_token(attrs, class_token), true)
            .into_iter()
            .next()
    }

    pub fn fragments(&self, class_token: &str) -> Vec<Fragment<'a>> {
        self.find_elements(&|_, attrs| has_class_token(attrs, class_token), false)
    }

    pub fn fragment_by_id(&self, id: &str) -> Option<Fragment<'a>> {
        self.find_elements(&|_, attrs| attr(attrs, "id").as_deref() == Some(id), true)
            .into_iter()
            .next()
    }

    pub fn text(&self) -> String {
        let cleaned = strip_container(&strip_container(self.raw, "script"), "style");
        normalize_ws(&decode_entities(&strip_tags(&cleaned)))
    }

    pub fn anchors(&self) -> Vec<Anchor> {
        let html = self.raw;
        let mut out = Vec::new();
        let mut pos = 0;
        while let Some(tag) = next_tag(html, pos) {
            pos = tag.open_end;
            if tag.closing || !tag.name.eq_ignore_ascii_case("a") {
                continue;
            }
            let inner_end = if tag.self_closing {
                tag.open_end
            } else {
                find_close(html, tag.open_end, "a").unwrap_or(tag.open_end)
            };
            out.push(Anchor {
                href: attr(tag.attrs, "href").unwrap_or_default(),
                title: attr(tag.attrs, "title").filter(|t| !t.trim().is_empty()),
                text: normalize_ws(&decode_entities(&strip_tags(&html[tag.open_end..inner_end]))),
                classes: attr(tag.attrs, "class").unwrap_or_default(),
            });
        }
        out
    }

    fn find_elements(
        &self,
        matcher: &dyn Fn(&str, &str) -> bool,
        first_only: bool,
    ) -> Vec<Fragment<'a>> {
        let html = self.raw;
        let mut out = Vec::new();
        let mut pos = 0;
        while let Some(tag) = next_tag(html, pos) {
            pos = tag.open_end;
            if tag.closing || tag.self_closing {
                continue;
            }
            let name = tag.name.to_ascii_lowercase();
            if VOID_TAGS.contains(&name.as_str()) {
                continue;
            }
            if !matcher(&name, tag.attrs) {
                continue;
            }
            if let Some(close) = find_close(html, tag.open_end, &name) {
                out.push(Fragment {
                    raw: &html[tag.open_end..close],
                });
                if first_only {
                    return out;
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tag scanning
// ---------------------------------------------------------------------------

struct Tag<'a> {
    name: &'a str,
    attrs: &'a str,
    start: usize,
    open_end: usize,
    closing: bool,
    self_closing: bool,
}

/// Find the next tag at or after `from`. Comments and doctype-style
/// declarations are skipped; stray `<` characters are ignored.
fn next_tag(html: &str, from: usize) -> Option<Tag<'_>> {
    let mut i = from;
    loop {
        let lt = html[i..].find('<')? + i;
        let rest = &html[lt + 1..];
        if rest.starts_with("!--") {
            i = lt + html[lt..].find("-->").map(|p| p + 3)?;
            continue;
        }
        let (closing, name_start) = if rest.starts_with('/') {
            (true, lt + 2)
        } else {
            (false, lt + 1)
        };
        let name_end = html[name_start..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .map(|p| name_start + p)
            .unwrap_or(html.len());
        if name_end == name_start {
            i = lt + 1;
            continue;
        }
        let gt = find_tag_end(html, name_end)?;
        let attrs = &html[name_end..gt];
        return Some(Tag {
            name: &html[name_start..name_end],
            attrs,
            start: lt,
            open_end: gt + 1,
            closing,
            self_closing: attrs.trim_end().ends_with('/'),
        });
    }
}

/// Find the `>` that ends the tag starting before `from`, skipping over
/// quoted attribute values.
fn find_tag_end(html: &str, from: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut quote: Option<u8> = None;
    for (off, &b) in bytes[from..].iter().enumerate() {
        match b {
            b'"' | b'\'' => match quote {
                Some(q) if q == b => quote = None,
                None => quote = Some(b),
                _ => {}
            },
            b'>' if quote.is_none() => return Some(from + off),
            _ => {}
        }
    }
    None
}

/// Position of the matching close tag for an element whose content starts at
/// `from`, tracking nesting of same-named tags.
fn find_close(html: &str, from: usize, name: &str) -> Option<usize> {
    let mut depth = 1u32;
    let mut pos = from;
    while let Some(tag) = next_tag(html, pos) {
        pos = tag.open_end;
        if !tag.name.eq_ignore_ascii_case(name) {
            continue;
        }
        if tag.closing {
            depth -= 1;
            if depth == 0 {
                return Some(tag.start);
            }
        } else if !tag.self_closing {
            depth += 1;
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Extract an attribute value from the raw attribute section of an open tag.
pub(crate) fn attr(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(p) = lower[search..].find(name) {
        let at = search + p;
        search = at + name.len();
        let bounded_left = at == 0
            || !lower[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !bounded_left {
            continue;
        }
        let rest = attrs[at + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let value = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rest[1..];
                &body[..body.find(q).unwrap_or(body.len())]
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
                    .unwrap_or(rest.len());
                &rest[..end]
            }
        };
        return Some(decode_entities(value));
    }
    None
}

fn has_class_token(attrs: &str, token: &str) -> bool {
    attr(attrs, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == token))
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Remove every `<name ...>...</name>` block (used for script/style).
fn strip_container(html: &str, name: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(p) = lower[pos..].find(&open) {
        let start = pos + p;
        out.push_str(&html[pos..start]);
        let Some(c) = lower[start..].find(&close) else {
            return out;
        };
        let after = start + c;
        match lower[after..].find('>') {
            Some(gt) => pos = after + gt + 1,
            None => return out,
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Drop all markup, replacing each tag with a single space so adjacent
/// cells and paragraphs do not run together.
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the HTML entities that occur in wiki markup. Named entities are
/// limited to the handful the source actually emits; numeric references are
/// decoded in both decimal and hex form.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail.find(';').filter(|&p| p <= 12);
        let Some(semi) = semi else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix('#')
                .and_then(|num| {
                    if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        num.parse::<u32>().ok()
                    }
                })
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
