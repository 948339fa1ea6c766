//! The normalize module parses uploaded bytes as HTML and prints the parse tree
//! back in an indented, one-node-per-line form.

use ego_tree::NodeRef;
use scraper::Html;
use scraper::Node;
use scraper::node::{Doctype, Element};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never have children and print as `<tag/>`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text is not HTML-escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Elements whose content is whitespace-sensitive and printed verbatim.
const PREFORMATTED_ELEMENTS: &[&str] = &["listing", "pre", "textarea"];

/// Everything after this open tag is read as its text, up to the end of input.
const PLAINTEXT_ELEMENT: &str = "plaintext";

/// Parses raw bytes into an HTML document.
///
/// Bytes that are not valid UTF-8 are replaced, and the HTML5 tree builder
/// recovers from any markup error, so every input yields a document.
pub fn parse_html(content: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(content))
}

/// Parses `content` and returns its prettified form.
///
/// The result is stable: prettifying it again returns the same string.
pub fn prettify(content: &[u8]) -> String {
    prettify_document(&parse_html(content))
}

/// Prints a parsed document with one node per line and one space of
/// indentation per nesting level.
pub fn prettify_document(document: &Html) -> String {
    let mut printer = Printer::default();
    for child in document.tree.root().children() {
        printer.write_node(child, 0);
    }
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    /// Set once a `plaintext` element is written. Nothing may follow it.
    ended: bool,
}

impl Printer {
    fn write_node(&mut self, node: NodeRef<'_, Node>, depth: usize) {
        if self.ended {
            return;
        }
        match node.value() {
            Node::Doctype(doctype) => self.push_line(depth, &format_doctype(doctype)),
            Node::Comment(comment) => self.push_line(depth, &format!("<!--{}-->", &**comment)),
            Node::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if has_raw_text_parent(node) {
                    self.push_line(depth, text);
                } else {
                    self.push_line(depth, &escape_text(text));
                }
            }
            Node::Element(element) => self.write_element(node, element, depth),
            _ => {}
        }
    }

    fn write_element(&mut self, node: NodeRef<'_, Node>, element: &Element, depth: usize) {
        let open = open_tag(element);

        if is_html_one_of(element, VOID_ELEMENTS) {
            self.push_line(depth, &format!("{open}/>"));
            return;
        }

        if is_html_one_of(element, PREFORMATTED_ELEMENTS) {
            self.out.push_str(&" ".repeat(depth));
            self.write_inline(node);
            self.out.push('\n');
            return;
        }

        self.push_line(depth, &format!("{open}>"));
        for child in node.children() {
            self.write_node(child, depth + 1);
        }

        if is_html_one_of(element, &[PLAINTEXT_ELEMENT]) {
            self.ended = true;
        }
        if !self.ended {
            self.push_line(depth, &format!("</{}>", element.name()));
        }
    }

    /// Writes a subtree exactly as parsed, without adding or removing whitespace.
    fn write_inline(&mut self, node: NodeRef<'_, Node>) {
        if self.ended {
            return;
        }
        match node.value() {
            Node::Text(text) => {
                if has_plaintext_parent(node) {
                    // The line break ending the enclosing line is read back into it.
                    self.out.push_str(text.trim_end());
                } else if has_raw_text_parent(node) {
                    self.out.push_str(text);
                } else {
                    self.out.push_str(&escape_text(text));
                }
            }
            Node::Comment(comment) => self.out.push_str(&format!("<!--{}-->", &**comment)),
            Node::Element(element) => {
                self.out.push_str(&open_tag(element));
                if is_html_one_of(element, VOID_ELEMENTS) {
                    self.out.push_str("/>");
                    return;
                }
                self.out.push('>');
                if drops_leading_newline(node, element) {
                    self.out.push('\n');
                }
                for child in node.children() {
                    self.write_inline(child);
                }

                if is_html_one_of(element, &[PLAINTEXT_ELEMENT]) {
                    self.ended = true;
                }
                if !self.ended {
                    self.out.push_str(&format!("</{}>", element.name()));
                }
            }
            _ => {}
        }
    }

    fn push_line(&mut self, depth: usize, line: &str) {
        self.out.push_str(&" ".repeat(depth));
        self.out.push_str(line);
        self.out.push('\n');
    }
}

/// Returns `true` for an HTML element (not SVG or MathML) named in `names`.
fn is_html_one_of(element: &Element, names: &[&str]) -> bool {
    &*element.name.ns == HTML_NAMESPACE && names.contains(&element.name())
}

fn parent_element<'a>(node: NodeRef<'a, Node>) -> Option<&'a Element> {
    node.parent().and_then(|parent| parent.value().as_element())
}

fn has_raw_text_parent(node: NodeRef<'_, Node>) -> bool {
    parent_element(node).is_some_and(|parent| is_html_one_of(parent, RAW_TEXT_ELEMENTS))
}

fn has_plaintext_parent(node: NodeRef<'_, Node>) -> bool {
    parent_element(node).is_some_and(|parent| is_html_one_of(parent, &[PLAINTEXT_ELEMENT]))
}

/// The parser drops one newline right after a `pre`, `listing` or `textarea`
/// open tag, so a leading newline in the content needs an extra one written.
fn drops_leading_newline(node: NodeRef<'_, Node>, element: &Element) -> bool {
    is_html_one_of(element, PREFORMATTED_ELEMENTS)
        && matches!(
            node.first_child().map(|child| child.value()),
            Some(Node::Text(text)) if text.starts_with('\n')
        )
}

/// Renders `<name attr="value"` without the closing bracket.
fn open_tag(element: &Element) -> String {
    let mut tag = format!("<{}", element.name());
    for (name, value) in element.attrs() {
        tag.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
    }
    tag
}

fn format_doctype(doctype: &Doctype) -> String {
    let mut line = format!("<!DOCTYPE {}", doctype.name());
    let (public_id, system_id) = (doctype.public_id(), doctype.system_id());
    if !public_id.is_empty() {
        line.push_str(&format!(" PUBLIC {}", quote_identifier(public_id)));
        if !system_id.is_empty() {
            line.push_str(&format!(" {}", quote_identifier(system_id)));
        }
    } else if !system_id.is_empty() {
        line.push_str(&format!(" SYSTEM {}", quote_identifier(system_id)));
    }
    line.push('>');
    line
}

/// A doctype identifier never holds both quote characters, since the one
/// it was quoted with ends it.
fn quote_identifier(id: &str) -> String {
    if id.contains('"') {
        format!("'{id}'")
    } else {
        format!("\"{id}\"")
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
