use lazy_static::lazy_static;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

lazy_static! {
    static ref DECIMAL_REF: Regex = Regex::new(r"&#(\d+);").unwrap();
    static ref HEX_REF: Regex = Regex::new(r"&#x([0-9A-Fa-f]+);").unwrap();
    static ref BREAK_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref PARAGRAPH_END: Regex = Regex::new(r"(?i)</p>").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"(?i)<li>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\x0B\x0C\r]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const NAMED_ENTITIES: [(&str, &str); 6] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
];

/// Decodes the entities the API emits in titles and display names: a small
/// named set plus decimal and hex character references. References that do
/// not name a valid code point are left as they are.
pub fn unescape_html(input: &str) -> String {
    let mut text = input.to_string();
    for (entity, replacement) in NAMED_ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    let text = DECIMAL_REF.replace_all(&text, |caps: &Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    let text = HEX_REF.replace_all(&text, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    text.into_owned()
}

/// Converts body HTML to readable text, keeping paragraph and line breaks.
pub fn html_to_plain_text(html: &str) -> String {
    let text = BREAK_TAG.replace_all(html, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = LIST_ITEM.replace_all(&text, "• ");
    let text = ANY_TAG.replace_all(&text, " ");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    unescape_html(text.trim())
}

pub fn one_line_excerpt(text: &str, max_chars: usize) -> String {
    WHITESPACE
        .replace_all(text, " ")
        .trim()
        .chars()
        .take(max_chars)
        .collect()
}

pub fn html_excerpt(html: &str, max_chars: usize) -> String {
    one_line_excerpt(&html_to_plain_text(html), max_chars)
}

/// A renderable chunk of a post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlBlock {
    Heading(String),
    Paragraph(String),
    Code(String),
    ListItem(String),
    Quote(String),
}

/// Splits a post body into top-level blocks so code samples can be shown
/// verbatim while prose is reflowed.
pub fn html_blocks(html: &str) -> Vec<HtmlBlock> {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();

    for node in fragment.root_element().children() {
        if let Some(text) = node.value().as_text() {
            let text = collapse(text);
            if !text.is_empty() {
                blocks.push(HtmlBlock::Paragraph(text));
            }
            continue;
        }

        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        match element.value().name() {
            "pre" => {
                let code: String = element.text().collect();
                let code = code.trim_end_matches('\n').to_string();
                if !code.is_empty() {
                    blocks.push(HtmlBlock::Code(code));
                }
            }
            "ul" | "ol" => {
                for item in element.children().filter_map(ElementRef::wrap) {
                    if item.value().name() == "li" {
                        push_text(&mut blocks, item, HtmlBlock::ListItem);
                    }
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => push_text(&mut blocks, element, HtmlBlock::Heading),
            "blockquote" => push_text(&mut blocks, element, HtmlBlock::Quote),
            "hr" | "br" => {}
            _ => push_text(&mut blocks, element, HtmlBlock::Paragraph),
        }
    }

    blocks
}

fn push_text(blocks: &mut Vec<HtmlBlock>, element: ElementRef<'_>, make: fn(String) -> HtmlBlock) {
    let text: String = element.text().collect();
    let text = collapse(&text);
    if !text.is_empty() {
        blocks.push(make(text));
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
