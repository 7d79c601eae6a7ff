//! Permissive line-scanning RSS parser.
//!
//! The parser walks the raw feed text line by line with three states
//! (outside the channel, inside the channel, inside an item) and buffers each
//! scope's lines. Field extraction runs over the buffered fragment when a
//! scope closes, which is what lets a tag's content span multiple lines.
//!
//! There is deliberately no XML library here: real news feeds ship malformed
//! markup, and the contract is that parsing never fails. Unknown tags are
//! ignored, unmatched markers degrade to partial output, and the worst
//! possible input yields an empty result rather than an error.

use serde::Serialize;

use super::text::{attr_value, tag_content, tag_contents};

/// Descriptive metadata of one feed. Built once per parse, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    #[serde(rename = "lastBuildDate")]
    pub last_build_date: String,
}

/// One news entry. The link doubles as the natural unique key in storage;
/// items without one are still produced here and rejected by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub guid: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub description: String,
    pub content: String,
    pub image: String,
    pub categories: Vec<String>,
}

/// Result of parsing one raw feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub channel: Channel,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Outside,
    InChannel,
    InItem,
}

/// Parses raw feed text into a channel and its items.
///
/// Total: any input produces a `ParsedFeed`. A feed without a `<channel>`
/// wrapper yields an empty channel and zero items. An unclosed `<channel>`
/// still yields whatever was captured up to end of input; an `<item>` left
/// unclosed at end of input is discarded.
pub fn parse_feed(raw: &str) -> ParsedFeed {
    let mut state = State::Outside;
    let mut channel_buf = String::new();
    let mut item_buf = String::new();
    let mut items = Vec::new();

    for raw_line in raw.lines() {
        let line = raw_line.trim();
        match state {
            State::Outside => {
                if let Some(rest) = strip_open_marker(line, "channel") {
                    state = State::InChannel;
                    push_line(&mut channel_buf, rest);
                }
            }
            State::InChannel => {
                if line.starts_with("</channel>") {
                    state = State::Outside;
                } else if let Some(rest) = strip_open_marker(line, "item") {
                    // Tolerate a complete item on a single line.
                    if let Some(end) = rest.find("</item>") {
                        items.push(read_item(&rest[..end]));
                    } else {
                        state = State::InItem;
                        item_buf.clear();
                        push_line(&mut item_buf, rest);
                    }
                } else {
                    push_line(&mut channel_buf, line);
                }
            }
            State::InItem => {
                if line.starts_with("</item>") {
                    items.push(read_item(&item_buf));
                    item_buf.clear();
                    state = State::InChannel;
                } else {
                    push_line(&mut item_buf, line);
                }
            }
        }
    }

    ParsedFeed {
        channel: read_channel(&channel_buf),
        items,
    }
}

/// Strips `<name ...>` from the start of the line, returning the remainder.
///
/// The marker may carry attributes; `<itemized>` is not an item marker.
fn strip_open_marker<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let after = line.strip_prefix('<')?.strip_prefix(name)?;
    match after.chars().next() {
        Some('>') => Some(&after[1..]),
        Some(c) if c.is_whitespace() => after.find('>').map(|gt| &after[gt + 1..]),
        _ => None,
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !line.is_empty() {
        buf.push_str(line);
        buf.push('\n');
    }
}

fn read_channel(fragment: &str) -> Channel {
    Channel {
        title: tag_content(fragment, "title"),
        link: tag_content(fragment, "link"),
        description: tag_content(fragment, "description"),
        language: tag_content(fragment, "language"),
        last_build_date: tag_content(fragment, "lastBuildDate"),
    }
}

fn read_item(fragment: &str) -> Item {
    // The enclosure marker is self-closing; its payload lives in attributes,
    // so it is scanned directly rather than through tag extraction.
    let image = match fragment.find("<enclosure") {
        Some(at) => {
            let tag = &fragment[at..];
            let tag = match tag.find('>') {
                Some(end) => &tag[..end + 1],
                None => tag,
            };
            attr_value(tag, "url")
        }
        None => String::new(),
    };

    Item {
        title: tag_content(fragment, "title"),
        link: tag_content(fragment, "link"),
        guid: tag_content(fragment, "guid"),
        pub_date: tag_content(fragment, "pubDate"),
        description: tag_content(fragment, "description"),
        content: tag_content(fragment, "content:encoded"),
        image,
        categories: tag_contents(fragment, "category"),
    }
}

// ============================================================================
// Tests
// ============================================================================
