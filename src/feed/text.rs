//! String-level primitives of the permissive feed parser.
//!
//! Real-world news feeds are full of half-valid markup, so everything here is
//! total: malformed input degrades to an empty or partial result, never an
//! error. No XML library is involved: these are plain scans over the raw
//! text, which is exactly what makes them tolerant of markup an XML parser
//! would reject.

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Unwraps a CDATA section, returning its inner content trimmed.
///
/// Text without a CDATA marker is returned trimmed and otherwise unchanged,
/// so the function is idempotent on already-normalized text. A CDATA section
/// missing its closing marker falls back to the original text minus the
/// opening marker.
pub fn strip_cdata(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find(CDATA_OPEN) else {
        return trimmed.to_string();
    };
    let inner = &trimmed[start + CDATA_OPEN.len()..];
    match inner.find(CDATA_CLOSE) {
        Some(end) => inner[..end].trim().to_string(),
        None => trimmed.replacen(CDATA_OPEN, "", 1).trim().to_string(),
    }
}

/// Inner text of the first `<name ...>...</name>` element in `fragment`,
/// CDATA-normalized and trimmed. Returns an empty string when the tag is
/// absent.
///
/// The opening tag may carry attributes and the inner text may span multiple
/// lines. Matching is bounded to the nearest closing tag of the same name.
pub fn tag_content(fragment: &str, name: &str) -> String {
    match extract_at(fragment, name, 0) {
        Some((inner, _)) => strip_cdata(inner),
        None => String::new(),
    }
}

/// Inner text of every `<name>` occurrence, in document order.
///
/// Used for repeated tags such as `<category>`.
pub fn tag_contents(fragment: &str, name: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut at = 0;
    while let Some((inner, next)) = extract_at(fragment, name, at) {
        values.push(strip_cdata(inner));
        at = next;
    }
    values
}

/// Value of the `name="..."` attribute within a single tag's text.
///
/// The attribute name is matched case-insensitively (feeds disagree on
/// casing). Returns an empty string when the attribute is absent or its
/// quote is unterminated. Used for the self-closing `<enclosure>` marker,
/// which carries its payload in attributes rather than inner text.
pub fn attr_value(tag: &str, name: &str) -> String {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=\"", name.to_ascii_lowercase());
    let Some(start) = lower.find(&needle) else {
        return String::new();
    };
    let value_start = start + needle.len();
    match tag[value_start..].find('"') {
        Some(end) => tag[value_start..value_start + end].to_string(),
        None => String::new(),
    }
}

/// Raw inner text of the first complete `<name>` element at or after `from`,
/// plus the offset just past its closing tag.
///
/// Self-closing occurrences (`<name ... />`) carry no inner text and are
/// skipped. An opening tag with no closing tag anywhere after it yields no
/// match; the bounded search is what keeps `<title>` from swallowing the
/// rest of the document.
fn extract_at<'a>(fragment: &'a str, name: &str, from: usize) -> Option<(&'a str, usize)> {
    let close = format!("</{}>", name);
    let mut search = from;
    loop {
        let (content_start, self_closing) = find_open_tag(fragment, name, search)?;
        if self_closing {
            search = content_start;
            continue;
        }
        let rel = fragment[content_start..].find(&close)?;
        let end = content_start + rel;
        return Some((&fragment[content_start..end], end + close.len()));
    }
}

/// Locates `<name ...>` at or after `from`, returning the offset just past
/// the `>` and whether the tag was self-closing.
///
/// The character after the tag name must be `>`, `/`, or whitespace, so
/// `<title>` never matches `<titleImage>`.
fn find_open_tag(fragment: &str, name: &str, from: usize) -> Option<(usize, bool)> {
    let needle = format!("<{}", name);
    let mut at = from;
    while let Some(rel) = fragment[at..].find(&needle) {
        let open = at + rel;
        let after = open + needle.len();
        match fragment[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let gt = after + fragment[after..].find('>')?;
                let self_closing = fragment[..gt].ends_with('/');
                return Some((gt + 1, self_closing));
            }
            // Prefix of a longer tag name; keep scanning.
            _ => at = open + 1,
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // strip_cdata
    // ------------------------------------------------------------------------

    #[test]
    fn test_cdata_unwrapped() {
        assert_eq!(strip_cdata("<![CDATA[Hello world]]>"), "Hello world");
    }

    #[test]
    fn test_cdata_trims_inner_whitespace() {
        assert_eq!(strip_cdata("<![CDATA[  spaced  ]]>"), "spaced");
    }

    #[test]
    fn test_plain_text_passes_through_trimmed() {
        assert_eq!(strip_cdata("  plain text  "), "plain text");
    }

    #[test]
    fn test_cdata_idempotent() {
        let once = strip_cdata("<![CDATA[Breaking news]]>");
        assert_eq!(strip_cdata(&once), once);
    }

    #[test]
    fn test_cdata_missing_close_drops_marker_only() {
        assert_eq!(strip_cdata("<![CDATA[unterminated"), "unterminated");
    }

    #[test]
    fn test_cdata_empty_input() {
        assert_eq!(strip_cdata(""), "");
    }

    #[test]
    fn test_cdata_with_markup_inside() {
        assert_eq!(
            strip_cdata("<![CDATA[<p>Rich <b>text</b></p>]]>"),
            "<p>Rich <b>text</b></p>"
        );
    }

    // ------------------------------------------------------------------------
    // tag_content
    // ------------------------------------------------------------------------

    #[test]
    fn test_tag_content_simple() {
        assert_eq!(tag_content("<title>Hello</title>", "title"), "Hello");
    }

    #[test]
    fn test_tag_content_absent_returns_empty() {
        assert_eq!(tag_content("<title>Hello</title>", "link"), "");
    }

    #[test]
    fn test_tag_content_with_attributes() {
        assert_eq!(
            tag_content(r#"<category term="x" domain="y">Politics</category>"#, "category"),
            "Politics"
        );
    }

    #[test]
    fn test_tag_content_multiline() {
        let fragment = "<description>\nFirst line\nSecond line\n</description>";
        assert_eq!(tag_content(fragment, "description"), "First line\nSecond line");
    }

    #[test]
    fn test_tag_content_cdata() {
        assert_eq!(
            tag_content("<title><![CDATA[Wrapped & raw]]></title>", "title"),
            "Wrapped & raw"
        );
    }

    #[test]
    fn test_tag_content_bounded_to_nearest_close() {
        let fragment = "<title>First</title><title>Second</title>";
        assert_eq!(tag_content(fragment, "title"), "First");
    }

    #[test]
    fn test_tag_content_no_prefix_confusion() {
        let fragment = "<titleImage>pic.png</titleImage><title>Real</title>";
        assert_eq!(tag_content(fragment, "title"), "Real");
    }

    #[test]
    fn test_tag_content_namespaced_name() {
        assert_eq!(
            tag_content("<content:encoded>Body</content:encoded>", "content:encoded"),
            "Body"
        );
    }

    #[test]
    fn test_tag_content_unclosed_yields_empty() {
        assert_eq!(tag_content("<title>dangling", "title"), "");
    }

    #[test]
    fn test_tag_content_self_closing_skipped() {
        let fragment = "<link/><link>https://example.com</link>";
        assert_eq!(tag_content(fragment, "link"), "https://example.com");
    }

    // ------------------------------------------------------------------------
    // tag_contents
    // ------------------------------------------------------------------------

    #[test]
    fn test_tag_contents_document_order() {
        let fragment = "<category>One</category><x/><category>Two</category><category>Three</category>";
        assert_eq!(tag_contents(fragment, "category"), vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_tag_contents_empty_when_absent() {
        assert!(tag_contents("<title>No categories</title>", "category").is_empty());
    }

    #[test]
    fn test_tag_contents_mixed_cdata_and_plain() {
        let fragment = "<category><![CDATA[Sports]]></category><category>Weather</category>";
        assert_eq!(tag_contents(fragment, "category"), vec!["Sports", "Weather"]);
    }

    // ------------------------------------------------------------------------
    // attr_value
    // ------------------------------------------------------------------------

    #[test]
    fn test_attr_value_basic() {
        assert_eq!(
            attr_value(r#"<enclosure url="http://img/x.jpg" type="image/jpeg"/>"#, "url"),
            "http://img/x.jpg"
        );
    }

    #[test]
    fn test_attr_value_case_insensitive_name() {
        assert_eq!(attr_value(r#"<enclosure URL="http://img/y.jpg"/>"#, "url"), "http://img/y.jpg");
    }

    #[test]
    fn test_attr_value_absent() {
        assert_eq!(attr_value(r#"<enclosure type="image/jpeg"/>"#, "url"), "");
    }

    #[test]
    fn test_attr_value_unterminated_quote() {
        assert_eq!(attr_value(r#"<enclosure url="http://broken"#, "url"), "");
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            /// Extraction round-trips any value that cannot itself open or
            /// close a tag.
            #[test]
            fn roundtrip_extraction(value in "[^<\\]]{0,64}") {
                let fragment = format!("<tag>{}</tag>", value);
                prop_assert_eq!(tag_content(&fragment, "tag"), value.trim());
            }

            /// Normalizing already-normalized text is a no-op.
            #[test]
            fn cdata_idempotence(text in "[^<\\]]{0,64}") {
                let once = strip_cdata(&format!("<![CDATA[{}]]>", text));
                prop_assert_eq!(strip_cdata(&once), once.clone());
            }

            /// Multi-value extraction preserves count and document order.
            #[test]
            fn multi_value_order(values in proptest::collection::vec("[a-zA-Z0-9 ]{1,16}", 0..8)) {
                let fragment: String = values
                    .iter()
                    .map(|v| format!("<category>{}</category>", v))
                    .collect();
                let extracted = tag_contents(&fragment, "category");
                let expected: Vec<String> = values.iter().map(|v| v.trim().to_string()).collect();
                prop_assert_eq!(extracted, expected);
            }
        }
    }
}
