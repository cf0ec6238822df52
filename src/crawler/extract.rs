//! Link extraction and text cleaning over fetched HTML.
//!
//! `scraper::Html` is not `Send`, so both helpers are synchronous and
//! return owned data; nothing parsed here ever crosses an await point.

use scraper::{Html, Selector};
use url::Url;

/// Absolute outbound hyperlinks of a document, resolved against the page
/// URL, in document order.
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static selector");
    let base = Url::parse(page_url).ok();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }
        let absolute = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(ref base) = base {
            match base.join(href) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };
        links.push(absolute);
    }
    links
}

/// Text a page contributes to the index: title, the content of a meta
/// description tag if present, and the visible body text. Never the raw
/// markup.
pub fn clean_document(html: &str) -> String {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").expect("static selector");
    let meta_selector = Selector::parse(r#"meta[name="description"]"#).expect("static selector");
    let body_selector = Selector::parse("body").expect("static selector");

    let mut text = String::new();
    if let Some(title) = document.select(&title_selector).next() {
        text.push_str(&title.text().collect::<Vec<_>>().join(" "));
        text.push(' ');
    }
    if let Some(meta) = document.select(&meta_selector).next() {
        if let Some(description) = meta.value().attr("content") {
            text.push_str(description);
            text.push(' ');
        }
    }
    if let Some(body) = document.select(&body_selector).next() {
        text.push_str(&body.text().collect::<Vec<_>>().join(" "));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html>
        <head>
            <title>Pets</title>
            <meta name="description" content="all about pets">
        </head>
        <body>
            <p>cat <b>dog</b></p>
            <a href="/a">a</a>
            <a href="https://example.com/b">b</a>
            <a href="mailto:x@example.com">mail</a>
            <a href="#">top</a>
        </body>
    </html>"##;

    #[test]
    fn resolves_relative_links() {
        let links = extract_links(PAGE, "https://example.com/");
        assert!(links.contains(&"https://example.com/a".to_string()));
        assert!(links.contains(&"https://example.com/b".to_string()));
        assert!(!links.iter().any(|l| l.starts_with("mailto:")));
    }

    #[test]
    fn bare_fragment_resolves_to_page_url() {
        let links = extract_links(PAGE, "https://example.com/");
        // "#" joins to the page itself with an empty fragment.
        assert!(links.contains(&"https://example.com/#".to_string()));
    }

    #[test]
    fn cleaning_concatenates_title_description_body() {
        let text = clean_document(PAGE);
        assert!(text.contains("Pets"));
        assert!(text.contains("all about pets"));
        assert!(text.contains("cat"));
        assert!(text.contains("dog"));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn cleaning_without_head_sections() {
        let text = clean_document("<html><body>plain words</body></html>");
        assert!(text.contains("plain words"));
    }
}
