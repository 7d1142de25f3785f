//! Extraction of image URLs from the wallpapers HTML document.

use regex::Regex;
use std::sync::LazyLock;

/// Matches the src attribute of an <img> tag.
/// Case-insensitive; tolerates attributes before src and either quote style.
static IMG_SRC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// Pull every `<img src>` URL out of an HTML document, in document order.
/// The input is read-only; nothing is removed or rewritten.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    IMG_SRC_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
