//! Append-only audit log of published images.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append one line per published image:
/// `<timestamp>: Posted <url> with caption '<caption>'`
pub fn append_records(path: &Path, urls: &[String], caption: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    for url in urls {
        writeln!(file, "{}: Posted {} with caption '{}'", timestamp, url, caption)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_one_line_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post_log.txt");

        let urls = vec!["https://a/1.jpg".to_string(), "https://a/2.jpg".to_string()];
        append_records(&path, &urls, "#1 Morning vibes ").unwrap();

        let log = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Posted https://a/1.jpg with caption '#1 Morning vibes '"));
        assert!(lines[1].contains("Posted https://a/2.jpg with caption '#1 Morning vibes '"));
    }

    #[test]
    fn test_appends_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post_log.txt");

        append_records(&path, &["u1".to_string()], "c1").unwrap();
        append_records(&path, &["u2".to_string()], "c2").unwrap();

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log.lines().count(), 2);
    }
}
