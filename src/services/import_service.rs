use opml::{Outline, OPML};

use crate::errors::{TailError, TailResult};

/// Feed URLs of an OPML subscription list, in document order, with
/// duplicates removed.
pub fn read_opml_urls(content: &str) -> TailResult<Vec<String>> {
    let opml = OPML::from_str(content).map_err(|e| TailError::OpmlParse(e.to_string()))?;

    let mut urls = Vec::new();
    for url in extract_feed_urls(&opml.body.outlines) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    Ok(urls)
}

/// Recursively collect `xmlUrl` attributes, descending into categories.
fn extract_feed_urls(outlines: &[Outline]) -> Vec<String> {
    let mut urls = Vec::new();

    for outline in outlines {
        if let Some(url) = &outline.xml_url {
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }

        urls.extend(extract_feed_urls(&outline.outlines));
    }

    urls
}
