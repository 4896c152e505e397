//! Locate the dataset download links on the cached source page.
//!
//! The page lists its downloads under a "Public Use Datasets" heading; every
//! anchor inside that heading's parent element is collected into a
//! label -> absolute URL map. Dataset lookup is exact-or-prefix match of the
//! dataset title against the collected labels.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const DATASETS_HEADING: &str = "Public Use Datasets";

/// Collect every link under the "Public Use Datasets" heading:
/// whitespace-collapsed label -> URL resolved against `base`.
pub fn dataset_links(html: &str, base: &Url) -> Result<BTreeMap<String, String>> {
    let heading_selector = Selector::parse("h5").expect("valid h5 selector");
    let anchor_selector = Selector::parse("a[href]").expect("valid anchor selector");

    let doc = Html::parse_document(html);
    let heading = doc
        .select(&heading_selector)
        .find(|h| collapse_whitespace(&h.text().collect::<String>()).starts_with(DATASETS_HEADING))
        .with_context(|| format!("no '{}' heading on the source page", DATASETS_HEADING))?;
    let section = heading
        .parent()
        .and_then(ElementRef::wrap)
        .context("datasets heading has no parent element")?;

    let mut links = BTreeMap::new();
    for anchor in section.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href) else {
            continue;
        };
        let label = collapse_whitespace(&anchor.text().collect::<String>());
        if !label.is_empty() {
            links.insert(label, url.to_string());
        }
    }
    Ok(links)
}

/// Find the URL for a dataset title: exact label match first, then the first
/// label the title is a prefix of. No match is a fatal lookup error.
pub fn lookup_dataset_url<'a>(links: &'a BTreeMap<String, String>, title: &str) -> Result<&'a str> {
    if let Some(url) = links.get(title) {
        return Ok(url);
    }
    links
        .iter()
        .find(|(label, _)| label.starts_with(title))
        .map(|(_, url)| url.as_str())
        .with_context(|| format!("dataset '{}' not found among the page's links", title))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
