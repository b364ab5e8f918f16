//! NDJSON record fixtures for both record families.

use bytes::Bytes;
use serde_json::json;

/// Builds one archive slim record as an NDJSON line.
///
/// The record carries the fields the loader exercises (identifier, string
/// timestamp, nested keywords) plus representative dimensions.
pub fn archive_record(article_id: &str, pub_date: &str) -> String {
    json!({
        "article_id": article_id,
        "uri": format!("nyt://article/{article_id}"),
        "pub_date": pub_date,
        "section_name": "World",
        "news_desk": "Foreign",
        "type_of_material": "News",
        "document_type": "article",
        "word_count": 843,
        "web_url": format!("https://example.com/{article_id}"),
        "headline_main": "Example headline",
        "byline_original": "By A. Reporter",
        "abstract": "Example abstract.",
        "snippet": "Example snippet.",
        "keywords": [{"name": "subject", "value": "Examples", "rank": 1, "major": "N"}],
        "byline_person": [{"firstname": "A.", "lastname": "Reporter"}],
        "multimedia_count_by_type": {"image": 2}
    })
    .to_string()
}

/// Builds one most-popular slim record as an NDJSON line.
pub fn most_popular_record(id: i64) -> String {
    json!({
        "id": id,
        "uri": format!("nyt://article/{id}"),
        "url": format!("https://example.com/{id}"),
        "asset_id": id,
        "source": "New York Times",
        "published_date": "2026-02-18",
        "updated": "2026-02-19 08:30:12",
        "section": "U.S.",
        "subsection": "Politics",
        "byline": "By A. Reporter",
        "type": "Article",
        "title": "Example title",
        "abstract": "Example abstract.",
        "des_facet": ["Example Subject"],
        "org_facet": [],
        "per_facet": [],
        "geo_facet": ["Example Place"],
        "media_count_by_type": {"image": 1},
        "adx_keywords": "Example;Keywords"
    })
    .to_string()
}

/// Joins records into an NDJSON payload.
pub fn ndjson(lines: &[String]) -> Bytes {
    let mut out = lines.join("\n");
    out.push('\n');
    Bytes::from(out)
}
