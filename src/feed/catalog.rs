use crate::storage::{NewSource, PoliticalLeaning};

/// (name, feed url, country, leaning)
const KNOWN_FEEDS: &[(&str, &str, &str, PoliticalLeaning)] = &[
    (
        "BBC News",
        "http://feeds.bbci.co.uk/news/rss.xml",
        "UK",
        PoliticalLeaning::Center,
    ),
    (
        "Reuters",
        "https://www.reutersagency.com/feed/",
        "UK",
        PoliticalLeaning::Center,
    ),
    (
        "The Guardian",
        "https://www.theguardian.com/world/rss",
        "UK",
        PoliticalLeaning::CenterLeft,
    ),
    (
        "CNN",
        "http://rss.cnn.com/rss/edition.rss",
        "US",
        PoliticalLeaning::CenterLeft,
    ),
    (
        "Fox News",
        "https://moxie.foxnews.com/google-publisher/latest.xml",
        "US",
        PoliticalLeaning::Right,
    ),
    (
        "NPR",
        "https://feeds.npr.org/1001/rss.xml",
        "US",
        PoliticalLeaning::CenterLeft,
    ),
    (
        "The New York Times",
        "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
        "US",
        PoliticalLeaning::CenterLeft,
    ),
    (
        "Washington Post",
        "https://feeds.washingtonpost.com/rss/world",
        "US",
        PoliticalLeaning::CenterLeft,
    ),
    (
        "Al Jazeera",
        "https://www.aljazeera.com/xml/rss/all.xml",
        "Qatar",
        PoliticalLeaning::Center,
    ),
    (
        "Deutsche Welle",
        "https://rss.dw.com/xml/rss-en-all",
        "Germany",
        PoliticalLeaning::Center,
    ),
    (
        "France 24",
        "https://www.france24.com/en/rss",
        "France",
        PoliticalLeaning::Center,
    ),
    (
        "TechCrunch",
        "https://techcrunch.com/feed/",
        "US",
        PoliticalLeaning::TechFocus,
    ),
    (
        "The Verge",
        "https://www.theverge.com/rss/index.xml",
        "US",
        PoliticalLeaning::TechFocus,
    ),
    (
        "Ars Technica",
        "http://feeds.arstechnica.com/arstechnica/index",
        "US",
        PoliticalLeaning::TechFocus,
    ),
];

/// Built-in catalog of news feeds, used by `sources seed`
pub fn known_sources() -> Vec<NewSource> {
    KNOWN_FEEDS
        .iter()
        .map(|(name, url, country, leaning)| NewSource {
            name: (*name).to_string(),
            url: (*url).to_string(),
            country: Some((*country).to_string()),
            political_leaning: Some(*leaning),
        })
        .collect()
}
