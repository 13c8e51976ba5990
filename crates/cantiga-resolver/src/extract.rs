//! Song page content extraction.
//!
//! Catalog pages are scraped, not served over an API, so everything
//! here is defensive: each field is located through an ordered chain of
//! CSS selector fallbacks (the markup drifts over time), the document
//! is validated as an actual song page before anything is extracted
//! (keyword search loves to hand out discography and album listing
//! URLs), and any failure degrades to `None` instead of an error.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use cantiga_core::ScrapedContent;

use crate::catalog::RemoteCatalog;

// ---------------------------------------------------------------------------
// Selector chains, in priority order
// ---------------------------------------------------------------------------

const LYRICS_CONTAINER_PATTERNS: &[&str] = &[
    "div[data-lyrics-container='true']",
    "div[class*='Lyrics__Container']",
    "div[class*='lyrics']",
];

const SONG_TITLE_PATTERNS: &[&str] = &["h1[class*='SongHeader']", "h1"];

const ARTIST_PATTERNS: &[&str] = &[
    "a[class*='HeaderArtistAndTracklist']",
    "a[class*='SongHeader'][href*='/artists/']",
    "a[class*='Artist']",
];

const ALBUM_PATTERNS: &[&str] = &[
    "a[class*='PrimaryAlbum']",
    "div[class*='HeaderTracklist'] a[href*='/albums/']",
];

const RELEASE_DATE_PATTERNS: &[&str] = &[
    "span[class*='ReleaseDate']",
    "div[class*='MetadataStats'] span[class*='Date']",
];

const COVER_ART_PATTERNS: &[&str] = &["img[class*='CoverArt']", "img[class*='cover_art']"];

/// Page titles containing one of these are listing pages, not songs.
const LISTING_TITLE_MARKERS: &[&str] = &["discography", "(album)", "tracklist", "albums by"];

/// Class fragments marking sub-elements that must not leak into lyrics.
const NOISE_CLASS_MARKERS: &[&str] = &[
    "Ad__",
    "ReadMore",
    "Placeholder",
    "Embed",
    "Sidebar",
    "LyricsHeader",
];

fn parse_selector(pattern: &str) -> Selector {
    Selector::parse(pattern).expect("selector pattern is valid")
}

fn parse_selectors(patterns: &[&str]) -> Vec<Selector> {
    patterns.iter().map(|p| parse_selector(p)).collect()
}

static LYRICS_CONTAINERS: Lazy<Vec<Selector>> =
    Lazy::new(|| parse_selectors(LYRICS_CONTAINER_PATTERNS));
static SONG_TITLE: Lazy<Vec<Selector>> = Lazy::new(|| parse_selectors(SONG_TITLE_PATTERNS));
static ARTIST: Lazy<Vec<Selector>> = Lazy::new(|| parse_selectors(ARTIST_PATTERNS));
static ALBUM: Lazy<Vec<Selector>> = Lazy::new(|| parse_selectors(ALBUM_PATTERNS));
static RELEASE_DATE: Lazy<Vec<Selector>> = Lazy::new(|| parse_selectors(RELEASE_DATE_PATTERNS));
static COVER_ART: Lazy<Vec<Selector>> = Lazy::new(|| parse_selectors(COVER_ART_PATTERNS));
static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| parse_selector("title"));
static CREDIT_ROWS: Lazy<Selector> = Lazy::new(|| parse_selector("div[class*='SongInfo__Credit']"));
static CREDIT_LABEL: Lazy<Selector> = Lazy::new(|| parse_selector("div[class*='SongInfo__Label']"));
static CREDIT_VALUES: Lazy<Selector> = Lazy::new(|| parse_selector("a"));

// ---------------------------------------------------------------------------
// Lyrics cleaning
// ---------------------------------------------------------------------------

static SECTION_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("section marker regex is valid"));
static SPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("space run regex is valid"));
static LINE_EDGE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("line edge regex is valid"));
static NEWLINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline run regex is valid"));

/// Clean reconstructed lyric text: strip bracketed annotations (section
/// markers like `[Chorus]`), collapse space runs, collapse 3+ newlines
/// to exactly 2, and trim.
#[must_use]
pub fn clean_lyrics(raw: &str) -> String {
    let text = SECTION_MARKERS.replace_all(raw, "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = LINE_EDGE_SPACE.replace_all(&text, "\n");
    let text = NEWLINE_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

// ---------------------------------------------------------------------------
// Document queries
// ---------------------------------------------------------------------------

fn collapse_ws<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined: String = parts.into_iter().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty text content along a selector chain.
fn first_text(doc: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        doc.select(sel)
            .next()
            .map(|el| collapse_ws(el.text()))
            .filter(|t| !t.is_empty())
    })
}

/// First non-empty attribute value along a selector chain.
fn first_attr(doc: &Html, selectors: &[Selector], attr: &str) -> Option<String> {
    selectors.iter().find_map(|sel| {
        doc.select(sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string)
            .filter(|v| !v.is_empty())
    })
}

/// `<meta property=...>` content, the Open-Graph fallback for several
/// fields.
fn meta_content(doc: &Html, property: &str) -> Option<String> {
    let sel = parse_selector(&format!("meta[property='{property}']"));
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

fn page_title(doc: &Html) -> Option<String> {
    doc.select(&PAGE_TITLE)
        .next()
        .map(|el| collapse_ws(el.text()))
        .filter(|t| !t.is_empty())
}

fn has_lyrics_container(doc: &Html) -> bool {
    LYRICS_CONTAINERS
        .iter()
        .any(|sel| doc.select(sel).next().is_some())
}

fn title_indicates_listing(doc: &Html) -> bool {
    page_title(doc).is_some_and(|title| {
        let title = title.to_lowercase();
        LISTING_TITLE_MARKERS.iter().any(|m| title.contains(m))
    })
}

/// A document is a song page only when a lyrics container exists and
/// the title does not look like a discography/album listing.
fn is_song_page(doc: &Html) -> bool {
    has_lyrics_container(doc) && !title_indicates_listing(doc)
}

// ---------------------------------------------------------------------------
// Lyrics reconstruction
// ---------------------------------------------------------------------------

fn is_noise(element: &scraper::node::Element) -> bool {
    matches!(
        element.name(),
        "script" | "style" | "aside" | "iframe" | "noscript"
    ) || element
        .classes()
        .any(|class| NOISE_CLASS_MARKERS.iter().any(|m| class.contains(m)))
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "b" | "i" | "em" | "strong" | "span" | "u" | "small" | "sup" | "sub"
    )
}

/// Walk the container's nested structure, treating `<br>` as a newline
/// boundary and each block-level child as its own line, skipping noise
/// sub-elements entirely.
///
/// Raw newlines inside text nodes are HTML source formatting, not line
/// breaks; they flatten to single spaces here so that only explicit
/// markers produce newlines.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !flat.is_empty() {
                    if !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
                        out.push(' ');
                    }
                    out.push_str(&flat);
                }
            }
            Node::Element(elem) => {
                if elem.name() == "br" {
                    out.push('\n');
                } else if !is_noise(elem) {
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        collect_text(child_ref, out);
                        if !is_inline(elem.name()) && !out.ends_with('\n') {
                            out.push('\n');
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn lyrics_from(doc: &Html) -> Option<String> {
    let container = LYRICS_CONTAINERS
        .iter()
        .find_map(|sel| doc.select(sel).next())?;
    let mut raw = String::new();
    collect_text(container, &mut raw);
    let cleaned = clean_lyrics(&raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

// ---------------------------------------------------------------------------
// Auxiliary fields
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Credits {
    featured: Vec<String>,
    producers: Vec<String>,
    writers: Vec<String>,
}

fn collect_credits(doc: &Html) -> Credits {
    let mut credits = Credits::default();
    for row in doc.select(&CREDIT_ROWS) {
        let Some(label) = row.select(&CREDIT_LABEL).next().map(|el| collapse_ws(el.text()))
        else {
            continue;
        };
        let label = label.to_lowercase();
        let names: Vec<String> = row
            .select(&CREDIT_VALUES)
            .map(|a| collapse_ws(a.text()))
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            continue;
        }
        if label.contains("featur") {
            credits.featured.extend(names);
        } else if label.contains("produc") {
            credits.producers.extend(names);
        } else if label.contains("writ") {
            credits.writers.extend(names);
        }
    }
    credits
}

/// Extract every field independently; a missing album or date never
/// blocks the lyrics.
fn scrape_document(doc: &Html) -> ScrapedContent {
    let credits = collect_credits(doc);
    ScrapedContent {
        lyrics: lyrics_from(doc),
        cover_art_url: first_attr(doc, &COVER_ART, "src")
            .or_else(|| meta_content(doc, "og:image")),
        song_title: first_text(doc, &SONG_TITLE).or_else(|| meta_content(doc, "og:title")),
        artist_name: first_text(doc, &ARTIST),
        album_name: first_text(doc, &ALBUM),
        release_date: first_text(doc, &RELEASE_DATE),
        featured_artists: credits.featured,
        producers: credits.producers,
        writers: credits.writers,
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Fetches a song page through the gateway-backed catalog and extracts
/// its content.
///
/// This component never returns an error: network failures, non-success
/// statuses, and validity rejections are logged and become `None`.
pub struct PageExtractor {
    catalog: Arc<dyn RemoteCatalog>,
}

impl fmt::Debug for PageExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageExtractor").finish_non_exhaustive()
    }
}

impl PageExtractor {
    #[must_use]
    pub fn new(catalog: Arc<dyn RemoteCatalog>) -> Self {
        Self { catalog }
    }

    /// Fetch, validate, and extract the full page content.
    pub async fn extract_all(&self, url: &str) -> Option<ScrapedContent> {
        let html = self.fetch(url).await?;
        let doc = Html::parse_document(&html);
        if !is_song_page(&doc) {
            log_rejection(url);
            return None;
        }
        Some(scrape_document(&doc))
    }

    /// Fast path for callers that only need text: fetch, validate, and
    /// extract lyrics without the auxiliary-field passes.
    pub async fn extract_lyrics(&self, url: &str) -> Option<String> {
        let html = self.fetch(url).await?;
        let doc = Html::parse_document(&html);
        if !is_song_page(&doc) {
            log_rejection(url);
            return None;
        }
        lyrics_from(&doc)
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        match self.catalog.fetch_page(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                log::warn!("failed to fetch {url}: {e}");
                None
            }
        }
    }
}

/// Validity rejections are terminal for the URL (the page itself is
/// wrong), so they are logged as the typed error and absorbed.
fn log_rejection(url: &str) {
    let err = crate::error::ResolveError::InvalidPage {
        url: url.to_string(),
    };
    log::warn!("extraction failed: {err}");
}
