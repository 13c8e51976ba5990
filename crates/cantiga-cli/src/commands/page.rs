use anyhow::Result;

use cantiga_resolver::Resolver;

/// Fetch only the lyric text from a song page.
pub async fn run_lyrics(resolver: &Resolver, url: &str) {
    match resolver.extract_lyrics(url).await {
        Some(lyrics) => println!("{lyrics}"),
        None => println!("No lyrics available."),
    }
}

/// Fetch the full scraped content of a song page and print it as JSON.
pub async fn run_page(resolver: &Resolver, url: &str) -> Result<()> {
    match resolver.extract_all(url).await {
        Some(content) => println!("{}", serde_json::to_string_pretty(&content)?),
        None => println!("No content available."),
    }
    Ok(())
}
