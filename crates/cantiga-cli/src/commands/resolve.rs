use anyhow::Result;

use cantiga_core::MatchOutcome;
use cantiga_resolver::Resolver;

/// Resolve one `(title, artist)` pair and print the outcome.
pub async fn run_resolve(resolver: &Resolver, title: &str, artist: &str, json: bool) -> Result<()> {
    let outcome = resolver.resolve(title, artist).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        MatchOutcome::Success {
            candidate,
            strategy,
        } => {
            println!(
                "Matched: {} - {} (via {strategy} strategy)",
                candidate.primary_artist, candidate.title
            );
            println!("  id:  {}", candidate.id);
            println!("  url: {}", candidate.url);
            if let Some(thumb) = &candidate.thumbnail_url {
                println!("  art: {thumb}");
            }
        }
        MatchOutcome::NotFound => {
            println!("No acceptable match found for {title:?} by {artist:?}.");
        }
        MatchOutcome::Error { message } => {
            println!("Resolution failed: {message}");
        }
    }

    Ok(())
}
