pub mod candidate;
pub mod content;
pub mod outcome;
pub mod query;

pub use candidate::Candidate;
pub use content::ScrapedContent;
pub use outcome::{MatchOutcome, SearchStrategy};
pub use query::SongQuery;
