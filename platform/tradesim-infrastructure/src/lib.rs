pub mod market_archive;
pub mod summarizer;
