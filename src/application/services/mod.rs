//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! `NetworkSession` is the one that touches I/O (through `FileSystem`);
//! analytics and sentiment scoring are pure.

pub mod analytics;
mod network;
mod sentiment;
mod session;

pub use analytics::DEFAULT_MAX_ITERATIONS;
pub use network::NetworkRegistry;
pub use sentiment::{LexiconAnalyzer, PolarityAnalyzer, SentimentLevel, SentimentScorer};
pub use session::NetworkSession;
