//! socialtree: a social network model
//!
//! Users sit in an introduction hierarchy (who brought whom in) that is
//! mirrored as an undirected relationship graph. On top of that the crate
//! detects communities, ranks users by betweenness centrality and scores
//! the sentiment of their interactions.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
