// InnovateHer: hackathon judging.
// Implements: records and request validation, rubrics, score aggregation and
// leaderboards, judge assignment over a pluggable store (memory or Postgres).

pub mod handlers;
pub mod models;
pub mod pg_store;
pub mod rubric;
pub mod scoring;
pub mod store;
