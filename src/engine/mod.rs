//! Core engine: one fetch, score and rank round.

pub mod recommender;
