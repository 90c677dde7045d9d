//! Stateless feature tools behind the views. None of them touch the session.

pub mod keywords;
pub mod listing;
pub mod photo;
