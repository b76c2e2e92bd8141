pub mod spotify;
pub mod unmatched_log;
pub mod youtube;
