pub mod create;
pub mod output;
pub mod test_source;
pub mod test_destination;
