pub mod parse;
pub mod query;
pub mod record;
pub mod runner;
