pub mod handlers;
pub mod ingest;
pub mod parse;
pub mod pdf;
