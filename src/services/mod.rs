pub mod billing;
pub mod ingest;
pub mod normalize;
pub mod notify;
pub mod parsio;
pub mod state;
