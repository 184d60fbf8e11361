//! Database query operations organized by table

pub mod documents;
pub mod kv;
