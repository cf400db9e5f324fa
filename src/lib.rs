pub mod analyzers;
pub mod charts;
pub mod config;
pub mod error;
pub mod fetch;
pub mod narrative;
pub mod nyt;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod rt;
pub mod state;
