pub mod analyzers;
pub mod bib;
pub mod config;
pub mod fetch;
pub mod mapping;
pub mod meta;
pub mod olca;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod puf;
pub mod sctg;
pub mod stats;
