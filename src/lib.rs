pub mod cli;
pub mod config;
pub mod consumer;
pub mod fetcher;
pub mod input;
pub mod lookup;
pub mod output;
pub mod pipeline;
