pub mod cli;
pub mod commands;
pub mod coverage;
pub mod pipeline;
pub mod utils;
