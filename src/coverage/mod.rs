mod parse;
mod track;

pub use parse::AlignmentSummary;
pub use track::{render, TrackMode};
