pub mod command;
pub mod info;
pub mod multistream;
pub mod progress;
pub mod repack;
