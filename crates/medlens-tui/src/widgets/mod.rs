//! Custom widgets for the TUI

pub mod markdown;
pub mod path_input;
pub mod spinner;
pub mod thumbnail;
pub mod transcript;

pub use path_input::PathInput;
pub use spinner::Spinner;
pub use thumbnail::Thumbnail;
pub use transcript::{EntryKind, TranscriptEntry, TranscriptView, transcript_height};
