//! # takeout
//!
//! A pure Rust library for streaming chat-history exports.
//!
//! The engine receives a user's data (profile, profile pictures,
//! contacts, sessions, conversations with paged message history) as an
//! ordered sequence of typed slices and serializes it incrementally into
//! one of four formats: plain text, YAML-like structured text, an HTML
//! document set, or JSON. No format ever holds the full dataset in
//! memory.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use takeout::{create_writer, Format, Settings};
//!
//! let settings = Settings::new("export_output", Format::Json);
//! let mut writer = create_writer(settings.format);
//!
//! writer.start(&settings)?;
//! writer.write_personal(&personal)?;
//! writer.write_dialogs_start(&dialogs_info)?;
//! for dialog in dialogs {
//!     writer.write_dialog_start(&dialog.info)?;
//!     for slice in dialog.message_pages {
//!         writer.write_dialog_slice(&slice)?;
//!     }
//!     writer.write_dialog_end()?;
//! }
//! writer.write_dialogs_end()?;
//! writer.finish()?;
//! # Ok::<(), takeout::ExportError>(())
//! ```
//!
//! ## Architecture
//!
//! - `ExportWriter` - protocol engine enforcing the section call order
//! - `Encoder` - trait implemented once per output format
//! - `Stats` - monotonic progress counters shared with the driver
//! - `Settings` - immutable configuration snapshot for one run
//!
//! The call order is a contract: sections open, fill and close in a
//! fixed sequence and never interleave. Out-of-order calls are rejected
//! deterministically and the writer refuses further work; the driver
//! restarts a run rather than resuming one.

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod data;
pub mod error;
pub mod output;
pub mod settings;
pub mod stats;

// Re-export commonly used types
pub use error::{ExportError, Result};
pub use output::{create_writer, ChatListKind, Encoder, ExportWriter};
pub use settings::{Categories, Format, Settings};
pub use stats::{Stats, StatsSnapshot};

// Re-export the data model
pub use data::{
    Contact, ContactsList, DialogInfo, DialogKind, DialogsInfo, Media, Message, MessagesSlice,
    PersonalInfo, Session, SessionsList, Userpic, UserpicsInfo, UserpicsSlice,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
