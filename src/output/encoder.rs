//! Format encoder trait
//!
//! One implementation per output format. Encoders only translate protocol
//! events into well-formed fragments at their current nesting state; call
//! ordering is validated upstream by the writer, so an encoder never sees
//! an illegal sequence from a correctly used `ExportWriter`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::{
    ContactsList, DialogInfo, DialogsInfo, MessagesSlice, PersonalInfo, SessionsList,
    UserpicsInfo, UserpicsSlice,
};
use crate::error::Result;
use crate::settings::Settings;
use crate::stats::Stats;

/// Which conversation collection a chat event belongs to
///
/// The writer exposes the dialogs and left-channels operation sets
/// separately; encoders receive them as one chat pipeline tagged with the
/// collection, so each format implements the pipeline once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatListKind {
    /// The main conversation list
    Main,
    /// Channels the user has left or archived
    Left,
}

impl ChatListKind {
    /// Section title used by the human-readable formats
    pub fn title(&self) -> &'static str {
        match self {
            ChatListKind::Main => "Chats",
            ChatListKind::Left => "Left chats",
        }
    }

    /// Root key used by the structured formats
    pub fn key(&self) -> &'static str {
        match self {
            ChatListKind::Main => "dialogs",
            ChatListKind::Left => "left_chats",
        }
    }
}

/// Trait for translating export events into one output format
pub trait Encoder {
    /// Open the root artifact stream(s) for a run
    fn start(&mut self, settings: &Settings, stats: Arc<Stats>) -> Result<()>;

    /// Write the profile block
    fn personal(&mut self, info: &PersonalInfo) -> Result<()>;

    /// Open the profile-pictures section
    fn userpics_start(&mut self, info: &UserpicsInfo) -> Result<()>;

    /// Append one page of profile pictures
    fn userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()>;

    /// Close the profile-pictures section
    fn userpics_end(&mut self) -> Result<()>;

    /// Write the full contact list
    fn contacts(&mut self, list: &ContactsList) -> Result<()>;

    /// Write the full session list
    fn sessions(&mut self, list: &SessionsList) -> Result<()>;

    /// Open a conversation collection
    fn chats_start(&mut self, info: &DialogsInfo, kind: ChatListKind) -> Result<()>;

    /// Open one conversation inside the current collection
    fn chat_start(&mut self, info: &DialogInfo, kind: ChatListKind) -> Result<()>;

    /// Append one page of messages to the open conversation
    fn chat_slice(&mut self, slice: &MessagesSlice) -> Result<()>;

    /// Close the open conversation
    fn chat_end(&mut self) -> Result<()>;

    /// Close the current conversation collection
    fn chats_end(&mut self, kind: ChatListKind) -> Result<()>;

    /// Flush and close every stream, emitting whatever the format needs
    /// to be independently openable (closing tokens, the HTML index)
    fn finish(&mut self) -> Result<()>;

    /// Drop all open streams without completing the document
    fn abort(&mut self) -> Result<()>;

    /// Path of the entry-point artifact; `None` before `start`
    fn main_file_path(&self) -> Option<PathBuf>;
}
