//! Export protocol engine
//!
//! `ExportWriter` owns one format encoder and enforces the call-order
//! contract shared by every format: sections open, fill and close in a
//! fixed order, siblings never interleave, and nothing runs after a
//! failure. Encoders behind it only ever see legal sequences.

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::{
    ContactsList, DialogInfo, DialogsInfo, MessagesSlice, PersonalInfo, SessionsList,
    UserpicsInfo, UserpicsSlice,
};
use crate::error::{ExportError, Result};
use crate::settings::Settings;
use crate::stats::Stats;

use super::encoder::{ChatListKind, Encoder};
use super::stream::RunLock;

/// Single-shot steps in their mandated order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Step {
    Start,
    Personal,
    Userpics,
    Contacts,
    Sessions,
    Dialogs,
    LeftChannels,
}

/// Protocol position of the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Constructed, `start` not yet called
    Created,
    /// Between sections; `last` is the furthest completed step
    Open { last: Step },
    /// Inside the profile-pictures section
    InUserpics,
    /// Inside a conversation collection
    InChats { kind: ChatListKind, chat_open: bool },
    /// Run completed by `finish`
    Finished,
    /// Run ended by `abort`
    Aborted,
    /// An operation failed; only `abort` is accepted
    Poisoned,
}

/// Protocol engine driving one format encoder through an export run
pub struct ExportWriter {
    encoder: Box<dyn Encoder>,
    stats: Arc<Stats>,
    lock: Option<RunLock>,
    state: State,
}

impl ExportWriter {
    /// Wrap a format encoder; `start` begins the run
    pub fn new(encoder: Box<dyn Encoder>) -> Self {
        Self {
            encoder,
            stats: Arc::new(Stats::new()),
            lock: None,
            state: State::Created,
        }
    }

    /// Shared progress counters for this run
    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Path of the entry-point artifact, available once started
    pub fn main_file_path(&self) -> Option<PathBuf> {
        self.encoder.main_file_path()
    }

    /// Open the run: claim the output root and open root streams
    pub fn start(&mut self, settings: &Settings) -> Result<()> {
        self.guard()?;
        if self.state != State::Created {
            return self.reject("start called twice");
        }
        let lock = RunLock::acquire(&settings.output_dir)?;
        log::info!(
            "export started: {:?} into {}",
            settings.format,
            settings.output_dir.display()
        );
        match self.encoder.start(settings, Arc::clone(&self.stats)) {
            Ok(()) => {
                self.lock = Some(lock);
                self.state = State::Open { last: Step::Start };
                Ok(())
            }
            Err(e) => {
                drop(lock);
                self.poison();
                Err(e)
            }
        }
    }

    /// Write the profile block; only valid directly after `start`
    pub fn write_personal(&mut self, info: &PersonalInfo) -> Result<()> {
        self.expect_open(Step::Start, "write_personal")?;
        self.forward(|enc| enc.personal(info))?;
        self.state = State::Open {
            last: Step::Personal,
        };
        Ok(())
    }

    /// Open the profile-pictures section
    pub fn write_userpics_start(&mut self, info: &UserpicsInfo) -> Result<()> {
        self.expect_open(Step::Personal, "write_userpics_start")?;
        self.forward(|enc| enc.userpics_start(info))?;
        self.state = State::InUserpics;
        Ok(())
    }

    /// Append one page of profile pictures
    pub fn write_userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()> {
        self.guard()?;
        if self.state != State::InUserpics {
            return self.reject("write_userpics_slice outside the userpics section");
        }
        self.forward(|enc| enc.userpics_slice(slice))?;
        self.stats.add_pictures(slice.list.len() as u64);
        Ok(())
    }

    /// Close the profile-pictures section
    pub fn write_userpics_end(&mut self) -> Result<()> {
        self.guard()?;
        if self.state != State::InUserpics {
            return self.reject("write_userpics_end without matching start");
        }
        self.forward(|enc| enc.userpics_end())?;
        self.state = State::Open {
            last: Step::Userpics,
        };
        Ok(())
    }

    /// Write the full contact list in one call
    pub fn write_contacts_list(&mut self, list: &ContactsList) -> Result<()> {
        self.expect_open(Step::Userpics, "write_contacts_list")?;
        self.forward(|enc| enc.contacts(list))?;
        self.stats.add_contacts(list.list.len() as u64);
        self.state = State::Open {
            last: Step::Contacts,
        };
        Ok(())
    }

    /// Write the full session list in one call
    pub fn write_sessions_list(&mut self, list: &SessionsList) -> Result<()> {
        self.expect_open(Step::Contacts, "write_sessions_list")?;
        self.forward(|enc| enc.sessions(list))?;
        self.stats.add_sessions(list.list.len() as u64);
        self.state = State::Open {
            last: Step::Sessions,
        };
        Ok(())
    }

    /// Open the main conversation collection
    pub fn write_dialogs_start(&mut self, info: &DialogsInfo) -> Result<()> {
        self.expect_open(Step::Sessions, "write_dialogs_start")?;
        self.forward(|enc| enc.chats_start(info, ChatListKind::Main))?;
        self.state = State::InChats {
            kind: ChatListKind::Main,
            chat_open: false,
        };
        Ok(())
    }

    /// Open one conversation inside the main collection
    pub fn write_dialog_start(&mut self, info: &DialogInfo) -> Result<()> {
        self.chat_start(ChatListKind::Main, info, "write_dialog_start")
    }

    /// Append one page of messages to the open conversation
    pub fn write_dialog_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        self.chat_slice(ChatListKind::Main, slice, "write_dialog_slice")
    }

    /// Close the open conversation
    pub fn write_dialog_end(&mut self) -> Result<()> {
        self.chat_end(ChatListKind::Main, "write_dialog_end")
    }

    /// Close the main conversation collection
    pub fn write_dialogs_end(&mut self) -> Result<()> {
        self.chats_end(ChatListKind::Main, Step::Dialogs, "write_dialogs_end")
    }

    /// Open the left-channels collection
    pub fn write_left_channels_start(&mut self, info: &DialogsInfo) -> Result<()> {
        self.expect_open(Step::Dialogs, "write_left_channels_start")?;
        self.forward(|enc| enc.chats_start(info, ChatListKind::Left))?;
        self.state = State::InChats {
            kind: ChatListKind::Left,
            chat_open: false,
        };
        Ok(())
    }

    /// Open one left channel
    pub fn write_left_channel_start(&mut self, info: &DialogInfo) -> Result<()> {
        self.chat_start(ChatListKind::Left, info, "write_left_channel_start")
    }

    /// Append one page of messages to the open left channel
    pub fn write_left_channel_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        self.chat_slice(ChatListKind::Left, slice, "write_left_channel_slice")
    }

    /// Close the open left channel
    pub fn write_left_channel_end(&mut self) -> Result<()> {
        self.chat_end(ChatListKind::Left, "write_left_channel_end")
    }

    /// Close the left-channels collection
    pub fn write_left_channels_end(&mut self) -> Result<()> {
        self.chats_end(
            ChatListKind::Left,
            Step::LeftChannels,
            "write_left_channels_end",
        )
    }

    /// Complete the run: emit closers and the index, release the root
    pub fn finish(&mut self) -> Result<()> {
        self.guard()?;
        match self.state {
            State::Open { .. } => {}
            State::Created => return self.reject("finish before start"),
            State::InUserpics | State::InChats { .. } => {
                return self.reject("finish with a section still open");
            }
            _ => return self.reject("finish after the run ended"),
        }
        self.forward(|enc| enc.finish())?;
        if let Some(lock) = self.lock.take() {
            lock.release()?;
        }
        self.state = State::Finished;
        let snap = self.stats.snapshot();
        log::info!(
            "export finished: {} bytes in {} files, {} messages in {} chats",
            snap.bytes_written,
            snap.files_created,
            snap.messages_written,
            snap.dialogs_written
        );
        Ok(())
    }

    /// Cooperative cancellation: drop every open stream and release the
    /// output root without completing the document
    pub fn abort(&mut self) -> Result<()> {
        if matches!(self.state, State::Finished | State::Aborted) {
            return Ok(());
        }
        log::warn!("export aborted");
        let _ = self.encoder.abort();
        self.lock = None;
        self.state = State::Aborted;
        Ok(())
    }

    /// Reject every call after a failure, except `abort`
    fn guard(&self) -> Result<()> {
        if self.state == State::Poisoned {
            return Err(ExportError::Poisoned);
        }
        Ok(())
    }

    /// Precondition for single-shot steps: between sections, with the
    /// previous steps at or before `latest_allowed`
    fn expect_open(&mut self, latest_allowed: Step, operation: &str) -> Result<()> {
        self.guard()?;
        match self.state {
            State::Open { last } if last <= latest_allowed => Ok(()),
            State::Created => self.reject(&format!("{operation} before start")),
            State::InUserpics | State::InChats { .. } => {
                self.reject(&format!("{operation} while another section is open"))
            }
            State::Open { .. } => self.reject(&format!("{operation} out of order")),
            _ => self.reject(&format!("{operation} after the run ended")),
        }
    }

    fn chat_start(&mut self, kind: ChatListKind, info: &DialogInfo, operation: &str) -> Result<()> {
        self.guard()?;
        match self.state {
            State::InChats {
                kind: open_kind,
                chat_open: false,
            } if open_kind == kind => {}
            State::InChats {
                chat_open: true, ..
            } => return self.reject(&format!("{operation} with a chat already open")),
            _ => return self.reject(&format!("{operation} outside its collection")),
        }
        self.forward(|enc| enc.chat_start(info, kind))?;
        self.state = State::InChats {
            kind,
            chat_open: true,
        };
        Ok(())
    }

    fn chat_slice(&mut self, kind: ChatListKind, slice: &MessagesSlice, operation: &str) -> Result<()> {
        self.guard()?;
        match self.state {
            State::InChats {
                kind: open_kind,
                chat_open: true,
            } if open_kind == kind => {}
            _ => return self.reject(&format!("{operation} with no chat open")),
        }
        self.forward(|enc| enc.chat_slice(slice))?;
        self.stats.add_messages(slice.list.len() as u64);
        Ok(())
    }

    fn chat_end(&mut self, kind: ChatListKind, operation: &str) -> Result<()> {
        self.guard()?;
        match self.state {
            State::InChats {
                kind: open_kind,
                chat_open: true,
            } if open_kind == kind => {}
            _ => return self.reject(&format!("{operation} with no chat open")),
        }
        self.forward(|enc| enc.chat_end())?;
        self.stats.add_dialog();
        self.state = State::InChats {
            kind,
            chat_open: false,
        };
        Ok(())
    }

    fn chats_end(&mut self, kind: ChatListKind, step: Step, operation: &str) -> Result<()> {
        self.guard()?;
        match self.state {
            State::InChats {
                kind: open_kind,
                chat_open: false,
            } if open_kind == kind => {}
            State::InChats {
                chat_open: true, ..
            } => return self.reject(&format!("{operation} with a chat still open")),
            _ => return self.reject(&format!("{operation} without matching start")),
        }
        self.forward(|enc| enc.chats_end(kind))?;
        self.state = State::Open { last: step };
        Ok(())
    }

    /// Delegate to the encoder, poisoning the writer on failure
    fn forward<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Encoder) -> Result<()>,
    {
        match op(self.encoder.as_mut()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.poison();
                Err(e)
            }
        }
    }

    /// Deterministic rejection of an out-of-order call; the encoder is
    /// never touched, so no output is mutated
    fn reject(&mut self, message: &str) -> Result<()> {
        self.poison();
        Err(ExportError::protocol(message))
    }

    /// Release every resource exactly once and refuse further work
    fn poison(&mut self) {
        if self.state == State::Poisoned {
            return;
        }
        let _ = self.encoder.abort();
        self.lock = None;
        self.state = State::Poisoned;
    }
}
