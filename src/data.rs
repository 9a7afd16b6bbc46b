//! Chat data model
//!
//! Value objects handed to the export engine by the driver. The engine
//! treats them as opaque, already-validated data; it never mutates them
//! and never revisits a slice.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Profile block written at the top of every export
#[derive(Debug, Clone, Default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl PersonalInfo {
    /// Display name composed from the name parts
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Announced size of the profile-picture collection
#[derive(Debug, Clone, Copy, Default)]
pub struct UserpicsInfo {
    pub count: usize,
}

/// One profile picture reference
#[derive(Debug, Clone)]
pub struct Userpic {
    pub id: u64,
    pub date: DateTime<Utc>,
    /// Relative path of the downloaded image, if it was fetched
    pub image_path: Option<PathBuf>,
}

/// One page of the profile-picture collection
#[derive(Debug, Clone, Default)]
pub struct UserpicsSlice {
    pub list: Vec<Userpic>,
}

/// One saved contact
#[derive(Debug, Clone)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub date: DateTime<Utc>,
}

impl Contact {
    /// Display name composed from the name parts
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        name.trim().to_string()
    }
}

/// Full contact list, bounded and written in a single call
#[derive(Debug, Clone, Default)]
pub struct ContactsList {
    pub list: Vec<Contact>,
}

/// One authorized session or device
#[derive(Debug, Clone)]
pub struct Session {
    pub last_active: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub application: String,
    pub device: String,
    pub platform: String,
    pub ip: String,
    pub region: String,
}

/// Full session list, bounded and written in a single call
#[derive(Debug, Clone, Default)]
pub struct SessionsList {
    pub list: Vec<Session>,
}

/// Kind of conversation, as shown to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Personal,
    Bot,
    PrivateGroup,
    PublicGroup,
    PrivateChannel,
    PublicChannel,
}

impl DialogKind {
    /// Human-readable label used by every encoder
    pub fn label(&self) -> &'static str {
        match self {
            DialogKind::Personal => "personal",
            DialogKind::Bot => "bot",
            DialogKind::PrivateGroup => "private group",
            DialogKind::PublicGroup => "public group",
            DialogKind::PrivateChannel => "private channel",
            DialogKind::PublicChannel => "public channel",
        }
    }
}

/// Announced size of a conversation collection
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogsInfo {
    pub count: usize,
}

/// Metadata of one conversation
#[derive(Debug, Clone)]
pub struct DialogInfo {
    pub id: i64,
    pub name: String,
    pub kind: DialogKind,
    /// Total messages the driver will stream for this conversation
    pub messages_count: usize,
}

/// Attached media, rendered as a typed placeholder when the underlying
/// file was not downloaded
#[derive(Debug, Clone)]
pub enum Media {
    Photo {
        path: Option<PathBuf>,
        width: u32,
        height: u32,
    },
    File {
        path: Option<PathBuf>,
        name: String,
        size: u64,
    },
    Sticker {
        emoji: String,
    },
    Call {
        duration_secs: u32,
    },
}

/// One message inside a conversation
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub from: String,
    pub reply_to: Option<i64>,
    pub text: String,
    pub media: Option<Media>,
}

/// One page of a conversation's message history
#[derive(Debug, Clone, Default)]
pub struct MessagesSlice {
    pub list: Vec<Message>,
}
