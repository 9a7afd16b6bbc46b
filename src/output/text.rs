//! Plain-text encoder
//!
//! Append-only: sections become header lines separated by blank lines, so
//! end operations never owe closing markup beyond a separator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::{
    ContactsList, DialogInfo, DialogsInfo, Media, Message, MessagesSlice, PersonalInfo,
    SessionsList, UserpicsInfo, UserpicsSlice,
};
use crate::error::{ExportError, Result};
use crate::settings::Settings;
use crate::stats::Stats;

use super::encoder::{ChatListKind, Encoder};
use super::stream::OutputStream;
use super::{format_date, human_size};

/// Plain-text export encoder
#[derive(Default)]
pub struct TextEncoder {
    out: Option<OutputStream>,
    main_path: Option<PathBuf>,
}

impl TextEncoder {
    /// Create an encoder with no open streams
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<&mut OutputStream> {
        self.out
            .as_mut()
            .ok_or_else(|| ExportError::invariant("text stream not open"))
    }

    fn section_header(&mut self, title: &str) -> Result<()> {
        let underline = "-".repeat(title.chars().count());
        let out = self.stream()?;
        out.write_line(title)?;
        out.write_line(&underline)?;
        out.write_line("")
    }

    fn message(&mut self, message: &Message) -> Result<()> {
        let head = format!(
            "[{}] {}:",
            format_date(&message.date),
            if message.from.is_empty() {
                "(unknown)"
            } else {
                &message.from
            }
        );
        let reply = message.reply_to;
        let body = if message.text.is_empty() {
            None
        } else {
            // Indent every line of the body under the header.
            Some(
                message
                    .text
                    .lines()
                    .map(|l| format!("  {l}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };
        let media_line = message.media.as_ref().map(|media| match media {
            Media::Photo { path, width, height } => match path {
                Some(p) => format!("  (photo {width}x{height}: {})", p.display()),
                None => format!("  (photo {width}x{height}, not downloaded)"),
            },
            Media::File { path, name, size } => match path {
                Some(p) => format!("  (file {name}, {}: {})", human_size(*size), p.display()),
                None => format!("  (file {name}, {}, not downloaded)", human_size(*size)),
            },
            Media::Sticker { emoji } => format!("  (sticker {emoji})"),
            Media::Call { duration_secs } => format!("  (call, {duration_secs} seconds)"),
        });

        let out = self.stream()?;
        out.write_line(&head)?;
        if let Some(reply_to) = reply {
            out.write_line(&format!("  (reply to message {reply_to})"))?;
        }
        if let Some(body) = body {
            out.write_line(&body)?;
        }
        if let Some(line) = media_line {
            out.write_line(&line)?;
        }
        Ok(())
    }
}

impl Encoder for TextEncoder {
    fn start(&mut self, settings: &Settings, stats: Arc<Stats>) -> Result<()> {
        let path = settings.main_file_path();
        self.out = Some(OutputStream::create(&path, stats)?);
        self.main_path = Some(path);
        Ok(())
    }

    fn personal(&mut self, info: &PersonalInfo) -> Result<()> {
        self.section_header("Personal information")?;
        let name = info.full_name();
        let out = self.stream()?;
        out.write_line(&format!("Name: {name}"))?;
        out.write_line(&format!("Phone number: {}", info.phone_number))?;
        if let Some(username) = &info.username {
            out.write_line(&format!("Username: @{username}"))?;
        }
        if let Some(bio) = &info.bio {
            out.write_line(&format!("Bio: {bio}"))?;
        }
        out.write_line("")
    }

    fn userpics_start(&mut self, info: &UserpicsInfo) -> Result<()> {
        self.section_header(&format!("Profile pictures ({})", info.count))
    }

    fn userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()> {
        let out = self.stream()?;
        for userpic in &slice.list {
            let line = match &userpic.image_path {
                Some(path) => format!("{} - {}", format_date(&userpic.date), path.display()),
                None => format!("{} - (not downloaded)", format_date(&userpic.date)),
            };
            out.write_line(&line)?;
        }
        Ok(())
    }

    fn userpics_end(&mut self) -> Result<()> {
        self.stream()?.write_line("")
    }

    fn contacts(&mut self, list: &ContactsList) -> Result<()> {
        self.section_header(&format!("Contacts ({})", list.list.len()))?;
        let out = self.stream()?;
        for contact in &list.list {
            let line = format!(
                "{} - {} - added {}",
                contact.full_name(),
                contact.phone_number,
                format_date(&contact.date)
            );
            out.write_line(&line)?;
        }
        out.write_line("")
    }

    fn sessions(&mut self, list: &SessionsList) -> Result<()> {
        self.section_header(&format!("Sessions ({})", list.list.len()))?;
        let out = self.stream()?;
        for session in &list.list {
            out.write_line(&format!(
                "{} on {} ({})",
                session.application, session.device, session.platform
            ))?;
            out.write_line(&format!(
                "  created {}, last active {}, {} {}",
                format_date(&session.created),
                format_date(&session.last_active),
                session.ip,
                session.region
            ))?;
        }
        out.write_line("")
    }

    fn chats_start(&mut self, info: &DialogsInfo, kind: ChatListKind) -> Result<()> {
        self.section_header(&format!("{} ({})", kind.title(), info.count))
    }

    fn chat_start(&mut self, info: &DialogInfo, _kind: ChatListKind) -> Result<()> {
        let header = format!(
            "== {} ({}, {} messages)",
            if info.name.is_empty() {
                "(deleted)"
            } else {
                &info.name
            },
            info.kind.label(),
            info.messages_count
        );
        let out = self.stream()?;
        out.write_line(&header)?;
        out.write_line("")
    }

    fn chat_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        for message in &slice.list {
            self.message(message)?;
        }
        Ok(())
    }

    fn chat_end(&mut self) -> Result<()> {
        self.stream()?.write_line("")
    }

    fn chats_end(&mut self, _kind: ChatListKind) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self.out.take() {
            Some(out) => out.finish(),
            None => Err(ExportError::invariant("text stream already closed")),
        }
    }

    fn abort(&mut self) -> Result<()> {
        self.out = None;
        Ok(())
    }

    fn main_file_path(&self) -> Option<PathBuf> {
        self.main_path.clone()
    }
}
