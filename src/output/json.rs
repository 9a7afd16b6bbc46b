//! JSON encoder
//!
//! Tracks, per nesting depth, whether the next member owes a comma. The
//! writer guarantees sections closed before `finish`, so closing the
//! document is a fixed sequence: one root brace. Anything else still open
//! at that point is an invariant failure, not valid input.

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
use super::format_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// One open JSON container and how many members it holds so far
#[derive(Debug)]
struct Level {
    container: Container,
    members: usize,
}

/// JSON export encoder
#[derive(Default)]
pub struct JsonEncoder {
    out: Option<OutputStream>,
    main_path: Option<PathBuf>,
    stack: Vec<Level>,
}

/// Quote and escape a string through serde_json
fn escape(value: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| ExportError::invariant(format!("json string encoding: {e}")))
}

fn indent(depth: usize) -> String {
    " ".repeat(depth)
}

impl JsonEncoder {
    /// Create an encoder with no open streams
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<&mut OutputStream> {
        self.out
            .as_mut()
            .ok_or_else(|| ExportError::invariant("json stream not open"))
    }

    /// Comma (when owed), newline and indentation before the next member
    /// of the innermost container
    fn member_prefix(&mut self) -> Result<String> {
        let level = self
            .stack
            .last_mut()
            .ok_or_else(|| ExportError::invariant("member written outside any container"))?;
        let comma = if level.members > 0 { "," } else { "" };
        level.members += 1;
        Ok(format!("{comma}\n{}", indent(self.stack.len())))
    }

    fn open(&mut self, key: Option<&str>, container: Container) -> Result<()> {
        let prefix = self.member_prefix()?;
        let opener = match container {
            Container::Object => '{',
            Container::Array => '[',
        };
        let head = match key {
            Some(key) => format!("{prefix}{}: {opener}", escape(key)?),
            None => format!("{prefix}{opener}"),
        };
        self.stream()?.write_str(&head)?;
        self.stack.push(Level {
            container,
            members: 0,
        });
        Ok(())
    }

    fn close(&mut self, container: Container) -> Result<()> {
        let level = self
            .stack
            .pop()
            .ok_or_else(|| ExportError::invariant("closed a container that is not open"))?;
        if level.container != container {
            return Err(ExportError::invariant(
                "closed a container of the wrong kind",
            ));
        }
        let closer = match container {
            Container::Object => '}',
            Container::Array => ']',
        };
        let text = if level.members == 0 {
            closer.to_string()
        } else {
            // Align the closer with the line that opened the container.
            format!("\n{}{closer}", indent(self.stack.len()))
        };
        self.stream()?.write_str(&text)
    }

    fn member(&mut self, key: &str, raw_value: &str) -> Result<()> {
        let prefix = self.member_prefix()?;
        let line = format!("{prefix}{}: {raw_value}", escape(key)?);
        self.stream()?.write_str(&line)
    }

    fn string_member(&mut self, key: &str, value: &str) -> Result<()> {
        let escaped = escape(value)?;
        self.member(key, &escaped)
    }

    fn message_object(&mut self, message: &Message) -> Result<()> {
        self.open(None, Container::Object)?;
        self.member("id", &message.id.to_string())?;
        self.string_member("date", &format_date(&message.date))?;
        self.string_member("from", &message.from)?;
        if let Some(reply_to) = message.reply_to {
            self.member("reply_to", &reply_to.to_string())?;
        }
        self.string_member("text", &message.text)?;
        if let Some(media) = &message.media {
            self.open(Some("media"), Container::Object)?;
            match media {
                Media::Photo { path, width, height } => {
                    self.string_member("kind", "photo")?;
                    self.member("width", &width.to_string())?;
                    self.member("height", &height.to_string())?;
                    if let Some(path) = path {
                        self.string_member("file", &path.display().to_string())?;
                    }
                }
                Media::File { path, name, size } => {
                    self.string_member("kind", "file")?;
                    self.string_member("name", name)?;
                    self.member("size", &size.to_string())?;
                    if let Some(path) = path {
                        self.string_member("file", &path.display().to_string())?;
                    }
                }
                Media::Sticker { emoji } => {
                    self.string_member("kind", "sticker")?;
                    self.string_member("emoji", emoji)?;
                }
                Media::Call { duration_secs } => {
                    self.string_member("kind", "call")?;
                    self.member("duration_secs", &duration_secs.to_string())?;
                }
            }
            self.close(Container::Object)?;
        }
        self.close(Container::Object)
    }
}

impl Encoder for JsonEncoder {
    fn start(&mut self, settings: &Settings, stats: Arc<Stats>) -> Result<()> {
        let path = settings.main_file_path();
        let mut out = OutputStream::create(&path, stats)?;
        out.write_str("{")?;
        self.out = Some(out);
        self.main_path = Some(path);
        self.stack.push(Level {
            container: Container::Object,
            members: 0,
        });
        Ok(())
    }

    fn personal(&mut self, info: &PersonalInfo) -> Result<()> {
        self.open(Some("personal"), Container::Object)?;
        self.string_member("first_name", &info.first_name)?;
        self.string_member("last_name", &info.last_name)?;
        self.string_member("phone_number", &info.phone_number)?;
        if let Some(username) = &info.username {
            self.string_member("username", username)?;
        }
        if let Some(bio) = &info.bio {
            self.string_member("bio", bio)?;
        }
        self.close(Container::Object)
    }

    fn userpics_start(&mut self, _info: &UserpicsInfo) -> Result<()> {
        self.open(Some("profile_pictures"), Container::Array)
    }

    fn userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()> {
        for userpic in &slice.list {
            self.open(None, Container::Object)?;
            self.member("id", &userpic.id.to_string())?;
            self.string_member("date", &format_date(&userpic.date))?;
            if let Some(path) = &userpic.image_path {
                self.string_member("file", &path.display().to_string())?;
            }
            self.close(Container::Object)?;
        }
        Ok(())
    }

    fn userpics_end(&mut self) -> Result<()> {
        self.close(Container::Array)
    }

    fn contacts(&mut self, list: &ContactsList) -> Result<()> {
        self.open(Some("contacts"), Container::Array)?;
        for contact in &list.list {
            self.open(None, Container::Object)?;
            self.string_member("first_name", &contact.first_name)?;
            self.string_member("last_name", &contact.last_name)?;
            self.string_member("phone_number", &contact.phone_number)?;
            self.string_member("date", &format_date(&contact.date))?;
            self.close(Container::Object)?;
        }
        self.close(Container::Array)
    }

    fn sessions(&mut self, list: &SessionsList) -> Result<()> {
        self.open(Some("sessions"), Container::Array)?;
        for session in &list.list {
            self.open(None, Container::Object)?;
            self.string_member("application", &session.application)?;
            self.string_member("device", &session.device)?;
            self.string_member("platform", &session.platform)?;
            self.string_member("created", &format_date(&session.created))?;
            self.string_member("last_active", &format_date(&session.last_active))?;
            self.string_member("ip", &session.ip)?;
            self.string_member("region", &session.region)?;
            self.close(Container::Object)?;
        }
        self.close(Container::Array)
    }

    fn chats_start(&mut self, _info: &DialogsInfo, kind: ChatListKind) -> Result<()> {
        self.open(Some(kind.key()), Container::Array)
    }

    fn chat_start(&mut self, info: &DialogInfo, _kind: ChatListKind) -> Result<()> {
        self.open(None, Container::Object)?;
        self.member("id", &info.id.to_string())?;
        self.string_member("name", &info.name)?;
        self.string_member("type", info.kind.label())?;
        self.member("messages_count", &info.messages_count.to_string())?;
        self.open(Some("messages"), Container::Array)
    }

    fn chat_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        for message in &slice.list {
            self.message_object(message)?;
        }
        Ok(())
    }

    fn chat_end(&mut self) -> Result<()> {
        self.close(Container::Array)?;
        self.close(Container::Object)
    }

    fn chats_end(&mut self, _kind: ChatListKind) -> Result<()> {
        self.close(Container::Array)
    }

    fn finish(&mut self) -> Result<()> {
        if self.stack.len() != 1 {
            return Err(ExportError::invariant(format!(
                "finish with {} containers open",
                self.stack.len()
            )));
        }
        self.close(Container::Object)?;
        let out = self.stream()?;
        out.write_str("\n")?;
        match self.out.take() {
            Some(out) => out.finish(),
            None => Err(ExportError::invariant("json stream already closed")),
        }
    }

    fn abort(&mut self) -> Result<()> {
        self.out = None;
        self.stack.clear();
        Ok(())
    }

    fn main_file_path(&self) -> Option<PathBuf> {
        self.main_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DialogKind;
    use crate::settings::Format;
    use chrono::TimeZone;

    fn read_json(dir: &std::path::Path) -> serde_json::Value {
        let text = std::fs::read_to_string(dir.join("export_results.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_empty_document_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Json);
        let mut enc = JsonEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.finish().unwrap();
        assert_eq!(read_json(dir.path()), serde_json::json!({}));
    }

    #[test]
    fn test_empty_sections_leave_no_dangling_commas() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Json);
        let mut enc = JsonEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.userpics_start(&UserpicsInfo { count: 0 }).unwrap();
        enc.userpics_end().unwrap();
        enc.contacts(&ContactsList::default()).unwrap();
        enc.finish().unwrap();

        let value = read_json(dir.path());
        assert_eq!(value["profile_pictures"], serde_json::json!([]));
        assert_eq!(value["contacts"], serde_json::json!([]));
    }

    #[test]
    fn test_escaping_through_serde() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Json);
        let mut enc = JsonEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.personal(&PersonalInfo {
            first_name: "Ja\"ne".into(),
            last_name: "D\\oe".into(),
            phone_number: "+1\n00".into(),
            username: None,
            bio: None,
        })
        .unwrap();
        enc.finish().unwrap();

        let value = read_json(dir.path());
        assert_eq!(value["personal"]["first_name"], "Ja\"ne");
        assert_eq!(value["personal"]["last_name"], "D\\oe");
        assert_eq!(value["personal"]["phone_number"], "+1\n00");
    }

    #[test]
    fn test_nested_chat_structure() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Json);
        let mut enc = JsonEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.chats_start(&DialogsInfo { count: 1 }, ChatListKind::Main)
            .unwrap();
        enc.chat_start(
            &DialogInfo {
                id: 7,
                name: "Alice".into(),
                kind: DialogKind::Personal,
                messages_count: 2,
            },
            ChatListKind::Main,
        )
        .unwrap();
        enc.chat_slice(&MessagesSlice {
            list: vec![
                Message {
                    id: 1,
                    date: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                    from: "Alice".into(),
                    reply_to: None,
                    text: "hi".into(),
                    media: None,
                },
                Message {
                    id: 2,
                    date: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap(),
                    from: "me".into(),
                    reply_to: Some(1),
                    text: "hello".into(),
                    media: Some(Media::Sticker {
                        emoji: "\u{1f44d}".into(),
                    }),
                },
            ],
        })
        .unwrap();
        enc.chat_end().unwrap();
        enc.chats_end(ChatListKind::Main).unwrap();
        enc.finish().unwrap();

        let value = read_json(dir.path());
        let dialogs = value["dialogs"].as_array().unwrap();
        assert_eq!(dialogs.len(), 1);
        let messages = dialogs[0]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["reply_to"], 1);
        assert_eq!(messages[1]["media"]["kind"], "sticker");
    }

    #[test]
    fn test_wrong_close_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Json);
        let mut enc = JsonEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.userpics_start(&UserpicsInfo { count: 0 }).unwrap();
        // Closing the array as an object is an internal inconsistency.
        let err = enc.close(Container::Object).unwrap_err();
        assert!(matches!(err, ExportError::Invariant(_)));
    }
}
