//! YAML-like structured-text encoder
//!
//! Nesting state lives in an explicit section stack: every streamed
//! section pushes a frame on open and pops it on close, and every emitted
//! line derives its indentation from the frame on top. Pops are verified
//! against the pushed tag so an unbalanced close surfaces as an invariant
//! error instead of corrupting every following line.

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

const USERPICS_TAG: &str = "profile_pictures";
const MESSAGES_TAG: &str = "messages";

/// One open streamed section: its tag and the indent depth of its items
struct Frame {
    tag: &'static str,
    depth: usize,
}

/// YAML-like export encoder
#[derive(Default)]
pub struct YamlEncoder {
    out: Option<OutputStream>,
    main_path: Option<PathBuf>,
    stack: Vec<Frame>,
}

/// Double-quote a string, escaping what the quoting style cannot carry
fn quoted(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for ch in value.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

impl YamlEncoder {
    /// Create an encoder with no open streams
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<&mut OutputStream> {
        self.out
            .as_mut()
            .ok_or_else(|| ExportError::invariant("yaml stream not open"))
    }

    fn item_depth(&self) -> Result<usize> {
        self.stack
            .last()
            .map(|frame| frame.depth)
            .ok_or_else(|| ExportError::invariant("list item written with no section open"))
    }

    fn pop(&mut self, tag: &'static str) -> Result<()> {
        match self.stack.pop() {
            Some(top) if top.tag == tag => Ok(()),
            Some(top) => Err(ExportError::invariant(format!(
                "closed section {tag} while {} is open",
                top.tag
            ))),
            None => Err(ExportError::invariant(format!(
                "closed section {tag} with no section open"
            ))),
        }
    }

    /// Write one list item: first key carries the `- ` marker, the rest
    /// align beneath it, all indented from the current frame depth
    fn list_item(&mut self, pairs: &[(&str, String)]) -> Result<()> {
        let depth = self.item_depth()?;
        let out = self.stream()?;
        for (i, (key, value)) in pairs.iter().enumerate() {
            if i == 0 {
                out.write_line(&format!("{}- {key}: {value}", indent(depth)))?;
            } else {
                out.write_line(&format!("{}  {key}: {value}", indent(depth)))?;
            }
        }
        Ok(())
    }

    fn message_item(&mut self, message: &Message) -> Result<()> {
        let mut pairs: Vec<(&str, String)> = vec![
            ("id", message.id.to_string()),
            ("date", quoted(&format_date(&message.date))),
            ("from", quoted(&message.from)),
        ];
        if let Some(reply_to) = message.reply_to {
            pairs.push(("reply_to", reply_to.to_string()));
        }
        pairs.push(("text", quoted(&message.text)));
        self.list_item(&pairs)?;

        if let Some(media) = &message.media {
            let depth = self.item_depth()?;
            let media_pairs: Vec<(&str, String)> = match media {
                Media::Photo { path, width, height } => {
                    let mut p = vec![
                        ("kind", quoted("photo")),
                        ("width", width.to_string()),
                        ("height", height.to_string()),
                    ];
                    if let Some(path) = path {
                        p.push(("file", quoted(&path.display().to_string())));
                    }
                    p
                }
                Media::File { path, name, size } => {
                    let mut p = vec![
                        ("kind", quoted("file")),
                        ("name", quoted(name)),
                        ("size", size.to_string()),
                    ];
                    if let Some(path) = path {
                        p.push(("file", quoted(&path.display().to_string())));
                    }
                    p
                }
                Media::Sticker { emoji } => {
                    vec![("kind", quoted("sticker")), ("emoji", quoted(emoji))]
                }
                Media::Call { duration_secs } => vec![
                    ("kind", quoted("call")),
                    ("duration_secs", duration_secs.to_string()),
                ],
            };
            let out = self.stream()?;
            out.write_line(&format!("{}  media:", indent(depth)))?;
            for (key, value) in media_pairs {
                out.write_line(&format!("{}    {key}: {value}", indent(depth)))?;
            }
        }
        Ok(())
    }
}

impl Encoder for YamlEncoder {
    fn start(&mut self, settings: &Settings, stats: Arc<Stats>) -> Result<()> {
        let path = settings.main_file_path();
        self.out = Some(OutputStream::create(&path, stats)?);
        self.main_path = Some(path);
        Ok(())
    }

    fn personal(&mut self, info: &PersonalInfo) -> Result<()> {
        let name = info.full_name();
        let out = self.stream()?;
        out.write_line("personal:")?;
        out.write_line(&format!("  name: {}", quoted(&name)))?;
        out.write_line(&format!("  phone_number: {}", quoted(&info.phone_number)))?;
        if let Some(username) = &info.username {
            out.write_line(&format!("  username: {}", quoted(username)))?;
        }
        if let Some(bio) = &info.bio {
            out.write_line(&format!("  bio: {}", quoted(bio)))?;
        }
        Ok(())
    }

    fn userpics_start(&mut self, _info: &UserpicsInfo) -> Result<()> {
        self.stream()?.write_line("profile_pictures:")?;
        self.stack.push(Frame {
            tag: USERPICS_TAG,
            depth: 1,
        });
        Ok(())
    }

    fn userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()> {
        for userpic in &slice.list {
            let mut pairs = vec![
                ("id", userpic.id.to_string()),
                ("date", quoted(&format_date(&userpic.date))),
            ];
            if let Some(path) = &userpic.image_path {
                pairs.push(("file", quoted(&path.display().to_string())));
            }
            self.list_item(&pairs)?;
        }
        Ok(())
    }

    fn userpics_end(&mut self) -> Result<()> {
        self.pop(USERPICS_TAG)
    }

    fn contacts(&mut self, list: &ContactsList) -> Result<()> {
        if list.list.is_empty() {
            return self.stream()?.write_line("contacts: []");
        }
        let out = self.stream()?;
        out.write_line("contacts:")?;
        for contact in &list.list {
            out.write_line(&format!("  - name: {}", quoted(&contact.full_name())))?;
            out.write_line(&format!(
                "    phone_number: {}",
                quoted(&contact.phone_number)
            ))?;
            out.write_line(&format!(
                "    date: {}",
                quoted(&format_date(&contact.date))
            ))?;
        }
        Ok(())
    }

    fn sessions(&mut self, list: &SessionsList) -> Result<()> {
        if list.list.is_empty() {
            return self.stream()?.write_line("sessions: []");
        }
        let out = self.stream()?;
        out.write_line("sessions:")?;
        for session in &list.list {
            out.write_line(&format!(
                "  - application: {}",
                quoted(&session.application)
            ))?;
            out.write_line(&format!("    device: {}", quoted(&session.device)))?;
            out.write_line(&format!("    platform: {}", quoted(&session.platform)))?;
            out.write_line(&format!(
                "    created: {}",
                quoted(&format_date(&session.created))
            ))?;
            out.write_line(&format!(
                "    last_active: {}",
                quoted(&format_date(&session.last_active))
            ))?;
            out.write_line(&format!("    ip: {}", quoted(&session.ip)))?;
            out.write_line(&format!("    region: {}", quoted(&session.region)))?;
        }
        Ok(())
    }

    fn chats_start(&mut self, _info: &DialogsInfo, kind: ChatListKind) -> Result<()> {
        self.stream()?.write_line(&format!("{}:", kind.key()))?;
        self.stack.push(Frame {
            tag: kind.key(),
            depth: 1,
        });
        Ok(())
    }

    fn chat_start(&mut self, info: &DialogInfo, _kind: ChatListKind) -> Result<()> {
        let pairs = vec![
            ("id", info.id.to_string()),
            ("name", quoted(&info.name)),
            ("type", quoted(info.kind.label())),
            ("messages_count", info.messages_count.to_string()),
        ];
        self.list_item(&pairs)?;
        let depth = self.item_depth()?;
        self.stream()?
            .write_line(&format!("{}  messages:", indent(depth)))?;
        // Message items sit one level below the messages key.
        self.stack.push(Frame {
            tag: MESSAGES_TAG,
            depth: depth + 2,
        });
        Ok(())
    }

    fn chat_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        for message in &slice.list {
            self.message_item(message)?;
        }
        Ok(())
    }

    fn chat_end(&mut self) -> Result<()> {
        self.pop(MESSAGES_TAG)
    }

    fn chats_end(&mut self, kind: ChatListKind) -> Result<()> {
        self.pop(kind.key())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(open) = self.stack.last() {
            return Err(ExportError::invariant(format!(
                "finish with section {} still open",
                open.tag
            )));
        }
        match self.out.take() {
            Some(out) => out.finish(),
            None => Err(ExportError::invariant("yaml stream already closed")),
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

    #[test]
    fn test_quoting() {
        assert_eq!(quoted("plain"), "\"plain\"");
        assert_eq!(quoted("a\"b"), "\"a\\\"b\"");
        assert_eq!(quoted("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(quoted("tab\there"), "\"tab\\there\"");
    }

    #[test]
    fn test_nesting_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Yaml);
        let mut enc = YamlEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.chats_start(&DialogsInfo { count: 1 }, ChatListKind::Main)
            .unwrap();
        enc.chat_start(
            &DialogInfo {
                id: 7,
                name: "Alice".into(),
                kind: DialogKind::Personal,
                messages_count: 1,
            },
            ChatListKind::Main,
        )
        .unwrap();
        enc.chat_slice(&MessagesSlice {
            list: vec![Message {
                id: 1,
                date: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                from: "Alice".into(),
                reply_to: None,
                text: "hi".into(),
                media: None,
            }],
        })
        .unwrap();
        enc.chat_end().unwrap();
        enc.chats_end(ChatListKind::Main).unwrap();
        enc.finish().unwrap();

        let text = std::fs::read_to_string(dir.path().join("export_results.yaml")).unwrap();
        assert!(text.contains("dialogs:\n  - id: 7\n"));
        assert!(text.contains("    messages:\n      - id: 1\n"));
        assert!(text.contains("        text: \"hi\"\n"));
    }

    #[test]
    fn test_empty_section_is_composable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Yaml);
        let mut enc = YamlEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.userpics_start(&UserpicsInfo { count: 0 }).unwrap();
        enc.userpics_end().unwrap();
        enc.contacts(&ContactsList::default()).unwrap();
        enc.finish().unwrap();

        let text = std::fs::read_to_string(dir.path().join("export_results.yaml")).unwrap();
        // The empty streamed section leaves a bare key, the following
        // sibling starts at column zero with no dangling marker between.
        assert!(text.contains("profile_pictures:\ncontacts: []\n"));
    }

    #[test]
    fn test_unbalanced_pop_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Yaml);
        let mut enc = YamlEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        let err = enc.chat_end().unwrap_err();
        assert!(matches!(err, ExportError::Invariant(_)));
    }

    #[test]
    fn test_finish_with_open_section_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path(), Format::Yaml);
        let mut enc = YamlEncoder::new();
        enc.start(&settings, Arc::new(Stats::new())).unwrap();
        enc.userpics_start(&UserpicsInfo { count: 0 }).unwrap();
        let err = enc.finish().unwrap_err();
        assert!(matches!(err, ExportError::Invariant(_)));
    }
}
