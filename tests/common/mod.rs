//! Shared fixtures for the integration tests

use chrono::{TimeZone, Utc};
use takeout::{
    Contact, ContactsList, DialogInfo, DialogKind, DialogsInfo, ExportWriter, Media, Message,
    MessagesSlice, PersonalInfo, Result, Session, SessionsList, Userpic, UserpicsInfo,
    UserpicsSlice,
};

pub fn personal() -> PersonalInfo {
    PersonalInfo {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        phone_number: "+1 555 0100".into(),
        username: Some("janedoe".into()),
        bio: None,
    }
}

pub fn contacts(count: usize) -> ContactsList {
    ContactsList {
        list: (0..count)
            .map(|i| Contact {
                first_name: format!("Contact{i}"),
                last_name: "Example".into(),
                phone_number: format!("+1 555 02{i:02}"),
                date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            })
            .collect(),
    }
}

pub fn sessions(count: usize) -> SessionsList {
    SessionsList {
        list: (0..count)
            .map(|i| Session {
                last_active: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
                created: Utc.with_ymd_and_hms(2023, 3, 12, 12, 0, 0).unwrap(),
                application: format!("Desktop 4.{i}"),
                device: "Laptop".into(),
                platform: "Linux".into(),
                ip: "203.0.113.7".into(),
                region: "Berlin, Germany".into(),
            })
            .collect(),
    }
}

pub fn userpics(count: usize) -> UserpicsSlice {
    UserpicsSlice {
        list: (0..count)
            .map(|i| Userpic {
                id: i as u64 + 1,
                date: Utc.with_ymd_and_hms(2023, 11, 2, 9, 15, 0).unwrap(),
                image_path: if i % 2 == 0 {
                    Some(format!("profile_pictures/photo_{i}.jpg").into())
                } else {
                    None
                },
            })
            .collect(),
    }
}

pub fn dialog(id: i64, name: &str, messages_count: usize) -> DialogInfo {
    DialogInfo {
        id,
        name: name.into(),
        kind: DialogKind::Personal,
        messages_count,
    }
}

pub fn message(id: i64, from: &str, text: &str) -> Message {
    Message {
        id,
        date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        from: from.into(),
        reply_to: None,
        text: text.into(),
        media: None,
    }
}

pub fn media_message(id: i64, from: &str) -> Message {
    Message {
        id,
        date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap(),
        from: from.into(),
        reply_to: Some(id - 1),
        text: String::new(),
        media: Some(Media::Photo {
            path: Some("chats/photos/photo_1.jpg".into()),
            width: 640,
            height: 480,
        }),
    }
}

pub fn slice(messages: Vec<Message>) -> MessagesSlice {
    MessagesSlice { list: messages }
}

/// Drive a writer through one full run touching every section
pub fn drive_full_export(writer: &mut ExportWriter) -> Result<()> {
    writer.write_personal(&personal())?;

    writer.write_userpics_start(&UserpicsInfo { count: 3 })?;
    writer.write_userpics_slice(&userpics(3))?;
    writer.write_userpics_end()?;

    writer.write_contacts_list(&contacts(2))?;
    writer.write_sessions_list(&sessions(1))?;

    writer.write_dialogs_start(&DialogsInfo { count: 2 })?;
    writer.write_dialog_start(&dialog(7, "Alice Smith", 3))?;
    writer.write_dialog_slice(&slice(vec![
        message(100, "Alice Smith", "Did you see the release notes?"),
        message(101, "Jane Doe", "Yes!\nReading them now."),
    ]))?;
    writer.write_dialog_slice(&slice(vec![media_message(102, "Alice Smith")]))?;
    writer.write_dialog_end()?;
    writer.write_dialog_start(&dialog(8, "Rust Devs", 0))?;
    writer.write_dialog_end()?;
    writer.write_dialogs_end()?;

    writer.write_left_channels_start(&DialogsInfo { count: 1 })?;
    writer.write_left_channel_start(&DialogInfo {
        id: 9,
        name: "Old Announcements".into(),
        kind: DialogKind::PublicChannel,
        messages_count: 1,
    })?;
    writer.write_left_channel_slice(&slice(vec![message(
        1,
        "Old Announcements",
        "closing down",
    )]))?;
    writer.write_left_channel_end()?;
    writer.write_left_channels_end()?;

    writer.finish()
}
