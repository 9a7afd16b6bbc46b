//! Generates a sample export in every supported format.
//!
//! Output lands in `sample_export/<format>/` so the artifacts can be
//! inspected by hand or opened in a browser.
//!
//! Run with:  cargo run --bin generate_sample_export

use anyhow::Result;
use chrono::{TimeZone, Utc};

use takeout::{
    create_writer, Categories, Contact, ContactsList, DialogInfo, DialogKind, DialogsInfo,
    Format, Media, Message, MessagesSlice, PersonalInfo, Session, SessionsList, Settings,
    Userpic, UserpicsInfo, UserpicsSlice,
};

fn sample_personal() -> PersonalInfo {
    PersonalInfo {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        phone_number: "+1 555 0100".into(),
        username: Some("janedoe".into()),
        bio: Some("Exploring the world, one export at a time.".into()),
    }
}

fn sample_userpics() -> UserpicsSlice {
    UserpicsSlice {
        list: vec![
            Userpic {
                id: 1,
                date: Utc.with_ymd_and_hms(2023, 11, 2, 9, 15, 0).unwrap(),
                image_path: Some("profile_pictures/photo_1.jpg".into()),
            },
            Userpic {
                id: 2,
                date: Utc.with_ymd_and_hms(2024, 2, 14, 18, 40, 0).unwrap(),
                image_path: None,
            },
        ],
    }
}

fn sample_contacts() -> ContactsList {
    ContactsList {
        list: vec![
            Contact {
                first_name: "Alice".into(),
                last_name: "Smith".into(),
                phone_number: "+1 555 0101".into(),
                date: Utc.with_ymd_and_hms(2022, 6, 1, 10, 0, 0).unwrap(),
            },
            Contact {
                first_name: "Bob".into(),
                last_name: String::new(),
                phone_number: "+1 555 0102".into(),
                date: Utc.with_ymd_and_hms(2023, 1, 20, 16, 30, 0).unwrap(),
            },
        ],
    }
}

fn sample_sessions() -> SessionsList {
    SessionsList {
        list: vec![Session {
            last_active: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            created: Utc.with_ymd_and_hms(2023, 3, 12, 12, 0, 0).unwrap(),
            application: "Desktop 4.16".into(),
            device: "ThinkPad X1".into(),
            platform: "Linux".into(),
            ip: "203.0.113.7".into(),
            region: "Berlin, Germany".into(),
        }],
    }
}

fn sample_messages() -> Vec<MessagesSlice> {
    let first = MessagesSlice {
        list: vec![
            Message {
                id: 100,
                date: Utc.with_ymd_and_hms(2024, 4, 30, 21, 5, 0).unwrap(),
                from: "Alice Smith".into(),
                reply_to: None,
                text: "Did you see the release notes?".into(),
                media: None,
            },
            Message {
                id: 101,
                date: Utc.with_ymd_and_hms(2024, 4, 30, 21, 7, 0).unwrap(),
                from: "Jane Doe".into(),
                reply_to: Some(100),
                text: "Yes! Attaching the changelog.".into(),
                media: Some(Media::File {
                    path: None,
                    name: "changelog.txt".into(),
                    size: 4096,
                }),
            },
        ],
    };
    let second = MessagesSlice {
        list: vec![Message {
            id: 102,
            date: Utc.with_ymd_and_hms(2024, 5, 1, 7, 45, 0).unwrap(),
            from: "Alice Smith".into(),
            reply_to: None,
            text: String::new(),
            media: Some(Media::Sticker {
                emoji: "\u{1f389}".into(),
            }),
        }],
    };
    vec![first, second]
}

fn export_one(format: Format, label: &str) -> Result<()> {
    let settings = Settings::new(format!("sample_export/{label}"), format)
        .with_categories(Categories::all());
    let mut writer = create_writer(format);
    let stats = writer.stats();

    writer.start(&settings)?;
    if settings.categories.contains(Categories::PERSONAL_INFO) {
        writer.write_personal(&sample_personal())?;
    }

    if settings.categories.contains(Categories::USERPICS) {
        writer.write_userpics_start(&UserpicsInfo { count: 2 })?;
        writer.write_userpics_slice(&sample_userpics())?;
        writer.write_userpics_end()?;
    }

    if settings.categories.contains(Categories::CONTACTS) {
        writer.write_contacts_list(&sample_contacts())?;
    }
    if settings.categories.contains(Categories::SESSIONS) {
        writer.write_sessions_list(&sample_sessions())?;
    }

    if settings.categories.contains(Categories::CHATS) {
        writer.write_dialogs_start(&DialogsInfo { count: 2 })?;
        writer.write_dialog_start(&DialogInfo {
            id: 7,
            name: "Alice Smith".into(),
            kind: DialogKind::Personal,
            messages_count: 3,
        })?;
        for slice in sample_messages() {
            writer.write_dialog_slice(&slice)?;
        }
        writer.write_dialog_end()?;
        writer.write_dialog_start(&DialogInfo {
            id: 8,
            name: "Rust Devs".into(),
            kind: DialogKind::PublicGroup,
            messages_count: 0,
        })?;
        writer.write_dialog_end()?;
        writer.write_dialogs_end()?;
    }

    if settings.categories.contains(Categories::LEFT_CHANNELS) {
        writer.write_left_channels_start(&DialogsInfo { count: 1 })?;
        writer.write_left_channel_start(&DialogInfo {
            id: 9,
            name: "Old Announcements".into(),
            kind: DialogKind::PublicChannel,
            messages_count: 0,
        })?;
        writer.write_left_channel_end()?;
        writer.write_left_channels_end()?;
    }

    writer.finish()?;

    let snap = stats.snapshot();
    println!(
        "{label:>5}: {} -> {} bytes, {} files, {} messages",
        writer
            .main_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        snap.bytes_written,
        snap.files_created,
        snap.messages_written
    );
    Ok(())
}

fn main() -> Result<()> {
    export_one(Format::Text, "text")?;
    export_one(Format::Yaml, "yaml")?;
    export_one(Format::Html, "html")?;
    export_one(Format::Json, "json")?;
    println!("done, see sample_export/");
    Ok(())
}
