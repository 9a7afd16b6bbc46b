//! HTML encoder
//!
//! The multi-file format: every conversation streams into its own page
//! under `chats/`, the streamed lists into pages under `lists/`, and the
//! index is rendered last, from the accumulated link table, once every
//! page's path and entry count is known. The link table is insertion
//! ordered so the index lists conversations in export order.

use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

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

const BASE_STYLE: &str = "
body { font-family: sans-serif; margin: 0 auto; max-width: 720px; padding: 16px; color: #222; }
h1 { font-size: 20px; border-bottom: 1px solid #ddd; padding-bottom: 8px; }
h2 { font-size: 16px; margin-top: 24px; }
a { color: #168acd; text-decoration: none; }
a:hover { text-decoration: underline; }
.entry { padding: 6px 0; border-bottom: 1px solid #f0f0f0; }
.details { color: #999; font-size: 12px; }
";

const MESSAGE_STYLE: &str = "
.message { padding: 8px 0; border-bottom: 1px solid #f0f0f0; }
.message .from { font-weight: bold; }
.message .date { color: #999; font-size: 12px; margin-left: 8px; }
.message .media { color: #555; font-style: italic; }
.message img.photo { max-width: 280px; display: block; margin-top: 4px; }
";

/// Shared `<head>` fragment; composed once, reused by every page
static PAGE_HEAD: Lazy<String> = Lazy::new(|| {
    format!(
        "<meta charset=\"utf-8\">\n<style>{}{}</style>",
        BASE_STYLE.trim(),
        MESSAGE_STYLE.trim()
    )
});

/// Escape text for HTML body and attribute positions
fn html_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}

/// Lowercase alphanumeric slug of a conversation name for its file name
fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for ch in name.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_').to_string();
    slug.chars().take(48).collect()
}

/// A finished auxiliary page linked from the index
struct ListPage {
    title: &'static str,
    file: &'static str,
    entries: usize,
}

/// A finished conversation page in the link table
struct ChatPage {
    title: String,
    kind_label: &'static str,
    list: ChatListKind,
    messages: usize,
}

/// The page currently being streamed for an open conversation
struct ChatStream {
    out: OutputStream,
    file: String,
    title: String,
    kind_label: &'static str,
    list: ChatListKind,
    messages: usize,
}

/// HTML export encoder
#[derive(Default)]
pub struct HtmlEncoder {
    root: Option<PathBuf>,
    main_path: Option<PathBuf>,
    stats: Option<Arc<Stats>>,
    personal: Option<PersonalInfo>,
    list_pages: Vec<ListPage>,
    /// Link table for the index, keyed by relative file path
    chats: IndexMap<String, ChatPage>,
    used_names: AHashMap<String, usize>,
    userpics_out: Option<OutputStream>,
    userpics_entries: usize,
    current: Option<ChatStream>,
}

impl HtmlEncoder {
    /// Create an encoder with no open streams
    pub fn new() -> Self {
        Self::default()
    }

    fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| ExportError::invariant("html encoder not started"))
    }

    fn stats(&self) -> Result<Arc<Stats>> {
        self.stats
            .clone()
            .ok_or_else(|| ExportError::invariant("html encoder not started"))
    }

    fn page_header(title: &str, back_link: Option<&str>) -> String {
        let back = match back_link {
            Some(href) => format!("<a href=\"{href}\">&laquo; back to export</a>\n"),
            None => String::new(),
        };
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>{}</title>\n{}\n</head>\n<body>\n{back}<h1>{}</h1>\n",
            html_escape(title),
            *PAGE_HEAD,
            html_escape(title)
        )
    }

    fn page_footer() -> &'static str {
        "</body>\n</html>\n"
    }

    /// Open an auxiliary list page under `lists/`
    fn open_list_page(&mut self, file: &str, title: &str) -> Result<OutputStream> {
        let path = self.root()?.join(file);
        let mut out = OutputStream::create(&path, self.stats()?)?;
        out.write_str(&Self::page_header(title, Some("../export_results.html")))?;
        Ok(out)
    }

    /// Reserve a unique relative file path for a conversation page
    fn chat_file(&mut self, info: &DialogInfo) -> String {
        let slug = match slugify(&info.name) {
            s if s.is_empty() => format!("chat_{}", info.id),
            s => s,
        };
        let seen = self.used_names.entry(slug.clone()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            format!("chats/{slug}.html")
        } else {
            format!("chats/{slug}_{seen}.html")
        }
    }

    fn message_fragment(message: &Message) -> String {
        let mut fragment = String::from("<div class=\"message\">\n");
        fragment.push_str(&format!(
            "<span class=\"from\">{}</span><span class=\"date\">{}</span>\n",
            html_escape(if message.from.is_empty() {
                "(unknown)"
            } else {
                &message.from
            }),
            format_date(&message.date)
        ));
        if let Some(reply_to) = message.reply_to {
            fragment.push_str(&format!(
                "<div class=\"details\">in reply to message {reply_to}</div>\n"
            ));
        }
        if !message.text.is_empty() {
            let body = html_escape(&message.text).replace('\n', "<br>\n");
            fragment.push_str(&format!("<div class=\"text\">{body}</div>\n"));
        }
        if let Some(media) = &message.media {
            let media_html = match media {
                Media::Photo { path, width, height } => match path {
                    Some(p) => format!(
                        "<img class=\"photo\" src=\"../{}\" width=\"{width}\" height=\"{height}\">",
                        html_escape(&p.display().to_string())
                    ),
                    None => format!("<div class=\"media\">photo {width}x{height}, not downloaded</div>"),
                },
                Media::File { path, name, size } => match path {
                    Some(p) => format!(
                        "<div class=\"media\"><a href=\"../{}\">{}</a> ({})</div>",
                        html_escape(&p.display().to_string()),
                        html_escape(name),
                        human_size(*size)
                    ),
                    None => format!(
                        "<div class=\"media\">file {} ({}), not downloaded</div>",
                        html_escape(name),
                        human_size(*size)
                    ),
                },
                Media::Sticker { emoji } => {
                    format!("<div class=\"media\">sticker {}</div>", html_escape(emoji))
                }
                Media::Call { duration_secs } => {
                    format!("<div class=\"media\">call, {duration_secs} seconds</div>")
                }
            };
            fragment.push_str(&media_html);
            fragment.push('\n');
        }
        fragment.push_str("</div>\n");
        fragment
    }

    /// Render the index from the accumulated state; only called from
    /// `finish`, when every linked page is already on disk
    fn render_index(&mut self) -> Result<()> {
        let path = self
            .main_path
            .clone()
            .ok_or_else(|| ExportError::invariant("html encoder not started"))?;
        let mut out = OutputStream::create(&path, self.stats()?)?;
        out.write_str(&Self::page_header("Exported data", None))?;

        if let Some(personal) = &self.personal {
            out.write_str("<h2>Personal information</h2>\n")?;
            out.write_str(&format!(
                "<div class=\"entry\">{}<div class=\"details\">{}</div></div>\n",
                html_escape(&personal.full_name()),
                html_escape(&personal.phone_number)
            ))?;
            if let Some(username) = &personal.username {
                out.write_str(&format!(
                    "<div class=\"entry\">@{}</div>\n",
                    html_escape(username)
                ))?;
            }
            if let Some(bio) = &personal.bio {
                out.write_str(&format!(
                    "<div class=\"entry\">{}</div>\n",
                    html_escape(bio)
                ))?;
            }
        }

        if !self.list_pages.is_empty() {
            out.write_str("<h2>Data</h2>\n")?;
            for page in &self.list_pages {
                out.write_str(&format!(
                    "<div class=\"entry\"><a href=\"{}\">{}</a><div class=\"details\">{} entries</div></div>\n",
                    page.file, page.title, page.entries
                ))?;
            }
        }

        for kind in [ChatListKind::Main, ChatListKind::Left] {
            let pages: Vec<_> = self
                .chats
                .iter()
                .filter(|(_, page)| page.list == kind)
                .collect();
            if pages.is_empty() {
                continue;
            }
            out.write_str(&format!("<h2>{}</h2>\n", kind.title()))?;
            for (file, page) in pages {
                out.write_str(&format!(
                    "<div class=\"entry\"><a href=\"{}\">{}</a><div class=\"details\">{}, {} messages</div></div>\n",
                    file,
                    html_escape(&page.title),
                    page.kind_label,
                    page.messages
                ))?;
            }
        }

        out.write_str(Self::page_footer())?;
        out.finish()
    }
}

impl Encoder for HtmlEncoder {
    fn start(&mut self, settings: &Settings, stats: Arc<Stats>) -> Result<()> {
        self.root = Some(settings.output_dir.clone());
        self.main_path = Some(settings.main_file_path());
        self.stats = Some(stats);
        Ok(())
    }

    fn personal(&mut self, info: &PersonalInfo) -> Result<()> {
        // Bounded: kept for the index rather than streamed.
        self.personal = Some(info.clone());
        Ok(())
    }

    fn userpics_start(&mut self, _info: &UserpicsInfo) -> Result<()> {
        let out = self.open_list_page("lists/profile_pictures.html", "Profile pictures")?;
        self.userpics_out = Some(out);
        self.userpics_entries = 0;
        Ok(())
    }

    fn userpics_slice(&mut self, slice: &UserpicsSlice) -> Result<()> {
        let count = slice.list.len();
        let out = self
            .userpics_out
            .as_mut()
            .ok_or_else(|| ExportError::invariant("userpics page not open"))?;
        for userpic in &slice.list {
            let body = match &userpic.image_path {
                Some(path) => format!(
                    "<a href=\"../{0}\"><img class=\"photo\" src=\"../{0}\"></a>",
                    html_escape(&path.display().to_string())
                ),
                None => "<div class=\"media\">not downloaded</div>".to_string(),
            };
            out.write_str(&format!(
                "<div class=\"entry\">{body}<div class=\"details\">{}</div></div>\n",
                format_date(&userpic.date)
            ))?;
        }
        self.userpics_entries += count;
        Ok(())
    }

    fn userpics_end(&mut self) -> Result<()> {
        let mut out = self
            .userpics_out
            .take()
            .ok_or_else(|| ExportError::invariant("userpics page not open"))?;
        out.write_str(Self::page_footer())?;
        out.finish()?;
        self.list_pages.push(ListPage {
            title: "Profile pictures",
            file: "lists/profile_pictures.html",
            entries: self.userpics_entries,
        });
        Ok(())
    }

    fn contacts(&mut self, list: &ContactsList) -> Result<()> {
        let mut out = self.open_list_page("lists/contacts.html", "Contacts")?;
        for contact in &list.list {
            out.write_str(&format!(
                "<div class=\"entry\">{}<div class=\"details\">{} &middot; added {}</div></div>\n",
                html_escape(&contact.full_name()),
                html_escape(&contact.phone_number),
                format_date(&contact.date)
            ))?;
        }
        out.write_str(Self::page_footer())?;
        out.finish()?;
        self.list_pages.push(ListPage {
            title: "Contacts",
            file: "lists/contacts.html",
            entries: list.list.len(),
        });
        Ok(())
    }

    fn sessions(&mut self, list: &SessionsList) -> Result<()> {
        let mut out = self.open_list_page("lists/sessions.html", "Sessions")?;
        for session in &list.list {
            out.write_str(&format!(
                "<div class=\"entry\">{} on {}<div class=\"details\">{} &middot; last active {} &middot; {} {}</div></div>\n",
                html_escape(&session.application),
                html_escape(&session.device),
                html_escape(&session.platform),
                format_date(&session.last_active),
                html_escape(&session.ip),
                html_escape(&session.region)
            ))?;
        }
        out.write_str(Self::page_footer())?;
        out.finish()?;
        self.list_pages.push(ListPage {
            title: "Sessions",
            file: "lists/sessions.html",
            entries: list.list.len(),
        });
        Ok(())
    }

    fn chats_start(&mut self, _info: &DialogsInfo, _kind: ChatListKind) -> Result<()> {
        // The collection has no page of its own; the index section is
        // built from the link table.
        Ok(())
    }

    fn chat_start(&mut self, info: &DialogInfo, kind: ChatListKind) -> Result<()> {
        if self.current.is_some() {
            return Err(ExportError::invariant("chat page already open"));
        }
        let file = self.chat_file(info);
        let title = if info.name.is_empty() {
            "(deleted)".to_string()
        } else {
            info.name.clone()
        };
        let path = self.root()?.join(&file);
        let mut out = OutputStream::create(&path, self.stats()?)?;
        out.write_str(&Self::page_header(&title, Some("../export_results.html")))?;
        out.write_str(&format!(
            "<div class=\"details\">{}, {} messages</div>\n",
            info.kind.label(),
            info.messages_count
        ))?;
        self.current = Some(ChatStream {
            out,
            file,
            title,
            kind_label: info.kind.label(),
            list: kind,
            messages: 0,
        });
        Ok(())
    }

    fn chat_slice(&mut self, slice: &MessagesSlice) -> Result<()> {
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| ExportError::invariant("chat page not open"))?;
        for message in &slice.list {
            current.out.write_str(&Self::message_fragment(message))?;
        }
        current.messages += slice.list.len();
        Ok(())
    }

    fn chat_end(&mut self) -> Result<()> {
        let mut current = self
            .current
            .take()
            .ok_or_else(|| ExportError::invariant("chat page not open"))?;
        current.out.write_str(Self::page_footer())?;
        current.out.finish()?;
        self.chats.insert(
            current.file,
            ChatPage {
                title: current.title,
                kind_label: current.kind_label,
                list: current.list,
                messages: current.messages,
            },
        );
        Ok(())
    }

    fn chats_end(&mut self, _kind: ChatListKind) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.current.is_some() || self.userpics_out.is_some() {
            return Err(ExportError::invariant("finish with a page still open"));
        }
        self.render_index()
    }

    fn abort(&mut self) -> Result<()> {
        self.current = None;
        self.userpics_out = None;
        Ok(())
    }

    fn main_file_path(&self) -> Option<PathBuf> {
        self.main_path.clone()
    }
}
