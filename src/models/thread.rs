// src/models/thread.rs

//! Thread identity, posts, and the persisted snapshot.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::MediaDescriptor;

/// Thread URL patterns tried in order. Each must capture `board` and `id`.
const THREAD_URL_PATTERNS: &[&str] =
    &[r"^https?://boards\.(?:4chan|4channel)\.org/(?P<board>[\w-]+)/thread/(?P<id>\d+)"];

fn thread_url_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        THREAD_URL_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("invalid thread URL pattern"))
            .collect()
    })
}

/// Identifies one thread: board code, numeric id, canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    pub board: String,
    pub id: String,
    pub url: String,
}

impl ThreadRef {
    /// Parse a thread URL against the known URL patterns, in order.
    pub fn parse(url: &str) -> Option<Self> {
        for regex in thread_url_regexes() {
            if let Some(caps) = regex.captures(url.trim()) {
                return Some(Self::new(&caps["board"], &caps["id"]));
            }
        }
        None
    }

    /// Build a reference from a board code and thread id.
    pub fn new(board: &str, id: impl ToString) -> Self {
        let id = id.to_string();
        let url = format!("https://boards.4chan.org/{board}/thread/{id}");
        Self {
            board: board.to_string(),
            id,
            url,
        }
    }

    /// URL of the thread JSON on the API host.
    pub fn api_url(&self, api_host: &str) -> String {
        format!(
            "{}/{}/thread/{}.json",
            api_host.trim_end_matches('/'),
            self.board,
            self.id
        )
    }

    /// Short `board/id` label used in log lines.
    pub fn label(&self) -> String {
        format!("{}/{}", self.board, self.id)
    }
}

/// One entry in a thread's post sequence.
///
/// Only the fields the archiver reads are typed; everything else the
/// upstream sends is kept in `extra` so the stored snapshot remains the full
/// remote payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    /// Post id
    pub no: u64,

    /// Id of the thread this replies to (0 on the OP)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resto: Option<u64>,

    /// Reply count, present on the OP only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<u64>,

    /// Image count (excluding the OP's own image), present on the OP only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<u64>,

    /// 1 once the upstream has closed the thread, present on the OP only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,

    /// UNIX timestamp of the post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    /// Subject line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Comment body, HTML-escaped by the upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub com: Option<String>,

    /// Media timestamp id, present when the post carries an attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tim: Option<u64>,

    /// Attachment extension including the leading dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// Declared attachment size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsize: Option<u64>,

    /// Declared attachment digest (base64 MD5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// Original filename of the attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Any upstream fields the archiver does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// Descriptor for this post's attachment, if it has one.
    pub fn media(&self) -> Option<MediaDescriptor> {
        match (self.tim, &self.ext, &self.md5) {
            (Some(tim), Some(ext), Some(md5)) => Some(MediaDescriptor {
                tim,
                ext: ext.clone(),
                md5: md5.clone(),
            }),
            _ => None,
        }
    }
}

/// Local-only completion flags stored alongside the upstream payload.
///
/// Serialized under the reserved `"archive-chan"` key; these never appear in
/// the upstream schema. The whole object is omitted while every flag is
/// false, so a freshly fetched snapshot round-trips unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFlags {
    /// Mirror of the upstream archived flag, set when a closed payload is persisted
    #[serde(default)]
    pub archived: bool,

    /// Upstream no longer has the thread
    #[serde(rename = "404", default)]
    pub not_found: bool,

    /// Every media file was downloaded and verified after the thread went terminal
    #[serde(rename = "media-done", default)]
    pub media_complete: bool,
}

impl LocalFlags {
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// The persisted state of one thread: the full remote post sequence plus
/// local completion flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub posts: Vec<Post>,

    #[serde(rename = "archive-chan", default, skip_serializing_if = "LocalFlags::is_clear")]
    pub local: LocalFlags,
}

impl ThreadSnapshot {
    /// The original post, index 0 of the sequence.
    pub fn op(&self) -> Option<&Post> {
        self.posts.first()
    }

    /// Reply count declared on the OP.
    pub fn reply_count(&self) -> Option<u64> {
        self.op().and_then(|op| op.replies)
    }

    /// Whether the upstream payload says the thread is closed.
    pub fn archived_upstream(&self) -> bool {
        self.op().and_then(|op| op.archived).unwrap_or(0) == 1
    }

    /// Terminal threads can never change upstream again and are not re-fetched.
    pub fn is_terminal(&self) -> bool {
        self.local.archived || self.local.not_found
    }

    /// Descriptors for every post that carries media, in post order.
    pub fn media_descriptors(&self) -> Vec<MediaDescriptor> {
        self.posts.iter().filter_map(Post::media).collect()
    }

    /// Total media files this thread should have on disk.
    ///
    /// The OP's `images` field counts reply images only, so the OP's own
    /// image adds one.
    pub fn expected_media_total(&self) -> u64 {
        self.op().and_then(|op| op.images).unwrap_or(0) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thread_url() {
        let thread = ThreadRef::parse("https://boards.4chan.org/po/thread/570368").unwrap();
        assert_eq!(thread.board, "po");
        assert_eq!(thread.id, "570368");
        assert_eq!(thread.url, "https://boards.4chan.org/po/thread/570368");

        let legacy = ThreadRef::parse("http://boards.4channel.org/g/thread/51971506").unwrap();
        assert_eq!(legacy.board, "g");
        assert_eq!(legacy.id, "51971506");
    }

    #[test]
    fn test_parse_rejects_non_thread_urls() {
        assert!(ThreadRef::parse("https://boards.4chan.org/po/").is_none());
        assert!(ThreadRef::parse("https://example.com/po/thread/570368").is_none());
        assert!(ThreadRef::parse("not a url").is_none());
    }

    #[test]
    fn test_api_url() {
        let thread = ThreadRef::new("po", 570368);
        assert_eq!(
            thread.api_url("https://a.4cdn.org"),
            "https://a.4cdn.org/po/thread/570368.json"
        );
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = r#"{
            "posts": [
                {"no": 570368, "replies": 2, "images": 1, "sticky": 1,
                 "unique_ips": 38, "tim": 1546293948883, "ext": ".png",
                 "md5": "uZUeZeB14FVR+Mc2ScHvVA==", "fsize": 516657}
            ]
        }"#;
        let snapshot: ThreadSnapshot = serde_json::from_str(raw).unwrap();
        let op = snapshot.op().unwrap();
        assert_eq!(op.extra.get("sticky"), Some(&serde_json::json!(1)));
        assert_eq!(op.extra.get("unique_ips"), Some(&serde_json::json!(38)));

        let out = serde_json::to_string(&snapshot).unwrap();
        assert!(out.contains("\"sticky\""));
        assert!(out.contains("\"unique_ips\""));
        // No local flags were set, so the reserved key is absent
        assert!(!out.contains("archive-chan"));
    }

    #[test]
    fn test_local_flags_wire_names() {
        let mut snapshot = ThreadSnapshot {
            posts: vec![Post {
                no: 1,
                ..Post::default()
            }],
            ..ThreadSnapshot::default()
        };
        snapshot.local.not_found = true;
        snapshot.local.media_complete = true;

        let out = serde_json::to_string(&snapshot).unwrap();
        assert!(out.contains("\"archive-chan\""));
        assert!(out.contains("\"404\":true"));
        assert!(out.contains("\"media-done\":true"));

        let back: ThreadSnapshot = serde_json::from_str(&out).unwrap();
        assert!(back.local.not_found);
        assert!(back.local.media_complete);
        assert!(back.is_terminal());
    }

    #[test]
    fn test_media_descriptors_and_expected_total() {
        let raw = r#"{
            "posts": [
                {"no": 1, "replies": 3, "images": 1, "tim": 100, "ext": ".jpg",
                 "md5": "aaaa"},
                {"no": 2, "com": "text only"},
                {"no": 3, "tim": 200, "ext": ".webm", "md5": "bbbb"}
            ]
        }"#;
        let snapshot: ThreadSnapshot = serde_json::from_str(raw).unwrap();
        let media = snapshot.media_descriptors();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].filename(), "100.jpg");
        assert_eq!(media[1].filename(), "200.webm");
        assert_eq!(snapshot.expected_media_total(), 2);
    }

    #[test]
    fn test_archived_upstream() {
        let raw = r#"{"posts": [{"no": 1, "replies": 0, "archived": 1}]}"#;
        let snapshot: ThreadSnapshot = serde_json::from_str(raw).unwrap();
        assert!(snapshot.archived_upstream());
        // Upstream flag alone does not make the snapshot terminal
        assert!(!snapshot.is_terminal());
    }
}
