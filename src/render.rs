// src/render.rs

//! HTML rendering of archived threads.
//!
//! A pure function from snapshot to document: rendering never touches the
//! network and never mutates archival state. The page links media from the
//! local `media/` directory when files are preserved, from the upstream
//! media host otherwise.

use chrono::DateTime;
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::config::ArchiveConfig;
use crate::models::{Post, ThreadRef, ThreadSnapshot};

const STYLE: &str = "\
body { font-family: sans-serif; background: #eef2ff; margin: 0 auto; max-width: 60rem; padding: 1rem; }\
.post { background: #d6daf0; border: 1px solid #b7c5d9; margin: 0.5rem 0; padding: 0.5rem; }\
.post.op { background: #f0e0d6; border-color: #d9bfb7; }\
.header { color: #117743; font-weight: bold; }\
.header .no { color: #34345c; font-weight: normal; }\
.subject { color: #cc1105; font-weight: bold; }\
.file img { max-width: 250px; max-height: 250px; display: block; }\
blockquote { margin: 0.5rem 1rem; }";

/// Render a thread snapshot to a standalone HTML page.
pub fn render_thread(thread: &ThreadRef, snapshot: &ThreadSnapshot, archive: &ArchiveConfig) -> String {
    let op = snapshot.op();
    let title = op
        .and_then(|p| p.sub.clone())
        .or_else(|| op.and_then(|p| p.semantic_url.clone()))
        .unwrap_or_else(|| thread.label());

    let replies = snapshot.posts.get(1..).unwrap_or(&[]);
    let shown = match archive.post_cap {
        Some(cap) => &replies[..cap.min(replies.len())],
        None => replies,
    };

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "/" (thread.board) "/ - " (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "/" (thread.board) "/ - " (title) }
                p {
                    a href=(thread.url) { (thread.url) }
                }
                @if let Some(op) = op {
                    (post_markup(op, thread, archive, true))
                }
                @for post in shown {
                    (post_markup(post, thread, archive, false))
                }
                @if shown.len() < replies.len() {
                    p { em { (replies.len() - shown.len()) " replies omitted." } }
                }
            }
        }
    };
    markup.into_string()
}

fn post_markup(post: &Post, thread: &ThreadRef, archive: &ArchiveConfig, is_op: bool) -> Markup {
    let media = post.media();
    let media_src = media.as_ref().map(|m| {
        if archive.preserve_media {
            format!("media/{}", m.filename())
        } else {
            m.url(&archive.media_host, &thread.board)
        }
    });

    html! {
        div class=(if is_op { "post op" } else { "post" }) {
            p.header {
                @if let Some(sub) = &post.sub {
                    span.subject { (sub) } " "
                }
                (post.name.as_deref().unwrap_or("Anonymous"))
                " " (post_date(post))
                " " span.no { "No." (post.no) }
            }
            @if let (Some(media), Some(src)) = (&media, &media_src) {
                p.file {
                    a href=(src) { (post.filename.as_deref().unwrap_or("file")) (media.ext) }
                    @if is_image(&media.ext) {
                        a href=(src) { img src=(src) alt=(media.filename()); }
                    }
                }
            }
            @if let Some(com) = &post.com {
                // Upstream comment bodies arrive as sanitized HTML.
                blockquote { (PreEscaped(com.as_str())) }
            }
        }
    }
}

fn post_date(post: &Post) -> String {
    if let Some(now) = &post.now {
        return now.clone();
    }
    post.time
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn is_image(ext: &str) -> bool {
    matches!(ext, ".jpg" | ".jpeg" | ".png" | ".gif")
}
