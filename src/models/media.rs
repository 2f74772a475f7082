// src/models/media.rs

//! Media attachment metadata.

/// Locates one attachment and the digest the upstream declared for it.
///
/// Derived from the post sequence on demand, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Upstream timestamp id of the attachment
    pub tim: u64,

    /// File extension including the leading dot (".jpg", ".webm", ...)
    pub ext: String,

    /// Expected MD5 digest, base64-encoded as the upstream API reports it
    pub md5: String,
}

impl MediaDescriptor {
    /// Deterministic local filename for this attachment.
    pub fn filename(&self) -> String {
        format!("{}{}", self.tim, self.ext)
    }

    /// Download URL on the media host.
    pub fn url(&self, media_host: &str, board: &str) -> String {
        format!(
            "{}/{}/{}",
            media_host.trim_end_matches('/'),
            board,
            self.filename()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_and_url() {
        let media = MediaDescriptor {
            tim: 1546293948883,
            ext: ".png".to_string(),
            md5: "uZUeZeB14FVR+Mc2ScHvVA==".to_string(),
        };
        assert_eq!(media.filename(), "1546293948883.png");
        assert_eq!(
            media.url("https://i.4cdn.org/", "po"),
            "https://i.4cdn.org/po/1546293948883.png"
        );
    }
}
