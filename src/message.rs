use chrono::{DateTime, Utc};

/// Sentinel attachment id stored when a message carries no attachment.
pub const NO_ATTACHMENT_ID: i64 = 0;

/// Sentinel URL stored when no attachment URL applies.
pub const NO_ATTACHMENT_URL: &str = "No attachment URL";

/// The fixed tag stored in the `msg_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Plain text, or an attachment combination no rule covers.
    Message,
    /// Image attachment with empty text.
    Image,
    /// Image attachment alongside non-empty text.
    MessageImage,
    /// PDF attachment with empty text.
    Pdf,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Message => "Message",
            AttachmentKind::Image => "Image",
            AttachmentKind::MessageImage => "Message/Image",
            AttachmentKind::Pdf => "Pdf",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "Message" => Some(AttachmentKind::Message),
            "Image" => Some(AttachmentKind::Image),
            "Message/Image" => Some(AttachmentKind::MessageImage),
            "Pdf" => Some(AttachmentKind::Pdf),
            _ => None,
        }
    }
}

/// Media kind of an attachment, derived from its MIME content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
    Other,
}

impl MediaKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("image/") => MediaKind::Image,
            Some("application/pdf") => MediaKind::Pdf,
            _ => MediaKind::Other,
        }
    }
}

/// First attachment of a fetched message, reduced to what classification needs.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub id: i64,
    pub media: MediaKind,
    pub url: String,
}

/// A captured channel message, the unit persisted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub author_name: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachment_id: i64,
    pub attachment_kind: AttachmentKind,
    pub attachment_url: String,
}

impl Message {
    /// Build a message from extracted fields, deriving the attachment columns.
    ///
    /// When an attachment is present its id is always recorded, but the kind
    /// and URL only change for the combinations listed below; a PDF next to
    /// non-empty text (or any other media type) keeps the `Message` tag and
    /// the sentinel URL while `attachment_id` stays nonzero. That mismatch
    /// is part of the stored format.
    pub fn from_parts(
        id: i64,
        author_name: Option<String>,
        content: String,
        timestamp: DateTime<Utc>,
        first_attachment: Option<AttachmentInfo>,
    ) -> Self {
        let (attachment_id, attachment_kind, attachment_url) = match first_attachment {
            None => (
                NO_ATTACHMENT_ID,
                AttachmentKind::Message,
                NO_ATTACHMENT_URL.to_string(),
            ),
            Some(a) => {
                let (kind, url) = match (content.is_empty(), a.media) {
                    (true, MediaKind::Image) => (AttachmentKind::Image, a.url),
                    (false, MediaKind::Image) => (AttachmentKind::MessageImage, a.url),
                    (true, MediaKind::Pdf) => (AttachmentKind::Pdf, a.url),
                    (false, MediaKind::Pdf) | (_, MediaKind::Other) => {
                        (AttachmentKind::Message, NO_ATTACHMENT_URL.to_string())
                    }
                };
                (a.id, kind, url)
            }
        };

        Self {
            id,
            author_name,
            content,
            timestamp,
            attachment_id,
            attachment_kind,
            attachment_url,
        }
    }
}
