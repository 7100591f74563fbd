use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use crate::error::MediaError;

/// Decided once when a file is attached.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// What the file picker reports about a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

/// Reads the content of a selected file.
#[allow(async_fn_in_trait)]
pub trait FileReader {
    async fn read(&self, file: &SelectedFile) -> Result<Vec<u8>, MediaError>;
}

/// Displayable `data:` url for an attachment. Dropping it releases the
/// encoded copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let mime = if mime.trim().is_empty() {
            "application/octet-stream"
        } else {
            mime.trim()
        };
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Read `file` through `reader` and encode it as a preview.
pub async fn read_preview<R: FileReader>(
    reader: &R,
    file: &SelectedFile,
) -> Result<PreviewUrl, MediaError> {
    let bytes = reader.read(file).await?;
    if bytes.is_empty() {
        return Err(MediaError::Empty {
            name: file.name.clone(),
        });
    }
    Ok(PreviewUrl::from_bytes(&file.mime, &bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    file: SelectedFile,
    kind: MediaKind,
    preview: Option<PreviewUrl>,
}

impl MediaAttachment {
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// `None` until the preview read completes (or if it failed). The
    /// attachment is valid either way.
    pub fn preview(&self) -> Option<&PreviewUrl> {
        self.preview.as_ref()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaTicket(u64);

/// Holds at most one attachment. Each attach gets a fresh ticket; preview
/// completions for anything but the current ticket are dropped.
#[derive(Debug, Clone, Default)]
pub struct MediaSlot {
    current: Option<(MediaTicket, MediaAttachment)>,
    next_ticket: u64,
}

impl MediaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment(&self) -> Option<&MediaAttachment> {
        self.current.as_ref().map(|(_, a)| a)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.attachment()
            .and_then(|a| a.preview())
            .map(PreviewUrl::as_str)
    }

    /// Replace any current attachment with `file`, releasing its preview.
    pub fn attach(&mut self, file: SelectedFile) -> MediaTicket {
        self.release("replaced");
        self.next_ticket += 1;
        let ticket = MediaTicket(self.next_ticket);
        let kind = MediaKind::from_mime(&file.mime);
        info!(name = %file.name, ?kind, size = file.size, "attached file");
        self.current = Some((
            ticket,
            MediaAttachment {
                file,
                kind,
                preview: None,
            },
        ));
        ticket
    }

    pub fn finish_preview(
        &mut self,
        ticket: MediaTicket,
        preview: Result<PreviewUrl, MediaError>,
    ) -> bool {
        let Some((current, attachment)) = self.current.as_mut() else {
            debug!("discarding preview for a removed attachment");
            return false;
        };
        if *current != ticket {
            debug!("discarding preview for a replaced attachment");
            return false;
        }
        match preview {
            Ok(url) => {
                debug!(
                    name = %attachment.file.name,
                    bytes = url.as_str().len(),
                    "preview ready"
                );
                attachment.preview = Some(url);
            }
            Err(err) => {
                warn!(error = %err, "preview unavailable, keeping attachment without it");
            }
        }
        true
    }

    pub fn remove(&mut self) -> bool {
        self.release("removed")
    }

    fn release(&mut self, why: &'static str) -> bool {
        match self.current.take() {
            Some((_, attachment)) => {
                debug!(
                    name = %attachment.file.name,
                    had_preview = attachment.preview.is_some(),
                    why,
                    "attachment released"
                );
                true
            }
            None => false,
        }
    }
}
