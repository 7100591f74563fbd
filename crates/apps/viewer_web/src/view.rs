//! JSON snapshot of the content form handed to the page's UI code.

use overlay::{ContentForm, ContentKind, MediaKind, SubmissionState};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    pub loading: bool,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// The position was typed in rather than taken from the device.
    pub manual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentView {
    pub name: String,
    pub kind: &'static str,
    /// Absent until the preview has been read.
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionView {
    pub state: &'static str,
    pub status: Option<String>,
    pub inline_error: Option<String>,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub kind: ContentKind,
    pub message: String,
    pub description: String,
    pub link: String,
    pub location: LocationView,
    pub attachment: Option<AttachmentView>,
    pub submission: SubmissionView,
}

impl FormView {
    pub fn of(form: &ContentForm) -> Self {
        let geo = form.geolocation();
        let coords = form.coordinates();
        let submission = form.submission();
        Self {
            kind: form.kind(),
            message: form.message().to_string(),
            description: form.description().to_string(),
            link: form.link().to_string(),
            location: LocationView {
                loading: geo.is_loading(),
                status: geo.status_text(),
                lat: coords.map(|c| c.lat_deg),
                lng: coords.map(|c| c.lng_deg),
                manual: form.manual_coordinates().is_some(),
            },
            attachment: form.media().attachment().map(|a| AttachmentView {
                name: a.file().name.clone(),
                kind: match a.kind() {
                    MediaKind::Image => "image",
                    MediaKind::Video => "video",
                    MediaKind::Other => "other",
                },
                preview: a.preview().map(|p| p.as_str().to_string()),
            }),
            submission: SubmissionView {
                state: match submission.state() {
                    SubmissionState::Editing => "editing",
                    SubmissionState::Submitting => "submitting",
                    SubmissionState::Succeeded => "succeeded",
                    SubmissionState::Failed { .. } => "failed",
                },
                status: submission.status_text().map(str::to_string),
                inline_error: submission.inline_error().map(|e| e.to_string()),
                can_submit: submission.can_submit(),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::FormView;
    use foundation::math::Coordinates;
    use overlay::{ContentForm, ContentKind, OverlayConfig, SelectedFile};
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_form_is_editable_and_empty() {
        let form = ContentForm::new(OverlayConfig::default());
        let view = FormView::of(&form);
        assert_eq!(view.kind, ContentKind::Text);
        assert_eq!(view.location.status, None);
        assert!(!view.location.loading);
        assert!(view.attachment.is_none());
        assert_eq!(view.submission.state, "editing");
        assert!(view.submission.can_submit);
    }

    #[test]
    fn blank_submit_shows_inline_error() {
        let mut form = ContentForm::new(OverlayConfig::default());
        form.set_message("   ");
        assert!(form.begin_submit().is_err());
        let view = FormView::of(&form);
        assert_eq!(
            view.submission.inline_error.as_deref(),
            Some("Message is required")
        );
        assert_eq!(view.submission.state, "editing");
    }

    #[test]
    fn pending_attachment_has_no_preview_yet() {
        let mut form = ContentForm::new(OverlayConfig::default());
        form.attach(SelectedFile {
            name: "clip.mp4".to_string(),
            mime: "video/mp4".to_string(),
            size: 10,
        });
        let view = FormView::of(&form);
        let attachment = view.attachment.expect("attachment");
        assert_eq!(attachment.kind, "video");
        assert_eq!(attachment.preview, None);
    }

    #[test]
    fn typed_position_is_shown_as_manual() {
        let mut form = ContentForm::new(OverlayConfig::default());
        assert!(!FormView::of(&form).location.manual);
        form.set_manual_coordinates(Some(Coordinates::new(51.5, -0.12)))
            .unwrap();
        let location = FormView::of(&form).location;
        assert!(location.manual);
        assert_eq!((location.lat, location.lng), (Some(51.5), Some(-0.12)));
    }

    #[test]
    fn json_uses_lowercase_kind() {
        let mut form = ContentForm::new(OverlayConfig::default());
        form.set_kind(ContentKind::Song);
        let json: serde_json::Value = serde_json::from_str(&FormView::of(&form).to_json()).unwrap();
        assert_eq!(json["kind"], "song");
        assert_eq!(json["submission"]["state"], "editing");
    }
}
