//! The content form and the async drivers that feed it.
//!
//! Drivers hold only a `Weak` to the form. They upgrade it around each
//! synchronous step and never across an await, so a form dropped while a
//! request is in flight simply never sees the result.

use std::cell::RefCell;
use std::rc::Weak;

use tracing::debug;

use foundation::math::Coordinates;

use crate::config::OverlayConfig;
use crate::error::{TransportError, ValidationError};
use crate::geo::{GeoLocation, Geolocator, PositionSource};
use crate::geocode::ReverseGeocoder;
use crate::http::{HttpClient, Sleeper};
use crate::media::{FileReader, MediaSlot, MediaTicket, SelectedFile, read_preview};
use crate::submission::{
    ContentKind, ContentPayload, SubmissionMachine, SubmissionState, SubmitRefused, SubmitTicket,
};

#[derive(Debug, Clone)]
pub struct ContentForm {
    config: OverlayConfig,
    kind: ContentKind,
    message: String,
    description: String,
    link: String,
    manual_coords: Option<Coordinates>,
    geo: Geolocator,
    media: MediaSlot,
    submission: SubmissionMachine,
}

impl ContentForm {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            kind: ContentKind::default(),
            message: String::new(),
            description: String::new(),
            link: String::new(),
            manual_coords: None,
            geo: Geolocator::new(),
            media: MediaSlot::new(),
            submission: SubmissionMachine::new(),
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn geolocation(&self) -> &GeoLocation {
        self.geo.state()
    }

    /// Typed-in position, if any.
    pub fn manual_coordinates(&self) -> Option<Coordinates> {
        self.manual_coords
    }

    /// The position that goes into the payload: a typed-in one wins over
    /// the device fix.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.manual_coords.or_else(|| self.geo.state().coordinates())
    }

    pub fn media(&self) -> &MediaSlot {
        &self.media
    }

    pub fn submission(&self) -> &SubmissionMachine {
        &self.submission
    }

    pub fn set_kind(&mut self, kind: ContentKind) {
        self.kind = kind;
        self.submission.edited();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.submission.edited();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.submission.edited();
    }

    pub fn set_link(&mut self, link: impl Into<String>) {
        self.link = link.into();
        self.submission.edited();
    }

    /// Set or clear the typed-in position. An out-of-range value is refused
    /// and the previous one kept.
    pub fn set_manual_coordinates(
        &mut self,
        coords: Option<Coordinates>,
    ) -> Result<(), ValidationError> {
        if let Some(c) = coords
            && !c.is_valid()
        {
            return Err(ValidationError::CoordinatesOutOfRange);
        }
        self.manual_coords = coords;
        self.submission.edited();
        Ok(())
    }

    pub fn attach(&mut self, file: SelectedFile) -> MediaTicket {
        self.submission.edited();
        self.media.attach(file)
    }

    pub fn remove_attachment(&mut self) -> bool {
        self.submission.edited();
        self.media.remove()
    }

    /// The body that would be posted right now.
    pub fn payload(&self) -> ContentPayload {
        ContentPayload {
            kind: self.kind,
            content: self.message.clone(),
            description: non_empty(&self.description),
            lat: None,
            lng: None,
            link: non_empty(&self.link),
            media: self.media.preview_url().map(str::to_string),
        }
        .with_coordinates(self.coordinates())
    }

    pub fn begin_submit(&mut self) -> Result<(SubmitTicket, ContentPayload), SubmitRefused> {
        let ticket = self.submission.begin(&self.message)?;
        Ok((ticket, self.payload()))
    }

    /// The success display delay for `ticket` elapsed: clear what was sent,
    /// keep the location for the next share.
    pub fn finish_success(&mut self, ticket: SubmitTicket) -> bool {
        if !self.submission.success_shown(ticket) {
            return false;
        }
        self.message.clear();
        self.description.clear();
        self.link.clear();
        self.media.remove();
        true
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Acquire the device position and name it. Returns whether the form's
/// location state was updated; `false` when a request was already in flight
/// or the form went away.
pub async fn locate<P, H>(form: &Weak<RefCell<ContentForm>>, positions: &P, http: &H) -> bool
where
    P: PositionSource,
    H: HttpClient,
{
    let (ticket, endpoint, api_key) = {
        let Some(form) = form.upgrade() else {
            return false;
        };
        let mut form = form.borrow_mut();
        let Some(ticket) = form.geo.begin() else {
            return false;
        };
        (
            ticket,
            form.config.geocode_endpoint.clone(),
            form.config.geocode_api_key.clone(),
        )
    };

    let outcome = match positions.current_position().await {
        Ok(coords) => {
            if form.strong_count() == 0 {
                debug!("form unmounted before the position fix arrived");
                return false;
            }
            let place = ReverseGeocoder::new(http, &endpoint, &api_key)
                .resolve(coords)
                .await;
            Ok((coords, place))
        }
        Err(err) => Err(err),
    };

    let Some(form) = form.upgrade() else {
        debug!("form unmounted, dropping location result");
        return false;
    };
    form.borrow_mut().geo.finish(ticket, outcome)
}

/// Attach `file` and build its preview in the background.
pub async fn attach_media<R: FileReader>(
    form: &Weak<RefCell<ContentForm>>,
    file: SelectedFile,
    reader: &R,
) -> bool {
    let ticket = {
        let Some(form) = form.upgrade() else {
            return false;
        };
        form.borrow_mut().attach(file.clone())
    };

    let preview = read_preview(reader, &file).await;

    let Some(form) = form.upgrade() else {
        debug!("form unmounted, dropping preview");
        return false;
    };
    form.borrow_mut().media.finish_preview(ticket, preview)
}

/// Validate, post and, on success, hold the confirmation for the configured
/// delay before clearing the form.
pub async fn submit<H, S>(
    form: &Weak<RefCell<ContentForm>>,
    http: &H,
    sleeper: &S,
) -> Result<SubmissionState, SubmitRefused>
where
    H: HttpClient,
    S: Sleeper,
{
    let (ticket, payload, endpoint, delay_ms) = {
        let Some(form) = form.upgrade() else {
            return Err(SubmitRefused::Busy);
        };
        let mut form = form.borrow_mut();
        let (ticket, payload) = form.begin_submit()?;
        (
            ticket,
            payload,
            form.config.content_endpoint.clone(),
            form.config.success_delay_ms,
        )
    };

    let outcome = match payload.to_json() {
        Ok(body) => match http.post_json(&endpoint, &body).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(TransportError::Status {
                status: response.status,
            }),
            Err(err) => Err(TransportError::Network { reason: err.0 }),
        },
        Err(err) => Err(err),
    };
    let succeeded = outcome.is_ok();

    {
        let Some(form) = form.upgrade() else {
            debug!("form unmounted, dropping submission result");
            return Ok(SubmissionState::Editing);
        };
        let mut form = form.borrow_mut();
        form.submission.finish(ticket, outcome);
        if !succeeded {
            return Ok(form.submission.state().clone());
        }
    }

    sleeper.sleep_ms(delay_ms).await;

    let Some(form) = form.upgrade() else {
        return Ok(SubmissionState::Editing);
    };
    let mut form = form.borrow_mut();
    form.finish_success(ticket);
    Ok(form.submission.state().clone())
}
