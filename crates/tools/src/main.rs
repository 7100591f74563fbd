use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use config::ViewerConfig;
use foundation::math::Coordinates;
use overlay::{
    ContentForm, ContentKind, ReverseGeocoder, SUCCESS_MESSAGE, SubmissionState, SubmitRefused,
    locate, submit,
};
use scene::GlobeScene;
use streaming::{TextureCache, load_texture};
use tools::cli::{Cli, Command};
use tools::net::{FixedPosition, FsTextureSource, ReqwestHttp, TokioSleeper};
use tools::simulate::simulate;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ViewerConfig::load_from_path(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Command::Simulate {
            frames,
            zoom,
            assets,
        } => {
            let textures = Rc::new(RefCell::new(TextureCache::new()));
            if let Some(root) = assets {
                let source = FsTextureSource::new(root);
                let scene = GlobeScene::compose(&config.scene.globe)?;
                for uri in scene.texture_uris() {
                    load_texture(&textures, &source, uri).await;
                }
            }
            let report = simulate(&config.scene, textures, frames, &zoom)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Geocode { lat, lng } => {
            let coords = Coordinates::new(lat, lng);
            if !coords.is_valid() {
                return Err(format!("coordinates out of range: {lat}, {lng}").into());
            }
            let http = ReqwestHttp::new();
            let place = ReverseGeocoder::new(
                &http,
                &config.overlay.geocode_endpoint,
                &config.overlay.geocode_api_key,
            )
            .resolve(coords)
            .await;
            let out = serde_json::json!({
                "city": place.city,
                "country": place.country,
                "label": place.label(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Submit {
            message,
            kind,
            description,
            link,
            lat,
            lng,
        } => {
            let kind = ContentKind::parse(&kind)
                .ok_or_else(|| format!("unknown content kind {kind:?}"))?;
            let mut overlay = config.overlay.clone();
            overlay.success_delay_ms = 0;

            let form = Rc::new(RefCell::new(ContentForm::new(overlay)));
            {
                let mut form = form.borrow_mut();
                form.set_kind(kind);
                form.set_message(message);
                if let Some(description) = description {
                    form.set_description(description);
                }
                if let Some(link) = link {
                    form.set_link(link);
                }
            }

            let http = ReqwestHttp::new();
            let weak = Rc::downgrade(&form);
            if let (Some(lat), Some(lng)) = (lat, lng) {
                locate(&weak, &FixedPosition(Coordinates::new(lat, lng)), &http).await;
                if let Some(status) = form.borrow().geolocation().status_text() {
                    info!(location = %status, "location attached");
                }
            }

            match submit(&weak, &http, &TokioSleeper).await {
                Ok(SubmissionState::Failed { message }) => return Err(message.into()),
                Ok(_) => println!("{SUCCESS_MESSAGE}"),
                Err(SubmitRefused::Invalid(err)) => return Err(err.into()),
                Err(SubmitRefused::Busy) => return Err("a submission is already in flight".into()),
            }
        }
        Command::Config => {
            println!("{}", config.to_json_pretty()?);
        }
    }
    Ok(())
}
