use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "globe", about = "Headless tools for the globe viewer")]
pub struct Cli {
    /// Viewer configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the render loop without a display and print the final state.
    Simulate {
        #[arg(long, default_value_t = 600)]
        frames: u32,

        /// Wheel deltas applied before the first frame, in order.
        #[arg(long, allow_negative_numbers = true)]
        zoom: Vec<f64>,

        /// Directory the surface map uris are resolved against.
        #[arg(long)]
        assets: Option<PathBuf>,
    },

    /// Resolve coordinates to a place name.
    Geocode {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },

    /// Post one piece of content.
    Submit {
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "text")]
        kind: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
    },

    /// Print the effective configuration.
    Config,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn simulate_collects_repeated_zoom() {
        let cli = Cli::try_parse_from([
            "globe", "simulate", "--frames", "10", "--zoom", "-500", "--zoom", "120",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate { frames, zoom, .. } => {
                assert_eq!(frames, 10);
                assert_eq!(zoom, vec![-500.0, 120.0]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["globe", "config", "--config", "viewer.json"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("viewer.json")));
        assert!(matches!(cli.command, Command::Config));
    }

    #[test]
    fn lat_needs_lng() {
        assert!(Cli::try_parse_from(["globe", "submit", "--message", "hi", "--lat", "1"]).is_err());
        let cli = Cli::try_parse_from([
            "globe", "submit", "--message", "hi", "--lat", "-33.9", "--lng", "18.4",
        ])
        .unwrap();
        match cli.command {
            Command::Submit { kind, lat, lng, .. } => {
                assert_eq!(kind, "text");
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lng, Some(18.4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
