mod app;
mod clock;
mod config;
mod error;
mod frames;
mod menu;
mod metrics;
mod notes;
mod panels;
mod pet;
mod platform;
mod render;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Pixel-art desktop companion")]
struct Args {
    /// directory holding idle_N.png and walk_N.png (overrides the saved setting)
    frames_dir: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    env_logger::init();
    log::info!("PixelPal starting up");

    if let Err(e) = app::run(args.frames_dir) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn frames_dir_is_optional_positional() {
        let args = Args::try_parse_from(["pixelpal"]).unwrap();
        assert_eq!(args.frames_dir, None);

        let args = Args::try_parse_from(["pixelpal", "art/cat"]).unwrap();
        assert_eq!(args.frames_dir, Some(PathBuf::from("art/cat")));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Args::try_parse_from(["pixelpal", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["pixelpal", "a", "b"]).is_err());
    }
}
