use std::path::PathBuf;

use anyhow::{Context, Result};

use sphvr::driver::OrientationDriver;
use sphvr::framework::Framework;
use sphvr::settings::SphvrConfig;

const USAGE: &str = "usage: sphvr [--window] <video_path>\n\n  video_path  Path to equirect video.\n  --window    Render into an embedded window instead of the sink's own.";

struct Args {
    video_path: PathBuf,
    window: bool,
}

fn parse_args() -> Option<Args> {
    let mut video_path = None;
    let mut window = false;
    for arg in std::env::args_os().skip(1) {
        let flag = arg.to_string_lossy().into_owned();
        match flag.as_str() {
            "--help" | "-h" => return None,
            "--window" => window = true,
            _ if video_path.is_none() => video_path = Some(PathBuf::from(arg)),
            _ => {
                eprintln!("unexpected argument: {flag}");
                return None;
            }
        }
    }
    Some(Args {
        video_path: video_path?,
        window,
    })
}

fn main() -> Result<()> {
    sphvr::init_logging();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let config = SphvrConfig::load();
    let framework = Framework::init().context("Failed to initialize GStreamer")?;

    if args.window {
        sphvr::window::run(&framework, &args.video_path, &config)?;
    } else {
        let driver = OrientationDriver::new(&framework, &args.video_path, &config)
            .context("Failed to build pipeline")?;
        driver.run()?;
    }

    Ok(())
}
