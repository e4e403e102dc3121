//! Process entry point.

use std::path::PathBuf;
use std::process;

use crtbounce::application::{App, AppConfig};

fn parse_args() -> Result<AppConfig, String> {
    let mut config = AppConfig::default();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--assets" => {
                let value = it
                    .next()
                    .ok_or_else(|| String::from("missing value for --assets"))?;
                config.asset_dir = PathBuf::from(value);
            }
            "--width" => {
                let value = it
                    .next()
                    .ok_or_else(|| String::from("missing value for --width"))?;
                config.window_width = value
                    .parse::<u32>()
                    .map_err(|_| String::from("invalid --width value"))?;
                if config.window_width == 0 {
                    return Err(String::from("--width must be > 0"));
                }
            }
            "--height" => {
                let value = it
                    .next()
                    .ok_or_else(|| String::from("missing value for --height"))?;
                config.window_height = value
                    .parse::<u32>()
                    .map_err(|_| String::from("invalid --height value"))?;
                if config.window_height == 0 {
                    return Err(String::from("--height must be > 0"));
                }
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    Ok(config)
}

fn print_help() {
    eprintln!("crtbounce [--assets <dir>] [--width W] [--height H]");
    eprintln!("controls: Space toggles the CRT post-process, Esc quits");
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            process::exit(2);
        }
    };

    match App::new(config) {
        Ok(app) => app.run(),
        Err(err) => {
            log::error!("Failed to start: {err}");
            process::exit(1);
        }
    }
}
