//! Scenario Designer
//!
//! Usage: `scenario-designer [STORE_DIR] [SCENARIO_ID] [AUDIO_DIR]`
//!
//! Opens scenario `SCENARIO_ID` from `STORE_DIR` (default `scenarios`) for
//! editing (exiting when it cannot be loaded), or starts a new one when no id
//! is given. Ctrl+S saves. Set `SCENARIO_DESIGNER_CONFIG`
//! to a JSON file to tune camera and pointer behaviour.

use scenario_designer::app::{self, DesignerConfig, HostOptions};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut args = std::env::args().skip(1);
    let store_dir = PathBuf::from(args.next().unwrap_or_else(|| "scenarios".to_string()));
    let scenario_id = match args.next().map(|raw| raw.parse()) {
        None => None,
        Some(Ok(id)) => Some(id),
        Some(Err(err)) => {
            log::error!("Scenario id must be a whole number: {err}");
            return ExitCode::FAILURE;
        }
    };
    let audio_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| store_dir.join("audio"));

    let options = HostOptions {
        store_dir,
        audio_dir,
        scenario_id,
        config: DesignerConfig::from_env(),
    };
    log::info!("Scenario store: {}", options.store_dir.display());

    match app::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
