//! pocketscope: the acquisition-to-display pipeline of a small digital
//! oscilloscope, driven by a blocking command loop. On a host build the
//! device collaborators are simulated; button codes arrive on stdin.

mod config;
mod display;
mod dsp;
mod hw;
mod scope;

use anyhow::Result;
use config::DeviceProfile;
use hw::sim::{LogMailer, LogPanel, SyntheticSource};
use hw::{Command, NO_EVENT};
use scope::Scope;
use std::io::BufRead;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let profile = DeviceProfile::load_or_default(&config::profile_path());
    info!(
        samples = profile.sample_count,
        vertical = ?profile.vertical_scales,
        horizontal = ?profile.horizontal_scales,
        "profile loaded"
    );

    let source = SyntheticSource::new(profile.calibration);
    let mut scope = Scope::new(profile, source, LogPanel, LogMailer);

    info!(
        "button codes: 11 waveform, 12 report, 13 filtered, 21 vertical scale, \
         22 horizontal scale, 23 spectrum, 31 autoscale, 33 measurements"
    );
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let code: u8 = match line.trim().parse() {
            Ok(code) => code,
            Err(_) => {
                warn!("not a button code: {line:?}");
                continue;
            }
        };
        if code == NO_EVENT {
            continue;
        }
        match Command::from_code(code) {
            Some(command) => {
                if let Err(err) = scope.handle(command) {
                    warn!("command failed: {err:#}");
                }
            }
            None => debug!("unmapped button code {code}"),
        }
    }
    Ok(())
}
