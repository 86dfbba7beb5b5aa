use chrono::{Local, SecondsFormat};
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, time},
    prelude::*,
};

use crate::config::Log;

/// Installs the global subscriber. Fails on an unparsable `log.level`.
pub fn init(log: &Log) -> Result<(), String> {
    let is_color = log.style.is_color();
    if !is_color {
        yansi::disable();
    }
    let filter = parse_filter(&log.level)?;
    let format = fmt::layer()
        .with_timer(LocalTime)
        .with_ansi(is_color)
        .with_target(false);

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()
        .map_err(|err| format!("failed to install tracing subscriber: {err}"))
}

fn parse_filter(level: &str) -> Result<Targets, String> {
    level
        .parse()
        .map_err(|err| format!("log level `{level}` did not parse successfully: {err}"))
}

struct LocalTime;

impl time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            Local::now().to_rfc3339_opts(SecondsFormat::Millis, false)
        )
    }
}
