use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print `value` as JSON in `--json` mode, otherwise a one-line status.
pub fn print<T: Serialize>(value: &T, ok: bool, summary: &str) -> anyhow::Result<()> {
    if is_json() {
        let s = serde_json::to_string_pretty(value)?;
        println!("{s}");
        return Ok(());
    }
    status(ok, summary)
}

pub fn status(ok: bool, msg: &str) -> anyhow::Result<()> {
    let mut out = stdout();
    let color = if ok { Color::Green } else { Color::Red };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", if ok { "OK" } else { "FAILED" })?;
    out.reset()?;
    writeln!(out, " {msg}")?;
    Ok(())
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}
