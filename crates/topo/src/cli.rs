use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sceneconfig::PowerSetting;

#[derive(Parser, Debug)]
#[command(
    name = "topo",
    author,
    version,
    about = "Animated topographic contour background"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `topo.toml` in the user config directory.
    #[arg(long, value_name = "FILE", env = "TOPO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<WindowSize>,

    /// Adapter preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// WGSL file replacing the bundled noise shader.
    #[arg(long, value_name = "FILE")]
    pub noise_shader: Option<PathBuf>,

    /// WGSL file replacing the bundled contour shader.
    #[arg(long, value_name = "FILE")]
    pub contour_shader: Option<PathBuf>,

    /// How strongly pointer distance from the centre zooms the field (0 disables).
    #[arg(long, value_name = "STRENGTH", value_parser = parse_pointer_zoom)]
    pub pointer_zoom: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration as TOML and exit.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<WindowSize, String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("width and height must be greater than zero".to_string());
    }
    Ok(WindowSize { width, height })
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "low" | "low-power" => Ok(PowerSetting::Low),
        "high" | "high-performance" => Ok(PowerSetting::High),
        _ => Err(format!(
            "unknown power preference '{trimmed}'; expected low or high"
        )),
    }
}

pub fn parse_pointer_zoom(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let strength: f64 = trimmed
        .parse()
        .map_err(|_| format!("invalid pointer zoom '{trimmed}'"))?;
    if !strength.is_finite() || strength < 0.0 {
        return Err("pointer zoom must be a finite number >= 0".to_string());
    }
    Ok(strength)
}
