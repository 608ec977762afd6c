use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::{
    AnimationPolicy, GpuPowerPreference, Renderer, RendererConfig, SetupError, StageShader,
    SurfaceSize, Vec2,
};
use sceneconfig::{PowerSetting, SceneConfig};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file existed at the default location.
    Defaults(PathBuf),
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::File(path) => format!("loaded from {}", path.display()),
            ConfigSource::Defaults(path) => {
                format!("built-in defaults (no file at {})", path.display())
            }
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let (scene, source) = resolve_config(&args)?;
    info!(source = %source.describe(), "configuration resolved");
    let config = renderer_config(&scene)?;

    let renderer = Renderer::new(config);
    match renderer.run() {
        Ok(()) => Ok(()),
        Err(SetupError::Unsupported(reason)) => {
            error!(%reason, "GPU setup failed");
            bail!("GPU rendering is not supported on this system")
        }
        Err(err) => Err(err).context("renderer stopped with an error"),
    }
}

pub fn print_config(args: RunArgs) -> Result<()> {
    let (scene, source) = resolve_config(&args)?;
    let text = scene
        .to_toml_string()
        .context("failed to serialize configuration")?;
    println!("# {}", source.describe());
    print!("{text}");
    Ok(())
}

/// Loads the configuration file and applies command-line overrides on top.
pub fn resolve_config(args: &RunArgs) -> Result<(SceneConfig, ConfigSource)> {
    let (mut scene, source) = match &args.config {
        Some(path) => (load_file(path)?, ConfigSource::File(path.clone())),
        None => {
            let path = paths::default_config_file()?;
            match fs::read_to_string(&path) {
                Ok(text) => (parse_file(&path, &text)?, ConfigSource::File(path)),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no configuration file; using defaults");
                    (SceneConfig::default(), ConfigSource::Defaults(path))
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to read config at {}", path.display()))
                }
            }
        }
    };

    apply_overrides(&mut scene, args);
    scene
        .validate()
        .context("configuration is invalid after applying command-line overrides")?;
    Ok((scene, source))
}

fn load_file(path: &Path) -> Result<SceneConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_file(path, &text)
}

fn parse_file(path: &Path, text: &str) -> Result<SceneConfig> {
    let mut scene = SceneConfig::from_toml_str(text)
        .with_context(|| format!("failed to load config at {}", path.display()))?;
    if let Some(parent) = path.parent() {
        scene.resolve_relative_paths(parent);
    }
    Ok(scene)
}

fn apply_overrides(scene: &mut SceneConfig, args: &RunArgs) {
    if let Some(size) = args.size {
        scene.window.width = size.width;
        scene.window.height = size.height;
    }
    if let Some(power) = args.power {
        scene.window.power = power;
    }
    if let Some(path) = &args.noise_shader {
        scene.shaders.noise = Some(path.clone());
    }
    if let Some(path) = &args.contour_shader {
        scene.shaders.contour = Some(path.clone());
    }
    if let Some(strength) = args.pointer_zoom {
        scene.animation.pointer_zoom = strength;
    }
}

pub fn renderer_config(scene: &SceneConfig) -> Result<RendererConfig> {
    let noise_shader = match &scene.shaders.noise {
        Some(path) => StageShader::from_path(path).context("invalid noise shader override")?,
        None => StageShader::noise(),
    };
    let contour_shader = match &scene.shaders.contour {
        Some(path) => StageShader::from_path(path).context("invalid contour shader override")?,
        None => StageShader::contour(),
    };
    let animation = &scene.animation;

    Ok(RendererConfig {
        surface_size: SurfaceSize::new(scene.window.width, scene.window.height),
        title: scene.window.title.clone(),
        power: match scene.window.power {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        },
        policy: AnimationPolicy {
            scale_sum: animation.scale_sum,
            drift: animation.drift,
            pointer_gain: animation.pointer_gain,
            pointer_zoom: animation.pointer_zoom,
            contour_drift_ratio: animation.contour_drift_ratio,
            initial_offset: Vec2::new(animation.initial_offset[0], animation.initial_offset[1]),
        },
        noise_shader,
        contour_shader,
    })
}
