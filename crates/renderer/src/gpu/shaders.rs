//! WGSL sources for the two stages.
//!
//! Both stages accept any WGSL module that exposes `vs_main`/`fs_main` and the
//! bindings the stage expects; the bundled sources are the defaults.

use std::borrow::Cow;
use std::path::Path;

use crate::error::SetupError;

pub const NOISE_WGSL: &str = include_str!("../../shaders/noise.wgsl");
pub const CONTOUR_WGSL: &str = include_str!("../../shaders/contour.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL text handed to a stage at setup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageShader {
    label: Cow<'static, str>,
    source: Cow<'static, str>,
}

impl StageShader {
    pub fn noise() -> Self {
        Self {
            label: Cow::Borrowed("noise shader"),
            source: Cow::Borrowed(NOISE_WGSL),
        }
    }

    pub fn contour() -> Self {
        Self {
            label: Cow::Borrowed("contour shader"),
            source: Cow::Borrowed(CONTOUR_WGSL),
        }
    }

    pub fn inline(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: Cow::Owned(label.into()),
            source: Cow::Owned(source.into()),
        }
    }

    /// Reads and validates a WGSL override from disk.
    pub fn from_path(path: &Path) -> Result<Self, SetupError> {
        let source = std::fs::read_to_string(path).map_err(|source| SetupError::ShaderRead {
            path: path.to_path_buf(),
            source,
        })?;
        validate_wgsl(&source).map_err(|message| SetupError::ShaderRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, message),
        })?;
        Ok(Self::inline(path.display().to_string(), source))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(self.source())),
        })
    }
}

/// Parses and validates WGSL, and checks both stage entry points exist.
pub fn validate_wgsl(source: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| err.into_inner().to_string())?;

    for (entry, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|point| point.name == entry && point.stage == stage);
        if !found {
            return Err(format!("missing {stage:?} entry point `{entry}`"));
        }
    }
    Ok(())
}
