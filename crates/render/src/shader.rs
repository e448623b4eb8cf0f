use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::backend::{GpuBackend, StageId};

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageKind {
    Compute,
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Compute => "compute",
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        })
    }
}

/// Startup failures while turning shader sources into programs.
///
/// Every variant is fatal. Compile failures keep the offending source and the
/// compiler's log verbatim so the report is self-contained.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader {}", path.display())]
    Read {
        stage: StageKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile {stage} shader `{label}`:\n{diagnostic_log}\n--- source ---\n{code}")]
    Compile {
        stage: StageKind,
        label: String,
        code: String,
        diagnostic_log: String,
    },
    #[error("failed to link program `{program}`:\n{diagnostic_log}{}", StageListing(.stages))]
    Link {
        program: String,
        diagnostic_log: String,
        /// Kind and source text of every stage attached to the program.
        stages: Vec<(StageKind, String)>,
    },
}

impl ShaderError {
    /// Stage the error originated from, when it belongs to a single stage.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            ShaderError::Read { stage, .. } | ShaderError::Compile { stage, .. } => Some(*stage),
            ShaderError::Link { stages, .. } => match stages.as_slice() {
                [(stage, _)] => Some(*stage),
                _ => None,
            },
        }
    }

    /// Attach the program's stage sources to a link failure. Other variants
    /// pass through untouched.
    pub fn with_link_sources(self, sources: Vec<(StageKind, String)>) -> Self {
        match self {
            ShaderError::Link {
                program,
                diagnostic_log,
                ..
            } => ShaderError::Link {
                program,
                diagnostic_log,
                stages: sources,
            },
            other => other,
        }
    }
}

struct StageListing<'a>(&'a [(StageKind, String)]);

impl fmt::Display for StageListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stage, code) in self.0 {
            write!(f, "\n--- {stage} source ---\n{code}")?;
        }
        Ok(())
    }
}

/// Where a stage's source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Embedded {
        label: &'static str,
        code: &'static str,
    },
    File(PathBuf),
}

impl ShaderSource {
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            ShaderSource::Embedded { label, .. } => Cow::Borrowed(label),
            ShaderSource::File(path) => path.to_string_lossy(),
        }
    }

    /// Read the source text.
    pub fn read(&self, stage: StageKind) -> Result<Cow<'static, str>, ShaderError> {
        match self {
            ShaderSource::Embedded { code, .. } => Ok(Cow::Borrowed(code)),
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ShaderError::Read {
                    stage,
                    path: path.clone(),
                    source,
                }),
        }
    }

    /// Read and compile through `backend`, yielding a stage handle.
    pub fn load<B: GpuBackend>(
        &self,
        backend: &mut B,
        stage: StageKind,
    ) -> Result<StageId, ShaderError> {
        let code = self.read(stage)?;
        self.compile(backend, stage, &code)
    }

    /// Compile already-read `code` under this source's label.
    pub fn compile<B: GpuBackend>(
        &self,
        backend: &mut B,
        stage: StageKind,
        code: &str,
    ) -> Result<StageId, ShaderError> {
        let label = self.label();
        tracing::debug!(%stage, %label, bytes = code.len(), "compiling shader stage");
        backend.compile_stage(stage, &label, code)
    }
}

/// File names looked up when shaders are loaded from a directory.
pub const COMPUTE_FILE: &str = "compute.wgsl";
pub const VERTEX_FILE: &str = "quad.vert.wgsl";
pub const FRAGMENT_FILE: &str = "quad.frag.wgsl";

/// Sources for the compute program and the two raster stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSources {
    pub compute: ShaderSource,
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ProgramSources {
    /// Load every stage from `dir` using the fixed file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            compute: ShaderSource::File(dir.join(COMPUTE_FILE)),
            vertex: ShaderSource::File(dir.join(VERTEX_FILE)),
            fragment: ShaderSource::File(dir.join(FRAGMENT_FILE)),
        }
    }
}
