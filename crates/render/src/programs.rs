use crate::backend::{GpuBackend, ProgramId};
use crate::shader::{ProgramSources, ShaderError, StageKind};

/// The two linked programs the frame loop alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Programs {
    pub compute: ProgramId,
    pub raster: ProgramId,
}

impl Programs {
    /// Load, compile, attach and link both programs.
    ///
    /// Stops at the first failure; the caller treats any error as fatal.
    pub fn build<B: GpuBackend>(
        backend: &mut B,
        sources: &ProgramSources,
    ) -> Result<Self, ShaderError> {
        let compute_code = sources.compute.read(StageKind::Compute)?;
        let vertex_code = sources.vertex.read(StageKind::Vertex)?;
        let fragment_code = sources.fragment.read(StageKind::Fragment)?;

        let compute_stage = sources
            .compute
            .compile(backend, StageKind::Compute, &compute_code)?;
        let vertex_stage = sources
            .vertex
            .compile(backend, StageKind::Vertex, &vertex_code)?;
        let fragment_stage = sources
            .fragment
            .compile(backend, StageKind::Fragment, &fragment_code)?;

        let compute = backend.create_program("compute");
        backend.attach_stage(compute, compute_stage);
        backend.link(compute).map_err(|err| {
            err.with_link_sources(vec![(StageKind::Compute, compute_code.to_string())])
        })?;

        let raster = backend.create_program("present_quad");
        backend.attach_stage(raster, vertex_stage);
        backend.attach_stage(raster, fragment_stage);
        backend.link(raster).map_err(|err| {
            err.with_link_sources(vec![
                (StageKind::Vertex, vertex_code.to_string()),
                (StageKind::Fragment, fragment_code.to_string()),
            ])
        })?;

        tracing::info!(?compute, ?raster, "shader programs linked");
        Ok(Self { compute, raster })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCall, RecordingBackend};
    use crate::shader::ShaderSource;

    fn sources(compute: &'static str) -> ProgramSources {
        ProgramSources {
            compute: ShaderSource::Embedded {
                label: "compute",
                code: compute,
            },
            vertex: ShaderSource::Embedded {
                label: "quad_vs",
                code: "vs",
            },
            fragment: ShaderSource::Embedded {
                label: "quad_fs",
                code: "fs",
            },
        }
    }

    #[test]
    fn builds_and_links_both_programs() {
        let mut backend = RecordingBackend::new();
        let programs = Programs::build(&mut backend, &sources("cs")).unwrap();
        assert_ne!(programs.compute, programs.raster);
        assert!(backend.is_linked(programs.compute));
        assert!(backend.is_linked(programs.raster));
        let links = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, GpuCall::Link(_)))
            .count();
        assert_eq!(links, 2);
    }

    #[test]
    fn compile_failure_stops_before_linking() {
        let mut backend = RecordingBackend::new().fail_compile_on("syntax error");
        let err = Programs::build(&mut backend, &sources("syntax error here")).unwrap_err();
        assert_eq!(err.stage(), Some(StageKind::Compute));
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, GpuCall::CreateProgram { .. }))
        );
    }

    #[test]
    fn link_failure_names_program() {
        let mut backend = RecordingBackend::new().fail_link_on("present_quad");
        let err = Programs::build(&mut backend, &sources("cs")).unwrap_err();
        assert!(matches!(&err, ShaderError::Link { program, .. } if program == "present_quad"));
    }

    #[test]
    fn link_failure_reports_attached_sources() {
        let mut backend = RecordingBackend::new().fail_link_on("present_quad");
        let err = Programs::build(&mut backend, &sources("cs")).unwrap_err();
        match &err {
            ShaderError::Link { stages, .. } => assert_eq!(
                stages,
                &vec![
                    (StageKind::Vertex, "vs".to_string()),
                    (StageKind::Fragment, "fs".to_string()),
                ]
            ),
            other => panic!("unexpected error {other:?}"),
        }
        let report = err.to_string();
        assert!(report.contains("link failed with stages"));
        assert!(report.contains("--- vertex source ---\nvs"));
        assert!(report.contains("--- fragment source ---\nfs"));
    }

    #[test]
    fn compute_link_failure_names_its_stage() {
        let mut backend = RecordingBackend::new().fail_link_on("compute");
        let err = Programs::build(&mut backend, &sources("COMPUTE_BODY")).unwrap_err();
        assert_eq!(err.stage(), Some(StageKind::Compute));
        assert!(err.to_string().contains("--- compute source ---\nCOMPUTE_BODY"));
    }
}
