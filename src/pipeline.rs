//! Two-phase batch: ingest every slice, then materialize every grid.
//!
//! Nothing is written until the whole document has been built, so a bad
//! input file leaves the output directory untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::PipelineConfig;
use crate::core::corpus::{ingest_dir, Corpus};
use crate::core::document::{timestamp_now, Output};
use crate::core::writers::{load_template, write_json, write_page};

/// Inputs and destinations of one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub input_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Optional raw JSON dump path.
    pub json_out: Option<PathBuf>,
    /// Page template; the built-in template is used when absent.
    pub template: Option<PathBuf>,
}

/// What a build produced.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub slices: usize,
    pub observations: usize,
    pub x_max: i64,
    pub y_max: i64,
    pub page: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Ingest phase: load and aggregate every slice in `input_dir`.
pub fn ingest(input_dir: &Path, config: &PipelineConfig) -> Result<Corpus> {
    ingest_dir(input_dir, &config.ingest)
        .with_context(|| format!("Failed to ingest {}", input_dir.display()))
}

/// Materialize phase: build the full document from an ingested corpus.
pub fn build_output(corpus: &Corpus, config: &PipelineConfig, generated_at: String) -> Output {
    Output::assemble(corpus, &config.render, generated_at)
}

/// Run a complete build and write its artifacts.
///
/// An input directory without slice files is not an error; the report then
/// carries no output paths and nothing is written.
pub fn run_build(request: &BuildRequest, config: &PipelineConfig) -> Result<BuildReport> {
    let template = load_template(request.template.as_deref())?;

    let corpus = ingest(&request.input_dir, config)?;
    if corpus.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.ingest.extension,
            request.input_dir.display()
        );
        return Ok(BuildReport::default());
    }

    let output = build_output(&corpus, config, timestamp_now());

    let mut report = BuildReport {
        slices: corpus.slices.len(),
        observations: corpus.observation_count(),
        x_max: corpus.x_max(),
        y_max: corpus.y_max(),
        ..BuildReport::default()
    };

    if let Some(json_path) = &request.json_out {
        write_json(json_path, &output)
            .with_context(|| format!("Failed to write JSON dump {}", json_path.display()))?;
        info!("Wrote {}", json_path.display());
        report.json = Some(json_path.clone());
    }

    let page = write_page(&request.out_dir, &template, &output)
        .with_context(|| format!("Failed to write page into {}", request.out_dir.display()))?;
    info!("Wrote {}", page.display());
    report.page = Some(page);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::SliceData;
    use crate::core::record::NO_DATA;
    use std::fs;
    use tempfile::TempDir;

    fn write_example(dir: &Path) {
        fs::write(dir.join("a.csv"), "X;Y;Value;Size\n1;1;0;10\n1;2;3.5;12").unwrap();
        fs::write(dir.join("b.csv"), "X;Y;Value;Size\n2;1;-1;0\n2;2;7.2;15").unwrap();
    }

    fn request(dir: &TempDir) -> BuildRequest {
        BuildRequest {
            input_dir: dir.path().join("data"),
            out_dir: dir.path().join("out"),
            json_out: Some(dir.path().join("dump").join("data.json")),
            template: None,
        }
    }

    fn values(data: &SliceData) -> Vec<[f64; 3]> {
        data.heat.clone()
    }

    #[test]
    fn test_end_to_end_example() -> Result<()> {
        let dir = TempDir::new()?;
        write_example(dir.path());

        let config = PipelineConfig::default();
        let corpus = ingest(dir.path(), &config)?;
        let output = build_output(&corpus, &config, "t".to_string());

        assert_eq!((output.meta.x_max, output.meta.y_max), (2, 2));
        assert_eq!(output.meta.value_max, 7.2);
        assert_eq!(output.meta.value_min_pos, 3.5);
        assert_eq!((output.meta.size_min, output.meta.size_max), (10.0, 15.0));
        assert_eq!(output.meta.slices, vec!["a", "b"]);

        assert_eq!(
            values(&output.datasets["a"]),
            vec![
                [1.0, 1.0, 0.0],
                [1.0, 2.0, 3.5],
                [2.0, 1.0, NO_DATA],
                [2.0, 2.0, NO_DATA],
            ]
        );
        assert_eq!(
            values(&output.datasets["b"]),
            vec![
                [1.0, 1.0, NO_DATA],
                [1.0, 2.0, NO_DATA],
                [2.0, 1.0, NO_DATA],
                [2.0, 2.0, 7.2],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_ragged_slices_share_extent() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("s1.csv"), "X,Y,Value\n1,1,1\n4,1,2\n")?;
        fs::write(dir.path().join("s2.csv"), "X,Y,Value\n1,3,5\n")?;

        let config = PipelineConfig::default();
        let output = build_output(&ingest(dir.path(), &config)?, &config, "t".to_string());

        for data in output.datasets.values() {
            assert_eq!(data.heat.len(), 12);
        }
        let s2 = &output.datasets["s2"];
        assert_eq!(s2.heat.iter().filter(|c| c[2] == NO_DATA).count(), 11);
        assert_eq!(s2.points.len(), 1);
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let dir = TempDir::new()?;
        write_example(dir.path());
        let config = PipelineConfig::default();

        let first = build_output(&ingest(dir.path(), &config)?, &config, "t1".to_string());
        let second = build_output(&ingest(dir.path(), &config)?, &config, "t2".to_string());

        assert_eq!(first.datasets, second.datasets);
        let mut meta = second.meta.clone();
        meta.generated_at = first.meta.generated_at.clone();
        assert_eq!(first.meta, meta);
        Ok(())
    }

    #[test]
    fn test_run_build_writes_artifacts() -> Result<()> {
        let dir = TempDir::new()?;
        let req = request(&dir);
        fs::create_dir_all(&req.input_dir)?;
        write_example(&req.input_dir);

        let report = run_build(&req, &PipelineConfig::default())?;

        assert_eq!(report.slices, 2);
        assert_eq!(report.observations, 4);
        assert!(req.out_dir.join("index.html").exists());
        assert!(req.json_out.as_ref().is_some_and(|p| p.exists()));
        Ok(())
    }

    #[test]
    fn test_short_header_aborts_without_output() -> Result<()> {
        let dir = TempDir::new()?;
        let req = request(&dir);
        fs::create_dir_all(&req.input_dir)?;
        write_example(&req.input_dir);
        fs::write(req.input_dir.join("c.csv"), "X;Y\n1;1\n")?;

        let result = run_build(&req, &PipelineConfig::default());

        assert!(result.is_err());
        assert!(!req.out_dir.exists());
        assert!(!req.json_out.as_ref().is_some_and(|p| p.exists()));
        Ok(())
    }

    #[test]
    fn test_oversized_extent_aborts_without_output() -> Result<()> {
        let dir = TempDir::new()?;
        let req = request(&dir);
        fs::create_dir_all(&req.input_dir)?;
        write_example(&req.input_dir);
        fs::write(req.input_dir.join("c.csv"), "X,Y,Value\n4000000000,4000000000,1\n")?;

        let result = run_build(&req, &PipelineConfig::default());

        assert!(result.is_err());
        assert!(!req.out_dir.exists());
        Ok(())
    }

    #[test]
    fn test_empty_input_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let req = request(&dir);
        fs::create_dir_all(&req.input_dir)?;

        let report = run_build(&req, &PipelineConfig::default())?;

        assert_eq!(report.slices, 0);
        assert!(report.page.is_none());
        assert!(!req.out_dir.exists());
        Ok(())
    }

    #[test]
    fn test_strict_mode_rejects_bad_field() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.csv"), "X,Y,Value\n1,1,lots\n")?;

        let mut config = PipelineConfig::default();
        assert!(ingest(dir.path(), &config).is_ok());

        config.ingest.strict = true;
        assert!(ingest(dir.path(), &config).is_err());
        Ok(())
    }
}
