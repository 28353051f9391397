use std::path::Path;

use thiserror::Error;

mod schema;

pub use schema::{DwiprepConfig, PreprocessingConfig, ReportConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Load and validate a `DwiprepConfig` from a TOML file path.
///
/// Returns the default config if the file does not exist.
pub fn load_config(path: &Path) -> Result<DwiprepConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(DwiprepConfig::default());
    }

    let data = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_config(&data)
}

/// Parse and validate a `DwiprepConfig` from a TOML string.
pub fn parse_config(data: &str) -> Result<DwiprepConfig, ConfigError> {
    let config: DwiprepConfig = toml::from_str(data)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &DwiprepConfig) -> Result<(), ConfigError> {
    let pre = &config.preprocessing;
    if pre.dwi_denoise_window != 0 && pre.dwi_denoise_window % 2 == 0 {
        return Err(ConfigError::Validation {
            message: format!(
                "preprocessing.dwi_denoise_window must be odd or 0, got {}",
                pre.dwi_denoise_window
            ),
        });
    }

    if pre.omp_nthreads == 0 {
        return Err(ConfigError::Validation {
            message: "preprocessing.omp_nthreads must be > 0".to_string(),
        });
    }

    if pre.workflow_name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "preprocessing.workflow_name must not be empty".to_string(),
        });
    }

    let report = &config.report;
    if report.width == 0 || report.height == 0 {
        return Err(ConfigError::Validation {
            message: format!(
                "report.width and report.height must be > 0, got {}x{}",
                report.width, report.height
            ),
        });
    }

    if let Some(tr) = report.repetition_time {
        if !tr.is_finite() || tr <= 0.0 {
            return Err(ConfigError::Validation {
                message: format!("report.repetition_time must be a finite number > 0, got {tr}"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = DwiprepConfig::default();
        validate(&config).unwrap();
    }

    #[test]
    fn minimal_toml_parses_to_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.preprocessing.dwi_denoise_window, 5);
        assert!(config.preprocessing.denoise_before_combining);
        assert_eq!(config.preprocessing.omp_nthreads, 1);
        assert!(!config.preprocessing.low_mem);
        assert_eq!(config.preprocessing.workflow_name, "pre_hmc_wf");
        assert_eq!(config.report.width, 950);
        assert_eq!(config.report.height, 800);
        assert!(config.report.repetition_time.is_none());
    }

    #[test]
    fn full_example_config_parses() {
        let data = r#"
[preprocessing]
dwi_denoise_window = 7
denoise_before_combining = false
omp_nthreads = 8
low_mem = true
workflow_name = "sub01_pre_hmc"

[report]
width = 1200
height = 900
repetition_time = 3.2
confounds = ["framewise_displacement"]

[report.units]
framewise_displacement = "mm"

[report.cutoffs]
framewise_displacement = [0.5, 1.0]
"#;

        let config = parse_config(data).unwrap();
        assert_eq!(config.preprocessing.dwi_denoise_window, 7);
        assert!(!config.preprocessing.denoise_before_combining);
        assert_eq!(config.preprocessing.omp_nthreads, 8);
        assert!(config.preprocessing.low_mem);
        assert_eq!(config.preprocessing.workflow_name, "sub01_pre_hmc");
        assert_eq!(config.report.width, 1200);
        assert_eq!(config.report.repetition_time, Some(3.2));
        assert_eq!(
            config.report.confounds.as_deref(),
            Some(&["framewise_displacement".to_string()][..])
        );
        assert_eq!(
            config.report.units.get("framewise_displacement").map(String::as_str),
            Some("mm")
        );
        assert_eq!(
            config.report.cutoffs.get("framewise_displacement"),
            Some(&vec![0.5, 1.0])
        );
    }

    #[test]
    fn even_denoise_window_rejected() {
        let data = r#"
[preprocessing]
dwi_denoise_window = 4
"#;
        let err = parse_config(data).unwrap_err();
        assert!(err.to_string().contains("dwi_denoise_window"));
    }

    #[test]
    fn zero_denoise_window_accepted() {
        let data = r#"
[preprocessing]
dwi_denoise_window = 0
"#;
        let config = parse_config(data).unwrap();
        assert_eq!(config.preprocessing.dwi_denoise_window, 0);
    }

    #[test]
    fn zero_threads_rejected() {
        let data = r#"
[preprocessing]
omp_nthreads = 0
"#;
        let err = parse_config(data).unwrap_err();
        assert!(err.to_string().contains("omp_nthreads"));
    }

    #[test]
    fn blank_workflow_name_rejected() {
        let data = r#"
[preprocessing]
workflow_name = "  "
"#;
        let err = parse_config(data).unwrap_err();
        assert!(err.to_string().contains("workflow_name"));
    }

    #[test]
    fn non_positive_repetition_time_rejected() {
        let data = r#"
[report]
repetition_time = 0.0
"#;
        let err = parse_config(data).unwrap_err();
        assert!(err.to_string().contains("repetition_time"));
    }

    #[test]
    fn zero_figure_size_rejected() {
        let data = r#"
[report]
width = 0
"#;
        let err = parse_config(data).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn unknown_field_in_toml_returns_parse_error() {
        let data = r#"
[preprocessing]
nonexistent_field = "bad"
"#;
        let err = parse_config(data).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = load_config(Path::new("/tmp/nonexistent-dwiprep-test.toml")).unwrap();
        assert_eq!(config, DwiprepConfig::default());
    }

    #[test]
    fn config_file_on_disk_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dwiprep.toml");
        std::fs::write(&path, "[preprocessing]\nlow_mem = true\n").unwrap();
        let config = load_config(&path).unwrap();
        assert!(config.preprocessing.low_mem);
    }
}
