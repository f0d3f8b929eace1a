use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_edit";

/// Settings shared by every operation. Built once in `main` from the global
/// CLI flags, which also read the `PDF_TRIMMER_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub output_suffix: String,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            debug: false,
        }
    }
}

impl Config {
    /// File name ending that marks an already processed file, e.g. `_edit.pdf`.
    pub fn processed_suffix(&self) -> String {
        format!("{}.pdf", self.output_suffix)
    }

    /// Same settings, writing into `output_dir` instead.
    pub fn with_output_dir(&self, output_dir: Option<PathBuf>) -> Self {
        Config {
            output_dir: output_dir.unwrap_or_else(|| self.output_dir.clone()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.processed_suffix(), "_edit.pdf");
        assert!(!config.debug);
    }

    #[test]
    fn test_output_dir_override() {
        let config = Config::default();
        assert_eq!(config.with_output_dir(None), config);
        assert_eq!(
            config.with_output_dir(Some("trimmed".into())).output_dir,
            PathBuf::from("trimmed")
        );
    }
}
