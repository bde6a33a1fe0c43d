use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, AnalysisConfigBuilder, ConfigError};
use crate::embed::{EmbeddingConfig, EmbeddingProvider};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub analysis: Option<AnalysisSection>,
    pub embedding: Option<EmbeddingSection>,
    pub paths: Option<PathsSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub relevance_threshold: Option<f64>,
    pub max_sections: Option<usize>,
    pub max_subsections: Option<usize>,
    pub job_weight: Option<f64>,
    pub persona_weight: Option<f64>,
    pub heading_max_words: Option<usize>,
    pub paragraph_min_words: Option<usize>,
    pub section_prefix_chars: Option<usize>,
    pub default_body_font_size: Option<i32>,
    pub default_section_title: Option<String>,
    pub paragraph_per_block: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSection {
    pub provider: Option<EmbeddingProvider>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub dimensions: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    pub input: Option<String>,
    pub pdf_dir: Option<String>,
    pub output: Option<String>,
}

/// Platform config directory path: `<config_dir>/docsift/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsift").join("config.toml"))
}

/// Load config by cascading CWD `.docsift.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".docsift.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

macro_rules! overlay {
    ($base:expr, $overlay:expr, $section:ident, [$($field:ident),+ $(,)?]) => {
        $section {
            $(
                $field: $overlay
                    .as_ref()
                    .and_then(|s| s.$field.clone())
                    .or_else(|| $base.as_ref().and_then(|s| s.$field.clone())),
            )+
        }
    };
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        analysis: Some(overlay!(
            base.analysis,
            overlay.analysis,
            AnalysisSection,
            [
                relevance_threshold,
                max_sections,
                max_subsections,
                job_weight,
                persona_weight,
                heading_max_words,
                paragraph_min_words,
                section_prefix_chars,
                default_body_font_size,
                default_section_title,
                paragraph_per_block,
            ]
        )),
        embedding: Some(overlay!(
            base.embedding,
            overlay.embedding,
            EmbeddingSection,
            [provider, model, api_base, api_key, dimensions, timeout_secs]
        )),
        paths: Some(overlay!(
            base.paths,
            overlay.paths,
            PathsSection,
            [input, pdf_dir, output]
        )),
    }
}

impl ConfigFile {
    /// Build an [`AnalysisConfig`] from the `[analysis]` table; unset keys
    /// keep their defaults.
    pub fn analysis_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let Some(a) = &self.analysis else {
            return Ok(AnalysisConfig::default());
        };

        let mut builder = AnalysisConfigBuilder::new();
        if let Some(v) = a.relevance_threshold {
            builder = builder.relevance_threshold(v);
        }
        if let Some(v) = a.max_sections {
            builder = builder.max_sections(v);
        }
        if let Some(v) = a.max_subsections {
            builder = builder.max_subsections(v);
        }
        if let Some(v) = a.job_weight {
            builder = builder.job_weight(v);
        }
        if let Some(v) = a.persona_weight {
            builder = builder.persona_weight(v);
        }
        if let Some(v) = a.heading_max_words {
            builder = builder.heading_max_words(v);
        }
        if let Some(v) = a.paragraph_min_words {
            builder = builder.paragraph_min_words(v);
        }
        if let Some(v) = a.section_prefix_chars {
            builder = builder.section_prefix_chars(v);
        }
        if let Some(v) = a.default_body_font_size {
            builder = builder.default_body_font_size(v);
        }
        if let Some(v) = &a.default_section_title {
            builder = builder.default_section_title(v);
        }
        if let Some(v) = a.paragraph_per_block {
            builder = builder.paragraph_per_block(v);
        }
        builder.build()
    }

    /// Build an [`EmbeddingConfig`] from the `[embedding]` table, filling
    /// unset keys from the provider defaults.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        let section = self.embedding.clone().unwrap_or_default();
        let defaults = EmbeddingConfig::for_provider(section.provider.unwrap_or_default());
        EmbeddingConfig {
            provider: defaults.provider,
            model: section.model.unwrap_or(defaults.model),
            api_base: section.api_base.unwrap_or(defaults.api_base),
            api_key: section.api_key.or(defaults.api_key),
            dimensions: section.dimensions.or(defaults.dimensions),
            timeout: section
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_partial_toml() {
        let toml_str = "[analysis]\nrelevance_threshold = 0.3\n\n[embedding]\nprovider = \"ollama\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let analysis = parsed.analysis.as_ref().unwrap();
        assert_eq!(analysis.relevance_threshold, Some(0.3));
        assert!(analysis.max_sections.is_none());
        assert_eq!(
            parsed.embedding.as_ref().unwrap().provider,
            Some(EmbeddingProvider::Ollama)
        );
        assert!(parsed.paths.is_none());
    }

    #[test]
    fn round_trip_toml() {
        let config = ConfigFile {
            paths: Some(PathsSection {
                pdf_dir: Some("input/pdfs".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            analysis: Some(AnalysisSection {
                max_sections: Some(10),
                job_weight: Some(0.7),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            analysis: Some(AnalysisSection {
                max_sections: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let analysis = merged.analysis.unwrap();
        assert_eq!(analysis.max_sections, Some(3));
        assert_eq!(analysis.job_weight, Some(0.7));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            embedding: Some(EmbeddingSection {
                model: Some("nomic-embed-text".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.embedding.unwrap().model.as_deref(),
            Some("nomic-embed-text")
        );
    }

    #[test]
    fn analysis_config_applies_overrides() {
        let file = ConfigFile {
            analysis: Some(AnalysisSection {
                relevance_threshold: Some(0.1),
                paragraph_per_block: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = file.analysis_config().unwrap();
        assert!((config.relevance_threshold() - 0.1).abs() < f64::EPSILON);
        assert!(config.paragraph_per_block());
        assert_eq!(config.max_sections(), 5);
    }

    #[test]
    fn analysis_config_propagates_validation_errors() {
        let file = ConfigFile {
            analysis: Some(AnalysisSection {
                max_sections: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(file.analysis_config().is_err());
    }

    #[test]
    fn embedding_config_uses_provider_defaults() {
        let file = ConfigFile {
            embedding: Some(EmbeddingSection {
                provider: Some(EmbeddingProvider::Ollama),
                timeout_secs: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = file.embedding_config();
        assert_eq!(config.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.api_base, "http://localhost:11434");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn load_from_path_reads_and_tolerates_garbage() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[paths]\noutput = \"out/report.json\"").unwrap();
        let loaded = load_from_path(good.path()).unwrap();
        assert_eq!(
            loaded.paths.unwrap().output.as_deref(),
            Some("out/report.json")
        );

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "this is = = not toml").unwrap();
        assert!(load_from_path(bad.path()).is_none());

        assert!(load_from_path(Path::new("/definitely/not/here.toml")).is_none());
    }
}
