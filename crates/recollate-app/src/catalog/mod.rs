//! Configurable catalog of document-type profiles and section rules.
//!
//! The catalog is external data: parsed once at startup, validated, compiled
//! into an immutable structure, and shared behind an `Arc` for the lifetime
//! of the process. Requests never mutate it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CATALOG_YAML: &str = include_str!("default_catalog.yml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("catalog defines no profiles")]
    EmptyCatalog,
    #[error("profile `{name}` is declared more than once")]
    DuplicateProfile { name: String },
    #[error("profile `{name}` defines no sections")]
    EmptyProfile { name: String },
    #[error("section `{section}` is declared more than once in profile `{profile}`")]
    DuplicateSection { profile: String, section: String },
    #[error("section `{section}` in profile `{profile}` has negative or non-finite weight {weight}")]
    InvalidWeight {
        profile: String,
        section: String,
        weight: f32,
    },
    #[error("section `{section}` in profile `{profile}` has no indicators or boost patterns")]
    UnusableSection { profile: String, section: String },
    #[error("invalid boost pattern `{pattern}` in profile `{profile}`, section `{section}`: {source}")]
    InvalidPattern {
        profile: String,
        section: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    profiles: Vec<ProfileSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSpec {
    name: String,
    sections: Vec<SectionSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionSpec {
    section_name: String,
    priority: i32,
    weight: f32,
    #[serde(default)]
    indicators: Vec<String>,
    #[serde(default)]
    required_any: Vec<String>,
    #[serde(default)]
    boost_patterns: Vec<String>,
}

/// One compiled section rule. Keyword terms are lower-cased at load so page
/// scoring can match case-insensitively without repeated allocation.
#[derive(Debug)]
pub struct SectionRule {
    pub section_name: String,
    pub priority: i32,
    pub weight: f32,
    pub indicators: Vec<String>,
    pub required_any: Vec<String>,
    pub boost_patterns: Vec<Regex>,
    /// Position within the profile, used as the final deterministic tie-break.
    pub declaration_index: usize,
}

#[derive(Debug)]
pub struct DocumentTypeProfile {
    pub name: String,
    pub sections: Vec<SectionRule>,
}

impl DocumentTypeProfile {
    /// All keyword terms of the profile, for document-type auto-detection.
    pub fn detection_terms(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().flat_map(|section| {
            section
                .indicators
                .iter()
                .chain(section.required_any.iter())
                .map(String::as_str)
        })
    }
}

#[derive(Debug)]
pub struct RuleCatalog {
    pub profiles: Vec<DocumentTypeProfile>,
}

impl RuleCatalog {
    /// Compiles the embedded default catalog.
    pub fn builtin() -> Result<Arc<Self>, CatalogError> {
        Self::from_yaml(DEFAULT_CATALOG_YAML)
    }

    pub fn load(path: &Path) -> Result<Arc<Self>, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Arc<Self>, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(raw)?;
        compile(file).map(Arc::new)
    }
}

fn compile(file: CatalogFile) -> Result<RuleCatalog, CatalogError> {
    if file.profiles.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }

    let mut profile_names = HashSet::new();
    let mut profiles = Vec::with_capacity(file.profiles.len());

    for profile in file.profiles {
        if !profile_names.insert(profile.name.clone()) {
            return Err(CatalogError::DuplicateProfile { name: profile.name });
        }
        if profile.sections.is_empty() {
            return Err(CatalogError::EmptyProfile { name: profile.name });
        }

        let mut section_names = HashSet::new();
        let mut sections = Vec::with_capacity(profile.sections.len());

        for (declaration_index, section) in profile.sections.into_iter().enumerate() {
            if !section_names.insert(section.section_name.clone()) {
                return Err(CatalogError::DuplicateSection {
                    profile: profile.name,
                    section: section.section_name,
                });
            }
            if !section.weight.is_finite() || section.weight < 0.0 {
                return Err(CatalogError::InvalidWeight {
                    profile: profile.name,
                    section: section.section_name,
                    weight: section.weight,
                });
            }
            if section.indicators.is_empty() && section.boost_patterns.is_empty() {
                return Err(CatalogError::UnusableSection {
                    profile: profile.name,
                    section: section.section_name,
                });
            }

            let mut boost_patterns = Vec::with_capacity(section.boost_patterns.len());
            for pattern in &section.boost_patterns {
                let compiled =
                    Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                        profile: profile.name.clone(),
                        section: section.section_name.clone(),
                        pattern: pattern.clone(),
                        source,
                    })?;
                boost_patterns.push(compiled);
            }

            sections.push(SectionRule {
                section_name: section.section_name,
                priority: section.priority,
                weight: section.weight,
                indicators: lowercase_all(section.indicators),
                required_any: lowercase_all(section.required_any),
                boost_patterns,
                declaration_index,
            });
        }

        profiles.push(DocumentTypeProfile {
            name: profile.name,
            sections,
        });
    }

    Ok(RuleCatalog { profiles })
}

fn lowercase_all(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_compiles() {
        let catalog = RuleCatalog::builtin().expect("default catalog must be valid");
        assert!(catalog.profiles.len() >= 2, "expected multiple profiles");
        let loan = &catalog.profiles[0];
        assert_eq!(loan.name, "loan_agreement");
        assert!(loan.sections.iter().any(|s| s.section_name == "signing"));
    }

    #[test]
    fn duplicate_section_name_is_rejected() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: body
        priority: 1
        weight: 1.0
        indicators: ["alpha"]
      - section_name: body
        priority: 2
        weight: 1.0
        indicators: ["beta"]
"#;
        let err = RuleCatalog::from_yaml(yaml).expect_err("duplicate section must fail");
        assert!(matches!(err, CatalogError::DuplicateSection { .. }));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: body
        priority: 1
        weight: -0.5
        indicators: ["alpha"]
"#;
        let err = RuleCatalog::from_yaml(yaml).expect_err("negative weight must fail");
        assert!(matches!(err, CatalogError::InvalidWeight { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: body
        priority: 1
        weight: 1.0
        indicators: ["alpha"]
        surprise: true
"#;
        let err = RuleCatalog::from_yaml(yaml).expect_err("unknown field must fail");
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn invalid_boost_pattern_is_rejected() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: body
        priority: 1
        weight: 1.0
        indicators: ["alpha"]
        boost_patterns: ["(unclosed"]
"#;
        let err = RuleCatalog::from_yaml(yaml).expect_err("bad regex must fail");
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }

    #[test]
    fn indicator_terms_are_lowercased_at_load() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: body
        priority: 1
        weight: 1.0
        indicators: ["Alpha Beta", "  GAMMA  "]
"#;
        let catalog = RuleCatalog::from_yaml(yaml).expect("catalog compiles");
        let section = &catalog.profiles[0].sections[0];
        assert_eq!(section.indicators, vec!["alpha beta", "gamma"]);
    }
}
