use crate::core::session::DEFAULT_BATCH_SIZE;
use crate::domain::model::{LineTerminator, ParseOptions, QuoteStyle, SerializerOptions};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TidyError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: Option<InputConfig>,
    /// Transform id → enabled. Transforms not listed stay enabled.
    pub transforms: Option<BTreeMap<String, bool>>,
    pub parse: Option<ParseConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    pub delimiter: Option<char>,
    pub batch_size: Option<usize>,
    pub skip_empty_lines: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub file_name: Option<String>,
    pub delimiter: Option<char>,
    pub line_terminator: Option<LineTerminator>,
    pub quote_style: Option<QuoteStyle>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TidyError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TidyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of the environment variable, leaving unknown ones as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TidyError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Command-line input path and `--disable` flags win over the file.
    pub fn apply_overrides(&mut self, input: Option<&str>, disable: &[String]) {
        if let Some(path) = input {
            self.input = Some(InputConfig {
                path: Some(path.to_string()),
            });
        }

        if !disable.is_empty() {
            let transforms = self.transforms.get_or_insert_with(BTreeMap::new);
            for id in disable {
                transforms.insert(id.clone(), false);
            }
        }
    }

    fn parse_delimiter(&self) -> char {
        self.parse.as_ref().and_then(|p| p.delimiter).unwrap_or(',')
    }

    fn output_delimiter(&self) -> char {
        self.output.delimiter.unwrap_or(',')
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> Option<&str> {
        self.input.as_ref().and_then(|i| i.path.as_deref())
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn file_name(&self) -> &str {
        self.output.file_name.as_deref().unwrap_or("output.csv")
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.parse_delimiter() as u8,
            skip_empty_lines: self
                .parse
                .as_ref()
                .and_then(|p| p.skip_empty_lines)
                .unwrap_or(false),
        }
    }

    fn serializer_options(&self) -> SerializerOptions {
        SerializerOptions {
            delimiter: self.output_delimiter() as u8,
            line_terminator: self.output.line_terminator.unwrap_or_default(),
            quote_style: self.output.quote_style.unwrap_or_default(),
        }
    }

    fn disabled_transforms(&self) -> Vec<String> {
        self.transforms
            .iter()
            .flatten()
            .filter(|(_, enabled)| !**enabled)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn batch_size(&self) -> usize {
        self.parse
            .as_ref()
            .and_then(|p| p.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = self.input_path() {
            validation::validate_path("input.path", path)?;
        }
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_file_name("output.file_name", self.file_name())?;
        validation::validate_delimiter("parse.delimiter", self.parse_delimiter())?;
        validation::validate_delimiter("output.delimiter", self.output_delimiter())?;
        validation::validate_positive_number("parse.batch_size", self.batch_size(), 1)?;
        if let Some(transforms) = &self.transforms {
            validation::validate_transform_ids("transforms", transforms.keys().map(String::as_str))?;
        }
        Ok(())
    }
}
