use crate::core::session::DEFAULT_BATCH_SIZE;
use crate::domain::model::{LineTerminator, ParseOptions, QuoteStyle, SerializerOptions};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "csv-tidy")]
#[command(about = "Clean up a CSV export and write a tidy copy")]
pub struct CliConfig {
    /// CSV file to import
    pub input: Option<String>,

    /// TOML configuration file; command-line input and --disable still apply on top
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "output.csv")]
    pub file_name: String,

    /// Field delimiter of the input
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Drop blank lines instead of reporting them as rows with too few fields
    #[arg(long)]
    pub skip_empty_lines: bool,

    /// Field delimiter of the output
    #[arg(long, default_value_t = ',')]
    pub output_delimiter: char,

    #[arg(long, value_enum, default_value_t = LineTerminator::Crlf)]
    pub newline: LineTerminator,

    #[arg(long, value_enum, default_value_t = QuoteStyle::Never)]
    pub quote_style: QuoteStyle,

    /// Transforms to switch off (remove-first-line, remove-decimals, round-amounts)
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Rows parsed between progress snapshots
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Print the first N parsed rows
    #[arg(long)]
    pub preview: Option<usize>,

    /// Also write the row error list as JSON to this path
    #[arg(long)]
    pub errors_json: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> Option<&str> {
        self.input.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.delimiter as u8,
            skip_empty_lines: self.skip_empty_lines,
        }
    }

    fn serializer_options(&self) -> SerializerOptions {
        SerializerOptions {
            delimiter: self.output_delimiter as u8,
            line_terminator: self.newline,
            quote_style: self.quote_style,
        }
    }

    fn disabled_transforms(&self) -> Vec<String> {
        self.disable.clone()
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            validation::validate_path("input", input)?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_name("file_name", &self.file_name)?;
        validation::validate_delimiter("delimiter", self.delimiter)?;
        validation::validate_delimiter("output_delimiter", self.output_delimiter)?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        validation::validate_transform_ids("disable", self.disable.iter().map(String::as_str))?;
        Ok(())
    }
}
