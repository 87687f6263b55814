use std::path::PathBuf;

use clap::Parser;
use compreq::{Engine, ValidationResult, storage};
use tracing::instrument;

use super::{gate::Gate, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Re-run the quality checks over an instance file")]
pub struct Validate {
    /// Path to the instance JSON
    instance: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,

    #[command(flatten)]
    gate: Gate,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip_all, fields(instance = %self.instance.display()))]
    pub fn run(self, engine: &Engine) -> anyhow::Result<()> {
        // Structural faults become issues, not parse errors.
        let document = storage::load_document(&self.instance)?;
        let result = engine.validator().validate_document(&document);

        if !self.quiet {
            match self.output {
                OutputFormat::Table => self.output_table(&result),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Summary => println!("{}", summary_line(&result)),
            }
        }

        self.gate.enforce(&result);
        Ok(())
    }

    fn output_table(&self, result: &ValidationResult) {
        println!("Validating {}...\n", self.instance.display());

        for issue in &result.issues {
            let severity = format!("{:<8}", issue.severity.as_str());
            let owner = issue.requirement_id.as_deref().unwrap_or("-");
            println!(
                "{} {:<36} {:<10} {}",
                severity.severity(issue.severity),
                issue.code.as_str(),
                owner,
                issue.message
            );
        }

        if result.issues.is_empty() {
            println!("{}", "No issues found".success());
        } else {
            println!();
        }

        let status = format!("Status: {}", result.overall_status);
        println!(
            "{} ({} errors, {} warnings, {} info)",
            status.status(result.overall_status),
            result.error_count,
            result.warning_count,
            result.info_count
        );
    }
}

fn summary_line(result: &ValidationResult) -> String {
    format!(
        "status={} errors={} warnings={} info={} issues={}",
        result.overall_status,
        result.error_count,
        result.warning_count,
        result.info_count,
        result.issue_count
    )
}
