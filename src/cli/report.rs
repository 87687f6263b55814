use std::path::PathBuf;

use clap::Parser;
use compreq::{Engine, storage};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, Parser)]
#[command(about = "Summarise an instance's validation issues by code")]
pub struct Report {
    /// Path to the instance JSON
    instance: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl Report {
    #[instrument(level = "debug", skip_all, fields(instance = %self.instance.display()))]
    pub fn run(self, engine: &Engine) -> anyhow::Result<()> {
        let instance = storage::load_instance(&self.instance)?;
        let report = compreq::Report::build_with(&instance, engine.convention());

        match self.output {
            OutputFormat::Table => output_table(&report),
            OutputFormat::Json => {
                report.write_json(std::io::stdout().lock())?;
                println!();
            }
            OutputFormat::Csv => report.write_csv(std::io::stdout().lock())?,
        }
        Ok(())
    }
}

fn output_table(report: &compreq::Report) {
    println!("Instance:  {}", report.instance_id);
    println!("Template:  {}", report.template_id);
    if let Some(tag) = &report.component_tag {
        println!("Component: {tag}");
    }
    println!(
        "{}",
        format!("Generated: {}", report.generated_utc.format("%Y-%m-%dT%H:%M:%SZ")).dim()
    );

    let status = format!("Status:    {}", report.overall_status);
    println!(
        "{} ({} errors, {} warnings, {} info)\n",
        status.status(report.overall_status),
        report.counts.error_count,
        report.counts.warning_count,
        report.counts.info_count
    );

    if report.by_code.is_empty() {
        println!("{}", "No issues".success());
        return;
    }

    let narrow = terminal::is_narrow();
    for group in &report.by_code {
        let severity = format!("{:<8}", group.severity.as_str());
        println!(
            "{} {:<36} {:>4}  {}",
            severity.severity(group.severity),
            group.code.as_str(),
            group.count,
            group.requirement_ids.join(", ")
        );
        if !narrow {
            for example in &group.message_examples {
                println!("{}", format!("         {example}").dim());
            }
        }
    }
}
