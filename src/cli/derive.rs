use std::path::PathBuf;

use clap::Parser;
use compreq::{ComponentTarget, Engine, Report, storage};
use tracing::{instrument, warn};

use super::{gate::Gate, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Filter and instantiate component requirements from a template")]
pub struct Derive {
    /// Path to the requirement template library (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    template: PathBuf,

    /// Path to the component profile (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    profile: PathBuf,

    /// Output path for the instance JSON
    #[arg(long, value_name = "PATH")]
    out: PathBuf,

    /// Component kind (valve, pump, steam_generator, turbine, condenser,
    /// pressurizer)
    #[arg(long, default_value = "valve")]
    component: String,

    /// Key the profile is embedded under in the instance
    ///
    /// Defaults to '<component>_profile'.
    #[arg(long, value_name = "KEY")]
    profile_key: Option<String>,

    /// Profile field holding the component tag
    ///
    /// Defaults to the component's conventional tag field.
    #[arg(long, value_name = "FIELD")]
    tag_field: Option<String>,

    /// Also write a grouped validation report as JSON
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,

    /// Also write a grouped validation report as CSV
    #[arg(long, value_name = "PATH")]
    report_csv: Option<PathBuf>,

    #[command(flatten)]
    gate: Gate,
}

impl Derive {
    fn target(&self) -> ComponentTarget {
        if !ComponentTarget::is_builtin(&self.component) {
            warn!(component = %self.component, "not a built-in component, using generic naming");
        }

        let mut target = ComponentTarget::named(&self.component);
        if let Some(key) = &self.profile_key {
            target = target.with_profile_key(key.clone());
        }
        if let Some(field) = &self.tag_field {
            target = target.with_tag_field(field.clone());
        }
        target
    }

    #[instrument(level = "debug", skip_all, fields(component = %self.component))]
    pub fn run(self, engine: &Engine) -> anyhow::Result<()> {
        let template = storage::load_template(&self.template)?;
        let profile = storage::load_profile(&self.profile)?;
        let target = self.target();

        let instance = engine.derive(&template, &profile, &target);
        storage::write_instance(&instance, &self.out)?;
        println!(
            "{} {} (applicable={})",
            "Wrote:".success(),
            self.out.display(),
            instance.summary.applicable_count
        );

        if self.report_json.is_some() || self.report_csv.is_some() {
            let report = Report::build_with(&instance, engine.convention());
            if let Some(path) = &self.report_json {
                storage::write_report_json(&report, path)?;
                println!("{} {}", "Wrote report (JSON):".success(), path.display());
            }
            if let Some(path) = &self.report_csv {
                storage::write_report_csv(&report, path)?;
                println!("{} {}", "Wrote report (CSV):".success(), path.display());
            }
        }

        let validation = &instance.validation;
        let status = format!("Validation: {}", validation.overall_status);
        println!(
            "{} {}",
            status.status(validation.overall_status),
            format!(
                "({} errors, {} warnings)",
                validation.error_count, validation.warning_count
            )
            .dim()
        );

        self.gate.enforce(validation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Derive {
        let base = ["derive", "--template", "t.json", "--profile", "p.json", "--out", "o.json"];
        Derive::try_parse_from(base.iter().chain(args)).unwrap()
    }

    #[test]
    fn defaults_to_valve_naming() {
        let target = parse(&[]).target();
        assert_eq!(target, ComponentTarget::named("valve"));
        assert_eq!(target.profile_key, "valve_profile");
    }

    #[test]
    fn overrides_profile_key_and_tag_field() {
        let target = parse(&[
            "--component",
            "steam_generator",
            "--profile-key",
            "sg",
            "--tag-field",
            "unit_id",
        ])
        .target();
        assert_eq!(target.name, "steam_generator");
        assert_eq!(target.profile_key, "sg");
        assert_eq!(target.tag_field, "unit_id");
    }

    #[test]
    fn writes_instance_and_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let template = tmp.path().join("template.json");
        let profile = tmp.path().join("profile.yaml");
        std::fs::write(
            &template,
            r#"{"template_id": "pump_baseline", "requirement_sets": [{"requirements": [
                {"id": "P-001", "text": "The pump shall deliver {{flow}}.",
                 "verification": {"method": ["test"], "acceptance": "Rated flow met."}}
            ]}]}"#,
        )
        .unwrap();
        std::fs::write(&profile, "pump_tag: P-7\nflow: 40 m3/h\n").unwrap();

        let out = tmp.path().join("out").join("instance.json");
        let csv = tmp.path().join("out").join("report.csv");
        let command = Derive::try_parse_from([
            "derive",
            "--template",
            template.to_str().unwrap(),
            "--profile",
            profile.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--component",
            "pump",
            "--report-csv",
            csv.to_str().unwrap(),
        ])
        .unwrap();
        command.run(&Engine::default()).unwrap();

        let instance = storage::load_instance(&out).unwrap();
        assert_eq!(instance.instance_id, "P-7-requirements");
        assert_eq!(
            instance.applicable_requirements[0].text,
            "The pump shall deliver 40 m3/h."
        );
        assert!(csv.exists());
    }
}
