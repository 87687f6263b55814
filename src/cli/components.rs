use clap::Parser;
use compreq::ComponentTarget;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
#[command(about = "List the built-in component kinds and their naming")]
pub struct Components {
    /// Print names only
    #[arg(long, short)]
    quiet: bool,
}

impl Components {
    #[allow(clippy::unnecessary_wraps)]
    pub fn run(self) -> anyhow::Result<()> {
        if self.quiet {
            for target in ComponentTarget::builtin() {
                println!("{}", target.name);
            }
            return Ok(());
        }

        println!(
            "{}",
            format!("{:<16} {:<24} {}", "COMPONENT", "PROFILE KEY", "TAG FIELD").dim()
        );
        for target in ComponentTarget::builtin() {
            println!(
                "{:<16} {:<24} {}",
                target.name, target.profile_key, target.tag_field
            );
        }
        Ok(())
    }
}
