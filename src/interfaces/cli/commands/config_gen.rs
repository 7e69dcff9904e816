//! Generate config command

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;

use crate::config::WorkerConfig;
use crate::interfaces::cli::CliError;

/// Print a sample configuration, or write it to `output`
pub fn config_generate(output: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let Some(path) = output else {
        print!("{}", WorkerConfig::generate_sample_config());
        return Ok(());
    };

    if !force && path.exists() && !confirm_overwrite(&path)? {
        println!("{}", "Aborted.".red());
        return Ok(());
    }

    WorkerConfig::default().save_to_file(&path)?;
    println!(
        "{} {}",
        "Configuration file generated successfully:".green(),
        path.display().to_string().blue()
    );
    Ok(())
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool, CliError> {
    print!(
        "{} {} {}",
        "File already exists:".yellow(),
        path.display().to_string().blue(),
        "Overwrite? [y/N] ".yellow()
    );
    io::stdout()
        .flush()
        .map_err(|e| CliError::CommandError(e.to_string()))?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| CliError::CommandError(e.to_string()))?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nts-service.toml");

        config_generate(Some(path.clone()), false).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: WorkerConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed, WorkerConfig::default());
    }

    #[test]
    fn test_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nts-service.toml");
        std::fs::write(&path, "old").unwrap();

        config_generate(Some(path.clone()), true).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().contains("[service]"));
    }
}
