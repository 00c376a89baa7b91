//! Check command - validate the configuration and archive resolution

use console::style;
use nixrel_engine::Engine;
use nixrel_pipe::{PackageFields, PipeError};
use std::path::Path;

use super::{ReleaseOptions, artifacts_path, load_artifacts, load_project, release_context};
use crate::error::{CliError, Result};

pub fn run(config: &Path, artifacts: Option<&Path>, release: &ReleaseOptions) -> Result<()> {
    println!(
        "{} Checking {}",
        style("→").blue(),
        config.display()
    );

    let project = load_project(config)?;
    println!(
        "  {} configuration is valid ({} package(s))",
        style("✓").green(),
        project.nix.len()
    );

    let artifacts_file = artifacts_path(&project, artifacts);
    if !artifacts_file.exists() {
        println!(
            "  {} {} not found, skipping archive resolution",
            style("⚠").yellow(),
            artifacts_file.display()
        );
        return Ok(());
    }

    let list = load_artifacts(&artifacts_file)?;
    let ctx = release_context(&project, release)?;
    let engine = Engine::default();

    let mut errors = Vec::new();
    for pkg in &project.nix {
        let checked = PackageFields::expand(&engine, &ctx, pkg).and_then(|fields| {
            let archives = nixrel_pipe::resolve(&list, &pkg.ids, &pkg.goamd64)?;
            Ok((fields, archives))
        });

        match checked {
            Ok((fields, archives)) => {
                println!(
                    "  {} {} -> {}",
                    style("✓").green(),
                    style(&fields.name).bold(),
                    fields.path
                );
                for archive in &archives {
                    println!(
                        "      {} {}",
                        style(archive.platform.nix_system()).dim(),
                        archive.artifact.name
                    );
                }
            }
            Err(err) => {
                println!("  {} {}: {}", style("✗").red(), pkg.name, err);
                errors.push(err);
            }
        }
    }

    match errors.len() {
        0 => {
            println!("\n{} Check passed", style("✓").green().bold());
            Ok(())
        }
        1 => Err(CliError::from(errors.remove(0))),
        _ => Err(PipeError::Multiple(errors).into()),
    }
}
