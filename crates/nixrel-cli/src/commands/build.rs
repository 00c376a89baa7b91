//! Build command - render manifests with placeholder hashes

use console::style;
use nixrel_engine::Engine;
use std::path::Path;

use super::{ReleaseOptions, artifacts_path, load_artifacts, load_project, release_context};
use crate::error::Result;

pub async fn run(config: &Path, artifacts: Option<&Path>, release: &ReleaseOptions) -> Result<()> {
    let project = load_project(config)?;
    if project.nix.is_empty() {
        println!("{} No nix packages configured", style("⚠").yellow());
        return Ok(());
    }

    let artifacts_file = artifacts_path(&project, artifacts);
    let mut list = load_artifacts(&artifacts_file)?;
    let ctx = release_context(&project, release)?;

    let built = nixrel_pipe::build_all(&project, &mut list, &ctx, &Engine::default()).await?;
    list.save(&artifacts_file)?;

    for package in &built {
        println!(
            "{} {} -> {}",
            style("✓").green(),
            style(&package.name).bold(),
            package.local_path.display()
        );
    }
    println!(
        "\n{} Built {} nix package(s) for {}",
        style("✓").green().bold(),
        built.len(),
        ctx.tag
    );
    Ok(())
}
