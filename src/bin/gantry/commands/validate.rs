//! `gantry validate` - check a unit manifest's attributes.

use anyhow::{bail, Result};

use gantry::core::manifest::Manifest;
use gantry::CompilationPlanner;

use crate::cli::ValidateArgs;

pub fn execute(args: ValidateArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;

    let unit = manifest.compilation_unit();
    let surface = manifest.dep_surface();
    let namer = manifest.namer();
    let planner =
        CompilationPlanner::new(&unit, &surface, &manifest.config, &manifest.target, &namer);

    let diagnostics = planner.validate_attributes();
    for diagnostic in &diagnostics {
        println!("{}", diagnostic);
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        bail!("{} attribute error(s)", errors);
    }
    println!("ok: {}", manifest.target.label);
    Ok(())
}
