//! `gantry plan` - plan the action graph for a unit manifest.

use std::fs;

use anyhow::{Context, Result};

use gantry::core::manifest::Manifest;
use gantry::planner::PlanRequest;
use gantry::CompilationPlanner;

use crate::cli::PlanArgs;

pub fn execute(args: PlanArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;

    let unit = manifest.compilation_unit();
    let surface = manifest.dep_surface();
    let namer = manifest.namer();
    let request = PlanRequest {
        extra_compile_args: manifest.request.extra_compile_args.clone(),
        priority_headers: manifest.request.priority_headers.clone(),
        link_binary: manifest.request.link_binary,
        fully_link: manifest.request.fully_link,
        extra_link_args: manifest.request.extra_link_args.clone(),
        extra_link_inputs: manifest.request.extra_link_inputs.clone(),
        prune_info: manifest.prune_info(),
    };

    let planner =
        CompilationPlanner::new(&unit, &surface, &manifest.config, &manifest.target, &namer);
    let graph = planner.plan(&request)?;

    let json = serde_json::to_string_pretty(&graph).context("failed to encode action graph")?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
