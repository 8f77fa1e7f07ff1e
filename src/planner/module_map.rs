//! Clang module-map generation.

use crate::core::artifact::Artifact;
use crate::core::unit::is_module_map_header;
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::CompilationPlanner;

impl CompilationPlanner<'_> {
    /// Plans the write of this unit's module map.
    ///
    /// A map is only produced when module maps are enabled and the unit
    /// actually compiles something; header-only or empty units contribute no
    /// module of their own.
    pub fn plan_module_map(&self, graph: &mut ActionGraph) {
        if !self.config.module_maps_enabled || !self.unit.has_compilation_artifacts() {
            return;
        }

        let map = self.namer.module_map();
        let dep_maps: Vec<(String, Artifact)> = self
            .surface
            .direct_dep_module_maps
            .iter()
            .map(|m| (m.name.clone(), m.artifact))
            .collect();
        let contents = render_module_map(
            &map.name,
            map.artifact,
            self.unit.public_hdrs(),
            self.unit.private_hdrs(),
            &dep_maps,
        );

        graph.register(
            ActionBuilder::write_file("ObjcModuleMap", contents)
                .inputs(
                    self.unit
                        .public_hdrs()
                        .iter()
                        .chain(self.unit.private_hdrs())
                        .copied()
                        .filter(|h| is_module_map_header(*h)),
                )
                .inputs(dep_maps.iter().map(|(_, artifact)| *artifact))
                .output(map.artifact)
                .build(),
        );
    }
}

/// Renders the module-map text. Header paths are written relative to the
/// map's own directory, since clang resolves them from there.
fn render_module_map(
    name: &str,
    map: Artifact,
    public_hdrs: &[Artifact],
    private_hdrs: &[Artifact],
    dep_maps: &[(String, Artifact)],
) -> String {
    let up = ascent_prefix(map);
    let mut out = String::new();
    out.push_str(&format!("module \"{}\" {{\n", name));
    out.push_str("  export *\n");
    for hdr in public_hdrs.iter().copied().filter(|h| is_module_map_header(*h)) {
        out.push_str(&format!("  header \"{}{}\"\n", up, hdr));
    }
    for hdr in private_hdrs.iter().copied().filter(|h| is_module_map_header(*h)) {
        out.push_str(&format!("  private header \"{}{}\"\n", up, hdr));
    }
    out.push_str("}\n");
    for (dep_name, dep_map) in dep_maps {
        out.push_str(&format!(
            "extern module \"{}\" \"{}{}\"\n",
            dep_name, up, dep_map
        ));
    }
    out
}

/// "../" repeated once per directory level of the map's location, taking a
/// map-relative reference back to the execution root.
fn ascent_prefix(map: Artifact) -> String {
    let parent = map.parent_dir();
    if parent.is_empty() {
        return String::new();
    }
    let levels = parent.split('/').count();
    "../".repeat(levels)
}
