//! Topology file rendering.
//!
//! Renders a `TopologyDescription` into the two-section text format read by
//! the simulator's annotated topology reader:
//!
//! ```text
//! router
//!
//! con0
//! pro0
//! ...
//!
//! link
//!
//! pro0       forwarder0       100Mbps       1       2ms       50
//! ```

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use tempfile::NamedTempFile;

use crate::topology::types::{Link, TopologyDescription};
use crate::utils::duration::format_delay;
use crate::utils::validation::ensure_output_dir;

/// Field separator used by the reference topology files
const FIELD_SEPARATOR: &str = "       ";

/// Render one link line (without trailing newline)
pub fn render_link(link: &Link) -> String {
    let attrs = &link.attributes;
    [
        link.endpoint_a.clone(),
        link.endpoint_b.clone(),
        attrs.rate.to_string(),
        attrs.queue_size.to_string(),
        format_delay(attrs.delay),
        attrs.loss.to_string(),
    ]
    .join(FIELD_SEPARATOR)
}

/// Render the complete topology file contents
pub fn render_topology(topology: &TopologyDescription) -> String {
    let mut out = String::from("router\n\n");

    for node in &topology.nodes {
        let _ = writeln!(out, "{}", node.name);
    }

    out.push_str("\nlink\n\n");

    for link in &topology.links {
        let _ = writeln!(out, "{}", render_link(link));
    }

    out
}

/// Write a topology file.
///
/// The topology is checked and fully rendered before anything touches the
/// filesystem. The file is written through a uniquely named temporary file in
/// the target directory and persisted into place; on any failure the temporary
/// file is removed, so no partial file is left behind.
pub fn write_topology_file(topology: &TopologyDescription, output_path: &Path) -> Result<()> {
    topology
        .validate()
        .wrap_err("Refusing to write an inconsistent topology")?;

    let contents = render_topology(topology);

    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_output_dir(parent)
        .wrap_err_with(|| format!("Failed to create directory '{}'", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .wrap_err_with(|| format!("Failed to create a temporary file in '{}'", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .wrap_err_with(|| format!("Failed to write topology file '{}'", tmp.path().display()))?;
    tmp.persist(output_path)
        .map_err(|e| e.error)
        .wrap_err_with(|| format!("Failed to move topology file into '{}'", output_path.display()))?;

    log::info!(
        "Topology file written to {} ({} nodes, {} links)",
        output_path.display(),
        topology.nodes.len(),
        topology.links.len()
    );
    Ok(())
}
