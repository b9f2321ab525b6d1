//! Sidebar command implementation.

use super::load_config;
use anyhow::Result;
use quartify_core::SidebarGenerator;
use std::path::Path;

/// Print the sidebar descriptor for `root`
pub fn print_sidebar(config_path: Option<&Path>, root: &Path, indent: Option<usize>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut generator = SidebarGenerator::new(&config);
    if let Some(indent) = indent {
        generator = generator.with_indent(indent);
    }

    let sidebar = generator.try_generate(root)?;
    print!("{}", sidebar);
    Ok(())
}
