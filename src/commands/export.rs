// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the effective topology as JSON or Graphviz DOT

use super::Globals;
use crate::io::export_json;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Topology JSON, loadable again
    #[default]
    Json,
    /// Graphviz DOT format
    Dot,
}

impl ExportFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
        }
    }
}

/// Run the export command
pub fn run(globals: &Globals, topology: &Path, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format.extension());
    let graph = globals.effective_graph(topology)?;

    let content = match format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => export_json(&graph)?,
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            globals.output.success(&format!("Exported to {}", path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
