// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Terminal rendering shared by the commands

use crate::types::{Diagnostic, PathResult};
use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use std::io::Write;

/// Output handler: JSON documents or colored human-readable text
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print JSON instead of text
    pub json: bool,
    /// Use ANSI colors in text output
    pub color: bool,
    /// Print results and errors only
    pub quiet: bool,
}

impl Output {
    /// Create an output handler
    #[must_use]
    pub fn new(json: bool, color: bool) -> Self {
        Self {
            json,
            color,
            quiet: false,
        }
    }

    /// Drop headers, confirmations and warnings, keeping results
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Pretty-print a serializable value to stdout
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }

    /// Section header
    pub fn header(&self, text: &str) {
        if self.quiet {
            return;
        }
        println!("{}", self.paint(text, Style::new().bold().underline()));
    }

    /// `key: value` line
    pub fn field(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {} {}", self.paint(&format!("{key}:"), Style::new().dimmed()), value);
    }

    /// Success line
    pub fn success(&self, text: &str) {
        if self.quiet {
            return;
        }
        println!("{} {}", self.paint("✓", Style::new().green()), text);
    }

    /// Something the user should notice, printed to stderr
    pub fn warning(&self, text: &str) {
        if self.quiet {
            return;
        }
        eprintln!("{} {}", self.paint("!", Style::new().yellow().bold()), text);
    }

    /// Load or simulation diagnostics, printed to stderr
    pub fn diagnostics(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.warning(&diagnostic.to_string());
        }
    }

    /// One path as `a -> b -> c  (cost 12, 2 hops)`
    #[must_use]
    pub fn path_line(&self, path: &PathResult) -> String {
        let arrow = self.paint(" -> ", Style::new().dimmed());
        format!(
            "{}  {}",
            path.nodes.join(&arrow),
            self.paint(
                &format!("(cost {}, {} hops)", path.cost, path.hops),
                Style::new().cyan()
            )
        )
    }

    /// Text for a missing result
    #[must_use]
    pub fn unreachable(&self) -> String {
        self.paint("unreachable", Style::new().red())
    }
}
