// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Matrix command - best path cost between every ordered country pair

use super::Globals;
use crate::analysis::{country_matrix, Granularity};
use anyhow::Result;
use std::path::Path;

/// Print the country-pair cost matrix
pub fn run(
    globals: &Globals,
    topology: &Path,
    granularity: Option<Granularity>,
    pair_cap: Option<usize>,
) -> Result<()> {
    let graph = globals.effective_graph(topology)?;
    let granularity = granularity.unwrap_or(globals.config.analysis.granularity);
    let pair_cap = pair_cap.unwrap_or(globals.config.analysis.transit_pair_cap);
    let matrix = country_matrix(&graph, granularity, pair_cap)?;

    let out = &globals.output;
    if out.json {
        return out.json(&matrix);
    }

    let width = matrix.countries.iter().map(String::len).max().unwrap_or(0).max(4);
    print!("{:width$}", "");
    for to in &matrix.countries {
        print!(" {to:>width$}");
    }
    println!();
    for from in &matrix.countries {
        print!("{from:width$}");
        for to in &matrix.countries {
            let cell = if from == to {
                "-".to_string()
            } else {
                match (matrix.route(from, to), matrix.cost(from, to)) {
                    (_, Some(cost)) => cost.to_string(),
                    (Some(_), None) => "∞".to_string(),
                    (None, None) => "?".to_string(),
                }
            };
            print!(" {cell:>width$}");
        }
        println!();
    }
    if matrix.truncated {
        out.warning(&format!(
            "pair cap {pair_cap} reached; cells marked ? were not evaluated"
        ));
    }
    Ok(())
}
