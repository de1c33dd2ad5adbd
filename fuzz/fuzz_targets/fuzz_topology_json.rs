// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use topolens::normalize::{normalize_topology, parse_topology};
use topolens::path::{all_paths, shortest_path};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(raw) = parse_topology(json) else {
        return;
    };
    let Ok(normalized) = normalize_topology(&raw) else {
        return;
    };

    let graph = normalized.graph;
    let _ = graph.fingerprint();
    let _ = graph.stats();
    let (Some(first), Some(last)) = (graph.nodes().first(), graph.nodes().last()) else {
        return;
    };
    let _ = shortest_path(&graph, &first.id, &last.id);
    let _ = all_paths(&graph, &first.id, &last.id, 4, 16);
});
