// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn rotation_keeps_three_generations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("registry.json");

    for generation in 1..=4 {
        std::fs::write(&path, format!("gen{generation}")).unwrap();
        preserve_corrupt(&path);
    }

    let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("registry.bak"), "gen4");
    assert_eq!(read("registry.bak.2"), "gen3");
    assert_eq!(read("registry.bak.3"), "gen2");
    assert!(!dir.path().join("registry.bak.4").exists());
}
