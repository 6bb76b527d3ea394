//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use spdpac_formats::test_utils::ContainerBuilder;

/// Deterministic pseudo-random bytes
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    use rand::{RngExt, SeedableRng};

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

/// Write container bytes to a file inside `dir`
pub fn write_container(dir: &Path, data: &[u8]) -> PathBuf {
    let path = dir.join("firmware.pac");
    std::fs::write(&path, data).expect("write container");
    path
}
