//! Compiles the YAML topology descriptions under `topologies/` into a single
//! bincode image that gets embedded into the library.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    // Only rerun build.rs if something inside topologies/ has changed. (By
    // default cargo reruns build.rs if any file under the crate root has
    // changed.)
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=topologies");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("topologies.bincode");

    power_probe_topology::process_topologies(&[PathBuf::from("topologies")], &dest_path);
}
