//! Topology description schema
//!
//! A *topology* describes the hardware tree a debug backend exposes: which
//! chips, chiplets and execution threads exist, how they nest, and which
//! addressing properties each unit carries. One topology is shipped per
//! backend/board-variant pair and compiled into the `power-probe` binary as a
//! bincode image at build time.
//!
//! This crate contains the schema structs for the YAML topology description
//! files.
#![warn(missing_docs)]

mod node;
mod topology;

pub use node::{NodeDescription, PropertyDescription, PropertyValue};
pub use topology::{BackendKind, Topology, UnknownBackend};

#[cfg(feature = "bincode")]
mod compile {
    use std::fs::{read_dir, read_to_string};
    use std::io;
    use std::path::{Path, PathBuf};

    use crate::Topology;

    /// Process topology yamls at the given source paths, and produce a
    /// bincode-encoded file at the destination path.
    pub fn process_topologies(source_paths: &[PathBuf], dest_path: &Path) {
        let mut topologies = Vec::new();
        let mut process_topology_yaml = |file: &Path| {
            let string = read_to_string(file).unwrap_or_else(|error| {
                panic!(
                    "Failed to read topology file {} because:\n{error}",
                    file.display()
                )
            });

            match serde_yaml::from_str::<Topology>(&string) {
                Ok(topology) => topologies.push(topology),
                Err(error) => panic!(
                    "Failed to parse topology file: {} because:\n{error}",
                    file.display()
                ),
            }
        };

        for path in source_paths {
            visit_dirs(path, &mut process_topology_yaml).unwrap();
        }

        // Declaration order inside a file is load-bearing; order between
        // files is made deterministic by sorting on the topology name.
        topologies.sort_by(|a, b| a.name.cmp(&b.name));

        let image = bincode::serialize(&topologies)
            .expect("Failed to serialize topologies as bincode");

        std::fs::write(dest_path, &image).unwrap();

        // Check if we can deserialize the bincode again, otherwise the binary
        // will not be usable.
        if let Err(deserialize_error) = bincode::deserialize::<Vec<Topology>>(&image) {
            panic!(
                "Failed to deserialize compiled topology image from bincode: {deserialize_error:?}"
            );
        }
    }

    /// Call `process` on all files in a directory and its subdirectories.
    fn visit_dirs(dir: impl AsRef<Path>, process: &mut impl FnMut(&Path)) -> io::Result<()> {
        fn visit_dirs_impl(dir: &Path, process: &mut impl FnMut(&Path)) -> io::Result<()> {
            let mut entries = read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
            entries.sort_by_key(|entry| entry.path());

            for entry in entries {
                let path = entry.path();
                if path.is_dir() {
                    visit_dirs_impl(&path, process)?;
                } else {
                    process(&path);
                }
            }

            Ok(())
        }

        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(());
        }

        visit_dirs_impl(dir, process)
    }
}

#[cfg(feature = "bincode")]
pub use compile::process_topologies;
