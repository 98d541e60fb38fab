//! Placement of compiled records.
//!
//! Records are sharded in numbered folders: `<folder_index>/<uid><extension>`.
//! The location only depends on the uid, so two assets never collide.

use std::path::{Path, PathBuf};

use lgn_asset_catalog::Uid;

/// Location of a record relative to the output root, always `/` separated.
pub fn db_path(folder_index: u32, uid: Uid, extension: &str) -> String {
    format!("{}/{}{}", folder_index, uid, extension)
}

/// Location of a record on disk.
pub fn compose(output_root: &Path, folder_index: u32, uid: Uid, extension: &str) -> PathBuf {
    output_root.join(db_path(folder_index, uid, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharded_location() {
        let uid: Uid = "6f2a7d0c-6a47-4ad5-9e0b-7e1b0f3c2d41".parse().unwrap();

        assert_eq!(
            db_path(3, uid, ".nphys"),
            "3/6f2a7d0c-6a47-4ad5-9e0b-7e1b0f3c2d41.nphys"
        );
        assert_eq!(
            compose(Path::new("out"), 3, uid, ".nphys"),
            Path::new("out")
                .join("3")
                .join("6f2a7d0c-6a47-4ad5-9e0b-7e1b0f3c2d41.nphys")
        );
    }

    #[test]
    fn deterministic() {
        let output = Path::new("build/data");
        for _ in 0..8 {
            let uid = Uid::generate();
            assert_eq!(
                compose(output, 3, uid, ".nphys"),
                compose(output, 3, uid, ".nphys")
            );
            assert_eq!(
                compose(output, 3, uid, ".nphys"),
                output.join(format!("3/{}.nphys", uid))
            );
        }
        assert_ne!(
            compose(output, 3, Uid::generate(), ".nphys"),
            compose(output, 3, Uid::generate(), ".nphys")
        );
    }
}
