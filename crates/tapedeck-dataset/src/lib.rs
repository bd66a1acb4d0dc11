//! On-disk recording loader for tapedeck.
//!
//! A recording directory looks like this:
//!
//! ```text
//! <root>/sensor_data/data_stamp.csv      stamp,tag         (required)
//! <root>/sensor_data/gps.csv             stamp + 12 values
//! <root>/sensor_data/xsens_imu.csv       stamp + 7 or 16 values
//! <root>/sensor_data/stop_region.csv     start,end         (optional)
//! <root>/sensor_data/Ouster/<stamp>.bin  f32 x,y,z,intensity records
//! <root>/sensor_data/radar/polar/<stamp>.png
//! ```
//!
//! [`Dataset::load`] parses the stamp index and the lightweight sensors up
//! front and lists the heavy-sensor directories. Lidar and radar files
//! are decoded on demand through a [`DirectoryResolver`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod decode;
pub mod error;
pub mod layout;
pub mod loader;
pub mod records;
pub mod resolver;

pub use decode::{decode_point_cloud, decode_polar_image, POINT_STRIDE};
pub use error::DatasetError;
pub use layout::Layout;
pub use loader::{Dataset, LoadReport};
pub use resolver::DirectoryResolver;

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    /// A scratch directory removed on drop.
    pub struct TempDir(PathBuf);

    impl TempDir {
        pub fn new(label: &str) -> Self {
            let n = NEXT.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "tapedeck-{label}-{}-{n}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        pub fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
