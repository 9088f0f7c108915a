//! certbatch - batch TLS certificate issuance and PFX export
//!
//! This library takes a raw delimited list of common names, deduplicates it
//! against itself and against a local certificate store, then issues one
//! certificate per name from a self-signed-root certification authority and
//! exports each as a password-protected PKCS#12 bundle:
//!
//! - Parsing and deduplicating delimited name lists
//! - Clearing stale same-named entries from the certificate store before
//!   re-issuing, so friendly names stay unique by convention
//! - Per-name request/enrollment with `CN=<name>` plus the `<name>` /
//!   `www.<name>` SAN pair
//! - Password-protected PFX export (certificate + private key + chain)
//! - Per-name failure isolation: one bad name never aborts the batch
//!
//! # Examples
//!
//! ## Running a batch
//!
//! ```no_run
//! use certbatch::{
//!     BatchPipeline, BundleExporter, CertificateIssuer, FileStore, LocalCa, NullReporter,
//! };
//!
//! let mut ca = LocalCa::new_root("Issuing CA", 3650).unwrap();
//! let store = FileStore::new("certstore");
//! ca.attach_store(store.clone());
//!
//! let mut pipeline = BatchPipeline::new(
//!     &mut ca,
//!     &store,
//!     CertificateIssuer::new(),
//!     BundleExporter::new("bundles").with_password("s3cret"),
//! );
//!
//! let summary = pipeline
//!     .run("example.com; example.org", ";", &mut NullReporter)
//!     .unwrap();
//! println!("exported {} bundle(s)", summary.exported);
//! ```
//!
//! ## Issuing a single name by hand
//!
//! ```no_run
//! use certbatch::{BundleExporter, CertificateIssuer, LocalCa};
//!
//! let mut ca = LocalCa::new_root("Issuing CA", 3650).unwrap();
//! let handle = CertificateIssuer::new().issue(&mut ca, "example.com").unwrap();
//! BundleExporter::new(".").export(&handle).unwrap();
//! ```

pub mod ca;
pub mod error;
pub mod export;
pub mod issue;
pub mod names;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

pub use ca::{CertificateAuthorityService, LocalCa, WEB_SERVER_TEMPLATE};
pub use export::{BundleExporter, DEFAULT_EXPORT_PASSWORD};
pub use issue::CertificateIssuer;
pub use names::normalize;
pub use pipeline::{BatchPipeline, BatchSummary};
pub use report::{Event, NullReporter, Reporter};
pub use store::{
    reconcile, CertificateStore, FileStore, StoreAccess, StoreEntry, StoreHandle,
};
pub use types::{CertificateRequest, EnrollmentContext, EnrollmentHandle, NameBatch};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::{Recorded, RecordingReporter};
    use std::fs;

    #[test]
    fn batch_issues_exports_and_installs_store_entries() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bundles");
        fs::create_dir_all(&out).unwrap();

        let store = FileStore::new(dir.path().join("store"));
        let mut ca = LocalCa::new_root("End To End CA", 365).unwrap();
        ca.attach_store(store.clone());

        let mut reporter = RecordingReporter::default();
        let summary = BatchPipeline::new(
            &mut ca,
            &store,
            CertificateIssuer::new(),
            BundleExporter::new(&out),
        )
        .run("alpha.test, beta.test ,alpha.test", ",", &mut reporter)
        .unwrap();

        assert_eq!(summary.requested, 2);
        assert_eq!(summary.exported, 2);
        assert_eq!(summary.failed, 0);
        assert!(out.join("alpha.test.pfx").exists());
        assert!(out.join("beta.test.pfx").exists());
        assert_eq!(reporter.duplicates(), ["alpha.test"]);

        let mut handle = store.open(StoreAccess::ReadOnly).unwrap();
        let mut installed: Vec<String> = handle
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.friendly_name)
            .collect();
        installed.sort();
        assert_eq!(installed, ["alpha.test", "beta.test"]);
    }

    #[test]
    fn reissuing_the_same_batch_leaves_one_store_entry_per_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bundles");
        fs::create_dir_all(&out).unwrap();

        let store = FileStore::new(dir.path().join("store"));
        let mut ca = LocalCa::new_root("End To End CA", 365).unwrap();
        ca.attach_store(store.clone());

        for _ in 0..2 {
            let mut reporter = RecordingReporter::default();
            BatchPipeline::new(
                &mut ca,
                &store,
                CertificateIssuer::new(),
                BundleExporter::new(&out),
            )
            .run("alpha.test", ",", &mut reporter)
            .unwrap();
        }

        let mut handle = store.open(StoreAccess::ReadOnly).unwrap();
        assert_eq!(handle.entries().unwrap().len(), 1);
    }

    #[test]
    fn second_run_reports_the_removed_stale_entry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bundles");
        fs::create_dir_all(&out).unwrap();

        let store = FileStore::new(dir.path().join("store"));
        let mut ca = LocalCa::new_root("End To End CA", 365).unwrap();
        ca.attach_store(store.clone());

        let mut first = RecordingReporter::default();
        BatchPipeline::new(
            &mut ca,
            &store,
            CertificateIssuer::new(),
            BundleExporter::new(&out),
        )
        .run("alpha.test", ",", &mut first)
        .unwrap();
        assert!(!first
            .events
            .contains(&Recorded::Removed("alpha.test".to_string())));

        let mut second = RecordingReporter::default();
        BatchPipeline::new(
            &mut ca,
            &store,
            CertificateIssuer::new(),
            BundleExporter::new(&out),
        )
        .run("alpha.test", ",", &mut second)
        .unwrap();
        assert!(second
            .events
            .contains(&Recorded::Removed("alpha.test".to_string())));
    }
}
