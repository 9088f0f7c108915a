use crate::error::{Error, Result};
use crate::types::EnrollmentHandle;
use std::fs;
use std::path::{Path, PathBuf};

/// Default password protecting exported bundles. A throwaway placeholder, not
/// a secret; override it with [`BundleExporter::with_password`].
pub const DEFAULT_EXPORT_PASSWORD: &str = "changeit";

/// Turns an enrollment into a password-protected PKCS#12 bundle on disk:
/// certificate, private key, and the chain root, written to
/// `<output_dir>/<name>.pfx`. An existing file of the same name is
/// overwritten.
pub struct BundleExporter {
    output_dir: PathBuf,
    password: String,
}

impl BundleExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            password: DEFAULT_EXPORT_PASSWORD.to_string(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export(&self, handle: &EnrollmentHandle) -> Result<PathBuf> {
        let name = handle.friendly_name.as_str();
        let fail = |message: String| Error::Export {
            name: name.to_string(),
            message,
        };

        let archive = self.build_archive(handle).map_err(|e| fail(e.to_string()))?;
        let path = self.output_dir.join(format!("{}.pfx", name));
        fs::write(&path, archive).map_err(|e| fail(e.to_string()))?;
        Ok(path)
    }

    fn build_archive(&self, handle: &EnrollmentHandle) -> Result<Vec<u8>> {
        let cert_der = pem_to_der(&handle.cert_pem)?;
        let key_pem = handle
            .key_pem
            .as_deref()
            .ok_or_else(|| Error::Pkcs12("private key is not exportable".to_string()))?;
        let key_der = pem_to_der(key_pem)?;

        // The chain is ordered with the root last; PKCS#12 carries one CA cert.
        let root_der = handle.chain.last().map(|p| pem_to_der(p)).transpose()?;

        let pfx = p12::PFX::new(
            &cert_der,
            &key_der,
            root_der.as_deref(),
            &self.password,
            &handle.friendly_name,
        )
        .ok_or_else(|| Error::Pkcs12("could not assemble the archive".to_string()))?;
        Ok(pfx.to_der())
    }
}

fn pem_to_der(input: &str) -> Result<Vec<u8>> {
    Ok(pem::parse(input)?.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::{CertificateAuthorityService, LocalCa, WEB_SERVER_TEMPLATE};
    use crate::types::EnrollmentContext;

    fn enroll(name: &str, exportable: bool) -> EnrollmentHandle {
        let mut ca = LocalCa::new_root("Export Test CA", 365).unwrap();
        let mut request = ca
            .initialize_request(WEB_SERVER_TEMPLATE, EnrollmentContext::Machine)
            .unwrap();
        request.set_subject_cn(name);
        request.add_dns_san(name);
        if exportable {
            request.allow_key_export();
        }
        request.set_friendly_name(name);
        ca.submit(request).unwrap()
    }

    #[test]
    fn writes_a_pfx_named_after_the_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let handle = enroll("example.com", true);

        let path = BundleExporter::new(dir.path()).export(&handle).unwrap();

        assert_eq!(path, dir.path().join("example.com.pfx"));
        assert!(!fs::read(&path).unwrap().is_empty());
    }

    #[test]
    fn overwrites_an_existing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("example.com.pfx");
        fs::write(&stale, b"stale").unwrap();

        let handle = enroll("example.com", true);
        BundleExporter::new(dir.path()).export(&handle).unwrap();

        assert_ne!(fs::read(&stale).unwrap(), b"stale");
    }

    #[test]
    fn non_exportable_key_fails_with_the_candidate_name() {
        let dir = tempfile::tempdir().unwrap();
        let handle = enroll("example.com", false);

        let err = BundleExporter::new(dir.path()).export(&handle).unwrap_err();
        assert!(matches!(err, Error::Export { name, .. } if name == "example.com"));
        assert!(!dir.path().join("example.com.pfx").exists());
    }

    #[test]
    fn garbage_certificate_pem_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let handle = EnrollmentHandle {
            friendly_name: "broken".to_string(),
            cert_pem: "not pem at all".to_string(),
            key_pem: Some("also not pem".to_string()),
            chain: Vec::new(),
        };

        assert!(BundleExporter::new(dir.path()).export(&handle).is_err());
        assert!(!dir.path().join("broken.pfx").exists());
    }
}
