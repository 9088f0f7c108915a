use crate::ca::{CertificateAuthorityService, WEB_SERVER_TEMPLATE};
use crate::error::{Error, Result};
use crate::types::{EnrollmentContext, EnrollmentHandle};

/// Drives the per-name request/enrollment sequence against the CA.
///
/// The sequence is linear: initialize from the template, set the subject,
/// attach the SAN pair (`name` and `www.name`), mark the key exportable, tag
/// the friendly name, submit. Any step failing abandons this name only; the
/// error carries the name so the diagnostic can point at the offending item.
pub struct CertificateIssuer {
    template: String,
}

impl CertificateIssuer {
    pub fn new() -> Self {
        Self::with_template(WEB_SERVER_TEMPLATE)
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn issue(
        &self,
        ca: &mut dyn CertificateAuthorityService,
        name: &str,
    ) -> Result<EnrollmentHandle> {
        let mut request = ca
            .initialize_request(&self.template, EnrollmentContext::Machine)
            .map_err(|e| Error::Issue {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        request.set_subject_cn(name);
        request.add_dns_san(name);
        request.add_dns_san(format!("www.{}", name));
        request.allow_key_export();
        request.set_friendly_name(name);

        ca.submit(request).map_err(|e| Error::Issue {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for CertificateIssuer {
    fn default() -> Self {
        Self::new()
    }
}
