/// An ordered, deduplicated list of candidate common names for one batch run.
///
/// First-seen order is preserved; equality is case-sensitive. A batch is
/// created fresh per run and discarded once the run completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameBatch {
    names: Vec<String>,
}

impl NameBatch {
    pub(crate) fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Removes every occurrence of `name` from the batch.
    pub(crate) fn exclude(&mut self, name: &str) {
        self.names.retain(|n| n != name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentContext {
    Machine,
    User,
}

/// A pending certificate request, built up step by step by the issuer and
/// consumed by [`crate::ca::CertificateAuthorityService::submit`].
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub template: String,
    pub context: EnrollmentContext,
    pub subject_cn: Option<String>,
    pub dns_sans: Vec<String>,
    pub export_private_key: bool,
    pub friendly_name: Option<String>,
}

impl CertificateRequest {
    pub fn new(template: impl Into<String>, context: EnrollmentContext) -> Self {
        Self {
            template: template.into(),
            context,
            subject_cn: None,
            dns_sans: Vec::new(),
            export_private_key: false,
            friendly_name: None,
        }
    }

    pub fn set_subject_cn(&mut self, cn: impl Into<String>) {
        self.subject_cn = Some(cn.into());
    }

    pub fn add_dns_san(&mut self, dns: impl Into<String>) {
        self.dns_sans.push(dns.into());
    }

    /// Marks the generated private key as exportable. Without this the
    /// resulting enrollment carries no key and bundle export fails.
    pub fn allow_key_export(&mut self) {
        self.export_private_key = true;
    }

    pub fn set_friendly_name(&mut self, name: impl Into<String>) {
        self.friendly_name = Some(name.into());
    }
}

/// The outcome of a successful enrollment: the signed certificate, the
/// private key (only if the request allowed export), and the issuing chain
/// ordered leaf-most first with the root last.
#[derive(Debug, Clone)]
pub struct EnrollmentHandle {
    pub friendly_name: String,
    pub cert_pem: String,
    pub key_pem: Option<String>,
    pub chain: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_removes_all_occurrences() {
        let mut batch =
            NameBatch::from_names(vec!["a".into(), "b".into(), "a".into(), "c".into()]);
        batch.exclude("a");
        assert_eq!(batch.names(), ["b", "c"]);
    }

    #[test]
    fn request_builder_steps() {
        let mut request = CertificateRequest::new("WebServer", EnrollmentContext::Machine);
        request.set_subject_cn("example.com");
        request.add_dns_san("example.com");
        request.allow_key_export();
        request.set_friendly_name("example.com");

        assert_eq!(request.subject_cn.as_deref(), Some("example.com"));
        assert!(request.export_private_key);
        assert_eq!(request.friendly_name.as_deref(), Some("example.com"));
    }
}
