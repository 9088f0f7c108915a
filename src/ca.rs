use crate::error::{Error, Result};
use crate::store::{CertificateStore, StoreAccess, StoreHandle};
use crate::types::{CertificateRequest, EnrollmentContext, EnrollmentHandle};
use rcgen::{Certificate, CertificateParams, KeyPair};
use std::fs;
use std::path::Path;

pub const WEB_SERVER_TEMPLATE: &str = "WebServer";

/// The certification authority the pipeline enrolls against. Kept narrow so
/// issuance can be tested without real key generation or a real store.
pub trait CertificateAuthorityService {
    /// Starts a request against a named template. Unknown templates fail here.
    fn initialize_request(
        &self,
        template: &str,
        context: EnrollmentContext,
    ) -> Result<CertificateRequest>;

    /// Signs the request and, when a store is attached, installs the issued
    /// certificate under the request's friendly name.
    fn submit(&mut self, request: CertificateRequest) -> Result<EnrollmentHandle>;
}

enum Template {
    WebServer,
}

impl Template {
    fn parse(name: &str) -> Option<Self> {
        match name {
            WEB_SERVER_TEMPLATE => Some(Template::WebServer),
            _ => None,
        }
    }

    fn key_usages(&self) -> Vec<rcgen::KeyUsagePurpose> {
        vec![
            rcgen::KeyUsagePurpose::DigitalSignature,
            rcgen::KeyUsagePurpose::KeyEncipherment,
        ]
    }

    fn extended_key_usages(&self) -> Vec<rcgen::ExtendedKeyUsagePurpose> {
        vec![rcgen::ExtendedKeyUsagePurpose::ServerAuth]
    }

    fn validity_days(&self) -> u32 {
        365
    }
}

/// A self-signed-root certification authority backed by rcgen.
///
/// Keys are always ECDSA P-256; algorithm selection is deliberately not a
/// knob here. Enrolled certificates are installed into the attached store as
/// a side effect of [`CertificateAuthorityService::submit`], mirroring how a
/// machine CA enrolls into the machine store.
pub struct LocalCa {
    certificate: Certificate,
    cert_pem: String,
    key_pem: String,
    next_serial: u64,
    store: Option<Box<dyn CertificateStore>>,
}

impl LocalCa {
    pub fn new_root(common_name: &str, validity_days: u32) -> Result<Self> {
        let key_pair = KeyPair::generate(&rcgen::PKCS_ECDSA_P256_SHA256)?;

        let mut params = CertificateParams::new(vec![]);
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(rcgen::DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        params.key_usages = vec![
            rcgen::KeyUsagePurpose::DigitalSignature,
            rcgen::KeyUsagePurpose::KeyCertSign,
            rcgen::KeyUsagePurpose::CrlSign,
        ];

        let (not_before, not_after) = validity_window(validity_days)?;
        params.not_before = not_before;
        params.not_after = not_after;

        params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
        params.key_pair = Some(key_pair);
        params.serial_number = Some(rcgen::SerialNumber::from(1u64));

        let certificate = Certificate::from_params(params)?;
        let cert_pem = certificate.serialize_pem()?;
        let key_pem = certificate.serialize_private_key_pem();

        Ok(Self {
            certificate,
            cert_pem,
            key_pem,
            next_serial: 2,
            store: None,
        })
    }

    pub fn load_pem(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let cert_pem = fs::read_to_string(cert_path)?;
        let key_pem = fs::read_to_string(key_path)?;

        let key_pair = KeyPair::from_pem(&key_pem)?;
        let params = CertificateParams::from_ca_cert_pem(&cert_pem, key_pair)?;
        let certificate = Certificate::from_params(params)?;

        Ok(Self {
            certificate,
            cert_pem,
            key_pem,
            next_serial: 1000,
            store: None,
        })
    }

    pub fn save_pem(&self, cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<()> {
        fs::write(cert_path, &self.cert_pem)?;
        fs::write(key_path, &self.key_pem)?;
        Ok(())
    }

    /// Attaches the store that enrolled certificates are installed into.
    pub fn attach_store(&mut self, store: impl CertificateStore + 'static) {
        self.store = Some(Box::new(store));
    }

    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }
}

impl CertificateAuthorityService for LocalCa {
    fn initialize_request(
        &self,
        template: &str,
        context: EnrollmentContext,
    ) -> Result<CertificateRequest> {
        if Template::parse(template).is_none() {
            return Err(Error::UnknownTemplate(template.to_string()));
        }
        Ok(CertificateRequest::new(template, context))
    }

    fn submit(&mut self, request: CertificateRequest) -> Result<EnrollmentHandle> {
        let template = Template::parse(&request.template)
            .ok_or_else(|| Error::UnknownTemplate(request.template.clone()))?;
        let cn = request
            .subject_cn
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("certificate request has no subject".to_string()))?;
        let friendly_name = request
            .friendly_name
            .clone()
            .unwrap_or_else(|| cn.to_string());

        let key_pair = KeyPair::generate(&rcgen::PKCS_ECDSA_P256_SHA256)?;

        let mut params = CertificateParams::new(vec![]);
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(rcgen::DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.subject_alt_names = request
            .dns_sans
            .iter()
            .cloned()
            .map(rcgen::SanType::DnsName)
            .collect();
        params.is_ca = rcgen::IsCa::NoCa;
        params.key_usages = template.key_usages();
        params.extended_key_usages = template.extended_key_usages();

        let (not_before, not_after) = validity_window(template.validity_days())?;
        params.not_before = not_before;
        params.not_after = not_after;

        params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
        params.key_pair = Some(key_pair);

        let serial = self.next_serial;
        self.next_serial += 1;
        params.serial_number = Some(rcgen::SerialNumber::from(serial));

        let certificate = Certificate::from_params(params)?;
        let cert_pem = certificate.serialize_pem_with_signer(&self.certificate)?;
        let key_pem = request
            .export_private_key
            .then(|| certificate.serialize_private_key_pem());

        if let Some(store) = &self.store {
            let mut handle = store.open(StoreAccess::ReadWrite)?;
            handle.insert(&friendly_name, &cert_pem)?;
        }

        Ok(EnrollmentHandle {
            friendly_name,
            cert_pem,
            key_pem,
            chain: vec![self.cert_pem.clone()],
        })
    }
}

fn validity_window(days: u32) -> Result<(time::OffsetDateTime, time::OffsetDateTime)> {
    let not_before = chrono::Utc::now();
    let not_after = not_before + chrono::Duration::days(days as i64);
    let not_before = time::OffsetDateTime::from_unix_timestamp(not_before.timestamp())
        .map_err(|e| Error::CertGen(format!("Invalid timestamp: {}", e)))?;
    let not_after = time::OffsetDateTime::from_unix_timestamp(not_after.timestamp())
        .map_err(|e| Error::CertGen(format!("Invalid timestamp: {}", e)))?;
    Ok((not_before, not_after))
}
