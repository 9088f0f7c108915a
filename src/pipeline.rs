use crate::ca::CertificateAuthorityService;
use crate::error::Result;
use crate::export::BundleExporter;
use crate::issue::CertificateIssuer;
use crate::names::normalize;
use crate::report::{Event, Reporter};
use crate::store::{reconcile, CertificateStore};

/// Counts for one batch run. `requested` is the number of names left after
/// normalization and store reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: usize,
    pub exported: usize,
    pub failed: usize,
}

/// Orchestrates one batch: normalize the raw list, reconcile it against the
/// store, then issue and export each name in order.
///
/// Names are processed strictly sequentially, one fully completed before the
/// next begins. Issue and export failures are reported per name and never
/// abort the batch; only a store open/enumerate failure escapes as `Err`.
pub struct BatchPipeline<'a> {
    ca: &'a mut dyn CertificateAuthorityService,
    store: &'a dyn CertificateStore,
    issuer: CertificateIssuer,
    exporter: BundleExporter,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(
        ca: &'a mut dyn CertificateAuthorityService,
        store: &'a dyn CertificateStore,
        issuer: CertificateIssuer,
        exporter: BundleExporter,
    ) -> Self {
        Self {
            ca,
            store,
            issuer,
            exporter,
        }
    }

    pub fn run(
        &mut self,
        raw: &str,
        delimiter: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<BatchSummary> {
        let batch = normalize(raw, delimiter, reporter);
        let batch = reconcile(batch, self.store, reporter)?;

        let mut summary = BatchSummary {
            requested: batch.len(),
            ..BatchSummary::default()
        };

        for name in batch.names() {
            match self.issuer.issue(self.ca, name) {
                Ok(handle) => {
                    reporter.report(Event::Issued(name));
                    match self.exporter.export(&handle) {
                        Ok(path) => {
                            reporter.report(Event::Exported { name, path: &path });
                            summary.exported += 1;
                        }
                        Err(err) => {
                            reporter.report(Event::ExportFailed {
                                name,
                                message: err.to_string(),
                            });
                            summary.failed += 1;
                        }
                    }
                }
                Err(err) => {
                    reporter.report(Event::IssueFailed {
                        name,
                        message: err.to_string(),
                    });
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
