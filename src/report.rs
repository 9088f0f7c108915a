use std::path::Path;

/// A batch-level diagnostic. Every per-item outcome the pipeline wants the
/// user to see is one of these; the core never writes to the console itself.
#[derive(Debug)]
pub enum Event<'a> {
    /// A name appeared more than once in the raw list (reported once per value).
    DuplicateName(&'a str),
    /// A stale store entry with this friendly name was removed before re-issue.
    StoreEntryRemoved(&'a str),
    /// A stale store entry could not be removed; the name is dropped from the
    /// batch rather than risking a duplicate store entry.
    StoreEntrySkipped { name: &'a str, message: String },
    Issued(&'a str),
    IssueFailed { name: &'a str, message: String },
    Exported { name: &'a str, path: &'a Path },
    ExportFailed { name: &'a str, message: String },
}

pub trait Reporter {
    fn report(&mut self, event: Event<'_>);
}

/// Discards every event. Useful for callers that only care about the summary.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _event: Event<'_>) {}
}
