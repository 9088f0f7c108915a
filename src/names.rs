use crate::report::{Event, Reporter};
use crate::types::NameBatch;
use std::collections::HashSet;

/// Parses a raw delimited list into a deduplicated [`NameBatch`].
///
/// All space characters are stripped from each token, internal ones included.
/// Empty tokens are dropped and never counted as duplicates. Exact duplicates
/// are removed case-sensitively, keeping the first occurrence; each duplicated
/// value is reported exactly once. A delimiter with no occurrences yields a
/// single-element batch containing the whole (space-stripped) input.
pub fn normalize(raw: &str, delimiter: &str, reporter: &mut dyn Reporter) -> NameBatch {
    let tokens: Vec<&str> = if delimiter.is_empty() {
        vec![raw]
    } else {
        raw.split(delimiter).collect()
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut reported: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for token in tokens {
        let token: String = token.chars().filter(|c| *c != ' ').collect();
        if token.is_empty() {
            continue;
        }
        if seen.contains(&token) {
            if reported.insert(token.clone()) {
                reporter.report(Event::DuplicateName(&token));
            }
            continue;
        }
        seen.insert(token.clone());
        names.push(token);
    }

    NameBatch::from_names(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::RecordingReporter;
    use crate::report::NullReporter;

    #[test]
    fn preserves_first_seen_order_and_reports_duplicates_once() {
        let mut reporter = RecordingReporter::default();
        let batch = normalize("b,a,b,c,b", ",", &mut reporter);

        assert_eq!(batch.names(), ["b", "a", "c"]);
        assert_eq!(reporter.duplicates(), ["b"]);
    }

    #[test]
    fn strips_all_spaces_including_internal_ones() {
        let batch = normalize("foo bar, baz", ",", &mut NullReporter);
        assert_eq!(batch.names(), ["foobar", "baz"]);
    }

    #[test]
    fn drops_empty_tokens_without_counting_them_as_duplicates() {
        let mut reporter = RecordingReporter::default();
        let batch = normalize("a,,b,,", ",", &mut reporter);

        assert_eq!(batch.names(), ["a", "b"]);
        assert!(reporter.duplicates().is_empty());
    }

    #[test]
    fn unmatched_delimiter_yields_whole_string_as_one_name() {
        let batch = normalize("example.com", ";", &mut NullReporter);
        assert_eq!(batch.names(), ["example.com"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut reporter = NullReporter;
        let once = normalize("b, a,b ,c", ",", &mut reporter);
        let again = normalize(&once.names().join(","), ",", &mut reporter);
        assert_eq!(once, again);
    }

    #[test]
    fn multi_character_delimiter() {
        let batch = normalize("a::b::c", "::", &mut NullReporter);
        assert_eq!(batch.names(), ["a", "b", "c"]);
    }
}
