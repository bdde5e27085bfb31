//! Extracts finding counts from analysis tool output.

use regex::Regex;

use crate::domain::ports::ParsedCount;

/// Parser for the two textual contracts of the analysis tool:
/// `"<N> offenses detected"` and `"<N> offenses corrected"`.
#[derive(Debug, Clone)]
pub struct CountParser {
    detected_pattern: Regex,
    corrected_pattern: Regex,
    none_detected_pattern: Regex,
}

impl Default for CountParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CountParser {
    pub fn new() -> Self {
        Self {
            detected_pattern: Regex::new(r"(?i)\b(\d+) offenses? detected")
                .expect("detected pattern is valid"),
            corrected_pattern: Regex::new(r"(?i)\b(\d+) offenses? corrected")
                .expect("corrected pattern is valid"),
            none_detected_pattern: Regex::new(r"(?i)\bno offenses detected")
                .expect("no-offenses pattern is valid"),
        }
    }

    /// Findings reported by a check pass. The last summary line wins.
    pub fn detected(&self, output: &str) -> ParsedCount {
        match last_count(&self.detected_pattern, output) {
            Some(n) => ParsedCount::Count(n),
            None if self.none_detected_pattern.is_match(output) => ParsedCount::Count(0),
            None => ParsedCount::Unparsed,
        }
    }

    /// Findings fixed by an autocorrect pass. A run that detected nothing
    /// corrected nothing.
    pub fn corrected(&self, output: &str) -> ParsedCount {
        match last_count(&self.corrected_pattern, output) {
            Some(n) => ParsedCount::Count(n),
            None if self.detected(output) == ParsedCount::Count(0) => ParsedCount::Count(0),
            None => ParsedCount::Unparsed,
        }
    }
}

fn last_count(pattern: &Regex, output: &str) -> Option<u32> {
    pattern
        .captures_iter(output)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detected_summary() {
        let parser = CountParser::new();
        let output = "Inspecting 12 files\n..C..W\n\n12 files inspected, 7 offenses detected, 5 offenses autocorrectable\n";
        assert_eq!(parser.detected(output), ParsedCount::Count(7));
        assert_eq!(parser.detected("1 file inspected, 1 offense detected"), ParsedCount::Count(1));
    }

    #[test]
    fn no_offenses_is_zero_not_unparsed() {
        let parser = CountParser::new();
        assert_eq!(
            parser.detected("3 files inspected, no offenses detected"),
            ParsedCount::Count(0)
        );
    }

    #[test]
    fn missing_summary_is_unparsed() {
        let parser = CountParser::new();
        assert_eq!(parser.detected(""), ParsedCount::Unparsed);
        assert_eq!(
            parser.detected("Error: unrecognized cop Foo/Bar"),
            ParsedCount::Unparsed
        );
    }

    #[test]
    fn parses_corrected_summary() {
        let parser = CountParser::new();
        let output = "12 files inspected, 7 offenses detected, 5 offenses corrected, 2 offenses autocorrectable";
        assert_eq!(parser.corrected(output), ParsedCount::Count(5));
        assert_eq!(parser.corrected("1 offense corrected"), ParsedCount::Count(1));
    }

    #[test]
    fn corrected_falls_back_to_zero_only_when_nothing_was_detected() {
        let parser = CountParser::new();
        assert_eq!(
            parser.corrected("4 files inspected, no offenses detected"),
            ParsedCount::Count(0)
        );
        assert_eq!(
            parser.corrected("4 files inspected, 3 offenses detected"),
            ParsedCount::Unparsed
        );
    }

    #[test]
    fn last_summary_wins() {
        let parser = CountParser::new();
        let output = "first pass: 9 offenses detected\nsecond pass: 4 offenses detected";
        assert_eq!(parser.detected(output), ParsedCount::Count(4));
    }
}
