#![forbid(unsafe_code)]

//! Smart-case search compilation.

use regex::Regex;

use crate::ranges::MatchRanges;

/// A compiled search.
///
/// - Empty string: inactive, matches nothing.
/// - Contains uppercase: case sensitive, otherwise case insensitive.
/// - Valid regex with metacharacters: regex mode. Anything else: literal
///   substring mode, where match ranges still come from a quoted-literal
///   regex so highlighting and matching share one code path.
#[derive(Debug, Clone, Default)]
pub struct Search {
    find_me: String,
    is_substring: bool,
    has_uppercase: bool,
    pattern: Option<Regex>,
}

impl PartialEq for Search {
    fn eq(&self, other: &Self) -> bool {
        self.find_me == other.find_me
    }
}

impl Search {
    /// Compile a search from what the user typed.
    #[must_use]
    pub fn new(find_me: &str) -> Self {
        let mut search = Self::default();
        search.set(find_me);
        search
    }

    /// An inactive search.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Recompile for a new search string.
    pub fn set(&mut self, find_me: &str) {
        self.find_me = find_me.to_string();
        if find_me.is_empty() {
            // No search
            self.pattern = None;
            return;
        }

        self.has_uppercase = find_me.chars().any(char::is_uppercase);

        // Smart case; be case insensitive unless there are upper case runes
        // in the search string
        let prefix = if self.has_uppercase { "" } else { "(?i)" };

        let has_special_chars = regex::escape(find_me) != find_me;
        let as_regex = Regex::new(&format!("{prefix}{find_me}")).ok();
        let regex_matching_required = has_special_chars && as_regex.is_some();
        self.is_substring = !regex_matching_required;

        if regex_matching_required {
            self.pattern = as_regex;
            return;
        }

        // Quoting a literal always yields a valid regex; anything else is a
        // programming error, not a user-input problem.
        let quoted = format!("{prefix}{}", regex::escape(find_me));
        self.pattern = Some(Regex::new(&quoted).expect("quoted literal must compile"));
    }

    /// Deactivate: matches nothing until `set()` again.
    pub fn stop(&mut self) {
        self.find_me.clear();
        self.pattern = None;
    }

    /// The search string as typed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.find_me
    }

    /// Whether there is something to search for.
    #[must_use]
    pub fn active(&self) -> bool {
        !self.find_me.is_empty()
    }

    /// The opposite of [`Search::active`].
    #[must_use]
    pub fn inactive(&self) -> bool {
        self.find_me.is_empty()
    }

    /// Check one line's plain text for a match.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        if self.find_me.is_empty() {
            return false;
        }

        if self.is_substring && self.has_uppercase {
            // Case sensitive substring search, no regex machinery needed
            return line.contains(self.find_me.as_str());
        }

        match &self.pattern {
            Some(pattern) => pattern.is_match(line),
            None => false,
        }
    }

    /// Locate all matches in a line, rune-indexed. Empty when inactive or
    /// nothing matched.
    #[must_use]
    pub fn get_match_ranges(&self, line: &str) -> MatchRanges {
        let Some(pattern) = &self.pattern else {
            return MatchRanges::default();
        };

        let byte_ranges: Vec<(usize, usize)> = pattern
            .find_iter(line)
            .map(|found| (found.start(), found.end()))
            .collect();
        if byte_ranges.is_empty() {
            return MatchRanges::default();
        }

        // Convert byte indices to rune indices. A match touching the end of
        // the string is encoded as one-past-the-last byte, so that boundary
        // needs a mapping too.
        let boundaries: Vec<usize> = line
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(line.len()))
            .collect();
        let to_rune = |byte: usize| -> usize {
            boundaries
                .binary_search(&byte)
                .unwrap_or_else(|insertion| insertion)
        };

        MatchRanges {
            matches: byte_ranges
                .into_iter()
                .map(|(from, to)| (to_rune(from), to_rune(to)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_is_inactive() {
        let search = Search::new("");
        assert!(search.inactive());
        assert!(!search.matches("anything"));
    }

    #[test]
    fn regex_matching() {
        assert!(Search::new("G.*S").matches("GRIIIS"));
        assert!(!Search::new("G.*S").matches("gRIIIS"));
    }

    #[test]
    fn case_insensitive_regex_matching() {
        assert!(Search::new("g.*s").matches("GRIIIS"));
        assert!(Search::new("g.*s").matches("gRIIIS"));
    }

    #[test]
    fn substring_matching() {
        assert!(Search::new(")G").matches(")G"));
        assert!(!Search::new(")G").matches(")g"));
    }

    #[test]
    fn case_insensitive_substring_matching() {
        assert!(Search::new(")g").matches(")G"));
        assert!(Search::new(")g").matches(")g"));
    }

    #[test]
    fn stop_deactivates() {
        let mut search = Search::new("hej");
        assert!(search.active());
        search.stop();
        assert!(search.inactive());
        assert!(!search.matches("hej"));
    }

    #[test]
    fn match_ranges_basics() {
        let ranges = Search::new("m+").get_match_ranges("mamma");
        assert_eq!(ranges.matches, vec![(0, 1), (2, 4)]);
    }

    #[test]
    fn match_ranges_inactive() {
        let ranges = Search::new("").get_match_ranges("mamma");
        assert!(ranges.is_empty());
        assert!(!ranges.in_range(0));
    }

    #[test]
    fn in_range() {
        let ranges = Search::new("m+").get_match_ranges("mamma");
        assert!(ranges.in_range(0)); // m
        assert!(!ranges.in_range(1)); // a
        assert!(ranges.in_range(2)); // m
        assert!(ranges.in_range(3)); // m
        assert!(!ranges.in_range(4)); // a
        assert!(!ranges.in_range(5)); // past the end
    }

    #[test]
    fn ranges_are_rune_indexed() {
        let ranges = Search::new("ä").get_match_ranges("-ä-ä-");
        assert_eq!(ranges.matches, vec![(1, 2), (3, 4)]);
        assert!(!ranges.in_range(0));
        assert!(ranges.in_range(1));
        assert!(!ranges.in_range(2));
        assert!(ranges.in_range(3));
        assert!(!ranges.in_range(4));
    }

    #[test]
    fn range_touching_the_end() {
        let ranges = Search::new("ä").get_match_ranges("-ä");
        assert_eq!(ranges.matches, vec![(1, 2)]);
        assert!(!ranges.in_range(2));
    }

    #[test]
    fn adjacent_matches() {
        let ranges = Search::new("n").get_match_ranges("anna");
        assert_eq!(ranges.matches, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn no_match_means_empty_ranges() {
        let ranges = Search::new("apa").get_match_ranges("gris");
        assert!(ranges.is_empty());
        for i in 0..5 {
            assert!(!ranges.in_range(i));
        }
    }

    #[test]
    fn case_sensitivity_in_ranges() {
        assert!(!Search::new("G.*S").get_match_ranges("griiis").in_range(0));
        assert!(Search::new("g.*s").get_match_ranges("GRIIIS").in_range(0));
        assert_eq!(Search::new(")G").get_match_ranges(")G").matches.len(), 1);
        assert!(Search::new(")G").get_match_ranges(")g").is_empty());
        assert_eq!(Search::new(")g").get_match_ranges(")G").matches.len(), 1);
    }

    #[test]
    fn equality_is_by_search_string() {
        assert_eq!(Search::new("a"), Search::new("a"));
        assert_ne!(Search::new("a"), Search::new("b"));
    }
}
