//! "Did you mean" suggestions for misspelled names.

/// Largest edit distance still offered as a suggestion.
const MAX_DISTANCE: usize = 3;

/// Returns the candidate closest to `input`.
///
/// Uses Damerau-Levenshtein distance; candidates more than three edits away
/// are never suggested. Ties go to the earliest candidate.
#[must_use]
pub fn closest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter(|c| *c != input)
        .map(|c| (c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= MAX_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_match() {
        let names = ["temperature", "salinity", "pressure"];
        assert_eq!(closest("temprature", names), Some("temperature"));
        assert_eq!(closest("salinty", names), Some("salinity"));
    }

    #[test]
    fn test_nothing_close() {
        assert_eq!(closest("chlorophyll", ["temperature", "salinity"]), None);
        assert_eq!(closest("x", std::iter::empty()), None);
    }

    #[test]
    fn test_transposition_counts_once() {
        assert_eq!(closest("pH_qartod_spkie_test", ["pH_qartod_spike_test"]), Some("pH_qartod_spike_test"));
    }
}
