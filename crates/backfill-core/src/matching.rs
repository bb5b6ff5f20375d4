/// Decide whether a catalog title names the same show as the query.
///
/// Exact equality wins outright. Otherwise each whitespace-separated query
/// word is tested for raw substring containment in the candidate, and the
/// hit count is measured against the candidate's word count, not the
/// query's. More than half is a match.
pub fn titles_match(query: &str, candidate: &str) -> bool {
    if query == candidate {
        return true;
    }

    let candidate_words = candidate.split_ascii_whitespace().count();
    if candidate_words == 0 {
        return false;
    }

    let hits = query
        .split_ascii_whitespace()
        .filter(|word| candidate.contains(word))
        .count();

    hits * 2 > candidate_words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(titles_match("Firefly", "Firefly"));
        assert!(titles_match("", ""));
    }

    #[test]
    fn test_ratio_over_candidate_words() {
        // 2 hits over 3 candidate words
        assert!(titles_match("The Americans", "The Americans Show"));
        // 1 hit over 5 candidate words
        assert!(!titles_match("A", "A B C D E"));
        // exactly half is not enough
        assert!(!titles_match("Lost", "Lost Girl"));
    }

    #[test]
    fn test_empty_candidate_does_not_fault() {
        assert!(!titles_match("X", ""));
        assert!(!titles_match("X", "   "));
    }

    #[test]
    fn test_containment_is_substring_based() {
        // "Who" is found inside "Whose" even though the words differ
        assert!(titles_match("Who", "Whose"));
        assert!(!titles_match("doctor who", "Doctor Who"));
    }
}
