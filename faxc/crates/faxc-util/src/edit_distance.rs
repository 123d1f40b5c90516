//! Levenshtein edit distance, used to power "did you mean" suggestions
//! when a name fails to resolve.

/// Computes the Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut row: Vec<usize> = (0..=n).collect();
    for i in 1..=m {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let tmp = row[j];
            row[j] = (row[j] + 1).min(row[j - 1] + 1).min(prev_diag + cost);
            prev_diag = tmp;
        }
    }
    row[n]
}

/// Finds the closest candidate to `name` within `max_distance`, picking the
/// smallest-distance, lexicographically-first match among ties.
pub fn find_closest<'a, I>(name: &str, candidates: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|c| (edit_distance(name, c), c))
        .filter(|(d, _)| *d <= max_distance)
        .min_by(|(d1, c1), (d2, c2)| d1.cmp(d2).then_with(|| c1.cmp(c2)))
        .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(edit_distance("hello", "hello"), 0);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(edit_distance("cat", "bat"), 1);
    }

    #[test]
    fn insertion_and_deletion() {
        assert_eq!(edit_distance("ab", "a"), 1);
        assert_eq!(edit_distance("a", "ab"), 1);
    }

    #[test]
    fn finds_closest_within_threshold() {
        let candidates = vec!["length", "lenght", "width"];
        assert_eq!(find_closest("lenght", candidates, 3), Some("lenght"));
    }

    #[test]
    fn finds_closest_misspelling() {
        let candidates = vec!["String", "Strnig", "Int"];
        assert_eq!(find_closest("Strign", candidates, 3), Some("Strnig"));
    }

    #[test]
    fn no_match_outside_threshold() {
        let candidates = vec!["completely", "different"];
        assert_eq!(find_closest("xyz", candidates, 3), None);
    }
}
