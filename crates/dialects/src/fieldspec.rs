//! Field identifiers for WHM v1 sort and filter parameters.

const LETTERS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Encodes a position so that WHM sorts identifiers in position order:
/// one `z` per full 26, then the letter for the remainder
/// (`0 → "a"`, `25 → "z"`, `26 → "za"`, `52 → "zza"`).
#[must_use]
pub fn fieldspec(position: usize) -> String {
    let mut spec = "z".repeat(position / 26);
    spec.push(char::from(LETTERS[position % 26]));
    spec
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, std::collections::HashSet};

    #[rstest]
    #[case(0, "a")]
    #[case(1, "b")]
    #[case(25, "z")]
    #[case(26, "za")]
    #[case(27, "zb")]
    #[case(51, "zz")]
    #[case(52, "zza")]
    fn known_positions(#[case] position: usize, #[case] expected: &str) {
        assert_eq!(fieldspec(position), expected);
    }

    #[test]
    fn monotonic_and_unique() {
        let specs: Vec<String> = (0..=1000).map(fieldspec).collect();
        assert!(specs.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(specs.iter().collect::<HashSet<_>>().len(), specs.len());
    }
}
