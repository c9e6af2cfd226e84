use bio::alignment::pairwise::{Aligner, Scoring};
use bio::alignment::AlignmentOperation;

/// Percent identity between two sequences.
///
/// Global alignment with linear gap costs and free end gaps, so a short
/// partial repeat can sit anywhere inside a full-length member without
/// paying for the overhangs. Identity is alignment matches over the shorter
/// sequence's length.
pub fn identity_pct(x: &[u8], y: &[u8]) -> f64 {
    if x.is_empty() || y.is_empty() {
        return 0.0;
    }

    let scoring = Scoring::from_scores(0, -1, 1, -1).xclip(0).yclip(0);
    let mut aligner = Aligner::with_scoring(scoring);
    let alignment = aligner.custom(x, y);

    let matches = alignment
        .operations
        .iter()
        .filter(|&&op| op == AlignmentOperation::Match)
        .count();

    matches as f64 / x.len().min(y.len()) as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_sequences() {
        assert_relative_eq!(identity_pct(b"ACGTACGT", b"ACGTACGT"), 100.0);
    }

    #[test]
    fn prefix_of_a_longer_sequence() {
        // end gaps are free, identity is over the shorter length
        assert_relative_eq!(identity_pct(b"ACGTT", b"ACGTTGCAGCTAGCTAACGG"), 100.0);
    }

    #[test]
    fn internal_fragment_of_a_longer_sequence() {
        assert_relative_eq!(identity_pct(b"GCAGCTAG", b"ACGTTGCAGCTAGCTAACGG"), 100.0);
    }

    #[test]
    fn mismatches_lower_identity() {
        // one substitution in ten
        assert_relative_eq!(identity_pct(b"ACGTACGTAC", b"ACGTTCGTAC"), 90.0);
    }

    #[test]
    fn unrelated_sequences_score_low() {
        assert!(identity_pct(b"AAAAAAAAAA", b"CCCCCCCCCC") < 50.0);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_relative_eq!(identity_pct(b"", b"ACGT"), 0.0);
    }
}
