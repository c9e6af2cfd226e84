use std::collections::BTreeMap;

use crate::libs::error::ScanError;

/// Accession -> full sequence, loaded from the genome FASTA.
///
/// All coordinates are 1-based and inclusive. Slices are clipped to the
/// sequence, so callers can ask for flanks hanging over either end.
#[derive(Debug, Default)]
pub struct SeqMap(BTreeMap<String, String>);

impl SeqMap {
    pub fn from_fasta(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile);
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut seqs = BTreeMap::new();
        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            let seq = String::from_utf8(record.sequence().as_ref().to_vec())?;
            seqs.insert(name, seq);
        }

        Ok(Self(seqs))
    }

    pub fn from_map(seqs: BTreeMap<String, String>) -> Self {
        Self(seqs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extract `[start, end]` from an accession, clipped to `[1, seq_len]`.
    /// An inverted range after clipping yields the empty string.
    pub fn subseq(&self, acc: &str, start: i32, end: i32) -> crate::libs::error::Result<String> {
        let seq = self
            .0
            .get(acc)
            .ok_or_else(|| ScanError::UnknownAccession(acc.to_string()))?;

        let start = start.max(1) as usize;
        let end = (end.max(0) as usize).min(seq.len());
        if start > end {
            return Ok(String::new());
        }

        Ok(seq[start - 1..end].to_string())
    }

    /// Flanking sequences of up to `flank` bases immediately outside
    /// `[start, end]`, clipped at the contig boundaries.
    pub fn flanks(
        &self,
        acc: &str,
        (start, end): (i32, i32),
        flank: i32,
    ) -> crate::libs::error::Result<(String, String)> {
        let left = self.subseq(acc, start - flank, start - 1)?;
        let right = self.subseq(acc, end + 1, end + flank)?;
        Ok((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs() -> SeqMap {
        let mut map = BTreeMap::new();
        //                              1234567890123456789012345
        map.insert("ctg".to_string(), "ACGTACGTACGTACGTACGTACGTA".to_string());
        SeqMap(map)
    }

    #[test]
    fn subseq_is_one_based_inclusive() {
        let seqs = seqs();
        assert_eq!(seqs.subseq("ctg", 1, 4).unwrap(), "ACGT");
        assert_eq!(seqs.subseq("ctg", 5, 8).unwrap(), "ACGT");
        assert_eq!(seqs.subseq("ctg", 25, 25).unwrap(), "A");
    }

    #[test]
    fn subseq_clips_to_the_contig() {
        let seqs = seqs();
        assert_eq!(seqs.subseq("ctg", -3, 2).unwrap(), "AC");
        assert_eq!(seqs.subseq("ctg", 23, 40).unwrap(), "GTA");
        assert_eq!(seqs.subseq("ctg", 10, 5).unwrap(), "");
    }

    #[test]
    fn subseq_rejects_unknown_accession() {
        let err = seqs().subseq("nope", 1, 4).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn flanks_clip_at_both_ends() {
        let seqs = seqs();
        let (left, right) = seqs.flanks("ctg", (5, 20), 10).unwrap();
        assert_eq!(left, "ACGT");
        assert_eq!(right, "ACGTA");

        let (left, right) = seqs.flanks("ctg", (1, 25), 10).unwrap();
        assert_eq!(left, "");
        assert_eq!(right, "");
    }
}
