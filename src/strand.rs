//! Strand canonicalisation for double-stranded source material.
//!
//! Each read may have been sampled from either strand. Reads are oriented one
//! at a time against the already-oriented set: the orientation with more
//! accumulated overlap evidence (in both directions) wins.

use bio::alphabets::dna;

use crate::overlap::OverlapScorer;

/// Reverse complement after case normalisation (A<->T, C<->G, then reversed).
///
/// Symbols outside the DNA alphabet keep their (uppercased) value.
pub fn reverse_complement(sequence: &str) -> String {
    let upper = sequence.to_ascii_uppercase();
    let rc = dna::revcomp(upper.as_bytes());
    String::from_utf8(rc)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Outcome of orienting a read list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandResolution {
    /// Canonicalised reads, same length and order as the input.
    pub reads: Vec<String>,
    /// `true` where the read was replaced by its reverse complement.
    pub flipped: Vec<bool>,
}

impl StrandResolution {
    pub fn flipped_count(&self) -> usize {
        self.flipped.iter().filter(|&&f| f).count()
    }
}

/// Symmetric overlap evidence between `candidate` and every oriented read.
fn evidence<S>(scorer: &S, oriented: &[String], candidate: &str) -> usize
where
    S: OverlapScorer + ?Sized,
{
    oriented
        .iter()
        .map(|read| scorer.score(read, candidate) + scorer.score(candidate, read))
        .sum()
}

/// Preprocessing pass that canonicalises the strand of every read.
///
/// The first read seeds the reference orientation. A later read keeps its
/// orientation only when its evidence strictly exceeds that of its reverse
/// complement; ties flip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrandOrientationResolver;

impl StrandOrientationResolver {
    pub fn resolve<S>(&self, reads: &[String], scorer: &S) -> StrandResolution
    where
        S: OverlapScorer + ?Sized,
    {
        let mut oriented: Vec<String> = Vec::with_capacity(reads.len());
        let mut flipped = Vec::with_capacity(reads.len());

        let mut iter = reads.iter();
        if let Some(first) = iter.next() {
            oriented.push(first.clone());
            flipped.push(false);
        }

        for read in iter {
            let rc = reverse_complement(read);
            let same = evidence(scorer, &oriented, read);
            let opp = evidence(scorer, &oriented, &rc);
            log::trace!("orientation evidence for read {}: same={same} opp={opp}", oriented.len());

            if same > opp {
                oriented.push(read.clone());
                flipped.push(false);
            } else {
                oriented.push(rc);
                flipped.push(true);
            }
        }

        let resolution = StrandResolution {
            reads: oriented,
            flipped,
        };
        log::info!(
            "Strand resolution flipped {} of {} reads",
            resolution.flipped_count(),
            reads.len()
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::ExactPrefixScorer;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn reverse_complement_maps_and_reverses() {
        assert_eq!(reverse_complement("AACG"), "CGTT");
        assert_eq!(reverse_complement("acgt"), "ACGT");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn reverse_complement_is_an_involution() {
        let mut rng = StdRng::seed_from_u64(7);
        let bases = ['A', 'C', 'G', 'T'];
        for len in 0..40 {
            let seq: String = (0..len).map(|_| bases[rng.gen_range(0..4)]).collect();
            assert_eq!(reverse_complement(&reverse_complement(&seq)), seq);
        }
    }

    #[test]
    fn keeps_reads_already_on_reference_strand() {
        let reads = vec!["AACCGGTA".to_string(), "GGTATTCA".to_string()];
        let resolution = StrandOrientationResolver.resolve(&reads, &ExactPrefixScorer);
        assert_eq!(resolution.reads, reads);
        assert_eq!(resolution.flipped, vec![false, false]);
    }

    #[test]
    fn flips_reads_sampled_from_opposite_strand() {
        // Second read is the reverse complement of a read overlapping the first.
        let forward = "GGTATTCA".to_string();
        let reads = vec!["AACCGGTA".to_string(), reverse_complement(&forward)];
        let resolution = StrandOrientationResolver.resolve(&reads, &ExactPrefixScorer);
        assert_eq!(resolution.reads[1], forward);
        assert_eq!(resolution.flipped_count(), 1);
    }

    #[test]
    fn evidence_counts_reference_suffix_into_candidate_prefix() {
        // The reverse complement GGTAAAAT only overlaps the reference when it
        // follows it (GGTA), while the read as given shares one symbol with
        // the reference's tail. Counting both directions makes the flip win.
        let reads = vec!["AACCGGTA".to_string(), "ATTTTACC".to_string()];
        assert_eq!(reverse_complement(&reads[1]), "GGTAAAAT");

        let resolution = StrandOrientationResolver.resolve(&reads, &ExactPrefixScorer);
        assert_eq!(resolution.flipped, vec![false, true]);
        assert_eq!(resolution.reads[1], "GGTAAAAT");
    }

    #[test]
    fn ties_flip_the_candidate() {
        // No overlap either way: same == opp == 0.
        let reads = vec!["AAAA".to_string(), "CCCC".to_string()];
        let resolution = StrandOrientationResolver.resolve(&reads, &ExactPrefixScorer);
        assert_eq!(resolution.reads, vec!["AAAA".to_string(), "GGGG".to_string()]);
    }

    #[test]
    fn degenerate_inputs_are_returned_unchanged() {
        let empty = StrandOrientationResolver.resolve(&[], &ExactPrefixScorer);
        assert!(empty.reads.is_empty());

        let single = vec!["acgt".to_string()];
        let resolution = StrandOrientationResolver.resolve(&single, &ExactPrefixScorer);
        assert_eq!(resolution.reads, single);
        assert_eq!(resolution.flipped, vec![false]);
    }
}
