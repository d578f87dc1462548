//! Duplicate filtering of proposed fields against existing table fields.

use crate::fields::FieldCandidate;
use crate::similarity::{is_redundant, is_similar};

/// Which redundancy rule the filter applies.
///
/// `Ratio` uses the similarity ratio alone; `RatioOrContainment` also drops
/// candidates whose normalized name contains (or is contained in) a
/// reference name, catching abbreviation/expansion pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    Ratio,
    RatioOrContainment,
}

/// Drop candidates that duplicate any reference name under `policy`.
/// Input order is preserved among survivors.
pub fn remove_duplicates(
    candidates: Vec<FieldCandidate>,
    reference_names: &[String],
    policy: DedupPolicy,
    threshold: f64,
) -> Vec<FieldCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| match policy {
            DedupPolicy::Ratio => !reference_names
                .iter()
                .any(|reference| is_similar(&candidate.name, reference, threshold)),
            DedupPolicy::RatioOrContainment => {
                !is_redundant(&candidate.name, reference_names, threshold)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::DEFAULT_THRESHOLD;

    fn candidate(name: &str) -> FieldCandidate {
        FieldCandidate {
            name: name.to_string(),
            unit: None,
            years: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn exact_normalized_match_always_removed() {
        let refs = vec!["온실가스 배출량".to_string()];
        for policy in [DedupPolicy::Ratio, DedupPolicy::RatioOrContainment] {
            let out = remove_duplicates(
                vec![candidate("온실가스배출량"), candidate("이사회 구성")],
                &refs,
                policy,
                DEFAULT_THRESHOLD,
            );
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].name, "이사회 구성");
        }
    }

    #[test]
    fn containment_only_caught_by_augmented_policy() {
        // "근로손실재해율 (LTIFR)" contains the reference term after
        // normalization but scores below 0.8 against the longer name only
        // when padded; build a pair where the ratio alone passes.
        let refs = vec!["재해율".to_string()];
        let cands = vec![candidate("근로손실재해율 통계 항목")];

        let kept = remove_duplicates(
            cands.clone(),
            &refs,
            DedupPolicy::Ratio,
            DEFAULT_THRESHOLD,
        );
        assert_eq!(kept.len(), 1);

        let kept = remove_duplicates(
            cands,
            &refs,
            DedupPolicy::RatioOrContainment,
            DEFAULT_THRESHOLD,
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn survivor_order_preserved() {
        let refs = vec!["배출량".to_string()];
        let out = remove_duplicates(
            vec![
                candidate("용수 사용량"),
                candidate("배출량"),
                candidate("폐기물 재활용률"),
            ],
            &refs,
            DedupPolicy::Ratio,
            DEFAULT_THRESHOLD,
        );
        let names: Vec<&str> = out.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["용수 사용량", "폐기물 재활용률"]);
    }

    #[test]
    fn empty_references_keep_everything() {
        let out = remove_duplicates(
            vec![candidate("a"), candidate("b")],
            &[],
            DedupPolicy::RatioOrContainment,
            DEFAULT_THRESHOLD,
        );
        assert_eq!(out.len(), 2);
    }
}
