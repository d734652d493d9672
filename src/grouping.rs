//! Individual-vs-overflow split for one sibling set.

/// Indices into the sibling slice, each list in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupingDecision {
    pub individual: Vec<usize>,
    pub overflow: Vec<usize>,
}

impl GroupingDecision {
    pub fn all_individual(count: usize) -> Self {
        Self {
            individual: (0..count).collect(),
            overflow: Vec::new(),
        }
    }

    pub fn has_overflow(&self) -> bool {
        !self.overflow.is_empty()
    }
}

/// Splits `entries` so at most `max_individual` boxes appear: `max_individual - 1`
/// individual entries plus one overflow box once the set is too wide.
///
/// Pinned entries (explicitly expanded ones) are promoted first and never
/// land in overflow, even if that exceeds the slot count. Remaining slots go
/// to the earliest unpinned entries.
pub fn group<T>(
    entries: &[T],
    max_individual: usize,
    is_pinned: impl Fn(&T) -> bool,
) -> GroupingDecision {
    group_weighted(entries, max_individual, |_| 1, is_pinned)
}

/// Like [`group`], but an entry may occupy several boxes (an expanded
/// endpoint shows one per method). Unpinned entries fill the remaining slots
/// in document order until the first one that does not fit.
pub fn group_weighted<T>(
    entries: &[T],
    max_individual: usize,
    weight: impl Fn(&T) -> usize,
    is_pinned: impl Fn(&T) -> bool,
) -> GroupingDecision {
    let limit = max_individual.max(1);
    let weights: Vec<usize> = entries.iter().map(|entry| weight(entry).max(1)).collect();
    if weights.iter().sum::<usize>() <= limit {
        return GroupingDecision::all_individual(entries.len());
    }

    let pinned: Vec<bool> = entries.iter().map(&is_pinned).collect();
    let promoted: usize = weights
        .iter()
        .zip(&pinned)
        .filter(|(_, pinned)| **pinned)
        .map(|(weight, _)| *weight)
        .sum();
    let mut free_slots = (limit - 1).saturating_sub(promoted);
    let mut filling = true;

    let mut decision = GroupingDecision::default();
    for (idx, is_pinned) in pinned.into_iter().enumerate() {
        if is_pinned {
            decision.individual.push(idx);
        } else if filling && weights[idx] <= free_slots {
            free_slots -= weights[idx];
            decision.individual.push(idx);
        } else {
            filling = false;
            decision.overflow.push(idx);
        }
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("p{idx}")).collect()
    }

    #[test]
    fn small_sets_stay_individual() {
        let entries = names(5);
        let decision = group(&entries, 5, |_| false);
        assert_eq!(decision.individual, vec![0, 1, 2, 3, 4]);
        assert!(!decision.has_overflow());
    }

    #[test]
    fn wide_sets_keep_k_minus_one_plus_overflow() {
        let entries = names(8);
        let decision = group(&entries, 5, |_| false);
        assert_eq!(decision.individual, vec![0, 1, 2, 3]);
        assert_eq!(decision.overflow, vec![4, 5, 6, 7]);
    }

    #[test]
    fn pinned_entries_are_promoted_out_of_overflow() {
        let entries = names(8);
        let decision = group(&entries, 5, |name| name == "p6");
        assert_eq!(decision.individual, vec![0, 1, 2, 6]);
        assert_eq!(decision.overflow, vec![3, 4, 5, 7]);
        assert_eq!(decision.individual.len() + 1, 5);
    }

    #[test]
    fn pinned_entries_exceeding_slots_are_all_kept() {
        let entries = names(6);
        let decision = group(&entries, 3, |name| name != "p0");
        assert_eq!(decision.individual, vec![1, 2, 3, 4, 5]);
        assert_eq!(decision.overflow, vec![0]);
    }

    #[test]
    fn weighted_entries_consume_several_slots() {
        let entries = names(5);
        let weight = |name: &String| if name == "p1" { 3 } else { 1 };
        let decision = group_weighted(&entries, 4, weight, |_| false);
        assert_eq!(decision.individual, vec![0]);
        assert_eq!(decision.overflow, vec![1, 2, 3, 4]);

        let decision = group_weighted(&entries, 7, weight, |_| false);
        assert!(!decision.has_overflow());
    }

    #[test]
    fn pinned_weight_shrinks_the_free_slots() {
        let entries = names(6);
        let decision = group_weighted(
            &entries,
            5,
            |name| if name == "p4" { 3 } else { 1 },
            |name| name == "p4",
        );
        assert_eq!(decision.individual, vec![0, 4]);
        assert_eq!(decision.overflow, vec![1, 2, 3, 5]);
    }

    #[test]
    fn zero_limit_behaves_like_one() {
        let entries = names(3);
        let decision = group(&entries, 0, |_| false);
        assert!(decision.individual.is_empty());
        assert_eq!(decision.overflow, vec![0, 1, 2]);
    }
}
