use quorum_model::{ClassCounts, ClassSelection};

/// Choose which classes of a task are shown to a labeler.
///
/// Walks the classes in stored order. A class is taken when the classes left
/// (itself included) are just enough to fill `max_classes`, or when it still
/// needs labels (`occurrences < max_occurrences`) and there is room.
/// Exactly `min(len, max_classes)` classes are chosen, each unanswered.
pub fn ration(counts: &ClassCounts, max_classes: u32, max_occurrences: u32) -> ClassSelection {
    let total = counts.len();
    let max_classes = max_classes as usize;
    let mut selection = ClassSelection::new();

    for (index, (class, occurrences)) in counts.iter().enumerate() {
        let chosen = selection.len();
        let forced = (total - index) + chosen <= max_classes;
        let wanted = occurrences < max_occurrences && chosen < max_classes;
        if forced || wanted {
            selection.offer(class);
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u32)]) -> ClassCounts {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn names(selection: &ClassSelection) -> Vec<&str> {
        selection.names().collect()
    }

    #[test]
    fn fresh_classes_are_taken_in_order() {
        let c = counts(&[("A", 0), ("B", 0), ("C", 0), ("D", 0)]);
        let s = ration(&c, 2, 5);
        assert_eq!(names(&s), ["A", "B"]);
        assert!(s.names().all(|n| s.get(n) == Some(false)));
    }

    #[test]
    fn saturated_leading_classes_push_selection_to_the_tail() {
        let c = counts(&[("A", 5), ("B", 5), ("C", 0), ("D", 0)]);
        assert_eq!(names(&ration(&c, 2, 5)), ["C", "D"]);
    }

    #[test]
    fn forced_inclusion_overrides_saturation() {
        let c = counts(&[("A", 5), ("B", 5), ("C", 5)]);
        assert_eq!(names(&ration(&c, 2, 5)), ["B", "C"]);
    }

    #[test]
    fn fewer_classes_than_cap_takes_all() {
        let c = counts(&[("A", 9), ("B", 0), ("C", 5)]);
        assert_eq!(names(&ration(&c, 5, 5)), ["A", "B", "C"]);
    }

    #[test]
    fn zero_cap_and_empty_map() {
        let c = counts(&[("A", 0), ("B", 0)]);
        assert!(ration(&c, 0, 5).is_empty());
        assert!(ration(&ClassCounts::new(), 3, 5).is_empty());
    }

    #[test]
    fn chooses_exactly_min_of_total_and_cap() {
        let cases: &[&[(&str, u32)]] = &[
            &[("A", 0), ("B", 3), ("C", 5), ("D", 5), ("E", 1)],
            &[("A", 5), ("B", 5), ("C", 5), ("D", 5), ("E", 5)],
            &[("A", 0), ("B", 0), ("C", 0), ("D", 0), ("E", 0)],
            &[("A", 5), ("B", 0), ("C", 5), ("D", 0), ("E", 5)],
        ];
        for entries in cases {
            let c = counts(entries);
            for cap in 0..=7u32 {
                let s = ration(&c, cap, 5);
                assert_eq!(s.len(), c.len().min(cap as usize), "{entries:?} cap {cap}");
            }
        }
    }

    #[test]
    fn same_input_same_output() {
        let c = counts(&[("A", 5), ("B", 2), ("C", 0), ("D", 5), ("E", 1)]);
        assert_eq!(ration(&c, 3, 5), ration(&c, 3, 5));
        assert_eq!(names(&ration(&c, 3, 5)), ["B", "C", "E"]);
    }
}
