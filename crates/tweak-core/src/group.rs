//! Clustering of entries by their optional group label.

/// Split `items` into clusters keyed by `group_of`.
///
/// Ungrouped items come first, then every labelled group in the order its
/// label was first seen. An empty label counts as ungrouped. Items keep their
/// relative order inside a cluster, and empty clusters are never returned.
pub fn by_group<T>(
    items: &[T],
    group_of: impl Fn(&T) -> Option<&str>,
) -> Vec<(Option<&str>, Vec<&T>)> {
    let mut clusters: Vec<(Option<&str>, Vec<&T>)> = vec![(None, Vec::new())];
    for item in items {
        let group = group_of(item).filter(|label| !label.is_empty());
        match clusters.iter_mut().find(|(label, _)| *label == group) {
            Some((_, members)) => members.push(item),
            None => clusters.push((group, vec![item])),
        }
    }
    clusters.retain(|(_, members)| !members.is_empty());
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    type Item<'a> = (&'a str, Option<&'a str>);

    fn labels<'a>(
        clusters: &[(Option<&'a str>, Vec<&Item<'a>>)],
    ) -> Vec<(Option<&'a str>, Vec<&'a str>)> {
        clusters
            .iter()
            .map(|(label, members)| (*label, members.iter().map(|(name, _)| *name).collect()))
            .collect()
    }

    #[test]
    fn ungrouped_first_then_first_seen_order() {
        let items = [
            ("fire", Some("Weapons")),
            ("jump", None),
            ("heal", Some("Player")),
            ("reload", Some("Weapons")),
            ("crouch", None),
        ];
        let clusters = by_group(&items, |(_, group)| *group);
        assert_eq!(
            labels(&clusters),
            vec![
                (None, vec!["jump", "crouch"]),
                (Some("Weapons"), vec!["fire", "reload"]),
                (Some("Player"), vec!["heal"]),
            ]
        );
    }

    #[test]
    fn no_ungrouped_cluster_when_everything_is_grouped() {
        let items = [("fire", Some("Weapons"))];
        let clusters = by_group(&items, |(_, group)| *group);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].0, Some("Weapons"));
    }

    #[test]
    fn empty_label_joins_ungrouped() {
        let items = [("jump", None), ("fire", Some("")), ("heal", Some("Player"))];
        let clusters = by_group(&items, |(_, group)| *group);
        assert_eq!(
            labels(&clusters),
            vec![(None, vec!["jump", "fire"]), (Some("Player"), vec!["heal"])]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        let items: [(&str, Option<&str>); 0] = [];
        assert!(by_group(&items, |(_, group)| *group).is_empty());
    }
}
