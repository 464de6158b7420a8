//! Topical clusters of markets.

use std::collections::HashMap;

use super::id::MarketId;

/// A group of markets judged to be about the same topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCluster {
    id: usize,
    markets: Vec<MarketId>,
}

impl TopicCluster {
    #[must_use]
    pub fn new(id: usize, markets: Vec<MarketId>) -> Self {
        Self { id, markets }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn markets(&self) -> &[MarketId] {
        &self.markets
    }

    #[must_use]
    pub fn contains(&self, market_id: &MarketId) -> bool {
        self.markets.contains(market_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Every unordered pair of distinct members, in member order.
    pub fn pairs(&self) -> impl Iterator<Item = (&MarketId, &MarketId)> + '_ {
        self.markets.iter().enumerate().flat_map(move |(i, a)| {
            self.markets[i + 1..].iter().map(move |b| (a, b))
        })
    }
}

/// What clustering says about a pair of markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopicSignal {
    /// Both markets belong to the same cluster.
    pub same_cluster: bool,
    /// Size of the shared cluster, zero when not shared.
    pub cluster_size: usize,
}

/// Cluster membership lookup for one scan cycle.
#[derive(Debug, Clone, Default)]
pub struct ClusterIndex {
    clusters: Vec<TopicCluster>,
    membership: HashMap<MarketId, usize>,
}

impl ClusterIndex {
    #[must_use]
    pub fn new(clusters: Vec<TopicCluster>) -> Self {
        let membership = clusters
            .iter()
            .enumerate()
            .flat_map(|(idx, c)| c.markets().iter().map(move |m| (m.clone(), idx)))
            .collect();
        Self {
            clusters,
            membership,
        }
    }

    #[must_use]
    pub fn clusters(&self) -> &[TopicCluster] {
        &self.clusters
    }

    #[must_use]
    pub fn cluster_of(&self, market_id: &MarketId) -> Option<&TopicCluster> {
        self.membership
            .get(market_id)
            .and_then(|idx| self.clusters.get(*idx))
    }

    /// Topic signal for a pair. Unclustered markets never share a cluster.
    #[must_use]
    pub fn signal(&self, a: &MarketId, b: &MarketId) -> TopicSignal {
        match (self.membership.get(a), self.membership.get(b)) {
            (Some(x), Some(y)) if x == y => TopicSignal {
                same_cluster: true,
                cluster_size: self.clusters.get(*x).map_or(0, TopicCluster::len),
            },
            _ => TopicSignal::default(),
        }
    }

    /// Number of within-cluster pairs, the bound on classifier calls per scan.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.clusters
            .iter()
            .map(|c| c.len() * c.len().saturating_sub(1) / 2)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<MarketId> {
        names.iter().map(|n| MarketId::new(*n)).collect()
    }

    #[test]
    fn pairs_enumerates_unordered_pairs() {
        let c = TopicCluster::new(0, ids(&["a", "b", "c"]));
        let pairs: Vec<_> = c.pairs().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn signal_reports_shared_cluster_size() {
        let index = ClusterIndex::new(vec![
            TopicCluster::new(0, ids(&["a", "b"])),
            TopicCluster::new(1, ids(&["c", "d", "e"])),
        ]);

        let same = index.signal(&MarketId::new("c"), &MarketId::new("e"));
        assert!(same.same_cluster);
        assert_eq!(same.cluster_size, 3);

        let cross = index.signal(&MarketId::new("a"), &MarketId::new("c"));
        assert!(!cross.same_cluster);

        let unknown = index.signal(&MarketId::new("a"), &MarketId::new("zzz"));
        assert_eq!(unknown, TopicSignal::default());
    }

    #[test]
    fn pair_count_is_within_cluster_only() {
        let index = ClusterIndex::new(vec![
            TopicCluster::new(0, ids(&["a", "b"])),
            TopicCluster::new(1, ids(&["c", "d", "e"])),
        ]);
        assert_eq!(index.pair_count(), 1 + 3);
    }
}
