//! Ranking of analyzed candidates.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::application::profitability::ProfitabilityAnalyzer;
use crate::domain::{Books, Opportunity, ProfitabilityAnalysis, Usd};

/// An opportunity paired with its first-pass profitability estimate.
#[derive(Debug, Clone, Serialize)]
pub struct RankedOpportunity {
    pub opportunity: Opportunity,
    pub analysis: ProfitabilityAnalysis,
}

/// Order by estimated net profit, highest first. Rebalancing wins ties over
/// combinatorial, then the opportunity id keeps the order stable. At most
/// `limit` entries are returned.
#[must_use]
pub fn rank(mut candidates: Vec<RankedOpportunity>, limit: usize) -> Vec<RankedOpportunity> {
    candidates.sort_by(compare);
    candidates.truncate(limit);
    candidates
}

/// Analyze `candidates` at `nominal_size` against `books`, drop the
/// unprofitable ones and [`rank`] the rest.
#[must_use]
pub fn rank_profitable(
    analyzer: &ProfitabilityAnalyzer,
    candidates: Vec<Opportunity>,
    books: &Books,
    nominal_size: Usd,
    limit: usize,
) -> Vec<RankedOpportunity> {
    let profitable = candidates
        .into_iter()
        .map(|opportunity| {
            let analysis = analyzer.analyze(&opportunity, books, nominal_size);
            RankedOpportunity {
                opportunity,
                analysis,
            }
        })
        .filter(|ranked| {
            if !ranked.analysis.is_profitable {
                debug!(
                    opportunity_id = %ranked.opportunity.id(),
                    net_pct = %ranked.analysis.net_profit_pct,
                    "Not profitable"
                );
            }
            ranked.analysis.is_profitable
        })
        .collect();
    rank(profitable, limit)
}

fn compare(a: &RankedOpportunity, b: &RankedOpportunity) -> Ordering {
    b.analysis
        .net_profit
        .cmp(&a.analysis.net_profit)
        .then_with(|| a.opportunity.strategy().cmp(&b.opportunity.strategy()))
        .then_with(|| a.opportunity.id().cmp(b.opportunity.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::profitability::ProfitabilityAnalyzer;
    use crate::domain::{
        Books, Leg, Market, OrderSide, Outcome, RebalanceDirection, RelationKind, Relationship,
        StrategyKind, Venue,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn market(id: &str, yes: Decimal, no: Decimal) -> Market {
        Market::try_new(id, Venue::new("kalshi"), id, yes, no).unwrap()
    }

    fn ranked(opportunity: Opportunity) -> RankedOpportunity {
        let analysis = ProfitabilityAnalyzer::default().analyze(&opportunity, &Books::new(), dec!(100));
        RankedOpportunity {
            opportunity,
            analysis,
        }
    }

    fn rebalancing(id: &str, yes: Decimal, no: Decimal) -> RankedOpportunity {
        let m = market(id, yes, no);
        ranked(Opportunity::rebalancing(
            &m,
            yes + no - Decimal::ONE,
            RebalanceDirection::Split,
        ))
    }

    fn combinatorial(a: &str, b: &str, no_a: Decimal, no_b: Decimal) -> RankedOpportunity {
        let (ma, mb) = (
            market(a, Decimal::ONE - no_a, no_a),
            market(b, Decimal::ONE - no_b, no_b),
        );
        let rel = Relationship::new(
            ma.id().clone(),
            mb.id().clone(),
            RelationKind::MutuallyExclusive,
            0.9,
            "test",
        );
        let legs = vec![
            Leg::from_market(&ma, Outcome::No, OrderSide::Buy),
            Leg::from_market(&mb, Outcome::No, OrderSide::Buy),
        ];
        ranked(Opportunity::combinatorial(&ma, &mb, rel, dec!(0.1), legs))
    }

    #[test]
    fn orders_by_net_profit() {
        let out = rank(
            vec![
                rebalancing("small", dec!(0.48), dec!(0.48)),
                rebalancing("large", dec!(0.40), dec!(0.40)),
            ],
            10,
        );
        assert_eq!(out[0].opportunity.id().as_str(), "large");
    }

    #[test]
    fn rebalancing_wins_ties() {
        let out = rank(
            vec![
                combinatorial("a", "b", dec!(0.45), dec!(0.45)),
                rebalancing("m", dec!(0.45), dec!(0.45)),
            ],
            10,
        );
        assert_eq!(out[0].analysis.net_profit, out[1].analysis.net_profit);
        assert_eq!(out[0].opportunity.strategy(), StrategyKind::Rebalancing);
    }

    #[test]
    fn unprofitable_candidates_are_dropped() {
        let fair = market("fair", dec!(0.49), dec!(0.50));
        let cheap = market("cheap", dec!(0.40), dec!(0.40));
        let candidates = [fair, cheap]
            .iter()
            .map(|m| {
                Opportunity::rebalancing(
                    m,
                    m.yes_price() + m.no_price() - Decimal::ONE,
                    RebalanceDirection::Split,
                )
            })
            .collect();

        let out = rank_profitable(
            &ProfitabilityAnalyzer::default(),
            candidates,
            &Books::new(),
            dec!(100),
            10,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].opportunity.id().as_str(), "cheap");
    }

    #[test]
    fn caps_at_limit() {
        let candidates = (0..5)
            .map(|i| rebalancing(&format!("m{i}"), dec!(0.45), dec!(0.45)))
            .collect();
        let out = rank(candidates, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].opportunity.id().as_str(), "m0");
    }
}
