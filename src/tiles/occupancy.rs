//! Per-node-kind occupancy and tiered pricing
//!
//! Occupants of a kind are ranked in claim order. The Nth occupant's price is
//! `PricingTiers::price_for_rank(N)`. When an occupant leaves, everyone behind
//! it moves up one rank and is repriced, so ranks never have gaps.

use ahash::AHashMap;

use crate::core::config::PricingTiers;
use crate::core::types::EntityId;
use crate::tiles::cell::NodeKind;

/// Result of a successful claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRank {
    pub rank: usize,
    pub price: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OccupancyRegistry {
    tiers: PricingTiers,
    occupants: AHashMap<NodeKind, Vec<EntityId>>,
}

impl OccupancyRegistry {
    pub fn new(tiers: PricingTiers) -> Self {
        Self {
            tiers,
            occupants: AHashMap::new(),
        }
    }

    pub fn tiers(&self) -> &PricingTiers {
        &self.tiers
    }

    /// Register an occupant at the back of the kind's ranking
    ///
    /// Claiming twice returns the existing rank.
    pub fn claim(&mut self, kind: NodeKind, entity: EntityId) -> ClaimRank {
        let list = self.occupants.entry(kind).or_default();
        let rank = match list.iter().position(|e| *e == entity) {
            Some(idx) => idx + 1,
            None => {
                list.push(entity);
                list.len()
            }
        };
        ClaimRank {
            rank,
            price: self.tiers.price_for_rank(rank),
        }
    }

    /// Remove an occupant and return new prices for everyone left of that kind
    pub fn vacate(&mut self, kind: NodeKind, entity: EntityId) -> Vec<(EntityId, i64)> {
        let Some(list) = self.occupants.get_mut(&kind) else {
            return Vec::new();
        };
        list.retain(|e| *e != entity);
        list.iter()
            .enumerate()
            .map(|(idx, e)| (*e, self.tiers.price_for_rank(idx + 1)))
            .collect()
    }

    pub fn rank_of(&self, kind: NodeKind, entity: EntityId) -> Option<usize> {
        self.occupants
            .get(&kind)
            .and_then(|list| list.iter().position(|e| *e == entity))
            .map(|idx| idx + 1)
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.occupants.get(&kind).map_or(0, Vec::len)
    }

    /// Occupants in rank order
    pub fn occupants(&self, kind: NodeKind) -> &[EntityId] {
        self.occupants.get(&kind).map_or(&[], Vec::as_slice)
    }
}
