//! Item counters for nodes and agents

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::goods::Item;

/// Count of one item: fresh units plus a spoiled counterpart
///
/// `fresh` may dip below zero as a back-order marker (promised but not yet
/// delivered); `wasted` never does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub fresh: i32,
    pub wasted: u32,
}

impl Stock {
    /// Units physically present
    pub fn on_hand(&self) -> u32 {
        self.fresh.max(0) as u32 + self.wasted
    }

    /// Units owed to customers who bought ahead of delivery
    pub fn owed(&self) -> u32 {
        (-self.fresh).max(0) as u32
    }
}

/// Which variant a withdrawal produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taken {
    Fresh,
    Spoiled,
    BackOrder,
}

/// Per-item stock held by a cell or carried by an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: AHashMap<Item, Stock>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self, item: Item) -> Stock {
        self.items.get(&item).copied().unwrap_or_default()
    }

    /// Fresh count (negative while back-ordered)
    pub fn fresh(&self, item: Item) -> i32 {
        self.stock(item).fresh
    }

    pub fn wasted(&self, item: Item) -> u32 {
        self.stock(item).wasted
    }

    /// Add fresh units; deliveries fill back-orders first by plain addition
    pub fn add(&mut self, item: Item, amount: i32) {
        self.items.entry(item).or_default().fresh += amount;
    }

    /// Remove up to `amount` fresh units, returns amount actually removed
    pub fn remove(&mut self, item: Item, amount: i32) -> i32 {
        match self.items.get_mut(&item) {
            Some(stock) => {
                let removed = amount.min(stock.fresh).max(0);
                stock.fresh -= removed;
                removed
            }
            None => 0,
        }
    }

    /// Remove every fresh unit of an item, returns the amount removed
    pub fn take_all(&mut self, item: Item) -> i32 {
        let fresh = self.fresh(item).max(0);
        self.remove(item, fresh)
    }

    /// Turn one fresh unit into a wasted one
    pub fn spoil_one(&mut self, item: Item) -> bool {
        match self.items.get_mut(&item) {
            Some(stock) if stock.fresh > 0 => {
                stock.fresh -= 1;
                stock.wasted += 1;
                true
            }
            _ => false,
        }
    }

    pub fn add_wasted(&mut self, item: Item, amount: u32) {
        self.items.entry(item).or_default().wasted += amount;
    }

    /// Throw one spoiled unit away
    pub fn discard_wasted(&mut self, item: Item) -> bool {
        match self.items.get_mut(&item) {
            Some(stock) if stock.wasted > 0 => {
                stock.wasted -= 1;
                true
            }
            _ => false,
        }
    }

    /// Withdraw one unit for a customer: fresh first, then spoiled, then a
    /// back-order as long as the fresh count stays above `-max_back_orders`
    pub fn take_for_sale(&mut self, item: Item, max_back_orders: i32) -> Option<Taken> {
        let stock = self.items.entry(item).or_default();
        if stock.fresh > 0 {
            stock.fresh -= 1;
            Some(Taken::Fresh)
        } else if stock.wasted > 0 {
            stock.wasted -= 1;
            Some(Taken::Spoiled)
        } else if stock.fresh > -max_back_orders {
            stock.fresh -= 1;
            Some(Taken::BackOrder)
        } else {
            None
        }
    }

    /// Whether `take_for_sale` would succeed
    pub fn can_sell(&self, item: Item, max_back_orders: i32) -> bool {
        let stock = self.stock(item);
        stock.fresh > 0 || stock.wasted > 0 || stock.fresh > -max_back_orders
    }

    /// Items with any non-zero count, sorted for stable display
    pub fn entries(&self) -> Vec<(Item, Stock)> {
        let mut entries: Vec<(Item, Stock)> = self
            .items
            .iter()
            .filter(|(_, s)| s.fresh != 0 || s.wasted != 0)
            .map(|(item, stock)| (*item, *stock))
            .collect();
        entries.sort_by_key(|(item, _)| *item);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
