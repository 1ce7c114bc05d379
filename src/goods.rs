//! Items that sit in inventories and the goods/services roles trade in

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A stackable item carried by agents or stored on nodes
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    #[display(fmt = "fish")]
    Fish,
    #[display(fmt = "potato")]
    Potato,
    #[display(fmt = "carrot")]
    Carrot,
    #[display(fmt = "cabbage")]
    Cabbage,
    #[display(fmt = "meal")]
    Meal,
}

impl Item {
    pub const ALL: [Item; 5] = [Item::Fish, Item::Potato, Item::Carrot, Item::Cabbage, Item::Meal];

    /// Perishable items spoil while they sit on a register
    pub fn is_perishable(&self) -> bool {
        matches!(self, Item::Fish | Item::Meal)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.to_string() == name)
    }
}

/// Crop grown on a plot; fixed when the farmer claims it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Potato,
    Carrot,
    Cabbage,
}

impl Crop {
    pub fn item(&self) -> Item {
        match self {
            Crop::Potato => Item::Potato,
            Crop::Carrot => Item::Carrot,
            Crop::Cabbage => Item::Cabbage,
        }
    }
}

/// What a producer supplies; the dispatch key of the role registry
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Good {
    Fish,
    Produce,
    Meal,
    Restock,
    Delivery,
    Construction,
}

/// Ingredients a chef assembles into one meal
pub const MEAL_RECIPE: [Item; 2] = [Item::Fish, Item::Potato];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_names_round_trip() {
        for item in Item::ALL {
            assert_eq!(Item::from_name(&item.to_string()), Some(item));
        }
        assert_eq!(Item::from_name("caviar"), None);
    }

    #[test]
    fn test_perishables() {
        assert!(Item::Fish.is_perishable());
        assert!(Item::Meal.is_perishable());
        assert!(!Item::Potato.is_perishable());
    }
}
