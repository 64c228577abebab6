//! Item definition schema

use glimmer_core::{Currency, DefId};
use serde::{Deserialize, Serialize};

use crate::schema::achievement::Rarity;

/// Price of an item in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCost {
    /// Which currency the item is priced in
    pub currency: Currency,
    /// Price
    pub amount: u64,
}

/// Definition of an inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique identifier
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Store price; None means the item is reward-only
    #[serde(default)]
    pub cost: Option<ItemCost>,
    /// Whether the item may appear in trades
    #[serde(default = "default_tradeable")]
    pub tradeable: bool,
    /// Rarity tier
    #[serde(default)]
    pub rarity: Rarity,
}

fn default_tradeable() -> bool {
    true
}

impl ItemDef {
    /// Create a minimal definition (tests and fixtures)
    pub fn new(id: impl Into<DefId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            cost: None,
            tradeable: true,
            rarity: Rarity::Common,
        }
    }

    /// Set the store price
    pub fn priced(mut self, currency: Currency, amount: u64) -> Self {
        self.cost = Some(ItemCost { currency, amount });
        self
    }
}

/// A collection of item definitions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemDefs {
    pub items: Vec<ItemDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_def_ron() {
        let ron_str = r#"
        (
            id: "avatar_frame_neon",
            name: "Neon Avatar Frame",
            cost: Some((currency: sparkle, amount: 500)),
            rarity: uncommon,
        )
        "#;

        let def: ItemDef = ron::from_str(ron_str).unwrap();
        assert_eq!(def.id.as_str(), "avatar_frame_neon");
        assert_eq!(
            def.cost,
            Some(ItemCost {
                currency: Currency::Sparkle,
                amount: 500
            })
        );
        assert!(def.tradeable);
    }
}
