use {
    super::id::{CreatorId, GameId},
    super::money::MoneyAmount,
};

/// A purchasable experience, published externally. Read-only here; the
/// price is the floor a purchase amount is validated against.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub game_id: GameId,
    pub creator_id: CreatorId,
    pub price: MoneyAmount,
    pub config: serde_json::Value,
}
