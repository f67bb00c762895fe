use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct SkuModel {
    pub id_: u64,
    pub product_id: u64,
    pub code: String,
    pub name: String,
    pub spec: String,
    pub active: bool,
}

/// One quantity range mapped to a unit price in minor currency unit (fen).
/// `max_qty` set to `None` means the range is unbounded above.
#[derive(Debug, Clone, PartialEq)]
pub struct SkuPriceTierModel {
    pub sku_id: u64,
    pub min_qty: u32,
    pub max_qty: Option<u32>,
    pub unit_price: u32,
}

impl SkuPriceTierModel {
    pub fn covers(&self, qty: u32) -> bool {
        qty >= self.min_qty && self.max_qty.map_or(true, |m| qty <= m)
    }
}

/// Iterate tiers in their given order, keep overwriting the chosen price on
/// every covering tier, the last covering tier wins. Tier ordering returned
/// by the repository is therefore semantically significant and repositories
/// keep it stable (ascending `min_qty`, insertion order within a tie).
pub fn select_unit_price(tiers: &[SkuPriceTierModel], qty: u32) -> Option<u32> {
    let mut chosen = None;
    for t in tiers.iter() {
        if t.covers(qty) {
            chosen = Some(t.unit_price);
        }
    }
    chosen
}

/// SKU records hydrated together with all their price tiers, loaded in one
/// batched round trip per store to avoid per-row lookups.
pub struct SkuPriceModelSet {
    pub skus: Vec<SkuModel>,
    pub tiers: Vec<SkuPriceTierModel>,
}

impl SkuPriceModelSet {
    pub fn find_sku(&self, sku_id: u64) -> Option<&SkuModel> {
        self.skus.iter().find(|s| s.id_ == sku_id)
    }

    pub fn tiers_of(&self, sku_id: u64) -> Vec<&SkuPriceTierModel> {
        self.tiers.iter().filter(|t| t.sku_id == sku_id).collect()
    }

    pub fn unit_price(&self, sku_id: u64, qty: u32) -> Option<u32> {
        let mut chosen = None;
        for t in self.tiers.iter().filter(|t| t.sku_id == sku_id) {
            if t.covers(qty) {
                chosen = Some(t.unit_price);
            }
        }
        chosen
    }
}

pub fn dedup_sku_ids(ids: impl IntoIterator<Item = u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|i| seen.insert(*i)).collect()
}
