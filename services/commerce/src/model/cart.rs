use crate::api::web::dto::{CartDto, CartItemDto};

#[derive(Debug, Clone, PartialEq)]
pub struct CartItemModel {
    pub owner: u32,
    pub sku_id: u64,
    pub quantity: u32,
}

pub struct CartModel {
    pub owner: u32,
    pub items: Vec<CartItemModel>,
}

impl From<CartModel> for CartDto {
    fn from(value: CartModel) -> Self {
        let items = value
            .items
            .into_iter()
            .map(|m| CartItemDto {
                sku_id: m.sku_id,
                quantity: m.quantity,
            })
            .collect::<Vec<_>>();
        Self { items }
    }
}
