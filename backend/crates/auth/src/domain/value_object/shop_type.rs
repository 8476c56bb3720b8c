//! Shop Type
//!
//! Wire values are the slugs stored in `profiles.shop_type`.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ShopType {
    #[display("oziq-ovqat")]
    #[serde(rename = "oziq-ovqat")]
    Grocery,
    #[display("kiyim")]
    #[serde(rename = "kiyim")]
    Clothing,
    #[display("texnika")]
    #[serde(rename = "texnika")]
    Electronics,
    #[display("dorixona")]
    #[serde(rename = "dorixona")]
    Pharmacy,
    #[display("qurilish")]
    #[serde(rename = "qurilish")]
    BuildingMaterials,
    #[display("kosmetika")]
    #[serde(rename = "kosmetika")]
    Cosmetics,
    #[display("bolalar")]
    #[serde(rename = "bolalar")]
    Kids,
    #[display("boshqa")]
    #[serde(rename = "boshqa")]
    Other,
}

impl ShopType {
    pub const ALL: [ShopType; 8] = [
        ShopType::Grocery,
        ShopType::Clothing,
        ShopType::Electronics,
        ShopType::Pharmacy,
        ShopType::BuildingMaterials,
        ShopType::Cosmetics,
        ShopType::Kids,
        ShopType::Other,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown shop type: {0:?}")]
pub struct UnknownShopType(pub String);

impl FromStr for ShopType {
    type Err = UnknownShopType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShopType::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| UnknownShopType(s.to_string()))
    }
}
