//! Profile Entity
//!
//! One row per auth provider user in `profiles`. Text columns are kept as
//! stored (nullable); the completeness gate decides what is usable.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{
    acquisition_source::AcquisitionSource,
    birth_date::BirthDate,
    person_name::{FullName, ShopName},
    phone::Phone,
    promo_code::PromoCode,
    shop_type::ShopType,
    user_id::UserId,
    user_name::Username,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// ISO `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub shop_name: Option<String>,
    pub shop_type: Option<String>,
    pub source: Option<String>,
    pub promo_code: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Row created by the auth provider trigger, nothing filled in yet
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            username: None,
            full_name: None,
            phone: None,
            birth_date: None,
            shop_name: None,
            shop_type: None,
            source: None,
            promo_code: None,
            is_active: true,
            created_at: None,
        }
    }

    pub fn username(&self) -> Option<Username> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(Username::from_stored)
    }

    /// All fields the completeness gate requires are present and non-empty
    ///
    /// Whitespace-only values count as present.
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.phone,
            &self.birth_date,
            &self.shop_name,
            &self.shop_type,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// Validated profile write, one upsert keyed by `id`
///
/// `username` is only written when the stored row has none.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: UserId,
    pub username: Username,
    pub full_name: FullName,
    pub phone: Phone,
    pub birth_date: BirthDate,
    pub shop_name: ShopName,
    pub shop_type: ShopType,
    pub source: Option<AcquisitionSource>,
    pub promo_code: Option<PromoCode>,
}

impl NewProfile {
    /// Derives the username from the same inputs the owner sees in the preview
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        id: UserId,
        full_name: FullName,
        phone: Phone,
        birth_date: BirthDate,
        shop_name: ShopName,
        shop_type: ShopType,
        source: Option<AcquisitionSource>,
        promo_code: Option<PromoCode>,
    ) -> Self {
        let username = Username::derive(
            full_name.as_str(),
            shop_name.as_str(),
            &birth_date.to_iso(),
        );
        Self {
            id,
            username,
            full_name,
            phone,
            birth_date,
            shop_name,
            shop_type,
            source,
            promo_code,
        }
    }

    /// Keep the username already on record
    pub fn keep_username(mut self, existing: Option<Username>) -> Self {
        if let Some(existing) = existing {
            self.username = existing;
        }
        self
    }
}
