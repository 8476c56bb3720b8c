//! Value Object Module

pub mod acquisition_source;
pub mod birth_date;
pub mod email;
pub mod oauth_provider;
pub mod otp_code;
pub mod person_name;
pub mod phone;
pub mod promo_code;
pub mod shop_type;
pub mod user_id;
pub mod user_name;
pub mod user_password;
