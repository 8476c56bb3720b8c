//! Where the owner heard about the product

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionSource {
    #[display("trening")]
    Trening,
    #[display("biznesmen")]
    Biznesmen,
    #[display("youtube")]
    Youtube,
    #[display("instagram")]
    Instagram,
    #[display("telegram")]
    Telegram,
    #[display("google")]
    Google,
    /// Friend or acquaintance
    #[display("dost")]
    Dost,
}

impl AcquisitionSource {
    pub const ALL: [AcquisitionSource; 7] = [
        AcquisitionSource::Trening,
        AcquisitionSource::Biznesmen,
        AcquisitionSource::Youtube,
        AcquisitionSource::Instagram,
        AcquisitionSource::Telegram,
        AcquisitionSource::Google,
        AcquisitionSource::Dost,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown source: {0:?}")]
pub struct UnknownSource(pub String);

impl FromStr for AcquisitionSource {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AcquisitionSource::ALL
            .into_iter()
            .find(|src| src.to_string() == s)
            .ok_or_else(|| UnknownSource(s.to_string()))
    }
}
