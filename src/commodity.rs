//! Commodity categories and the standard tax-rate table

use crate::error::TaxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxed category of goods or services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commodity {
    Default,          // 25%
    Alcohol,          // 25%
    Food,             // 12%
    FoodServices,     // 12%
    Literature,       // 60%
    Transport,        // 60%
    CulturalServices, // 60%
}

impl Commodity {
    /// Every commodity, in declaration order
    pub const ALL: [Commodity; 7] = [
        Commodity::Default,
        Commodity::Alcohol,
        Commodity::Food,
        Commodity::FoodServices,
        Commodity::Literature,
        Commodity::Transport,
        Commodity::CulturalServices,
    ];

    /// Standard (hard-coded) tax rate, as a fraction
    pub fn standard_rate(&self) -> f64 {
        match self {
            Commodity::Default | Commodity::Alcohol => 0.25,
            Commodity::Food | Commodity::FoodServices => 0.12,
            Commodity::Literature | Commodity::Transport | Commodity::CulturalServices => 0.60,
        }
    }

    /// Map a numeric commodity code to a commodity.
    ///
    /// Codes outside the known set resolve to [`Commodity::Default`], so their
    /// standard rate is the default one.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Commodity::Alcohol,
            2 => Commodity::Food,
            3 => Commodity::FoodServices,
            4 => Commodity::Literature,
            5 => Commodity::Transport,
            6 => Commodity::CulturalServices,
            _ => Commodity::Default,
        }
    }

    /// Numeric code of this commodity
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get commodity name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Commodity::Default => "default",
            Commodity::Alcohol => "alcohol",
            Commodity::Food => "food",
            Commodity::FoodServices => "food_services",
            Commodity::Literature => "literature",
            Commodity::Transport => "transport",
            Commodity::CulturalServices => "cultural_services",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Commodity {
    type Err = TaxError;

    /// Accepts snake_case, kebab-case and CamelCase names, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "default" => Ok(Commodity::Default),
            "alcohol" => Ok(Commodity::Alcohol),
            "food" => Ok(Commodity::Food),
            "foodservices" => Ok(Commodity::FoodServices),
            "literature" => Ok(Commodity::Literature),
            "transport" => Ok(Commodity::Transport),
            "culturalservices" => Ok(Commodity::CulturalServices),
            _ => Err(TaxError::UnknownCommodity(s.to_string())),
        }
    }
}
