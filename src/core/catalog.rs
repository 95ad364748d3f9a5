//! Tracked commodities and chart ranges

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A tracked instrument. Variant order is the canonical catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Commodity {
    #[serde(rename = "CL=F")]
    CrudeOil,
    #[serde(rename = "NG=F")]
    NaturalGas,
    #[serde(rename = "GC=F")]
    Gold,
    #[serde(rename = "SI=F")]
    Silver,
}

impl Commodity {
    pub const ALL: [Commodity; 4] = [
        Commodity::CrudeOil,
        Commodity::NaturalGas,
        Commodity::Gold,
        Commodity::Silver,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "CL=F",
            Commodity::NaturalGas => "NG=F",
            Commodity::Gold => "GC=F",
            Commodity::Silver => "SI=F",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "Crude Oil",
            Commodity::NaturalGas => "Natural Gas",
            Commodity::Gold => "Gold",
            Commodity::Silver => "Silver",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "USD/bbl",
            Commodity::NaturalGas => "USD/MMBtu",
            Commodity::Gold | Commodity::Silver => "USD/oz",
        }
    }

    /// Short key accepted on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "oil",
            Commodity::NaturalGas => "gas",
            Commodity::Gold => "gold",
            Commodity::Silver => "silver",
        }
    }

    /// Position in the canonical catalog order.
    pub fn catalog_index(&self) -> usize {
        *self as usize
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.symbol() == symbol)
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Commodity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.symbol().eq_ignore_ascii_case(wanted)
                    || c.key().eq_ignore_ascii_case(wanted)
                    || c.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| anyhow!("Unknown commodity: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ChartRange {
    OneDay,
    OneWeek,
    OneMonth,
    SixMonths,
    OneYear,
    FiveYears,
}

impl Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChartRange::OneDay => "1D",
                ChartRange::OneWeek => "1W",
                ChartRange::OneMonth => "1M",
                ChartRange::SixMonths => "6M",
                ChartRange::OneYear => "1Y",
                ChartRange::FiveYears => "5Y",
            }
        )
    }
}

impl ChartRange {
    pub const ALL: [ChartRange; 6] = [
        ChartRange::OneDay,
        ChartRange::OneWeek,
        ChartRange::OneMonth,
        ChartRange::SixMonths,
        ChartRange::OneYear,
        ChartRange::FiveYears,
    ];

    /// Opaque `range` token handed to the data source.
    pub fn query_range(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1d",
            ChartRange::OneWeek => "5d",
            ChartRange::OneMonth => "1mo",
            ChartRange::SixMonths => "6mo",
            ChartRange::OneYear => "1y",
            ChartRange::FiveYears => "5y",
        }
    }

    /// Opaque `interval` token handed to the data source.
    pub fn query_interval(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "5m",
            ChartRange::OneWeek => "30m",
            ChartRange::OneMonth | ChartRange::SixMonths => "1d",
            ChartRange::OneYear => "1wk",
            ChartRange::FiveYears => "1mo",
        }
    }
}

impl FromStr for ChartRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(ChartRange::OneDay),
            "1W" | "5D" => Ok(ChartRange::OneWeek),
            "1M" => Ok(ChartRange::OneMonth),
            "6M" => Ok(ChartRange::SixMonths),
            "1Y" => Ok(ChartRange::OneYear),
            "5Y" => Ok(ChartRange::FiveYears),
            _ => Err(anyhow!("Invalid chart range: {}", s)),
        }
    }
}
