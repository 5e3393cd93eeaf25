//! Market data providers and the symbol universe.

mod alpaca_data;
mod polygon;
mod universe;

pub use alpaca_data::{AlpacaDataConfig, AlpacaDataProvider};
pub use polygon::{PolygonConfig, PolygonProvider};
pub use universe::{SymbolUniverse, UniverseConfig};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available market data vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataProviderKind {
    #[default]
    Polygon,
    Alpaca,
}

impl DataProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataProviderKind::Polygon => "polygon",
            DataProviderKind::Alpaca => "alpaca",
        }
    }
}

impl fmt::Display for DataProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polygon" => Ok(DataProviderKind::Polygon),
            "alpaca" => Ok(DataProviderKind::Alpaca),
            other => Err(format!("Unknown data provider: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Polygon".parse::<DataProviderKind>(), Ok(DataProviderKind::Polygon));
        assert_eq!("alpaca".parse::<DataProviderKind>(), Ok(DataProviderKind::Alpaca));
        assert!("yahoo".parse::<DataProviderKind>().is_err());
    }
}
