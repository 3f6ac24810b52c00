use std::fmt;
use std::str::FromStr;

use crate::types::FlywheelError;

/// Networks the tool knows how to source borrowers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Local node; borrowers come from its unlocked accounts.
    Development,
    Mainnet,
    Kovan,
    Ropsten,
    Goerli,
    Rinkeby,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Development => "development",
            Network::Mainnet => "mainnet",
            Network::Kovan => "kovan",
            Network::Ropsten => "ropsten",
            Network::Goerli => "goerli",
            Network::Rinkeby => "rinkeby",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Network::Development)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = FlywheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Network::Development),
            "mainnet" => Ok(Network::Mainnet),
            "kovan" => Ok(Network::Kovan),
            "ropsten" => Ok(Network::Ropsten),
            "goerli" => Ok(Network::Goerli),
            "rinkeby" => Ok(Network::Rinkeby),
            other => Err(FlywheelError::UnknownNetwork(other.to_string())),
        }
    }
}
