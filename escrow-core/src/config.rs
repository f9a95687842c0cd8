//! Configuration for the deal engine

use crate::types::{Address, DealTerms, TokenAmount};
use cbor_core::PieceCid;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Deal configuration
    pub deal: DealConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "escrow-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            deal: DealConfig::default(),
        }
    }
}

/// Deal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealConfig {
    /// Human-readable description of the dataset
    pub description: String,

    /// Label the published deal must carry
    pub example: String,

    /// Funding target in token units
    pub initial_investment_target: u64,

    /// Purchase price in token units
    pub purchase_price: u64,

    /// Agreed piece CID, hex of the full CID bytes
    pub piece_cid: String,

    /// Provider actor address, hex
    pub provider_actor: String,

    /// Trusted notification source address, hex
    pub notification_source: String,
}

impl Default for DealConfig {
    fn default() -> Self {
        Self {
            description: "SOME_DESCRIPTION".to_string(),
            example: "label".to_string(),
            initial_investment_target: 100,
            purchase_price: 100,
            piece_cid:
                "000181e2039220206b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
                    .to_string(),
            provider_actor: "0066".to_string(),
            notification_source: "0042".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(description) = std::env::var("DEAL_DESCRIPTION") {
            config.deal.description = description;
        }

        if let Ok(example) = std::env::var("DEAL_EXAMPLE") {
            config.deal.example = example;
        }

        if let Ok(target) = std::env::var("DEAL_INVESTMENT_TARGET") {
            config.deal.initial_investment_target = target
                .parse()
                .map_err(|e| crate::Error::Config(format!("DEAL_INVESTMENT_TARGET: {}", e)))?;
        }

        if let Ok(price) = std::env::var("DEAL_PURCHASE_PRICE") {
            config.deal.purchase_price = price
                .parse()
                .map_err(|e| crate::Error::Config(format!("DEAL_PURCHASE_PRICE: {}", e)))?;
        }

        if let Ok(cid) = std::env::var("DEAL_PIECE_CID") {
            config.deal.piece_cid = cid;
        }

        if let Ok(provider) = std::env::var("DEAL_PROVIDER_ACTOR") {
            config.deal.provider_actor = provider;
        }

        if let Ok(source) = std::env::var("DEAL_NOTIFICATION_SOURCE") {
            config.deal.notification_source = source;
        }

        Ok(config)
    }

    /// Resolve the typed deal setup: terms, provider identity, and trusted
    /// notification source
    pub fn deal_setup(&self) -> crate::Result<(DealTerms, Address, Address)> {
        let piece_cid = PieceCid::from_hex(&self.deal.piece_cid)
            .map_err(|e| crate::Error::Config(format!("piece_cid: {}", e)))?;
        let provider = Address::from_hex(&self.deal.provider_actor)?;
        let source = Address::from_hex(&self.deal.notification_source)?;

        let terms = DealTerms {
            description: self.deal.description.clone(),
            example: self.deal.example.clone(),
            initial_investment_target: TokenAmount::new(u128::from(
                self.deal.initial_investment_target,
            )),
            purchase_price: TokenAmount::new(u128::from(self.deal.purchase_price)),
            piece_cid,
            provider_actor: provider.clone(),
        };
        Ok((terms, provider, source))
    }
}
