//! Static chain registry: chain ids, LayerZero endpoint ids, Stargate pools,
//! token addresses, RPC endpoints and explorers.

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::{error::BridgeError, token::TokenKind};

const BUILTIN: &str = include_str!("../registry/stargate.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ChainDescriptor {
    pub name: String,
    pub chain_id: u64,
    /// LayerZero endpoint id, the `dstEid` other chains use to reach this one.
    pub endpoint_id: u32,
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,
    pub pools: BTreeMap<TokenKind, Address>,
    #[serde(default)]
    pub tokens: BTreeMap<TokenKind, Address>,
    #[serde(default)]
    pub rpc: Vec<String>,
    #[serde(default)]
    pub explorers: Vec<String>,
}

fn default_native_symbol() -> String {
    "ETH".to_string()
}

impl ChainDescriptor {
    pub fn pool(&self, kind: TokenKind) -> Result<Address, BridgeError> {
        self.pools.get(&kind).copied().ok_or_else(|| {
            BridgeError::configuration(format!("no {kind} pool registered on {}", self.name))
        })
    }

    /// Token contract for `kind`. Native assets have no contract and resolve
    /// to the zero address unless the registry says otherwise.
    pub fn token(&self, kind: TokenKind) -> Result<Address, BridgeError> {
        match (self.tokens.get(&kind), kind) {
            (Some(address), _) => Ok(*address),
            (None, TokenKind::Native) => Ok(Address::ZERO),
            (None, TokenKind::StandardAsset) => Err(BridgeError::configuration(format!(
                "no {kind} token registered on {}",
                self.name
            ))),
        }
    }

    /// First RPC endpoint usable without an API key over HTTP.
    pub fn rpc_url(&self) -> Result<&str, BridgeError> {
        self.rpc
            .iter()
            .map(String::as_str)
            .find(|url| !url.starts_with("wss:") && !url.contains("${"))
            .ok_or_else(|| {
                BridgeError::configuration(format!("no usable RPC endpoint for {}", self.name))
            })
    }

    pub fn explorer_url(&self) -> Option<&str> {
        self.explorers
            .iter()
            .map(String::as_str)
            .find(|url| !url.starts_with("wss:"))
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(rename = "chain")]
    chains: Vec<ChainDescriptor>,
}

/// Read-only registry of chains, loaded once per process.
#[derive(Debug, Clone)]
pub struct Registry {
    chains: Vec<ChainDescriptor>,
}

impl Registry {
    /// Registry compiled into the binary.
    pub fn builtin() -> Result<Self, BridgeError> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            BridgeError::configuration(format!("cannot read registry {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, BridgeError> {
        let file: RegistryFile = toml::from_str(raw)
            .map_err(|e| BridgeError::configuration(format!("malformed registry: {e}")))?;

        for (i, chain) in file.chains.iter().enumerate() {
            if chain.pools.is_empty() {
                return Err(BridgeError::configuration(format!(
                    "chain {} has no pools",
                    chain.name
                )));
            }
            if file.chains[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&chain.name))
            {
                return Err(BridgeError::configuration(format!(
                    "chain {} registered twice",
                    chain.name
                )));
            }
        }

        Ok(Self {
            chains: file.chains,
        })
    }

    /// Looks a chain up by name, ignoring case.
    pub fn chain(&self, name: &str) -> Result<&ChainDescriptor, BridgeError> {
        self.chains
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| BridgeError::configuration(format!("unknown chain {name:?}")))
    }

    pub fn chain_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chains.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a transfer route: both chains known, distinct, and carrying a
    /// pool for `kind`. Touches nothing but the registry.
    pub fn route(
        &self,
        source: &str,
        destination: &str,
        kind: TokenKind,
    ) -> Result<(&ChainDescriptor, &ChainDescriptor), BridgeError> {
        let source = self.chain(source)?;
        let destination = self.chain(destination)?;
        if source.name == destination.name {
            return Err(BridgeError::configuration(format!(
                "source and destination are both {}",
                source.name
            )));
        }
        source.pool(kind)?;
        destination.pool(kind)?;
        Ok((source, destination))
    }

    pub fn token_address(&self, chain: &str, kind: TokenKind) -> Result<Address, BridgeError> {
        self.chain(chain)?.token(kind)
    }
}
