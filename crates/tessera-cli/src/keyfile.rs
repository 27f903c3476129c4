//! Issuer key files.

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_core::Did;
use tessera_crypto::{AnyKeyPair, KeyType};
use tessera_identity::DidKeyResolver;
use tessera_proof::KeyDoc;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyAlgorithm {
    Ed25519,
    Secp256k1,
}

impl From<KeyAlgorithm> for KeyType {
    fn from(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Ed25519 => KeyType::Ed25519,
            KeyAlgorithm::Secp256k1 => KeyType::Secp256k1,
        }
    }
}

/// A `did:key` identity stored as JSON. The secret is hex encoded.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub did: String,
    pub key_type: String,
    secret_key_hex: String,
}

impl KeyFile {
    pub fn generate(algorithm: KeyAlgorithm) -> anyhow::Result<Self> {
        let keypair = AnyKeyPair::generate(algorithm.into());
        let did = DidKeyResolver::did_for(&keypair.public_key())?;
        let secret = Zeroizing::new(keypair.secret_bytes());
        Ok(Self {
            did: did.to_string(),
            key_type: keypair.key_type().to_string(),
            secret_key_hex: hex::encode(*secret),
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing key file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The signing key, identified by its `did:key` verification method.
    pub fn key_doc(&self) -> anyhow::Result<KeyDoc> {
        let key_type = match self.key_type.as_str() {
            "Ed25519" => KeyType::Ed25519,
            "Secp256k1" => KeyType::Secp256k1,
            other => anyhow::bail!("unsupported key type {}", other),
        };
        let secret = Zeroizing::new(hex::decode(&self.secret_key_hex).context("invalid secret key hex")?);
        let keypair = AnyKeyPair::from_secret_bytes(key_type, &secret)?;

        let did = Did::parse(&self.did)?;
        if DidKeyResolver::did_for(&keypair.public_key())? != did {
            anyhow::bail!("key file DID {} does not match its secret key", did);
        }
        Ok(KeyDoc::new(
            format!("{}#{}", did, did.identifier()),
            did.to_string(),
            keypair,
        ))
    }
}
