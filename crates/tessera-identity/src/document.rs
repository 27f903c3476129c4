use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_core::Did;
use tessera_crypto::{multibase_decode, AnyPublicKey, KeyType};

use crate::error::IdentityError;

pub const ED25519_VERIFICATION_KEY_2018: &str = "Ed25519VerificationKey2018";
pub const ED25519_VERIFICATION_KEY_2020: &str = "Ed25519VerificationKey2020";
pub const SECP256K1_VERIFICATION_KEY_2019: &str = "EcdsaSecp256k1VerificationKey2019";
pub const MULTIKEY: &str = "Multikey";

/// Verification relationships a key can be authorized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Authentication,
    AssertionMethod,
}

impl Relationship {
    /// The JSON-LD term naming this relationship.
    pub fn term(&self) -> &'static str {
        match self {
            Relationship::Authentication => "authentication",
            Relationship::AssertionMethod => "assertionMethod",
        }
    }
}

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Absolute verification method id (e.g. `did:example:abc#keys-1`).
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this key.
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
}

impl VerificationMethod {
    /// Describe `public_key` as a base58 verification method.
    pub fn new(id: String, controller: String, public_key: &AnyPublicKey) -> Self {
        let method_type = match public_key.key_type() {
            KeyType::Ed25519 => ED25519_VERIFICATION_KEY_2018,
            KeyType::Secp256k1 => SECP256K1_VERIFICATION_KEY_2019,
        };
        Self {
            id,
            method_type: method_type.to_string(),
            controller,
            public_key_base58: Some(public_key.to_bs58()),
            public_key_multibase: None,
            public_key_hex: None,
        }
    }

    /// Key algorithm implied by the method type, if it fixes one.
    pub fn key_type(&self) -> Option<KeyType> {
        match self.method_type.as_str() {
            ED25519_VERIFICATION_KEY_2018 | ED25519_VERIFICATION_KEY_2020 => Some(KeyType::Ed25519),
            SECP256K1_VERIFICATION_KEY_2019 => Some(KeyType::Secp256k1),
            _ => None,
        }
    }

    /// Decode the public key material.
    pub fn public_key(&self) -> Result<AnyPublicKey, IdentityError> {
        if let Some(multibase) = &self.public_key_multibase {
            return self.decode_multibase(multibase);
        }

        let key_type = self.key_type().ok_or_else(|| {
            IdentityError::InvalidKey(format!(
                "unsupported verification method type '{}' for {}",
                self.method_type, self.id
            ))
        })?;

        let bytes = if let Some(b58) = &self.public_key_base58 {
            bs58_decode(b58)?
        } else if let Some(hex_str) = &self.public_key_hex {
            hex_decode(hex_str)?
        } else {
            return Err(IdentityError::InvalidKey(format!(
                "verification method {} carries no key material",
                self.id
            )));
        };

        Ok(AnyPublicKey::from_bytes(key_type, &bytes)?)
    }

    fn decode_multibase(&self, multibase: &str) -> Result<AnyPublicKey, IdentityError> {
        match self.key_type() {
            // Ed25519VerificationKey2020 allows both raw and multicodec-prefixed keys.
            Some(key_type) => match AnyPublicKey::from_multibase(multibase) {
                Ok(key) if key.key_type() == key_type => Ok(key),
                _ => {
                    let bytes = multibase_decode(multibase)?;
                    Ok(AnyPublicKey::from_bytes(key_type, &bytes)?)
                }
            },
            None => Ok(AnyPublicKey::from_multibase(multibase)?),
        }
    }
}

/// Normalized DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: Did,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    /// Ids of methods authorized for authentication.
    #[serde(default)]
    pub authentication: Vec<String>,
    /// Ids of methods authorized to issue credentials.
    #[serde(default)]
    pub assertion_method: Vec<String>,
    /// Optional reference to an attestation about the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attests: Option<String>,
}

impl DidDocument {
    /// Create an empty document for `did`.
    pub fn new(did: Did) -> Self {
        Self {
            id: did,
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            attests: None,
        }
    }

    /// Add a key as `#keys-N`, authorized for authentication and assertion.
    /// Returns the new verification method id.
    pub fn add_verification_method(&mut self, public_key: &AnyPublicKey) -> String {
        let idx = self.verification_method.len() + 1;
        let id = format!("{}#keys-{}", self.id, idx);
        self.verification_method.push(VerificationMethod::new(
            id.clone(),
            self.id.to_string(),
            public_key,
        ));
        self.authentication.push(id.clone());
        self.assertion_method.push(id.clone());
        id
    }

    /// Build a single-key document, the shape used for freshly created DIDs.
    pub fn with_key(did: Did, public_key: &AnyPublicKey) -> Self {
        let mut doc = Self::new(did);
        doc.add_verification_method(public_key);
        doc
    }

    /// Look up a verification method by absolute or relative (`#keys-1`) id.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let id = absolute_id(self.id.uri(), id);
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// Whether `id` is listed under the given relationship.
    pub fn is_authorized(&self, id: &str, relationship: Relationship) -> bool {
        let id = absolute_id(self.id.uri(), id);
        let listed = match relationship {
            Relationship::Authentication => &self.authentication,
            Relationship::AssertionMethod => &self.assertion_method,
        };
        listed.iter().any(|entry| *entry == id)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Normalize a resolver-specific JSON document.
    ///
    /// Accepts `verificationMethod` or the legacy `publicKey` list, relative
    /// ids and verification methods embedded in relationship lists.
    pub fn from_json(value: &Value) -> Result<Self, IdentityError> {
        let obj = value
            .as_object()
            .ok_or_else(|| IdentityError::InvalidDocument("document is not an object".into()))?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::InvalidDocument("document has no id".into()))?;
        let did = Did::parse(id)?;

        let mut doc = Self::new(did);

        let methods = obj
            .get("verificationMethod")
            .or_else(|| obj.get("publicKey"));
        for entry in as_list(methods) {
            let vm = parse_method(doc.id.uri(), entry)?;
            doc.push_method(vm);
        }

        doc.authentication = doc.parse_relationship(obj, Relationship::Authentication)?;
        doc.assertion_method = doc.parse_relationship(obj, Relationship::AssertionMethod)?;
        doc.attests = obj
            .get("attests")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(doc)
    }

    fn push_method(&mut self, vm: VerificationMethod) {
        if !self.verification_method.iter().any(|m| m.id == vm.id) {
            self.verification_method.push(vm);
        }
    }

    fn parse_relationship(
        &mut self,
        obj: &Map<String, Value>,
        relationship: Relationship,
    ) -> Result<Vec<String>, IdentityError> {
        let mut ids = Vec::new();
        for entry in as_list(obj.get(relationship.term())) {
            let id = match entry {
                Value::String(reference) => absolute_id(self.id.uri(), reference),
                Value::Object(_) => {
                    let vm = parse_method(self.id.uri(), entry)?;
                    let id = vm.id.clone();
                    self.push_method(vm);
                    id
                }
                _ => {
                    return Err(IdentityError::InvalidDocument(format!(
                        "invalid {} entry",
                        relationship.term()
                    )))
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }
}

fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

fn absolute_id(did: &str, id: &str) -> String {
    if id.starts_with('#') {
        format!("{}{}", did, id)
    } else {
        id.to_string()
    }
}

fn parse_method(did: &str, value: &Value) -> Result<VerificationMethod, IdentityError> {
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

    let id = field("id")
        .ok_or_else(|| IdentityError::InvalidDocument("verification method has no id".into()))?;
    let method_type = field("type").ok_or_else(|| {
        IdentityError::InvalidDocument(format!("verification method {} has no type", id))
    })?;

    Ok(VerificationMethod {
        id: absolute_id(did, &id),
        method_type,
        controller: field("controller").unwrap_or_else(|| did.to_string()),
        public_key_base58: field("publicKeyBase58"),
        public_key_multibase: field("publicKeyMultibase"),
        public_key_hex: field("publicKeyHex"),
    })
}

fn bs58_decode(encoded: &str) -> Result<Vec<u8>, IdentityError> {
    bs58::decode(encoded)
        .into_vec()
        .map_err(|e| IdentityError::InvalidKey(format!("invalid base58: {}", e)))
}

fn hex_decode(encoded: &str) -> Result<Vec<u8>, IdentityError> {
    hex::decode(encoded.trim_start_matches("0x"))
        .map_err(|e| IdentityError::InvalidKey(format!("invalid hex: {}", e)))
}
