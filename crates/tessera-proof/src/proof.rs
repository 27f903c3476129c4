use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProofError;

/// A linked-data proof attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Multibase (base58btc) signature.
    #[serde(default)]
    pub proof_value: String,
}

impl Proof {
    /// The proof options: every field except the signature value.
    pub fn options(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("proofValue");
        }
        value
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Parse the proof (or proof set) of a document.
pub fn proofs_of(document: &Value) -> Result<Vec<Proof>, ProofError> {
    let parse = |value: &Value| {
        serde_json::from_value::<Proof>(value.clone())
            .map_err(|e| ProofError::InvalidProof(e.to_string()))
    };
    match document.get("proof") {
        None | Some(Value::Null) => Err(ProofError::MissingProof),
        Some(Value::Array(items)) if items.is_empty() => Err(ProofError::MissingProof),
        Some(Value::Array(items)) => items.iter().map(parse).collect(),
        Some(single) => Ok(vec![parse(single)?]),
    }
}

/// A copy of `document` without its `proof` member.
pub fn without_proof(document: &Value) -> Value {
    let mut unsigned = document.clone();
    if let Value::Object(map) = &mut unsigned {
        map.remove("proof");
    }
    unsigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proof_json() -> Value {
        json!({
            "type": "Ed25519Signature2018",
            "created": "2024-01-01T00:00:00Z",
            "verificationMethod": "did:example:a#keys-1",
            "proofPurpose": "assertionMethod",
            "proofValue": "z3sig",
        })
    }

    #[test]
    fn test_single_and_set() {
        let single = json!({"id": "urn:1", "proof": proof_json()});
        assert_eq!(proofs_of(&single).unwrap().len(), 1);

        let set = json!({"id": "urn:1", "proof": [proof_json(), proof_json()]});
        assert_eq!(proofs_of(&set).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_proof() {
        assert_eq!(proofs_of(&json!({"id": "urn:1"})), Err(ProofError::MissingProof));
        assert_eq!(
            proofs_of(&json!({"id": "urn:1", "proof": []})),
            Err(ProofError::MissingProof)
        );
        assert!(matches!(
            proofs_of(&json!({"proof": {"type": 5}})),
            Err(ProofError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_options_exclude_signature() {
        let proof: Proof = serde_json::from_value(proof_json()).unwrap();
        let options = proof.options();
        assert!(options.get("proofValue").is_none());
        assert_eq!(options["proofPurpose"], "assertionMethod");
        assert!(options.get("challenge").is_none());
    }

    #[test]
    fn test_without_proof() {
        let doc = json!({"id": "urn:1", "proof": proof_json()});
        assert_eq!(without_proof(&doc), json!({"id": "urn:1"}));
    }
}
