// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 typed structured data.
//!
//! Payloads are serialized to the JSON shape expected by
//! `eth_signTypedData_v4`. Integer values are always emitted as base-10
//! strings: JSON numbers cannot carry 256-bit integers without losing
//! precision, and every wallet accepts the string form.
//!
//! Maps are ordered, so serializing the same payload twice yields the same
//! bytes.

use std::collections::BTreeMap;

use alloy::primitives::{hex, Address, Bytes, B256, I256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::error::SignerError;

/// Name of the implicit domain struct.
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// A single member of a struct type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// EIP-712 domain separator fields. Absent fields are omitted from both the
/// JSON and the derived `EIP712Domain` type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedDataDomain {
    pub name: Option<String>,
    pub version: Option<String>,
    pub chain_id: Option<U256>,
    pub verifying_contract: Option<Address>,
    pub salt: Option<B256>,
}

impl TypedDataDomain {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(version) = &self.version {
            map.insert("version".into(), Value::String(version.clone()));
        }
        if let Some(chain_id) = &self.chain_id {
            map.insert("chainId".into(), Value::String(chain_id.to_string()));
        }
        if let Some(contract) = &self.verifying_contract {
            map.insert(
                "verifyingContract".into(),
                Value::String(contract.to_checksum(None)),
            );
        }
        if let Some(salt) = &self.salt {
            map.insert("salt".into(), Value::String(hex::encode_prefixed(salt)));
        }
        Value::Object(map)
    }

    /// Field list of the `EIP712Domain` struct for the populated fields, in
    /// canonical order.
    fn domain_type(&self) -> Vec<TypedField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(TypedField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedField::new("salt", "bytes32"));
        }
        fields
    }
}

/// A value inside a typed-data message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    Bytes(Bytes),
    String(String),
    Array(Vec<TypedValue>),
    Struct(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    /// JSON form for the provider. Integers become decimal strings.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Uint(value) => Value::String(value.to_string()),
            TypedValue::Int(value) => Value::String(value.to_string()),
            TypedValue::Bool(value) => Value::Bool(*value),
            TypedValue::Address(value) => Value::String(value.to_checksum(None)),
            TypedValue::Bytes(value) => Value::String(hex::encode_prefixed(value)),
            TypedValue::String(value) => Value::String(value.clone()),
            TypedValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            TypedValue::Struct(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Integers of any width, read from the literal digits so nothing above
    /// 2^53 is rounded.
    fn from_json_integer(number: &Number) -> Result<Self, SignerError> {
        let digits = number.to_string();
        let invalid = |reason: &str| SignerError::InvalidPayload(format!("Number {digits} {reason}"));

        let magnitude = digits.strip_prefix('-').unwrap_or(&digits);
        if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("is not a whole number and cannot be signed as typed data"));
        }

        if digits.starts_with('-') {
            I256::from_dec_str(&digits)
                .map(TypedValue::Int)
                .map_err(|_| invalid("does not fit in int256"))
        } else {
            U256::from_str_radix(&digits, 10)
                .map(TypedValue::Uint)
                .map_err(|_| invalid("does not fit in uint256"))
        }
    }

    /// Lift loosely-typed JSON (as received over the API) into a typed value.
    ///
    /// Whole numbers become integers, strings stay strings: the EIP-712 type
    /// list tells the wallet how to coerce them.
    pub fn from_json(value: &Value) -> Result<Self, SignerError> {
        match value {
            Value::Null => Err(SignerError::InvalidPayload(
                "null is not a valid typed-data value".to_string(),
            )),
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Number(number) => Self::from_json_integer(number),
            Value::String(s) => Ok(TypedValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(TypedValue::Array),
            Value::Object(fields) => fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), Self::from_json(value)?)))
                .collect::<Result<BTreeMap<_, _>, SignerError>>()
                .map(TypedValue::Struct),
        }
    }
}

impl From<U256> for TypedValue {
    fn from(value: U256) -> Self {
        TypedValue::Uint(value)
    }
}

impl From<u64> for TypedValue {
    fn from(value: u64) -> Self {
        TypedValue::Uint(U256::from(value))
    }
}

impl From<Address> for TypedValue {
    fn from(value: Address) -> Self {
        TypedValue::Address(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl From<Bytes> for TypedValue {
    fn from(value: Bytes) -> Self {
        TypedValue::Bytes(value)
    }
}

/// A complete typed-data request: domain, type definitions, primary type and
/// message value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedDataPayload {
    pub domain: TypedDataDomain,
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub primary_type: String,
    pub message: BTreeMap<String, TypedValue>,
}

impl TypedDataPayload {
    pub fn new(domain: TypedDataDomain, primary_type: impl Into<String>) -> Self {
        Self {
            domain,
            types: BTreeMap::new(),
            primary_type: primary_type.into(),
            message: BTreeMap::new(),
        }
    }

    /// Add a struct type definition.
    #[cfg(test)]
    pub(crate) fn with_type(mut self, name: impl Into<String>, fields: Vec<TypedField>) -> Self {
        self.types.insert(name.into(), fields);
        self
    }

    /// Set a field of the primary message.
    #[cfg(test)]
    pub(crate) fn with_field(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.message.insert(name.into(), value.into());
        self
    }

    /// Check that the primary type is defined and every declared field of it
    /// has a value.
    pub fn validate(&self) -> Result<(), SignerError> {
        let fields = self.types.get(&self.primary_type).ok_or_else(|| {
            SignerError::InvalidPayload(format!(
                "Primary type `{}` is not defined",
                self.primary_type
            ))
        })?;

        if let Some(missing) = fields.iter().find(|f| !self.message.contains_key(&f.name)) {
            return Err(SignerError::InvalidPayload(format!(
                "Field `{}` of `{}` has no value",
                missing.name, self.primary_type
            )));
        }

        Ok(())
    }

    /// JSON object in the `eth_signTypedData_v4` shape.
    pub fn to_json(&self) -> Value {
        let mut types: BTreeMap<String, Vec<TypedField>> = self.types.clone();
        types
            .entry(EIP712_DOMAIN_TYPE.to_string())
            .or_insert_with(|| self.domain.domain_type());

        let types = types
            .into_iter()
            .map(|(name, fields)| {
                let fields = fields
                    .into_iter()
                    .map(|f| serde_json::json!({ "name": f.name, "type": f.kind }))
                    .collect();
                (name, Value::Array(fields))
            })
            .collect::<Map<_, _>>();

        let message = self
            .message
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<Map<_, _>>();

        serde_json::json!({
            "domain": self.domain.to_json(),
            "types": Value::Object(types),
            "primaryType": self.primary_type,
            "message": Value::Object(message),
        })
    }

    /// Serialized JSON string forwarded to the provider.
    pub fn to_json_string(&self) -> Result<String, SignerError> {
        self.validate()?;
        serde_json::to_string(&self.to_json())
            .map_err(|e| SignerError::InvalidPayload(format!("Failed to serialize typed data: {e}")))
    }
}
