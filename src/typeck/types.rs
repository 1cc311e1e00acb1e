use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDesc {
    Boolean,
    Integer,
    String,
    Hash,
    #[serde(rename = "Sha3(String)")]
    Sha3String,
    #[serde(rename = "Sha3(PublicKey)")]
    Sha3PublicKey,
    #[serde(rename = "Sha256(String)")]
    Sha256String,
    #[serde(rename = "Sha256(PublicKey)")]
    Sha256PublicKey,
    PublicKey,
    Signature,
    Asset,
    Amount,
    Program,
    Value,
    Predicate,
    Contract,
    List,
    Nil,
}

impl TypeDesc {
    /// Resolves a declared parameter type, e.g. `Integer` or `Sha3(PublicKey)`.
    /// Returns `None` for unknown names and for types that cannot be declared.
    pub fn from_name(name: &str, inner: Option<&str>) -> Option<TypeDesc> {
        let ty = match (name, inner) {
            ("Boolean", None) => TypeDesc::Boolean,
            ("Integer", None) => TypeDesc::Integer,
            ("String", None) => TypeDesc::String,
            ("Hash", None) => TypeDesc::Hash,
            ("Sha3", Some("String")) => TypeDesc::Sha3String,
            ("Sha3", Some("PublicKey")) => TypeDesc::Sha3PublicKey,
            ("Sha256", Some("String")) => TypeDesc::Sha256String,
            ("Sha256", Some("PublicKey")) => TypeDesc::Sha256PublicKey,
            ("PublicKey", None) => TypeDesc::PublicKey,
            ("Signature", None) => TypeDesc::Signature,
            ("Asset", None) => TypeDesc::Asset,
            ("Amount", None) => TypeDesc::Amount,
            ("Program", None) => TypeDesc::Program,
            ("Value", None) => TypeDesc::Value,
            ("Predicate", None) => TypeDesc::Predicate,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_hash_subtype(self) -> bool {
        matches!(
            self,
            TypeDesc::Sha3String
                | TypeDesc::Sha3PublicKey
                | TypeDesc::Sha256String
                | TypeDesc::Sha256PublicKey
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, TypeDesc::Integer | TypeDesc::Amount)
    }

    /// True if a value of type `actual` may be used where `self` is required.
    /// `Integer` and `Amount` are interchangeable, and hash subtypes satisfy `Hash`.
    pub fn accepts(self, actual: TypeDesc) -> bool {
        if self == actual {
            return actual != TypeDesc::Nil;
        }
        (self.is_integer() && actual.is_integer())
            || (self == TypeDesc::Hash && actual.is_hash_subtype())
    }

    /// The hash subtype produced by `sha3`/`sha256` over an argument of type `arg`.
    pub fn hash_of(hash_fn: &str, arg: TypeDesc) -> TypeDesc {
        match (hash_fn, arg) {
            ("sha3", TypeDesc::String) => TypeDesc::Sha3String,
            ("sha3", TypeDesc::PublicKey) => TypeDesc::Sha3PublicKey,
            ("sha256", TypeDesc::String) => TypeDesc::Sha256String,
            ("sha256", TypeDesc::PublicKey) => TypeDesc::Sha256PublicKey,
            _ => TypeDesc::Hash,
        }
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TypeDesc::Boolean => "Boolean",
            TypeDesc::Integer => "Integer",
            TypeDesc::String => "String",
            TypeDesc::Hash => "Hash",
            TypeDesc::Sha3String => "Sha3(String)",
            TypeDesc::Sha3PublicKey => "Sha3(PublicKey)",
            TypeDesc::Sha256String => "Sha256(String)",
            TypeDesc::Sha256PublicKey => "Sha256(PublicKey)",
            TypeDesc::PublicKey => "PublicKey",
            TypeDesc::Signature => "Signature",
            TypeDesc::Asset => "Asset",
            TypeDesc::Amount => "Amount",
            TypeDesc::Program => "Program",
            TypeDesc::Value => "Value",
            TypeDesc::Predicate => "Predicate",
            TypeDesc::Contract => "Contract",
            TypeDesc::List => "List",
            TypeDesc::Nil => "nil",
        };
        f.write_str(s)
    }
}
