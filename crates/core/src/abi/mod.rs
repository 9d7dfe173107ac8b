//! Typed contract ABI: parsing, canonical signatures, selectors and merging

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Function,
    Event,
    Error,
    Constructor,
    Fallback,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub indexed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            internal_type: None,
            indexed: false,
            components: Vec::new(),
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn is_tuple(&self) -> bool {
        self.ty.starts_with("tuple")
    }

    /// Array suffix of a tuple type, e.g. `[]` for `tuple[]`
    pub fn tuple_suffix(&self) -> &str {
        self.ty.strip_prefix("tuple").unwrap_or("")
    }

    /// Type as it appears in a canonical signature
    pub fn canonical_type(&self) -> String {
        if self.is_tuple() {
            let inner: Vec<String> = self.components.iter().map(|c| c.canonical_type()).collect();
            format!("({}){}", inner.join(","), self.tuple_suffix())
        } else {
            canonical_elementary(&self.ty)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiItem {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub anonymous: bool,
    // Pre-0.5 compilers emit these instead of `stateMutability`
    #[serde(default, skip_serializing)]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing)]
    pub payable: Option<bool>,
}

/// What makes two ABI entries "the same" when merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemIdentity {
    Selector(ItemKind, [u8; 4]),
    Topic([u8; 32]),
    Singleton(ItemKind),
}

impl AbiItem {
    pub fn function(
        name: &str,
        inputs: Vec<AbiParam>,
        outputs: Vec<AbiParam>,
        mutability: StateMutability,
    ) -> Self {
        Self {
            kind: ItemKind::Function,
            name: name.to_string(),
            inputs,
            outputs,
            state_mutability: Some(mutability),
            anonymous: false,
            constant: None,
            payable: None,
        }
    }

    pub fn event(name: &str, inputs: Vec<AbiParam>) -> Self {
        Self {
            kind: ItemKind::Event,
            name: name.to_string(),
            inputs,
            outputs: Vec::new(),
            state_mutability: None,
            anonymous: false,
            constant: None,
            payable: None,
        }
    }

    pub fn mutability(&self) -> StateMutability {
        if let Some(m) = self.state_mutability {
            return m;
        }
        match (self.constant, self.payable) {
            (Some(true), _) => StateMutability::View,
            (_, Some(true)) => StateMutability::Payable,
            _ => StateMutability::Nonpayable,
        }
    }

    /// `name(type1,type2)` with tuples expanded
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.canonical_type()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        let hash = Keccak256::digest(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn topic(&self) -> [u8; 32] {
        Keccak256::digest(self.signature().as_bytes()).into()
    }

    pub fn identity(&self) -> ItemIdentity {
        match self.kind {
            ItemKind::Function | ItemKind::Error => ItemIdentity::Selector(self.kind, self.selector()),
            ItemKind::Event => ItemIdentity::Topic(self.topic()),
            kind => ItemIdentity::Singleton(kind),
        }
    }

    fn normalize(&mut self) {
        if !matches!(self.kind, ItemKind::Event | ItemKind::Error) {
            self.state_mutability = Some(self.mutability());
        }
        self.constant = None;
        self.payable = None;
    }
}

/// A contract ABI in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi {
    pub items: Vec<AbiItem>,
}

impl Abi {
    pub fn new(items: Vec<AbiItem>) -> Self {
        let mut abi = Self { items };
        abi.normalize();
        abi
    }

    /// Parse a JSON ABI array. Unknown fields are ignored.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let items: Vec<AbiItem> = serde_json::from_str(json)?;
        Ok(Self::new(items))
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let items: Vec<AbiItem> = serde_json::from_value(value)?;
        Ok(Self::new(items))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Function)
    }

    /// Content hash of the normalized ABI. Equal ABIs share a digest no matter
    /// which source produced them.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_string(&self.items).unwrap_or_default();
        format!("{:x}", md5::compute(canonical.as_bytes()))
    }

    /// Proxy entries first in their order, then implementation entries in their
    /// order, skipping any whose identity the proxy already declares.
    pub fn merge(proxy: &Abi, implementation: &Abi) -> Abi {
        let mut seen: HashSet<ItemIdentity> = HashSet::new();
        let mut items = Vec::with_capacity(proxy.len() + implementation.len());

        for item in proxy.items.iter().chain(implementation.items.iter()) {
            if seen.insert(item.identity()) {
                items.push(item.clone());
            }
        }

        tracing::debug!(
            "Merged ABI: {} proxy + {} implementation -> {} entries",
            proxy.len(),
            implementation.len(),
            items.len()
        );
        Abi { items }
    }

    fn normalize(&mut self) {
        for item in &mut self.items {
            item.normalize();
        }
    }
}

fn default_kind() -> ItemKind {
    ItemKind::Function
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn canonical_elementary(ty: &str) -> String {
    let (base, suffix) = match ty.find('[') {
        Some(idx) => ty.split_at(idx),
        None => (ty, ""),
    };
    let base = match base {
        "uint" => "uint256",
        "int" => "int256",
        "byte" => "bytes1",
        other => other,
    };
    format!("{base}{suffix}")
}
