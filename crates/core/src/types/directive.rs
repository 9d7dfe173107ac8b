use serde::{Deserialize, Serialize};

use super::address::Address;
use super::position::{Position, Span};

/// Whether a directive carries its own address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    AddressBound,
    PresetOnly,
}

/// One `@Name` / `@Name(0x…)` occurrence in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub address: Option<Address>,
    /// Covers the `@Name` token only; the parenthesized address stays in the text.
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_span: Option<Span>,
    pub position: Position,
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn preset_only(name: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            name: name.into(),
            address: None,
            span,
            argument_span: None,
            position,
            kind: DirectiveKind::PresetOnly,
        }
    }

    pub fn address_bound(
        name: impl Into<String>,
        address: Address,
        span: Span,
        argument_span: Span,
        position: Position,
    ) -> Self {
        Self {
            name: name.into(),
            address: Some(address),
            span,
            argument_span: Some(argument_span),
            position,
            kind: DirectiveKind::AddressBound,
        }
    }

    pub fn is_address_bound(&self) -> bool {
        matches!(self.kind, DirectiveKind::AddressBound)
    }
}

/// A logical interface planned from every directive sharing one name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceRequest {
    pub name: String,
    pub address: Option<Address>,
}
