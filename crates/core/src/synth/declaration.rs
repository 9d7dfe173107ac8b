use regex::Regex;
use std::sync::LazyLock;

use crate::types::Span;

static INTERFACE_DECLARATION: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"\binterface\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*(?:is\s+[^{;]*)?\{")
});

/// The first `interface Name {` declaration of a Solidity source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDeclaration {
    pub name: String,
    /// Byte span of the identifier only
    pub name_span: Span,
}

pub fn find_interface(source: &str) -> Option<InterfaceDeclaration> {
    let regex = INTERFACE_DECLARATION.as_ref().ok()?;
    let ident = regex.captures(source)?.get(1)?;
    Some(InterfaceDeclaration {
        name: ident.as_str().to_string(),
        name_span: Span::new(ident.start(), ident.end()),
    })
}

/// Whether `source` declares `interface <name>`
pub fn declares_interface(source: &str, name: &str) -> bool {
    find_interface(source).is_some_and(|decl| decl.name == name)
}
