use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{Address, Directive, InterfaceRequest};

/// Collapse directives into one request per name, sorted by name.
///
/// Bare occurrences adopt the address of a bound occurrence of the same name.
/// Two bound occurrences with different addresses are a conflict.
pub fn plan_requests(directives: &[Directive]) -> Result<Vec<InterfaceRequest>> {
    let mut planned: BTreeMap<&str, Option<Address>> = BTreeMap::new();

    for directive in directives {
        let slot = planned.entry(directive.name.as_str()).or_insert(None);
        match (*slot, directive.address) {
            (Some(first), Some(second)) if first != second => {
                return Err(Error::ResolutionConflict {
                    name: directive.name.clone(),
                    first,
                    second,
                });
            }
            (None, Some(address)) => *slot = Some(address),
            _ => {}
        }
    }

    Ok(planned
        .into_iter()
        .map(|(name, address)| InterfaceRequest {
            name: name.to_string(),
            address,
        })
        .collect())
}
