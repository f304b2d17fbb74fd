//! Internal reference resolution
//!
//! Follows `$ref` pointers of the form `#/components/...` within a single
//! document. External references are rejected.

use serde_json::Value;

use crate::error::{ForgeError, ForgeResult};

/// Chains longer than this are treated as cycles
const MAX_REF_DEPTH: usize = 32;

/// Resolves `$ref` objects against a root document
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// The `$ref` target of `value`, if it is a reference object
    pub fn reference(value: &Value) -> Option<&str> {
        value.get("$ref").and_then(Value::as_str)
    }

    /// Last path segment of a reference, e.g. `Post` for `#/components/schemas/Post`
    pub fn ref_name(value: &Value) -> Option<&str> {
        Self::reference(value).and_then(|r| r.rsplit('/').next())
    }

    /// Look up a single reference string
    pub fn lookup(&self, reference: &str) -> ForgeResult<&'a Value> {
        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            ForgeError::invalid(format!("unsupported external reference '{reference}'"))
        })?;

        self.root
            .pointer(pointer)
            .ok_or_else(|| ForgeError::invalid(format!("unresolvable reference '{reference}'")))
    }

    /// Follow references until a non-reference value is reached
    pub fn resolve(&self, value: &'a Value) -> ForgeResult<&'a Value> {
        let mut current = value;
        for _ in 0..MAX_REF_DEPTH {
            match Self::reference(current) {
                Some(reference) => current = self.lookup(reference)?,
                None => return Ok(current),
            }
        }

        Err(ForgeError::invalid(format!(
            "reference chain deeper than {MAX_REF_DEPTH} levels"
        )))
    }

    /// Resolve an optional child of `parent`
    pub fn child(&self, parent: &'a Value, key: &str) -> ForgeResult<Option<&'a Value>> {
        parent.get(key).map(|v| self.resolve(v)).transpose()
    }
}
