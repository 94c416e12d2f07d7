//! Composite ledger keys.
//!
//! A composite key is an object-type tag plus an ordered list of parts,
//! encoded as `\0type\0part1\0part2\0`. Because every part is terminated by
//! the separator, a partial key (`type` plus a leading subset of parts)
//! encodes to a strict prefix of every full key that extends it, which is
//! what makes `(assetAddr, [poolId])` range queries work.

use super::{LedgerError, LedgerResult};
use crate::config::PART_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    object_type: String,
    parts: Vec<String>,
}

impl CompositeKey {
    /// Build a key, rejecting empty object types and separator characters.
    pub fn new<S: AsRef<str>>(object_type: &str, parts: &[S]) -> LedgerResult<Self> {
        if object_type.is_empty() {
            return Err(LedgerError::InvalidKey("empty object type".into()));
        }
        check_part(object_type)?;
        let parts = parts
            .iter()
            .map(|p| {
                check_part(p.as_ref())?;
                Ok(p.as_ref().to_string())
            })
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(Self {
            object_type: object_type.to_string(),
            parts,
        })
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The ledger key string. For a partial key this is the range prefix.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(PART_SEPARATOR);
        out.push_str(&self.object_type);
        out.push(PART_SEPARATOR);
        for part in &self.parts {
            out.push_str(part);
            out.push(PART_SEPARATOR);
        }
        out
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(key: &str) -> LedgerResult<Self> {
        let body = key
            .strip_prefix(PART_SEPARATOR)
            .and_then(|k| k.strip_suffix(PART_SEPARATOR))
            .ok_or_else(|| LedgerError::InvalidKey(format!("{key:?} is not a composite key")))?;
        let mut fields = body.split(PART_SEPARATOR);
        let object_type = fields.next().unwrap_or_default();
        let parts: Vec<&str> = fields.collect();
        Self::new(object_type, &parts)
    }
}

fn check_part(part: &str) -> LedgerResult<()> {
    if part.contains(PART_SEPARATOR) {
        return Err(LedgerError::InvalidKey(format!(
            "{part:?} contains the key separator"
        )));
    }
    Ok(())
}
