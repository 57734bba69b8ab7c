use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix every client-minted placeholder identifier carries. The full wire
/// format is `temp-<entityKind>-<uniqueSuffix>`; suffix minting happens in
/// the write-creation path, outside this crate.
pub const TEMP_ID_PREFIX: &str = "temp";

const SEPARATOR: char = '-';

/// Returns true when `id` is a client-minted placeholder rather than a
/// server-assigned identifier. Pure prefix test; malformed input is simply
/// not a placeholder.
pub fn is_temp_id(id: &str) -> bool {
    id.strip_prefix(TEMP_ID_PREFIX)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .is_some()
}

/// Entity-kind token of a placeholder: the first `-`-delimited segment after
/// the prefix. `None` for anything that is not a recognized placeholder.
///
/// Kinds that themselves contain the separator extract truncated
/// (`temp-water-quality-1` yields `water`); see DESIGN.md.
pub fn entity_kind_of(id: &str) -> Option<&str> {
    let rest = id
        .strip_prefix(TEMP_ID_PREFIX)?
        .strip_prefix(SEPARATOR)?;
    let kind = rest.split(SEPARATOR).next()?;
    if kind.is_empty() { None } else { Some(kind) }
}

/// Identifies the domain entity a record belongs to (e.g. `batch`). Labels
/// are opaque to the sync core and never validated against the known set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    pub const BATCH: &'static str = "batch";
    pub const FEED: &'static str = "feed";
    pub const MORTALITY: &'static str = "mortality";
    pub const WEIGHT: &'static str = "weight";
    pub const WATER_QUALITY: &'static str = "water-quality";
    pub const EGG: &'static str = "egg";
    pub const VACCINATION: &'static str = "vaccination";
    pub const SALE: &'static str = "sale";
    pub const EXPENSE: &'static str = "expense";
    pub const INVOICE: &'static str = "invoice";
    pub const CUSTOMER: &'static str = "customer";
    pub const SUPPLIER: &'static str = "supplier";
    pub const STRUCTURE: &'static str = "structure";
    pub const TASK: &'static str = "task";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for EntityKind {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for EntityKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
