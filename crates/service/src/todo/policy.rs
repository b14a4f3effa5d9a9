use std::fmt;

/// One of the two replicas behind `TodoService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRole {
    /// Relational store.
    Primary,
    /// Document store.
    Secondary,
}

impl StoreRole {
    pub const fn other(self) -> Self {
        match self {
            StoreRole::Primary => StoreRole::Secondary,
            StoreRole::Secondary => StoreRole::Primary,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StoreRole::Primary => "primary",
            StoreRole::Secondary => "secondary",
        }
    }
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Store ordering used by `TodoService`.
///
/// The two fields are independent and their defaults disagree: lookups by id
/// prefer the secondary, while listings keep the primary's copy of a
/// duplicated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Read first by `find_by_id`; written and deleted first by save/update/delete.
    pub preferred: StoreRole,
    /// Enumerated first by `find_all`; its copy wins when both stores hold an id.
    pub listing_winner: StoreRole,
}

impl ReconcilePolicy {
    pub const DEFAULT: Self = Self { preferred: StoreRole::Secondary, listing_winner: StoreRole::Primary };

    /// Swap both orderings.
    pub const fn flipped(self) -> Self {
        Self { preferred: self.preferred.other(), listing_winner: self.listing_winner.other() }
    }
}

impl Default for ReconcilePolicy {
    fn default() -> Self { Self::DEFAULT }
}
