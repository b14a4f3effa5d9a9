use thiserror::Error;

use crate::todo::policy::StoreRole;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
    /// A collaborator store failed; `store` says which replica.
    #[error("{store} store failed: {source}")]
    Store {
        store: StoreRole,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    /// Tag an error with the store it came from. Already-tagged errors are kept as is.
    pub fn in_store(self, store: StoreRole) -> Self {
        match self {
            tagged @ ServiceError::Store { .. } => tagged,
            other => ServiceError::Store { store, source: Box::new(other) },
        }
    }

    /// Which store raised this error, if known.
    pub fn store(&self) -> Option<StoreRole> {
        match self {
            ServiceError::Store { store, .. } => Some(*store),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagging_is_idempotent() {
        let e = ServiceError::Db("disk full".into()).in_store(StoreRole::Secondary);
        assert_eq!(e.store(), Some(StoreRole::Secondary));
        let e = e.in_store(StoreRole::Primary);
        assert_eq!(e.store(), Some(StoreRole::Secondary));
        assert_eq!(e.to_string(), "secondary store failed: database error: disk full");
    }
}
