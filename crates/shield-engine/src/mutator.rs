//! Whitelist and blocklist mutations.
//!
//! Every mutation is a short read-modify-write on the shared store followed by
//! a recompute of the effective shield policy. There is no cross-process lock;
//! the last writer wins.

use std::sync::Arc;

use shield_store::SelectionStore;
use shield_types::Selection;
use tracing::{debug, info};

use crate::{
    Result,
    deps::{EffectivePolicy, ShieldPolicy},
};

/// A mutation of the block state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOp {
    /// Union tokens into the whitelist.
    Add(Selection),
    /// Remove tokens from the blocklist.
    Remove(Selection),
    /// Clear blocklist and whitelist and leave block-all mode.
    Reset,
    /// Leave block-all mode.
    Disable,
}

impl BlockOp {
    /// Short name for logs.
    fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Reset => "reset",
            Self::Disable => "disable",
        }
    }
}

/// Applies [`BlockOp`]s and hands the result to the shield policy.
#[derive(Clone)]
pub struct BlockMutator {
    /// Shared store.
    store: SelectionStore,
    /// Effective-policy collaborator.
    policy: Arc<dyn ShieldPolicy>,
}

impl BlockMutator {
    /// Create a mutator.
    pub fn new(store: SelectionStore, policy: Arc<dyn ShieldPolicy>) -> Self {
        Self { store, policy }
    }

    /// Apply `op`, then recompute and apply the effective policy.
    pub fn mutate(&self, op: BlockOp) -> Result<EffectivePolicy> {
        let name = op.name();
        match op {
            BlockOp::Add(tokens) => {
                let mut whitelist = self.store.whitelist()?;
                let before = whitelist.total_len();
                whitelist.union_with(&tokens);
                debug!(added = whitelist.total_len() - before, "whitelist_union");
                self.store.set_whitelist(&whitelist)?;
            }
            BlockOp::Remove(tokens) => {
                let mut blocklist = self.store.blocklist()?;
                let before = blocklist.total_len();
                blocklist.subtract(&tokens);
                debug!(removed = before - blocklist.total_len(), "blocklist_subtract");
                self.store.set_blocklist(&blocklist)?;
            }
            BlockOp::Reset => {
                self.store.set_blocklist(&Selection::default())?;
                self.store.set_whitelist(&Selection::default())?;
                self.store.set_block_all(false)?;
            }
            BlockOp::Disable => {
                self.store.set_block_all(false)?;
            }
        }
        let policy = self.effective_policy()?;
        let triggered_by = &self.store.settings().triggered_by;
        info!(
            op = name,
            triggered_by = %triggered_by,
            blocked = policy.blocked.total_len(),
            whitelisted = policy.whitelist.total_len(),
            block_all = policy.block_all,
            "block_update"
        );
        self.policy.apply(&policy, triggered_by);
        Ok(policy)
    }

    /// Derive the effective policy from the store without mutating it.
    pub fn effective_policy(&self) -> Result<EffectivePolicy> {
        let whitelist = self.store.whitelist()?;
        let blocked = self.store.blocklist()?.subtracting(&whitelist);
        Ok(EffectivePolicy {
            blocked,
            whitelist,
            block_all: self.store.block_all_enabled()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use shield_config::Settings;
    use shield_store::MemoryStore;
    use shield_types::TokenKind::{Application, WebDomain};

    use super::*;
    use crate::test_support::MockPolicy;

    fn mutator() -> (BlockMutator, SelectionStore, Arc<MockPolicy>) {
        let store = SelectionStore::new(Arc::new(MemoryStore::new()), Arc::new(Settings::default()));
        let policy = Arc::new(MockPolicy::new());
        (BlockMutator::new(store.clone(), policy.clone()), store, policy)
    }

    #[test]
    fn add_is_idempotent() {
        let (m, store, _) = mutator();
        let tok = Selection::default().with(Application, "A");
        m.mutate(BlockOp::Add(tok.clone())).unwrap();
        let once = store.whitelist().unwrap();
        m.mutate(BlockOp::Add(tok)).unwrap();
        assert_eq!(store.whitelist().unwrap(), once);
        assert_eq!(once.total_len(), 1);
    }

    #[test]
    fn whitelist_is_subtracted_from_blocked() {
        let (m, store, policy) = mutator();
        store
            .set_blocklist(
                &Selection::default()
                    .with(Application, "A")
                    .with(WebDomain, "D"),
            )
            .unwrap();
        let p = m
            .mutate(BlockOp::Add(Selection::default().with(Application, "A")))
            .unwrap();
        assert_eq!(p.blocked.total_len(), 1);
        assert_eq!(policy.last().unwrap(), p);
        assert_eq!(policy.labels(), ["shieldAction"]);
    }

    #[test]
    fn remove_then_reset_clears_everything() {
        let (m, store, policy) = mutator();
        store
            .set_blocklist(
                &Selection::default()
                    .with(Application, "A")
                    .with(Application, "B"),
            )
            .unwrap();
        store.set_block_all(true).unwrap();
        let p = m
            .mutate(BlockOp::Remove(Selection::default().with(Application, "A")))
            .unwrap();
        assert_eq!(p.blocked.total_len(), 1);
        assert!(p.block_all);

        let p = m.mutate(BlockOp::Reset).unwrap();
        assert!(p.is_clear());
        assert!(p.whitelist.is_empty());
        assert_eq!(m.effective_policy().unwrap(), p);
        assert_eq!(policy.applied().len(), 2);
    }

    #[test]
    fn disable_only_touches_the_flag() {
        let (m, store, _) = mutator();
        store
            .set_blocklist(&Selection::default().with(Application, "A"))
            .unwrap();
        store.set_block_all(true).unwrap();
        let p = m.mutate(BlockOp::Disable).unwrap();
        assert!(!p.block_all);
        assert_eq!(p.blocked.total_len(), 1);
    }
}
