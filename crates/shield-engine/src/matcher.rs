//! Find the selections that contain a blocked entity.

use std::sync::Arc;

use shield_store::SelectionStore;
use shield_types::{Selection, Token, TokenKind};
use tracing::{debug, trace};

use crate::{Result, deps::MonitorRegistry};

/// Read-only matcher over the persisted selections.
#[derive(Clone)]
pub struct SelectionMatcher {
    /// Selection source.
    store: SelectionStore,
    /// Monitoring-active collaborator.
    monitors: Arc<dyn MonitorRegistry>,
}

impl SelectionMatcher {
    /// Create a matcher.
    pub fn new(store: SelectionStore, monitors: Arc<dyn MonitorRegistry>) -> Self {
        Self { store, monitors }
    }

    /// Selections whose `kind` set contains `token`.
    ///
    /// With `only_monitored`, selections without a live monitor are dropped.
    /// With `sort_by_granularity`, narrower selections (fewer tokens across all
    /// kinds) come first and ties break on id. An empty result is not an error.
    pub fn find_matching_selections(
        &self,
        token: &Token,
        kind: TokenKind,
        only_monitored: bool,
        sort_by_granularity: bool,
    ) -> Result<Vec<Selection>> {
        let all = self.store.selections()?;
        let total = all.len();
        let mut matches: Vec<Selection> = all
            .into_iter()
            .filter(|s| s.contains(kind, token))
            .filter(|s| {
                let keep = !only_monitored || self.monitors.is_selection_monitored(&s.id);
                if !keep {
                    trace!(selection = %s.id, "match dropped: not monitored");
                }
                keep
            })
            .collect();
        if sort_by_granularity {
            sort_by_granularity_then_id(&mut matches);
        }
        debug!(
            %kind,
            total,
            matched = matches.len(),
            only_monitored,
            "selection_match"
        );
        Ok(matches)
    }
}

/// Most specific first; ties broken by id for determinism.
pub(crate) fn sort_by_granularity_then_id(selections: &mut [Selection]) {
    selections.sort_by(|a, b| {
        a.total_len()
            .cmp(&b.total_len())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use shield_types::TokenKind::{Application, Category, WebDomain};

    use super::*;

    fn sel(id: &str, n: usize) -> Selection {
        (0..n).fold(Selection::new(id), |s, i| s.with(Category, format!("c{i}")))
    }

    #[test]
    fn granularity_orders_narrow_first_then_id() {
        let mut v = vec![sel("b", 5), sel("z", 1), sel("a", 1), sel("m", 3)];
        sort_by_granularity_then_id(&mut v);
        let ids: Vec<_> = v.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "z", "m", "b"]);
    }

    #[test]
    fn total_counts_every_kind() {
        let wide = Selection::new("wide")
            .with(Application, "x")
            .with(WebDomain, "d1")
            .with(WebDomain, "d2");
        let narrow = Selection::new("narrow")
            .with(Application, "x")
            .with(Category, "c");
        let mut v = vec![wide, narrow];
        sort_by_granularity_then_id(&mut v);
        assert_eq!(v[0].id, "narrow");
    }
}
