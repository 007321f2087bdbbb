//! Optimistic watchlist sync: the client-side toggle state machine as a pure
//! reducer, independently testable without a UI or a network.
//!
//! A toggle flips the visible membership immediately and records the target
//! as pending until the server settles it. Settlement events are not
//! correlated with individual requests; rapid re-toggles race and the last
//! settlement to arrive wins, which is exactly the behavior of the shipped
//! client.

use std::collections::HashMap;

use crate::models::normalize_symbol;

/// Per-symbol sync state. `committed` is the last server-acknowledged
/// membership; `pending` is the optimistic target of an in-flight toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolState {
    pub committed: bool,
    pub pending: Option<bool>,
}

impl SymbolState {
    /// What the UI shows: the optimistic target when a toggle is in flight,
    /// the committed membership otherwise.
    pub fn visible(&self) -> bool {
        self.pending.unwrap_or(self.committed)
    }
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// User toggled a symbol's membership
    Toggle(String),
    /// Server accepted the in-flight mutation
    Confirmed(String),
    /// Server answered with a non-success status
    Rejected(String),
    /// The request never completed
    ConnectionLost(String),
    /// Authoritative membership fetched from the server (mount-time refetch)
    Reconcile(Vec<String>),
}

/// Which request the client should issue for a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Add,
    Remove,
}

/// Side effects the caller must carry out after a reduction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send { symbol: String, request: Request },
    Notify { message: String },
}

/// The set of symbols the client currently believes are on the watchlist.
#[derive(Debug, Clone, Default)]
pub struct WatchlistSync {
    symbols: HashMap<String, SymbolState>,
}

impl WatchlistSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, symbol: &str) -> SymbolState {
        self.symbols
            .get(&normalize_symbol(symbol))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_visible_member(&self, symbol: &str) -> bool {
        self.state(symbol).visible()
    }

    /// Symbols currently shown as members, sorted for stable rendering.
    pub fn visible_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .symbols
            .iter()
            .filter(|(_, state)| state.visible())
            .map(|(symbol, _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols
    }

    /// Advance the state machine, returning the effects to carry out.
    pub fn apply(&mut self, event: SyncEvent) -> Vec<Effect> {
        match event {
            SyncEvent::Toggle(symbol) => {
                let symbol = normalize_symbol(&symbol);
                let state = self.symbols.entry(symbol.clone()).or_default();
                let target = !state.visible();
                state.pending = Some(target);

                let request = if target { Request::Add } else { Request::Remove };
                vec![Effect::Send { symbol, request }]
            }
            SyncEvent::Confirmed(symbol) => {
                let symbol = normalize_symbol(&symbol);
                if let Some(state) = self.symbols.get_mut(&symbol) {
                    if let Some(target) = state.pending.take() {
                        state.committed = target;
                    }
                }
                Vec::new()
            }
            SyncEvent::Rejected(symbol) => {
                let symbol = normalize_symbol(&symbol);
                if let Some(state) = self.symbols.get_mut(&symbol) {
                    state.pending = None;
                }
                vec![Effect::Notify {
                    message: "Failed to update watchlist".to_string(),
                }]
            }
            SyncEvent::ConnectionLost(symbol) => {
                // Same compensating revert as a rejection, silently reconciled
                let symbol = normalize_symbol(&symbol);
                if let Some(state) = self.symbols.get_mut(&symbol) {
                    state.pending = None;
                }
                Vec::new()
            }
            SyncEvent::Reconcile(symbols) => {
                // Server state is ground truth: locally inferred flags and
                // any in-flight optimism are overwritten wholesale.
                self.symbols = symbols
                    .into_iter()
                    .map(|s| {
                        (
                            normalize_symbol(&s),
                            SymbolState {
                                committed: true,
                                pending: None,
                            },
                        )
                    })
                    .collect();
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_applies_optimistically_and_requests_an_add() {
        let mut sync = WatchlistSync::new();
        assert!(!sync.is_visible_member("TSLA"));

        let effects = sync.apply(SyncEvent::Toggle("TSLA".to_string()));

        assert!(sync.is_visible_member("TSLA"));
        assert_eq!(
            effects,
            vec![Effect::Send {
                symbol: "TSLA".to_string(),
                request: Request::Add
            }]
        );
    }

    #[test]
    fn rejection_reverts_and_notifies() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("TSLA".to_string()));
        assert!(sync.is_visible_member("TSLA"));

        let effects = sync.apply(SyncEvent::Rejected("TSLA".to_string()));

        assert!(!sync.is_visible_member("TSLA"));
        assert_eq!(
            effects,
            vec![Effect::Notify {
                message: "Failed to update watchlist".to_string()
            }]
        );
    }

    #[test]
    fn connection_loss_reverts_silently() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("TSLA".to_string()));

        let effects = sync.apply(SyncEvent::ConnectionLost("TSLA".to_string()));

        assert!(!sync.is_visible_member("TSLA"));
        assert!(effects.is_empty());
    }

    #[test]
    fn confirmation_commits_the_pending_target() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("AAPL".to_string()));
        sync.apply(SyncEvent::Confirmed("AAPL".to_string()));

        assert_eq!(
            sync.state("AAPL"),
            SymbolState {
                committed: true,
                pending: None
            }
        );

        // A later rejection with nothing in flight changes no state
        sync.apply(SyncEvent::Rejected("AAPL".to_string()));
        assert!(sync.is_visible_member("AAPL"));
    }

    #[test]
    fn toggling_a_member_requests_a_remove() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Reconcile(vec!["MSFT".to_string()]));

        let effects = sync.apply(SyncEvent::Toggle("MSFT".to_string()));

        assert!(!sync.is_visible_member("MSFT"));
        assert_eq!(
            effects,
            vec![Effect::Send {
                symbol: "MSFT".to_string(),
                request: Request::Remove
            }]
        );
    }

    #[test]
    fn rapid_double_toggle_lets_the_last_settlement_win() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("TSLA".to_string()));
        sync.apply(SyncEvent::Toggle("TSLA".to_string()));
        assert!(!sync.is_visible_member("TSLA"));

        // Settlements are not correlated with requests: whichever arrives
        // commits whatever is pending at that moment.
        sync.apply(SyncEvent::Confirmed("TSLA".to_string()));
        assert!(!sync.is_visible_member("TSLA"));

        sync.apply(SyncEvent::Confirmed("TSLA".to_string()));
        assert!(!sync.is_visible_member("TSLA"));
    }

    #[test]
    fn reconcile_overwrites_local_flags_with_server_truth() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("TSLA".to_string()));
        sync.apply(SyncEvent::Toggle("AAPL".to_string()));
        sync.apply(SyncEvent::Confirmed("AAPL".to_string()));

        sync.apply(SyncEvent::Reconcile(vec![
            "msft".to_string(),
            "NFLX".to_string(),
        ]));

        assert_eq!(sync.visible_symbols(), vec!["MSFT", "NFLX"]);
        assert!(!sync.is_visible_member("TSLA"));
        assert!(!sync.is_visible_member("AAPL"));
    }

    #[test]
    fn symbols_are_tracked_case_insensitively() {
        let mut sync = WatchlistSync::new();
        sync.apply(SyncEvent::Toggle("tsla".to_string()));
        assert!(sync.is_visible_member("TSLA"));
    }
}
