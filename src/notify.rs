//! Outbound notifications: the rare-cosmetic gate and the join watcher.

use std::collections::HashSet;

use log::debug;

use crate::rules::RarityTable;
use crate::types::OwnerInfo;

/// Sink for formatted notification messages.  Fire-and-forget; the host's
/// notification display takes it from here.
pub trait NotificationSink {
    fn send(&mut self, message: &str);
}

/// One-shot rare-cosmetic alert per owner per session.
///
/// The gate remembers which owners it has already announced; a session change
/// clears that memory.  Once an owner is recorded, later calls emit nothing
/// even if the descriptor changes.
#[derive(Debug, Default)]
pub struct NotificationGate {
    notified: HashSet<String>,
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce the first rarity match for this owner, at most once per
    /// session.
    pub fn maybe_notify(
        &mut self,
        owner: &OwnerInfo,
        cosmetics: &str,
        rarity: &RarityTable,
        sink: &mut dyn NotificationSink,
    ) {
        if self.notified.contains(&owner.id) {
            return;
        }
        if let Some(label) = rarity.first_substring_match(cosmetics) {
            debug!("Rare cosmetic on {}: {}", owner.id, label);
            sink.send(&format!(
                "<color=red>[RARE]</color> {} has {}",
                owner.display_name, label
            ));
            self.notified.insert(owner.id.clone());
        }
    }

    /// Session changed: every owner may be announced again.
    pub fn reset(&mut self) {
        self.notified.clear();
    }

    #[cfg(test)]
    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }
}

/// Announces players appearing in the roster since the previous tick.
#[derive(Debug, Default)]
pub struct JoinWatcher {
    seen: HashSet<String>,
}

impl JoinWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the owners present this tick and announce the new ones.
    /// Owners who leave are forgotten, so a rejoin announces again.
    pub fn observe<'a>(
        &mut self,
        owners: impl IntoIterator<Item = &'a OwnerInfo>,
        sink: &mut dyn NotificationSink,
    ) {
        let mut current = HashSet::new();
        for owner in owners {
            if current.insert(owner.id.clone()) && !self.seen.contains(&owner.id) {
                sink.send(&format!(
                    "<color=grey>[</color><color=green>JOIN</color><color=grey>] \
                     </color><color=white>Name: {}</color>",
                    owner.display_name
                ));
            }
        }
        self.seen = current;
    }

    /// Session changed: the next roster is all new, but arrivals into a fresh
    /// room should not be announced as joins.
    pub fn reset<'a>(&mut self, owners: impl IntoIterator<Item = &'a OwnerInfo>) {
        self.seen = owners.into_iter().map(|o| o.id.clone()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RarityTable;

    #[derive(Default)]
    struct Recorder {
        messages: Vec<String>,
    }

    impl NotificationSink for Recorder {
        fn send(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    fn owner(id: &str, name: &str) -> OwnerInfo {
        OwnerInfo {
            id: id.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn gate_emits_once_per_session() {
        let rarity = RarityTable::builtin();
        let mut gate = NotificationGate::new();
        let mut sink = Recorder::default();
        let jane = owner("p1", "Jane");

        gate.maybe_notify(&jane, "xxLBAAD.xx", &rarity, &mut sink);
        gate.maybe_notify(&jane, "xxLBAAD.xx", &rarity, &mut sink);
        // Descriptor change after the first emission stays silent too.
        gate.maybe_notify(&jane, "LBANI.", &rarity, &mut sink);
        assert_eq!(sink.messages.len(), 1);
        assert_eq!(
            sink.messages[0],
            "<color=red>[RARE]</color> Jane has Administrator"
        );

        gate.reset();
        gate.maybe_notify(&jane, "xxLBAAD.xx", &rarity, &mut sink);
        assert_eq!(sink.messages.len(), 2);
    }

    #[test]
    fn gate_ignores_unmatched_descriptors() {
        let rarity = RarityTable::builtin();
        let mut gate = NotificationGate::new();
        let mut sink = Recorder::default();

        gate.maybe_notify(&owner("p1", "Jane"), "nothing rare", &rarity, &mut sink);
        assert!(sink.messages.is_empty());
        assert_eq!(gate.notified_count(), 0);
    }

    #[test]
    fn join_watcher_announces_new_arrivals_once() {
        let mut watcher = JoinWatcher::new();
        let mut sink = Recorder::default();
        let jane = owner("p1", "Jane");
        let bob = owner("p2", "Bob");

        watcher.observe([&jane], &mut sink);
        assert_eq!(sink.messages.len(), 1);
        assert!(sink.messages[0].contains("Name: Jane"));

        // Same roster: silence.
        watcher.observe([&jane], &mut sink);
        assert_eq!(sink.messages.len(), 1);

        // Bob arrives.
        watcher.observe([&jane, &bob], &mut sink);
        assert_eq!(sink.messages.len(), 2);
        assert!(sink.messages[1].contains("Name: Bob"));

        // Bob leaves and rejoins: announced again.
        watcher.observe([&jane], &mut sink);
        watcher.observe([&jane, &bob], &mut sink);
        assert_eq!(sink.messages.len(), 3);
    }

    #[test]
    fn join_watcher_reset_swallows_room_entry() {
        let mut watcher = JoinWatcher::new();
        let mut sink = Recorder::default();
        let jane = owner("p1", "Jane");
        let bob = owner("p2", "Bob");

        // Entering a room already containing Jane is not a join.
        watcher.reset([&jane]);
        watcher.observe([&jane], &mut sink);
        assert!(sink.messages.is_empty());

        watcher.observe([&jane, &bob], &mut sink);
        assert_eq!(sink.messages.len(), 1);
        assert!(sink.messages[0].contains("Name: Bob"));
    }
}
