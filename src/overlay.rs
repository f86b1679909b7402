//! Overlay registry and the per-tick reconciliation driver.
//!
//! The registry owns every overlay resource: it is the only place that
//! creates or destroys them, so each overlay is destroyed exactly once,
//! either when its avatar drops out of the roster or on full teardown.
//! [`TagService::tick`] runs once per host frame and never blocks; the
//! directory refresh it may kick off completes on the tokio runtime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};

use crate::config::Config;
use crate::directory::{DirectoryCache, HttpFetcher};
use crate::host::HostEngine;
use crate::notify::{JoinWatcher, NotificationGate, NotificationSink};
use crate::render::render_lines;
use crate::rules::RuleTables;
use crate::types::{EntityKey, OverlayHandle, SlotHandle};

/// One overlay root plus its text slots, owned by the registry.
#[derive(Debug)]
pub struct OverlayEntry {
    pub root: OverlayHandle,
    pub slots: Vec<SlotHandle>,
}

/// Owns the mapping from tracked avatar to overlay resources.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    entries: HashMap<EntityKey, OverlayEntry>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entries.keys().copied()
    }

    /// Sole creation point.  Returns the existing entry or allocates one.
    fn ensure(
        &mut self,
        key: EntityKey,
        line_budget: usize,
        host: &mut dyn HostEngine,
    ) -> &OverlayEntry {
        self.entries.entry(key).or_insert_with(|| {
            debug!("Creating overlay for entity {:?}", key);
            let (root, slots) = host.create_overlay(line_budget);
            OverlayEntry { root, slots }
        })
    }

    /// Drop every entry whose avatar is no longer live.
    fn sweep(&mut self, live: &HashSet<EntityKey>, host: &mut dyn HostEngine) {
        let orphans: Vec<EntityKey> = self
            .entries
            .keys()
            .filter(|key| !live.contains(key))
            .copied()
            .collect();
        for key in orphans {
            if let Some(entry) = self.entries.remove(&key) {
                debug!("Destroying orphan overlay for entity {:?}", key);
                host.destroy_overlay(entry.root);
            }
        }
    }

    /// Destroy everything.  Used on session change and at shutdown.
    fn teardown(&mut self, host: &mut dyn HostEngine) {
        for (_, entry) in self.entries.drain() {
            host.destroy_overlay(entry.root);
        }
    }
}

/// The reconciliation loop, driven once per host frame.
///
/// Owns the directory cache, the overlay registry and the notification
/// state; constructed explicitly at startup and torn down at shutdown, with
/// no ambient globals.
pub struct TagService {
    config: Config,
    tables: RuleTables,
    cache: DirectoryCache,
    registry: OverlayRegistry,
    gate: NotificationGate,
    joins: JoinWatcher,
    last_session: Option<String>,
}

impl TagService {
    pub fn new(config: Config, tables: RuleTables, cache: DirectoryCache) -> Self {
        Self {
            config,
            tables,
            cache,
            registry: OverlayRegistry::new(),
            gate: NotificationGate::new(),
            joins: JoinWatcher::new(),
            last_session: None,
        }
    }

    /// Convenience constructor wiring the production HTTP fetcher from the
    /// configured directory URL.
    pub fn with_http(config: Config, runtime: tokio::runtime::Handle) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(config.directory_url.clone()));
        let cache = DirectoryCache::new(
            fetcher,
            std::time::Duration::from_secs(config.refresh_interval_secs),
            runtime,
        );
        Self::new(config, RuleTables::builtin(), cache)
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    /// One reconciliation pass.
    ///
    /// Order matters: session invalidation first, then the orphan sweep,
    /// then the roster scan.  Processing order across entities within the
    /// scan is unspecified.
    pub fn tick(&mut self, host: &mut dyn HostEngine, sink: &mut dyn NotificationSink) {
        self.cache.maybe_refresh();
        if host.refresh_requested() {
            self.cache.force_refresh();
        }

        let session = host.session_key();
        let session_changed = self.last_session.as_deref() != Some(session.as_str());
        if session_changed {
            info!("Session changed to {:?}, tearing down overlays", session);
            self.registry.teardown(host);
            self.gate.reset();
            self.last_session = Some(session);
        }

        let roster = host.roster();
        let live: HashSet<EntityKey> = roster
            .iter()
            .filter(|e| !e.offline && e.owner.is_some())
            .map(|e| e.key)
            .collect();
        self.registry.sweep(&live, host);

        if self.config.notify_joins {
            let owners = roster
                .iter()
                .filter(|e| !e.offline)
                .filter_map(|e| e.owner.as_ref());
            if session_changed {
                // Arriving into a room is not a join event for its occupants.
                self.joins.reset(owners);
            } else {
                self.joins.observe(owners, sink);
            }
        }

        let snapshot = self.cache.current();
        let viewer = host.viewer_position();
        for entity in &roster {
            if entity.offline {
                continue;
            }
            let owner = match &entity.owner {
                Some(owner) => owner,
                None => continue,
            };

            let entry = self
                .registry
                .ensure(entity.key, self.config.line_budget, host);

            // Hide, do not destroy, outside the display radius: entities at
            // the boundary would otherwise thrash allocation.
            let visible = match self.config.max_display_distance {
                None => true,
                Some(max) => viewer.distance(entity.head_position) <= max,
            };
            host.set_overlay_visible(entry.root, visible);
            if !visible {
                continue;
            }

            let lines = render_lines(entity, &snapshot, &self.tables, self.config.line_budget);
            for (slot, text) in entry.slots.iter().zip(&lines) {
                host.set_slot_text(*slot, text);
                host.set_slot_visible(*slot, !text.is_empty());
            }
            host.position_overlay(entry.root, entity.head_position);

            self.gate
                .maybe_notify(owner, &entity.cosmetics, &self.tables.rarity, sink);
        }
    }

    /// Release every owned resource.  Call once at shutdown.
    pub fn teardown(&mut self, host: &mut dyn HostEngine) {
        self.registry.teardown(host);
        self.gate.reset();
        self.last_session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntitySnapshot, Vec3};

    /// Minimal host: counts creates and destroys, nothing else.
    #[derive(Default)]
    struct CountingHost {
        next: u64,
        created: usize,
        destroyed: Vec<u64>,
    }

    impl HostEngine for CountingHost {
        fn roster(&self) -> Vec<EntitySnapshot> {
            Vec::new()
        }
        fn session_key(&self) -> String {
            String::new()
        }
        fn viewer_position(&self) -> Vec3 {
            Vec3::default()
        }
        fn refresh_requested(&mut self) -> bool {
            false
        }
        fn create_overlay(&mut self, slots: usize) -> (OverlayHandle, Vec<SlotHandle>) {
            self.created += 1;
            let root = self.next;
            self.next += 1;
            let slot_ids = (0..slots)
                .map(|_| {
                    let id = self.next;
                    self.next += 1;
                    SlotHandle(id)
                })
                .collect();
            (OverlayHandle(root), slot_ids)
        }
        fn destroy_overlay(&mut self, overlay: OverlayHandle) {
            assert!(
                !self.destroyed.contains(&overlay.0),
                "double free of overlay {}",
                overlay.0
            );
            self.destroyed.push(overlay.0);
        }
        fn set_overlay_visible(&mut self, _: OverlayHandle, _: bool) {}
        fn position_overlay(&mut self, _: OverlayHandle, _: Vec3) {}
        fn set_slot_text(&mut self, _: SlotHandle, _: &str) {}
        fn set_slot_visible(&mut self, _: SlotHandle, _: bool) {}
    }

    #[test]
    fn ensure_is_idempotent_per_key() {
        let mut registry = OverlayRegistry::new();
        let mut host = CountingHost::default();

        let root_a = registry.ensure(EntityKey(7), 5, &mut host).root;
        let root_b = registry.ensure(EntityKey(7), 5, &mut host).root;
        assert_eq!(root_a, root_b);
        assert_eq!(host.created, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ensure(EntityKey(7), 5, &mut host).slots.len(), 5);
    }

    #[test]
    fn sweep_destroys_only_orphans() {
        let mut registry = OverlayRegistry::new();
        let mut host = CountingHost::default();

        let kept = registry.ensure(EntityKey(1), 5, &mut host).root;
        let orphan = registry.ensure(EntityKey(2), 5, &mut host).root;

        let live: HashSet<EntityKey> = [EntityKey(1)].into_iter().collect();
        registry.sweep(&live, &mut host);

        assert!(registry.contains(EntityKey(1)));
        assert!(!registry.contains(EntityKey(2)));
        assert_eq!(host.destroyed, vec![orphan.0]);

        // Sweeping again with the same roster destroys nothing further.
        registry.sweep(&live, &mut host);
        assert_eq!(host.destroyed.len(), 1);
        assert_ne!(kept.0, orphan.0);
    }

    #[test]
    fn teardown_then_sweep_never_double_frees() {
        let mut registry = OverlayRegistry::new();
        let mut host = CountingHost::default();

        registry.ensure(EntityKey(1), 5, &mut host);
        registry.ensure(EntityKey(2), 5, &mut host);
        registry.teardown(&mut host);
        assert!(registry.is_empty());
        assert_eq!(host.destroyed.len(), 2);

        // CountingHost panics on double free; an empty sweep must not trip it.
        registry.sweep(&HashSet::new(), &mut host);
        registry.teardown(&mut host);
        assert_eq!(host.destroyed.len(), 2);
    }
}
