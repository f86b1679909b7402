//! Live trust nametags for a multiplayer VR space.
//!
//! Overlays an informational tag above every nearby avatar, combining a
//! periodically refreshed remote trust directory with attributes read from
//! each avatar's live state (frame rate, cosmetics, session properties).
//!
//! The host engine is an external collaborator behind the
//! [`host::HostEngine`] trait.  Embedders construct a [`TagService`] at
//! startup, call [`TagService::tick`] once per frame and
//! [`TagService::teardown`] at shutdown:
//!
//! ```no_run
//! use trusttags::{Config, TagService};
//!
//! # fn demo(host: &mut dyn trusttags::host::HostEngine,
//! #         sink: &mut dyn trusttags::notify::NotificationSink) -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let mut service = TagService::with_http(config, tokio::runtime::Handle::current());
//! loop {
//!     service.tick(host, sink);
//! }
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod host;
pub mod notify;
pub mod overlay;
pub mod render;
pub mod rules;
pub mod types;

pub use config::Config;
pub use directory::{DirectoryCache, DirectoryFetcher, FetchError, HttpFetcher};
pub use notify::{JoinWatcher, NotificationGate, NotificationSink};
pub use overlay::{OverlayRegistry, TagService};
pub use render::render_lines;
pub use rules::{PropertyTable, RarityTable, RuleTables};
pub use types::{
    DirectorySnapshot, EntityKey, EntitySnapshot, OverlayHandle, OwnerInfo, SlotHandle,
    TrustRecord, Vec3,
};
