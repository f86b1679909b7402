//! Host engine collaborator surface.
//!
//! Everything the tick loop needs from the surrounding engine sits behind
//! this trait: the live avatar roster, the session identifier, the viewer
//! position, overlay resource management and the manual-refresh input poll.
//! The engine's scene graph and network layer are opaque to this crate; the
//! integration tests drive the loop against an in-memory mock instead.

use crate::types::{EntitySnapshot, OverlayHandle, SlotHandle, Vec3};

pub trait HostEngine {
    /// Current avatar roster.  The set changes outside this system's
    /// control; offline placeholders are included and filtered by the caller.
    fn roster(&self) -> Vec<EntitySnapshot>;

    /// Identifier of the current room, or empty when not in one.
    fn session_key(&self) -> String;

    /// Viewer (camera) position.
    fn viewer_position(&self) -> Vec3;

    /// True once per press of the manual-refresh input.
    fn refresh_requested(&mut self) -> bool;

    /// Allocate an overlay root with `slots` text slots.
    fn create_overlay(&mut self, slots: usize) -> (OverlayHandle, Vec<SlotHandle>);

    /// Destroy an overlay root and everything under it.
    fn destroy_overlay(&mut self, overlay: OverlayHandle);

    /// Show or hide a whole overlay.
    fn set_overlay_visible(&mut self, overlay: OverlayHandle, visible: bool);

    /// Place an overlay above `position`, facing the viewer.
    fn position_overlay(&mut self, overlay: OverlayHandle, position: Vec3);

    fn set_slot_text(&mut self, slot: SlotHandle, text: &str);

    fn set_slot_visible(&mut self, slot: SlotHandle, visible: bool);
}
