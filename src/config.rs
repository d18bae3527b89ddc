//! Engine-wide knobs. The core takes no configuration source of its own —
//! no files, no env vars, per the Non-goals around I/O — so this is just a
//! plain `Default`-backed struct an embedder fills in, mirroring the
//! teacher's `LamportClock`/`MemoryStorage` defaults.

/// Tunables for the item-state manager. Constructed via [`Default`] or
/// built up field-by-field; never read from the environment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Whether a `ChildReordered` refresh event actually repositions the
    /// affected child entry. Disabling this makes refresh ignore reorder
    /// events entirely (cheap, but the workspace child collection drifts out
    /// of order relative to the server until the next full re-resolution) —
    /// a knob for embedders that don't care about sibling order.
    pub reorder_detection_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reorder_detection_enabled: true,
        }
    }
}
