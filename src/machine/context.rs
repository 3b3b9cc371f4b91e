//! Typed mission context shared across one machine scope.
//!
//! The context is a statically-typed record instead of a name-keyed map:
//! states declare which keys they read and write, and renames at a
//! nested-machine boundary go through a rename table validated when the
//! machine is built. A typo in a key or rename is a construction error, not
//! a silently-created new key.

/// Keys into the shared mission context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKey {
    TargetPixelX,
    TargetFrameWidth,
    SearchStatus,
    SearchConfidence,
}

/// Value type stored under a context key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    F32,
    Status,
}

impl ContextKey {
    pub fn kind(&self) -> ValueKind {
        match self {
            ContextKey::TargetPixelX
            | ContextKey::TargetFrameWidth
            | ContextKey::SearchConfidence => ValueKind::F32,
            ContextKey::SearchStatus => ValueKind::Status,
        }
    }
}

/// Result of the most recent search tick, as seen by the track states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchStatus {
    #[default]
    Unseen,
    Found,
}

/// A value read from or written to the context through a [`ContextKey`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContextValue {
    F32(f32),
    Status(SearchStatus),
}

/// Shared typed record threaded through the state executions of one mission.
///
/// Created once at mission start and alive for the whole execution; exactly
/// one state writes it at any instant because execution is sequential.
#[derive(Clone, Copy, Debug)]
pub struct MissionContext {
    /// Last reported detection pixel x (sentinel -1.0 before detection)
    pub pixel_x: f32,
    /// Last reported camera frame width (sentinel -1.0 before detection)
    pub frame_w: f32,
    /// Whether the last search tick saw the target
    pub status: SearchStatus,
    /// Last reported detector confidence
    pub confidence: f32,
}

impl Default for MissionContext {
    fn default() -> Self {
        Self {
            pixel_x: -1.0,
            frame_w: -1.0,
            status: SearchStatus::Unseen,
            confidence: 0.0,
        }
    }
}

impl MissionContext {
    pub fn get(&self, key: ContextKey) -> ContextValue {
        match key {
            ContextKey::TargetPixelX => ContextValue::F32(self.pixel_x),
            ContextKey::TargetFrameWidth => ContextValue::F32(self.frame_w),
            ContextKey::SearchStatus => ContextValue::Status(self.status),
            ContextKey::SearchConfidence => ContextValue::F32(self.confidence),
        }
    }

    pub fn set(&mut self, key: ContextKey, value: ContextValue) {
        match (key, value) {
            (ContextKey::TargetPixelX, ContextValue::F32(v)) => self.pixel_x = v,
            (ContextKey::TargetFrameWidth, ContextValue::F32(v)) => self.frame_w = v,
            (ContextKey::SearchStatus, ContextValue::Status(s)) => self.status = s,
            (ContextKey::SearchConfidence, ContextValue::F32(v)) => self.confidence = v,
            (key, value) => {
                // Unreachable once the machine builder has validated renames.
                tracing::error!("Type mismatch writing {:?} = {:?}, ignoring", key, value);
            }
        }
    }
}

/// One rename crossing a nested-machine boundary: the parent's `outer` key
/// is presented to the child as `inner`.
#[derive(Clone, Copy, Debug)]
pub struct Remap {
    pub outer: ContextKey,
    pub inner: ContextKey,
}

/// Validated rename table for one machine boundary.
///
/// Built only through the machine builder, which checks every `inner` key is
/// declared by a child state and that value types agree.
#[derive(Clone, Debug, Default)]
pub struct RemapTable {
    pub(crate) entries: Vec<Remap>,
}

impl RemapTable {
    /// Copy parent-scope values into the child's names on machine entry.
    pub fn apply_inbound(&self, ctx: &mut MissionContext) {
        for remap in &self.entries {
            let value = ctx.get(remap.outer);
            ctx.set(remap.inner, value);
        }
    }

    /// Copy child-scope values back to the parent's names on machine exit.
    pub fn apply_outbound(&self, ctx: &mut MissionContext) {
        for remap in &self.entries {
            let value = ctx.get(remap.inner);
            ctx.set(remap.outer, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_sentinel_values() {
        let ctx = MissionContext::default();
        assert_eq!(ctx.pixel_x, -1.0);
        assert_eq!(ctx.status, SearchStatus::Unseen);
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut ctx = MissionContext::default();
        ctx.set(ContextKey::TargetPixelX, ContextValue::F32(120.0));
        ctx.set(
            ContextKey::SearchStatus,
            ContextValue::Status(SearchStatus::Found),
        );
        assert_eq!(ctx.get(ContextKey::TargetPixelX), ContextValue::F32(120.0));
        assert_eq!(
            ctx.get(ContextKey::SearchStatus),
            ContextValue::Status(SearchStatus::Found)
        );
    }

    #[test]
    fn test_remap_copies_between_keys() {
        let mut ctx = MissionContext::default();
        ctx.set(ContextKey::TargetPixelX, ContextValue::F32(300.0));
        let table = RemapTable {
            entries: vec![Remap {
                outer: ContextKey::TargetPixelX,
                inner: ContextKey::TargetFrameWidth,
            }],
        };
        table.apply_inbound(&mut ctx);
        assert_eq!(ctx.frame_w, 300.0);
    }
}
