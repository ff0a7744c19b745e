use std::fmt;

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A render surface handed out by a `RenderTarget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub id: u64,
    pub size: Dimensions,
}

/// Physical place scenes draw into.
pub trait RenderTarget: Send {
    /// Allocate a surface, or `None` if the target is not available.
    fn allocate(&mut self, size: Dimensions) -> Option<Surface>;

    fn release(&mut self, surface: Surface);
}

/// In-process target for terminals and tests. Never draws anything.
#[derive(Debug, Clone, Default)]
pub struct HeadlessTarget {
    unavailable: bool,
    next_id: u64,
    live: Vec<u64>,
}

impl HeadlessTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that refuses every allocation.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Surfaces allocated and not yet released.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.live.len()
    }
}

impl RenderTarget for HeadlessTarget {
    fn allocate(&mut self, size: Dimensions) -> Option<Surface> {
        if self.unavailable || size.width == 0 || size.height == 0 {
            return None;
        }
        self.next_id += 1;
        self.live.push(self.next_id);
        Some(Surface {
            id: self.next_id,
            size,
        })
    }

    fn release(&mut self, surface: Surface) {
        self.live.retain(|id| *id != surface.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_tracks_live_surfaces() {
        let mut target = HeadlessTarget::new();
        let a = target.allocate(Dimensions::new(640, 480)).unwrap();
        let b = target.allocate(Dimensions::new(320, 240)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(target.live_surfaces(), 2);

        target.release(a);
        assert_eq!(target.live_surfaces(), 1);
    }

    #[test]
    fn zero_sized_or_unavailable_targets_refuse() {
        assert!(HeadlessTarget::new().allocate(Dimensions::new(0, 10)).is_none());
        assert!(
            HeadlessTarget::unavailable()
                .allocate(Dimensions::new(10, 10))
                .is_none()
        );
    }
}
