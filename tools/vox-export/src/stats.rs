//! Running min/max accumulators

/// Single-pass (min, max) over `f32` values
///
/// NaN values are skipped. `range()` is `None` until at least one non-NaN
/// value has been pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningRange {
    min: f32,
    max: f32,
    seen: bool,
}

impl Default for RunningRange {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningRange {
    pub const fn new() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            seen: false,
        }
    }

    #[inline]
    pub fn push(&mut self, v: f32) {
        if v.is_nan() {
            return;
        }
        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }
        self.seen = true;
    }

    /// Fold little-endian `f32` values packed in `bytes`
    pub fn push_le_bytes(&mut self, bytes: &[u8]) {
        for c in bytes.chunks_exact(4) {
            self.push(f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        }
    }

    pub fn range(&self) -> Option<[f32; 2]> {
        self.seen.then_some([self.min, self.max])
    }
}

/// Per-axis ranges for emitted point coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisBounds {
    pub x: RunningRange,
    pub y: RunningRange,
    pub z: RunningRange,
}

impl AxisBounds {
    #[inline]
    pub fn push(&mut self, [x, y, z]: [f32; 3]) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }
}
