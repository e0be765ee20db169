//! View angle and the depth -> shift lookup it produces

/// Number of distinct depth values
pub const DEPTH_LEVELS: usize = 256;

/// Default pixels of shift per unit of view angle at the extremes
pub const DEFAULT_PARALLAX_SCALE: f32 = 10.0;

/// Largest shift a table entry may hold, in output pixels
pub const MAX_SHIFT: i32 = 4096;

/// Horizontal pixel shift for every depth value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallaxTable {
    shifts: [i32; DEPTH_LEVELS],
}

impl ParallaxTable {
    /// Interpolate from `angle * k` at depth 0 to `-angle * k` at depth 255,
    /// truncating toward zero.
    pub fn new(view_angle: f32, k: f32) -> Self {
        let mut table = Self::flat();
        table.rebuild(view_angle, k);
        table
    }

    /// Every depth shifts by zero
    pub fn flat() -> Self {
        Self { shifts: [0; DEPTH_LEVELS] }
    }

    /// Table with explicit shifts, each clamped to `MAX_SHIFT`
    pub fn from_shifts(mut shifts: [i32; DEPTH_LEVELS]) -> Self {
        for shift in shifts.iter_mut() {
            *shift = (*shift).clamp(-MAX_SHIFT, MAX_SHIFT);
        }
        Self { shifts }
    }

    pub fn rebuild(&mut self, view_angle: f32, k: f32) {
        let first = view_angle * k;
        let last = -view_angle * k;
        for (i, shift) in self.shifts.iter_mut().enumerate() {
            let t = i as f32 / 255.0;
            // Written as a weighted sum so t = 0 and t = 1 hit the bounds exactly
            *shift = ((first * (1.0 - t) + last * t) as i32).clamp(-MAX_SHIFT, MAX_SHIFT);
        }
    }

    #[inline]
    pub fn shift(&self, depth: u8) -> i32 {
        self.shifts[depth as usize]
    }

    pub fn shifts(&self) -> &[i32; DEPTH_LEVELS] {
        &self.shifts
    }
}

impl Default for ParallaxTable {
    fn default() -> Self {
        Self::flat()
    }
}

/// Scalar view angle clamped to a configured range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngle {
    angle: f32,
    min: f32,
    max: f32,
}

impl ViewAngle {
    /// Starts at 0 clamped into range. A reversed range is swapped; a
    /// non-finite bound falls back to the default range.
    pub fn new(min: f32, max: f32) -> Self {
        if !(min.is_finite() && max.is_finite()) {
            return Self::default();
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            angle: 0.0_f32.clamp(min, max),
            min,
            max,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Add `delta` and clamp; returns the new angle
    pub fn adjust(&mut self, delta: f32) -> f32 {
        let next = self.angle + delta;
        if !next.is_nan() {
            self.angle = next.clamp(self.min, self.max);
        }
        self.angle
    }

    pub fn set(&mut self, angle: f32) -> f32 {
        if !angle.is_nan() {
            self.angle = angle.clamp(self.min, self.max);
        }
        self.angle
    }
}

impl Default for ViewAngle {
    fn default() -> Self {
        Self { angle: 0.0, min: -5.0, max: 0.0 }
    }
}
