//! 2D pixel buffer with bounds-checked access

/// A row-major 2D grid of pixels.
///
/// The logical size (`width` x `height`) can be smaller than the allocation:
/// buffers grow to a high-water mark and never shrink, so the row pitch
/// (`stride`) is kept private and may exceed `width`.
#[derive(Debug, Clone)]
pub struct PixelBuffer<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    stride: usize,
    rows: usize,
}

impl<T: Copy + Default> PixelBuffer<T> {
    /// Create a buffer filled with `T::default()`
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
            stride: width,
            rows: height,
        }
    }

    /// Wrap row-major pixel data. Returns `None` if the length doesn't match.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            stride: width,
            rows: height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Allocated size, which can be larger than the logical size
    pub fn capacity(&self) -> (usize, usize) {
        (self.stride, self.rows)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.stride + x)
    }

    /// Read a pixel; `None` when (x, y) is outside the buffer
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        self.index(x, y).map(|i| self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index(x, y).map(move |i| &mut self.data[i])
    }

    /// Write a pixel. Out-of-range writes are dropped and return false.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// One logical row (exactly `width` pixels)
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        Some(&self.data[start..start + self.width])
    }

    pub fn row_mut(&mut self, y: usize) -> Option<&mut [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        Some(&mut self.data[start..start + self.width])
    }

    /// Mutable span `[x, x + len)` of row `y`, clipped to the row
    pub fn span_mut(&mut self, x: usize, y: usize, len: usize) -> Option<&mut [T]> {
        let row = self.row_mut(y)?;
        let end = (x + len).min(row.len());
        if x >= end {
            return None;
        }
        Some(&mut row[x..end])
    }

    /// Copy the span `[x, x + len)` of row `src_y` onto row `dst_y`
    pub fn copy_span(&mut self, src_y: usize, dst_y: usize, x: usize, len: usize) -> bool {
        if src_y >= self.height || dst_y >= self.height || x >= self.width {
            return false;
        }
        let len = len.min(self.width - x);
        let src = src_y * self.stride + x;
        let dst = dst_y * self.stride + x;
        self.data.copy_within(src..src + len, dst);
        true
    }

    /// Set every logical pixel to `value`
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            let start = y * self.stride;
            self.data[start..start + self.width].fill(value);
        }
    }

    /// Change the logical size, growing the allocation if it is too small.
    ///
    /// The allocation is never shrunk. When it has to grow the contents are
    /// reset to `T::default()`; otherwise they are left as they were.
    /// Returns true if a reallocation happened.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        let grown = width > self.stride || height > self.rows;
        if grown {
            self.stride = self.stride.max(width);
            self.rows = self.rows.max(height);
            self.data = vec![T::default(); self.stride * self.rows];
        }
        self.width = width;
        self.height = height;
        grown
    }

    /// Grow the logical size to at least `width` x `height`
    pub fn ensure_size(&mut self, width: usize, height: usize) -> bool {
        if width <= self.width && height <= self.height {
            return false;
        }
        self.resize(self.width.max(width), self.height.max(height))
    }

    /// Row-major copy of the logical pixels
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            let start = y * self.stride;
            out.extend_from_slice(&self.data[start..start + self.width]);
        }
        out
    }
}
