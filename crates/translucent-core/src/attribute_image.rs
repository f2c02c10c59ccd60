//! Dense 2D grids of per-pixel attributes.

use crate::error::{Result, TranslucentError};

/// A row-major 2D grid holding one attribute value per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeImage<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> AttributeImage<T> {
    /// Creates an image filled with `value`.
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wraps row-major pixel data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(TranslucentError::SizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the image.
    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[y * self.width + x]
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the image.
    pub fn get_checked(&self, x: usize, y: usize) -> Option<T> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Row-major pixel data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Iterates over `(x, y, value)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let width = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % width, i / width, v))
    }

    /// Halves the resolution, combining each 2x2 block with `reduce`.
    ///
    /// Odd trailing rows and columns are dropped.
    pub fn downsample(&self, reduce: impl Fn(T, T, T, T) -> T) -> Self {
        Self::from_fn(self.width / 2, self.height / 2, |x, y| {
            reduce(
                self.get(2 * x, 2 * y),
                self.get(2 * x + 1, 2 * y),
                self.get(2 * x, 2 * y + 1),
                self.get(2 * x + 1, 2 * y + 1),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = AttributeImage::from_vec(3, 2, vec![0.0_f32; 5]);
        assert!(matches!(
            result,
            Err(TranslucentError::SizeMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_row_major_layout() {
        let image = AttributeImage::from_fn(3, 2, |x, y| y * 10 + x);
        assert_eq!(image.data(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(image.get(2, 1), 12);
        assert_eq!(image.get_checked(3, 0), None);
        let collected: Vec<_> = image.pixels().collect();
        assert_eq!(collected[4], (1, 1, 11));
    }

    #[test]
    fn test_downsample_shape_floors() {
        let image = AttributeImage::new(7, 5, 1.0_f32);
        let half = image.downsample(|a, b, c, d| (a + b + c + d) / 4.0);
        assert_eq!(half.dimensions(), (3, 2));
        let quarter = half.downsample(|a, b, c, d| (a + b + c + d) / 4.0);
        assert_eq!(quarter.dimensions(), (1, 1));
        assert_eq!(quarter.downsample(|a, _, _, _| a).dimensions(), (0, 0));
    }

    #[test]
    fn test_downsample_block_mapping() {
        let image = AttributeImage::from_fn(4, 4, |x, y| (y * 4 + x) as f32);
        let mean = image.downsample(|a, b, c, d| (a + b + c + d) / 4.0);
        // Block (1, 0) covers pixels 2, 3, 6, 7.
        assert_eq!(mean.get(1, 0), 4.5);
        let min = image.downsample(|a, b, c, d| a.min(b).min(c.min(d)));
        assert_eq!(min.get(0, 1), 8.0);
    }

    proptest! {
        #[test]
        fn prop_min_max_aggregation_bounds(
            width in 2usize..12,
            height in 2usize..12,
            seed in proptest::collection::vec(-100.0f32..100.0, 144),
        ) {
            let image = AttributeImage::from_fn(width, height, |x, y| seed[y * 12 + x]);
            let min = image.downsample(|a, b, c, d| a.min(b).min(c.min(d)));
            let max = image.downsample(|a, b, c, d| a.max(b).max(c.max(d)));
            prop_assert_eq!(min.dimensions(), (width / 2, height / 2));
            for (x, y, lo) in min.pixels() {
                let hi = max.get(x, y);
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let v = image.get(2 * x + dx, 2 * y + dy);
                    prop_assert!(lo <= v);
                    prop_assert!(hi >= v);
                }
            }
        }
    }
}
