use crate::Error;

/// Number of interleaved channels in an RGBA buffer.
pub const RGBA_CHANNELS: usize = 4;
/// Index of the alpha channel inside an RGBA pixel.
pub const ALPHA_CHANNEL: usize = 3;

/// Single-plane, row-major grid. Element `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Linear index of `(x, y)`, or `None` outside the grid.
    pub fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Linear index of `(x + dx, y + dy)`, or `None` if the offset leaves the grid.
    pub fn offset_index(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<usize> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.index_of(nx, ny)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index_of(x, y).and_then(|idx| self.data.get(idx))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Image<U> {
        Image {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

/// Interleaved float pixel buffer (`channels` values per pixel, row-major).
///
/// Values are conventionally in `[0, 1]` but are never clamped here.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl ColorImage {
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, Error> {
        if channels == 0 {
            return Err(Error::InvalidChannels(channels));
        }

        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Zero-filled RGBA buffer.
    pub fn new_rgba(width: usize, height: usize) -> Result<Self, Error> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(RGBA_CHANNELS))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: 0,
            })?;
        Self::from_vec(width, height, RGBA_CHANNELS, vec![0.0; len])
    }

    /// Converts 8-bit samples to floats in `[0, 1]`.
    pub fn from_u8(
        width: usize,
        height: usize,
        channels: usize,
        samples: &[u8],
    ) -> Result<Self, Error> {
        let data = samples.iter().map(|&v| v as f32 / 255.0).collect();
        Self::from_vec(width, height, channels, data)
    }

    /// Quantizes to 8 bits, clamping to `[0, 1]` first. NaN maps to 0.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| {
                let c = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                (c * 255.0).round() as u8
            })
            .collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.channels)
    }

    /// Extracts one channel as its own plane.
    pub fn channel(&self, c: usize) -> Result<Image<f32>, Error> {
        if c >= self.channels {
            return Err(Error::OutOfBounds);
        }
        let plane = self.pixels().map(|px| px[c]).collect();
        Image::from_vec(self.width, self.height, plane)
    }

    /// Alpha plane of an RGBA buffer.
    pub fn alpha_channel(&self) -> Result<Image<f32>, Error> {
        if self.channels != RGBA_CHANNELS {
            return Err(Error::InvalidChannels(self.channels));
        }
        self.channel(ALPHA_CHANNEL)
    }
}
