use image::RgbImage;
use ndarray::ArrayView3;

/// A single camera frame or still image: contiguous RGB bytes in row-major order.
///
/// `index` is the sequence number assigned by the producing stream; still
/// images and snapshots use 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, index)
    }

    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `[x1, x2) x [y1, y2)`, clamped to the frame.
    pub fn crop(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Frame> {
        let x1 = x1.clamp(0, self.width as i32) as usize;
        let y1 = y1.clamp(0, self.height as i32) as usize;
        let x2 = x2.clamp(0, self.width as i32) as usize;
        let y2 = y2.clamp(0, self.height as i32) as usize;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let stride = self.width as usize * CHANNELS;
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * CHANNELS);
        for row in y1..y2 {
            let start = row * stride + x1 * CHANNELS;
            data.extend_from_slice(&self.data[start..start + (x2 - x1) * CHANNELS]);
        }
        Some(Frame::new(data, (x2 - x1) as u32, (y2 - y1) as u32, 0))
    }
}
