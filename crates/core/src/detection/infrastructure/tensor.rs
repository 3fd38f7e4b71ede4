use ndarray::Array4;

use crate::shared::frame::{Frame, CHANNELS};

/// Nearest-neighbour resize of `frame` to `size`×`size`, normalized as
/// `(value - mean) / std`, in NCHW layout.
pub fn nchw_tensor(frame: &Frame, size: usize, mean: f32, std: f32) -> Array4<f32> {
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let data = frame.data();

    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as usize).min(src_h - 1);
        for x in 0..size {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / size as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * CHANNELS;
            for c in 0..CHANNELS {
                tensor[[0, c, y, x]] = (data[offset + c] as f32 - mean) / std;
            }
        }
    }

    tensor
}
