//! Five-point similarity alignment onto the ArcFace 112×112 template.

use crate::shared::frame::{Frame, CHANNELS};

pub const ALIGNED_SIZE: u32 = 112;

/// Canonical anchor positions in a 112×112 ArcFace crop: left eye, right eye,
/// nose tip, left mouth corner, right mouth corner.
pub const ARCFACE_TEMPLATE: [(f64, f64); 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

/// `q = [a -b; b a] p + t` (rotation, uniform scale, translation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Similarity {
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        )
    }

    pub fn invert(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let s = self.a * self.a + self.b * self.b;
        let dx = x - self.tx;
        let dy = y - self.ty;
        (
            (self.a * dx + self.b * dy) / s,
            (-self.b * dx + self.a * dy) / s,
        )
    }
}

/// Least-squares similarity transform mapping `src` onto `dst`.
///
/// Returns `None` when the source points are degenerate (all coincident).
pub fn estimate_similarity(src: &[(f64, f64); 5], dst: &[(f64, f64); 5]) -> Option<Similarity> {
    let n = src.len() as f64;
    let (smx, smy) = src.iter().fold((0.0, 0.0), |(ax, ay), p| (ax + p.0, ay + p.1));
    let (dmx, dmy) = dst.iter().fold((0.0, 0.0), |(ax, ay), p| (ax + p.0, ay + p.1));
    let (smx, smy, dmx, dmy) = (smx / n, smy / n, dmx / n, dmy / n);

    let mut denom = 0.0;
    let mut dot = 0.0;
    let mut cross = 0.0;
    for (p, q) in src.iter().zip(dst.iter()) {
        let (px, py) = (p.0 - smx, p.1 - smy);
        let (qx, qy) = (q.0 - dmx, q.1 - dmy);
        denom += px * px + py * py;
        dot += px * qx + py * qy;
        cross += px * qy - py * qx;
    }
    if denom <= f64::EPSILON {
        return None;
    }

    let a = dot / denom;
    let b = cross / denom;
    Some(Similarity {
        a,
        b,
        tx: dmx - (a * smx - b * smy),
        ty: dmy - (b * smx + a * smy),
    })
}

/// Warp the face described by `anchors` into an `ALIGNED_SIZE` square crop.
pub fn align_face(frame: &Frame, anchors: &[(f64, f64); 5]) -> Option<Frame> {
    let transform = estimate_similarity(anchors, &ARCFACE_TEMPLATE)?;
    let size = ALIGNED_SIZE as usize;
    let mut data = Vec::with_capacity(size * size * CHANNELS);

    for v in 0..size {
        for u in 0..size {
            let (sx, sy) = transform.invert((u as f64, v as f64));
            data.extend_from_slice(&sample_bilinear(frame, sx, sy));
        }
    }

    Some(Frame::new(data, ALIGNED_SIZE, ALIGNED_SIZE, 0))
}

/// Bilinear sample; pixels outside the frame read as black.
fn sample_bilinear(frame: &Frame, x: f64, y: f64) -> [u8; 3] {
    let w = frame.width() as i64;
    let h = frame.height() as i64;
    let data = frame.data();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let pixel = |px: i64, py: i64, c: usize| -> f64 {
        if px < 0 || py < 0 || px >= w || py >= h {
            0.0
        } else {
            data[(py as usize * w as usize + px as usize) * CHANNELS + c] as f64
        }
    };

    let mut out = [0u8; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let top = pixel(x0, y0, c) * (1.0 - fx) + pixel(x0 + 1, y0, c) * fx;
        let bottom = pixel(x0, y0 + 1, c) * (1.0 - fx) + pixel(x0 + 1, y0 + 1, c) * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
