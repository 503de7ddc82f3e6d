use ndarray::Array4;

use crate::shared::frame::Frame;

/// Resizes an RGB face crop to `width × height` (nearest neighbour) and lays
/// it out as a `[1, 3, H, W]` BGR tensor with raw 0-255 values, the input
/// convention of the emotion and head-pose models.
pub fn bgr_face_tensor(face: &Frame, width: usize, height: usize) -> Array4<f32> {
    let mut tensor = Array4::<f32>::zeros((1, 3, height, width));
    if face.is_empty() {
        return tensor;
    }

    let src = face.as_ndarray();
    let src_h = face.height() as usize;
    let src_w = face.width() as usize;
    let scale_y = src_h as f64 / height as f64;
    let scale_x = src_w as f64 / width as f64;

    for y in 0..height {
        let sy = ((y as f64 * scale_y) as usize).min(src_h - 1);
        for x in 0..width {
            let sx = ((x as f64 * scale_x) as usize).min(src_w - 1);
            // RGB source → BGR planes
            tensor[[0, 0, y, x]] = src[[sy, sx, 2]] as f32;
            tensor[[0, 1, y, x]] = src[[sy, sx, 1]] as f32;
            tensor[[0, 2, y, x]] = src[[sy, sx, 0]] as f32;
        }
    }
    tensor
}
