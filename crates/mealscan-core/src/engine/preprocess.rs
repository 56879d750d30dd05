//! Image decoding and tensor preparation.
//!
//! The contract mirrors the model's fixed input signature: decode whatever
//! container the bytes are in, force 3-channel RGB, stretch to the declared
//! spatial dims, then map pixel bytes into the declared numeric format with
//! a batch axis of 1.

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use super::signature::{InputSpec, Precision, TensorLayout};
use crate::error::{Error, Result};

/// A batch-of-1 input tensor in the model's declared precision.
#[derive(Debug)]
pub enum InputTensor {
    Float(Array4<f32>),
    Quantized(Array4<u8>),
}

impl InputTensor {
    pub fn dims(&self) -> Vec<i64> {
        match self {
            InputTensor::Float(a) => a.shape().iter().map(|&d| d as i64).collect(),
            InputTensor::Quantized(a) => a.shape().iter().map(|&d| d as i64).collect(),
        }
    }
}

/// Decode raw upload bytes into an image, sniffing the container format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))
}

/// Shape a decoded image into the model's input tensor.
pub fn prepare_tensor(image: &DynamicImage, spec: &InputSpec) -> Result<InputTensor> {
    if spec.channels != 3 {
        return Err(Error::Preprocess(format!(
            "model expects {} channels, only 3-channel RGB inputs are supported",
            spec.channels
        )));
    }

    // Color-mode normalization is unconditional and happens before the
    // resize: grayscale and alpha inputs all become RGB8, then the RGB
    // buffer is stretched to the model's spatial dims.
    let rgb = image::imageops::resize(
        &image.to_rgb8(),
        spec.width as u32,
        spec.height as u32,
        FilterType::Triangle,
    );

    match spec.precision {
        Precision::Float32 => {
            let mut tensor = Array4::<f32>::zeros(dims_of(spec));
            for (x, y, pixel) in rgb.enumerate_pixels() {
                for (c, &value) in pixel.0.iter().enumerate() {
                    let normalized = value as f32 / 255.0;
                    match spec.layout {
                        TensorLayout::Nhwc => tensor[[0, y as usize, x as usize, c]] = normalized,
                        TensorLayout::Nchw => tensor[[0, c, y as usize, x as usize]] = normalized,
                    }
                }
            }
            Ok(InputTensor::Float(tensor))
        }
        Precision::Quantized { scale, zero_point } => {
            let mut tensor = Array4::<u8>::zeros(dims_of(spec));
            for (x, y, pixel) in rgb.enumerate_pixels() {
                for (c, &value) in pixel.0.iter().enumerate() {
                    let quantized = quantize_pixel(value, scale, zero_point);
                    match spec.layout {
                        TensorLayout::Nhwc => tensor[[0, y as usize, x as usize, c]] = quantized,
                        TensorLayout::Nchw => tensor[[0, c, y as usize, x as usize]] = quantized,
                    }
                }
            }
            Ok(InputTensor::Quantized(tensor))
        }
    }
}

fn dims_of(spec: &InputSpec) -> (usize, usize, usize, usize) {
    let [n, a, b, c] = spec.batched_dims();
    (n, a, b, c)
}

/// Map a raw pixel byte into the model's fixed-point domain:
/// q = round((pixel / 255) / scale) + zero_point, clamped to u8 range.
/// With the default scale of 1/255 and zero point 0 this is the identity.
fn quantize_pixel(pixel: u8, scale: f32, zero_point: i32) -> u8 {
    let normalized = pixel as f32 / 255.0;
    let q = (normalized / scale).round() as i32 + zero_point;
    q.clamp(0, u8::MAX as i32) as u8
}

/// Map a fixed-point score back to a probability: (q - zero_point) * scale.
pub fn dequantize_score(q: u8, scale: f32, zero_point: i32) -> f32 {
    (q as i32 - zero_point) as f32 * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn float_nhwc_spec(height: usize, width: usize) -> InputSpec {
        InputSpec {
            name: "input".to_string(),
            layout: TensorLayout::Nhwc,
            height,
            width,
            channels: 3,
            precision: Precision::Float32,
        }
    }

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_rejects_non_image_bytes() {
        let err = decode_image(b"definitely not a png").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_red_png_stretches_and_normalizes() {
        let red = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let bytes = encode_png(&DynamicImage::ImageRgb8(red));

        let decoded = decode_image(&bytes).unwrap();
        let tensor = prepare_tensor(&decoded, &float_nhwc_spec(224, 224)).unwrap();

        let InputTensor::Float(tensor) = tensor else {
            panic!("expected float tensor");
        };
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        // Uniform source image stays uniform after the stretch.
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 0, 0, 1]].abs() < 1e-6);
        assert!(tensor[[0, 112, 112, 2]].abs() < 1e-6);
        assert!((tensor[[0, 223, 223, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_grayscale_and_alpha_become_rgb() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(8, 8, image::Luma([128])));
        let tensor = prepare_tensor(&gray, &float_nhwc_spec(4, 4)).unwrap();
        let InputTensor::Float(tensor) = tensor else {
            panic!("expected float tensor");
        };
        assert_eq!(tensor.shape(), &[1, 4, 4, 3]);

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, image::Rgba([0, 255, 0, 7])));
        let tensor = prepare_tensor(&rgba, &float_nhwc_spec(4, 4)).unwrap();
        let InputTensor::Float(tensor) = tensor else {
            panic!("expected float tensor");
        };
        assert_eq!(tensor.shape(), &[1, 4, 4, 3]);
        assert!((tensor[[0, 2, 2, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_dropped_before_resize() {
        // Alpha varies across the image but the color does not; since RGB
        // conversion precedes the resize, no alpha value may bleed into the
        // interpolated channels.
        let mut rgba = RgbaImage::from_pixel(8, 8, image::Rgba([60, 120, 180, 255]));
        for (x, y, pixel) in rgba.enumerate_pixels_mut() {
            pixel.0[3] = if (x + y) % 2 == 0 { 0 } else { 255 };
        }

        let tensor =
            prepare_tensor(&DynamicImage::ImageRgba8(rgba), &float_nhwc_spec(4, 4)).unwrap();
        let InputTensor::Float(tensor) = tensor else {
            panic!("expected float tensor");
        };
        for y in 0..4 {
            for x in 0..4 {
                assert!((tensor[[0, y, x, 0]] - 60.0 / 255.0).abs() < 1e-6);
                assert!((tensor[[0, y, x, 1]] - 120.0 / 255.0).abs() < 1e-6);
                assert!((tensor[[0, y, x, 2]] - 180.0 / 255.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_nchw_layout_places_channels_first() {
        let blue = RgbImage::from_pixel(6, 6, Rgb([0, 0, 255]));
        let spec = InputSpec {
            layout: TensorLayout::Nchw,
            ..float_nhwc_spec(6, 6)
        };
        let tensor = prepare_tensor(&DynamicImage::ImageRgb8(blue), &spec).unwrap();
        let InputTensor::Float(tensor) = tensor else {
            panic!("expected float tensor");
        };
        assert_eq!(tensor.shape(), &[1, 3, 6, 6]);
        assert!(tensor[[0, 0, 3, 3]].abs() < 1e-6);
        assert!((tensor[[0, 2, 3, 3]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_rgb_spec_rejected() {
        let source = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let spec = InputSpec {
            channels: 1,
            ..float_nhwc_spec(2, 2)
        };
        let err = prepare_tensor(&DynamicImage::ImageRgb8(source), &spec).unwrap_err();
        assert!(matches!(err, Error::Preprocess(_)));
    }

    #[test]
    fn test_quantized_identity_mapping() {
        assert_eq!(quantize_pixel(0, 1.0 / 255.0, 0), 0);
        assert_eq!(quantize_pixel(128, 1.0 / 255.0, 0), 128);
        assert_eq!(quantize_pixel(255, 1.0 / 255.0, 0), 255);
    }

    #[test]
    fn test_quantized_tensor_holds_raw_bytes() {
        let source = RgbImage::from_pixel(5, 5, Rgb([200, 10, 0]));
        let spec = InputSpec {
            precision: Precision::Quantized {
                scale: 1.0 / 255.0,
                zero_point: 0,
            },
            ..float_nhwc_spec(5, 5)
        };
        let tensor = prepare_tensor(&DynamicImage::ImageRgb8(source), &spec).unwrap();
        let InputTensor::Quantized(tensor) = tensor else {
            panic!("expected quantized tensor");
        };
        assert_eq!(tensor[[0, 2, 2, 0]], 200);
        assert_eq!(tensor[[0, 2, 2, 1]], 10);
    }

    #[test]
    fn test_dequantize_roundtrip() {
        let p = dequantize_score(179, 1.0 / 255.0, 0);
        assert!((p - 179.0 / 255.0).abs() < 1e-6);
    }
}
