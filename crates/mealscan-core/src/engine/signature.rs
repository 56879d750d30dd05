//! Model signature derivation from the runtime's declared I/O.

use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::ValueType;

use crate::error::{Error, Result};

/// Default affine parameters for uint8 tensors. ONNX sessions do not expose
/// per-tensor scale/zero-point (quantized graphs embed Q/DQ nodes), so uint8
/// inputs take the raw pixel byte unchanged: q = (pixel/255) / (1/255) + 0.
const DEFAULT_QUANT_SCALE: f32 = 1.0 / 255.0;
const DEFAULT_QUANT_ZERO_POINT: i32 = 0;

/// Numeric format of a model-boundary tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precision {
    /// Float tensor; pixel bytes scale linearly to [0, 1].
    Float32,
    /// Fixed-point tensor with an affine scale/zero-point mapping.
    Quantized { scale: f32, zero_point: i32 },
}

/// Axis ordering of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// Batch, height, width, channels (TFLite-converted models).
    Nhwc,
    /// Batch, channels, height, width (torch-exported models).
    Nchw,
}

/// Input tensor requirements derived from the model's declared signature.
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub name: String,
    pub layout: TensorLayout,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub precision: Precision,
}

impl InputSpec {
    /// Run-time tensor dimensions with the batch axis pinned to 1.
    pub fn batched_dims(&self) -> [usize; 4] {
        match self.layout {
            TensorLayout::Nhwc => [1, self.height, self.width, self.channels],
            TensorLayout::Nchw => [1, self.channels, self.height, self.width],
        }
    }
}

/// Output tensor description derived from the model's declared signature.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub name: String,
    /// Per-class score count, when the signature declares it statically.
    pub num_classes: Option<usize>,
    pub precision: Precision,
}

/// Fixed I/O contract of a loaded model. Immutable for the engine's lifetime.
#[derive(Debug, Clone)]
pub struct ModelSignature {
    pub input: InputSpec,
    pub output: OutputSpec,
}

impl ModelSignature {
    /// Derive the signature from a freshly created session.
    pub fn from_session(session: &Session) -> Result<Self> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelLoad("model declares no inputs".to_string()))?;
        let (input_ty, input_dims) = tensor_type(&input.input_type)
            .ok_or_else(|| Error::ModelLoad("model input is not a tensor".to_string()))?;
        let (layout, height, width, channels) = infer_input_layout(&input_dims)?;

        let output = session
            .outputs
            .first()
            .ok_or_else(|| Error::ModelLoad("model declares no outputs".to_string()))?;
        let (output_ty, output_dims) = tensor_type(&output.output_type)
            .ok_or_else(|| Error::ModelLoad("model output is not a tensor".to_string()))?;

        Ok(Self {
            input: InputSpec {
                name: input.name.clone(),
                layout,
                height,
                width,
                channels,
                precision: precision_for(input_ty)?,
            },
            output: OutputSpec {
                name: output.name.clone(),
                num_classes: infer_output_len(&output_dims),
                precision: precision_for(output_ty)?,
            },
        })
    }
}

fn tensor_type(value_type: &ValueType) -> Option<(TensorElementType, Vec<i64>)> {
    match value_type {
        ValueType::Tensor { ty, shape, .. } => Some((*ty, shape.iter().copied().collect())),
        _ => None,
    }
}

fn precision_for(ty: TensorElementType) -> Result<Precision> {
    match ty {
        TensorElementType::Float32 => Ok(Precision::Float32),
        TensorElementType::Uint8 => Ok(Precision::Quantized {
            scale: DEFAULT_QUANT_SCALE,
            zero_point: DEFAULT_QUANT_ZERO_POINT,
        }),
        other => Err(Error::ModelLoad(format!(
            "unsupported tensor element type {other:?} (expected float32 or uint8)"
        ))),
    }
}

/// Classify a 4-D input shape as NHWC or NCHW and extract the spatial dims.
///
/// The batch axis may be dynamic (-1 or 0); spatial and channel axes must be
/// static because the preprocessor stretches every image to exactly this
/// shape. Only 3-channel models are accepted: a grayscale signature would
/// otherwise load "Ready" and then fail every single classify call.
pub(crate) fn infer_input_layout(dims: &[i64]) -> Result<(TensorLayout, usize, usize, usize)> {
    if dims.len() != 4 {
        return Err(Error::ModelLoad(format!(
            "expected a 4-D image input, model declares {:?}",
            dims
        )));
    }

    let is_channel = |d: i64| d == 1 || d == 3;
    let static_dim = |d: i64, axis: &str| -> Result<usize> {
        if d > 0 {
            Ok(d as usize)
        } else {
            Err(Error::ModelLoad(format!(
                "model input {axis} dimension is dynamic in {:?}",
                dims
            )))
        }
    };

    let (layout, height, width, channels) = if is_channel(dims[3]) {
        (
            TensorLayout::Nhwc,
            static_dim(dims[1], "height")?,
            static_dim(dims[2], "width")?,
            dims[3] as usize,
        )
    } else if is_channel(dims[1]) {
        (
            TensorLayout::Nchw,
            static_dim(dims[2], "height")?,
            static_dim(dims[3], "width")?,
            dims[1] as usize,
        )
    } else {
        return Err(Error::ModelLoad(format!(
            "cannot locate channel axis in input shape {:?}",
            dims
        )));
    };

    if channels != 3 {
        return Err(Error::ModelLoad(format!(
            "model expects {channels}-channel input, only 3-channel RGB models are supported"
        )));
    }

    Ok((layout, height, width, channels))
}

/// Number of classes from an output shape of the form `[N]` or `[batch, N]`,
/// if declared statically.
pub(crate) fn infer_output_len(dims: &[i64]) -> Option<usize> {
    match dims.last() {
        Some(&last) if last > 0 => Some(last as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nhwc_layout() {
        let (layout, h, w, c) = infer_input_layout(&[1, 224, 224, 3]).unwrap();
        assert_eq!(layout, TensorLayout::Nhwc);
        assert_eq!((h, w, c), (224, 224, 3));
    }

    #[test]
    fn test_nchw_layout() {
        let (layout, h, w, c) = infer_input_layout(&[-1, 3, 299, 299]).unwrap();
        assert_eq!(layout, TensorLayout::Nchw);
        assert_eq!((h, w, c), (299, 299, 3));
    }

    #[test]
    fn test_dynamic_batch_is_accepted() {
        assert!(infer_input_layout(&[-1, 224, 224, 3]).is_ok());
        assert!(infer_input_layout(&[0, 224, 224, 3]).is_ok());
    }

    #[test]
    fn test_dynamic_spatial_dims_rejected() {
        assert!(infer_input_layout(&[1, -1, -1, 3]).is_err());
        assert!(infer_input_layout(&[1, 3, -1, 224]).is_err());
    }

    #[test]
    fn test_non_image_shapes_rejected() {
        assert!(infer_input_layout(&[1, 128]).is_err());
        assert!(infer_input_layout(&[1, 224, 224, 7]).is_err());
    }

    #[test]
    fn test_single_channel_models_rejected_at_load() {
        let err = infer_input_layout(&[1, 224, 224, 1]).unwrap_err();
        assert!(err.to_string().contains("3-channel"));
        assert!(infer_input_layout(&[1, 1, 224, 224]).is_err());
    }

    #[test]
    fn test_output_len() {
        assert_eq!(infer_output_len(&[1, 42]), Some(42));
        assert_eq!(infer_output_len(&[42]), Some(42));
        assert_eq!(infer_output_len(&[1, -1]), None);
        assert_eq!(infer_output_len(&[]), None);
    }

    #[test]
    fn test_batched_dims_follow_layout() {
        let mut spec = InputSpec {
            name: "input".to_string(),
            layout: TensorLayout::Nhwc,
            height: 224,
            width: 224,
            channels: 3,
            precision: Precision::Float32,
        };
        assert_eq!(spec.batched_dims(), [1, 224, 224, 3]);
        spec.layout = TensorLayout::Nchw;
        assert_eq!(spec.batched_dims(), [1, 3, 224, 224]);
    }
}
