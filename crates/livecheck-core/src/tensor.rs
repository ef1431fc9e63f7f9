use ndarray::{Array4, ShapeError};

/// Side length of the square model input, in pixels.
pub const INPUT_SIZE: u32 = 128;

/// Model input shape: batch, height, width, channel (NHWC).
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];

/// Number of `f32` elements in a well-formed input tensor (49,152).
pub const INPUT_LEN: usize = INPUT_SHAPE[0] * INPUT_SHAPE[1] * INPUT_SHAPE[2] * INPUT_SHAPE[3];

/// Immutable 4-D `f32` tensor fed to the liveness model.
///
/// Tensors built by [`crate::preprocess`] always have [`INPUT_SHAPE`]. Other shapes
/// can be constructed (e.g. by a different preprocessing step) but are rejected by
/// the classifier before the model is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Array4<f32>,
}

impl InputTensor {
    /// Wrap an existing array. Any shape is accepted here.
    pub fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// Build a tensor from a flat row-major buffer.
    pub fn from_shape_vec(shape: [usize; 4], values: Vec<f32>) -> Result<Self, ShapeError> {
        Ok(Self {
            data: Array4::from_shape_vec(shape, values)?,
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// True if the tensor matches [`INPUT_SHAPE`] exactly.
    pub fn has_model_shape(&self) -> bool {
        self.data.shape() == INPUT_SHAPE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major view of the values, if the layout is contiguous.
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.data.as_slice()
    }

    pub fn view(&self) -> ndarray::ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }
}
