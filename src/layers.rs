use crate::error::VisualizerError;
use crate::shape::Shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    Same,
    #[default]
    Valid,
}

impl Padding {
    /// Flat padding added on each side of a spatial axis.
    ///
    /// `same` is modelled as a constant `1` regardless of kernel size and stride.
    fn amount(self) -> i128 {
        match self {
            Padding::Same => 1,
            Padding::Valid => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2DParams {
    pub filters: usize,
    /// (width, height)
    pub kernel: (usize, usize),
    /// (width, height)
    pub strides: (usize, usize),
    pub padding: Padding,
}

/// The closed set of layer kinds whose shape rule is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Conv2D(Conv2DParams),
    SeparableConv2D(Conv2DParams),
    MaxPooling2D { pool: (usize, usize) },
    GlobalAveragePooling2D,
    Flatten,
    Dense { units: usize },
    Unknown,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Input => "InputLayer",
            LayerKind::Conv2D(_) => "Conv2D",
            LayerKind::SeparableConv2D(_) => "SeparableConv2D",
            LayerKind::MaxPooling2D { .. } => "MaxPooling2D",
            LayerKind::GlobalAveragePooling2D => "GlobalAveragePooling2D",
            LayerKind::Flatten => "Flatten",
            LayerKind::Dense { .. } => "Dense",
            LayerKind::Unknown => "Unknown",
        }
    }
}

/// One parsed layer of a sequential model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Position of the layer in the model's layer list.
    pub index: usize,
    /// The `class_name` as written in the model, used as the block label.
    pub class_name: String,
    pub kind: LayerKind,
    /// Declared input shape; present on the network's entry layer.
    pub input_shape: Option<Shape>,
}

impl LayerDescriptor {
    pub fn new(index: usize, class_name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            index,
            class_name: class_name.into(),
            kind,
            input_shape: None,
        }
    }

    pub fn with_input_shape(mut self, shape: Shape) -> Self {
        self.input_shape = Some(shape);
        self
    }

    fn malformed(&self, reason: impl Into<String>) -> VisualizerError {
        VisualizerError::layer(self.index, &self.class_name, reason)
    }

    fn ensure_positive(&self, value: usize, field: &str) -> Result<(), VisualizerError> {
        if value == 0 {
            return Err(self.malformed(format!("`{}` must be positive", field)));
        }
        Ok(())
    }
}

/// Output extent of one spatial axis, or `None` when it does not fit in a `usize`.
fn conv_extent(input: usize, kernel: usize, stride: usize, padding: Padding) -> Option<usize> {
    let numerator = input as i128 - kernel as i128 + 2 * padding.amount();
    let out = numerator.div_euclid(stride as i128) + 1;
    usize::try_from(out.max(0)).ok()
}

fn convolve(
    prev: Shape,
    layer: &LayerDescriptor,
    params: &Conv2DParams,
) -> Result<Shape, VisualizerError> {
    layer.ensure_positive(params.filters, "filters")?;
    layer.ensure_positive(params.kernel.0, "kernel_size")?;
    layer.ensure_positive(params.kernel.1, "kernel_size")?;
    layer.ensure_positive(params.strides.0, "strides")?;
    layer.ensure_positive(params.strides.1, "strides")?;

    let overflow = || layer.malformed(format!("convolving {} overflows", prev));
    let width = conv_extent(prev.width, params.kernel.0, params.strides.0, params.padding)
        .ok_or_else(overflow)?;
    let height = conv_extent(prev.height, params.kernel.1, params.strides.1, params.padding)
        .ok_or_else(overflow)?;
    Ok(Shape::new(width, height, params.filters))
}

/// Computes the output shape of `layer` given the shape flowing into it.
pub fn next_shape(prev: Shape, layer: &LayerDescriptor) -> Result<Shape, VisualizerError> {
    match &layer.kind {
        LayerKind::Input => Ok(prev),
        LayerKind::Conv2D(params) | LayerKind::SeparableConv2D(params) => {
            convolve(prev, layer, params)
        }
        LayerKind::MaxPooling2D { pool } => {
            layer.ensure_positive(pool.0, "pool_size")?;
            layer.ensure_positive(pool.1, "pool_size")?;
            Ok(Shape::new(prev.width / pool.0, prev.height / pool.1, prev.depth))
        }
        LayerKind::GlobalAveragePooling2D => Ok(Shape::new(1, 1, prev.depth)),
        LayerKind::Flatten => {
            let flat = prev
                .width
                .checked_mul(prev.height)
                .and_then(|n| n.checked_mul(prev.depth))
                .ok_or_else(|| layer.malformed(format!("flattening {} overflows", prev)))?;
            Ok(Shape::new(flat, 1, 1))
        }
        LayerKind::Dense { units } => {
            layer.ensure_positive(*units, "units")?;
            Ok(Shape::new(*units, 1, 1))
        }
        LayerKind::Unknown => Ok(Shape::UNKNOWN),
    }
}
