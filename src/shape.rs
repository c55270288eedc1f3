use std::fmt;

/// Extent of a tensor at a layer boundary.
///
/// Axis convention, used everywhere in the crate:
/// - `width` is the first spatial axis. It is read from `batch_input_shape[1]` and
///   transformed by `kernel_size[0]`, `strides[0]` and `pool_size[0]`.
/// - `height` is the second spatial axis (`batch_input_shape[2]`, index `1` of the
///   kernel/stride/pool pairs).
/// - `depth` is the channel count (`batch_input_shape[3]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape {
    /// Sentinel produced by layers whose kind is not recognized.
    pub const UNKNOWN: Shape = Shape::new(0, 0, 0);

    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Shape::UNKNOWN
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "(?, ?, ?)")
        } else {
            write!(f, "({}, {}, {})", self.width, self.height, self.depth)
        }
    }
}

/// A shape tagged with the label it is displayed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub shape: Shape,
    pub label: String,
}

impl Block {
    pub const INPUT_LABEL: &'static str = "Input";

    pub fn new(shape: Shape, label: impl Into<String>) -> Self {
        Self {
            shape,
            label: label.into(),
        }
    }

    pub fn input(shape: Shape) -> Self {
        Self::new(shape, Self::INPUT_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_question_marks_for_unknown() {
        assert_eq!(Shape::new(30, 30, 16).to_string(), "(30, 30, 16)");
        assert_eq!(Shape::UNKNOWN.to_string(), "(?, ?, ?)");
    }

    #[test]
    fn partially_zero_shape_is_not_unknown() {
        assert!(!Shape::new(0, 4, 4).is_unknown());
        assert!(Shape::default().is_unknown());
    }
}
