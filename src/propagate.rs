use tracing::debug;

use crate::error::VisualizerError;
use crate::layers::{LayerDescriptor, next_shape};
use crate::shape::{Block, Shape};

/// Runs shape propagation over `layers`, starting from `initial`.
///
/// A layer that declares its own input shape resets the running shape and emits an
/// `Input` block before its own block. Every other layer emits exactly one block.
pub fn propagate(
    initial: Shape,
    layers: &[LayerDescriptor],
) -> Result<Vec<Block>, VisualizerError> {
    if layers.is_empty() {
        return Err(VisualizerError::input("model has no layers"));
    }

    let declared = layers.iter().filter(|l| l.input_shape.is_some()).count();
    let mut blocks = Vec::with_capacity(layers.len() + declared);
    let mut current = initial;

    for layer in layers {
        if let Some(input) = layer.input_shape {
            current = input;
            blocks.push(Block::input(input));
        }

        current = next_shape(current, layer)?;
        debug!(
            index = layer.index,
            kind = layer.kind.name(),
            label = %layer.class_name,
            shape = %current,
            "propagated layer"
        );
        blocks.push(Block::new(current, layer.class_name.clone()));
    }

    Ok(blocks)
}
