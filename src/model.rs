use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::VisualizerError;
use crate::layers::{Conv2DParams, LayerDescriptor, LayerKind, Padding};
use crate::shape::Shape;

/// Top level of a Keras `model.to_json()` document.
#[derive(Debug, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    class_name: Option<String>,
    config: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    class_name: String,
    #[serde(default)]
    config: Map<String, Value>,
}

/// A parsed sequential model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub name: Option<String>,
    pub layers: Vec<LayerDescriptor>,
}

/// Parses a model document into layer descriptors.
///
/// `config` may be either `{ "layers": [...] }` or the layer array itself, as written by
/// older `Sequential` exports.
pub fn parse_model(json: &str) -> Result<Model, VisualizerError> {
    let document: ModelDocument = serde_json::from_str(json)?;
    let config = document
        .config
        .ok_or_else(|| VisualizerError::input("missing `config`"))?;

    let (name, raw_layers) = match config {
        Value::Array(layers) => (None, layers),
        Value::Object(mut object) => {
            let name = object
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string);
            match object.remove("layers") {
                Some(Value::Array(layers)) => (name, layers),
                Some(_) => return Err(VisualizerError::input("`config.layers` is not an array")),
                None => return Err(VisualizerError::input("missing `config.layers`")),
            }
        }
        _ => return Err(VisualizerError::input("`config` is neither an object nor an array")),
    };

    debug!(
        class_name = document.class_name.as_deref().unwrap_or("?"),
        layers = raw_layers.len(),
        "parsing model"
    );

    let layers = raw_layers
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: RawLayer = serde_json::from_value(value)
                .map_err(|e| VisualizerError::input(format!("layer #{}: {}", index, e)))?;
            parse_layer(index, raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Model { name, layers })
}

fn parse_layer(index: usize, raw: RawLayer) -> Result<LayerDescriptor, VisualizerError> {
    let fields = Fields {
        index,
        class_name: &raw.class_name,
        config: &raw.config,
    };

    let kind = match raw.class_name.as_str() {
        "InputLayer" => LayerKind::Input,
        "Conv2D" => LayerKind::Conv2D(fields.conv_params()?),
        "SeparableConv2D" => LayerKind::SeparableConv2D(fields.conv_params()?),
        "MaxPooling2D" => LayerKind::MaxPooling2D {
            pool: fields.mandatory_pair("pool_size")?,
        },
        "GlobalAveragePooling2D" => LayerKind::GlobalAveragePooling2D,
        "Flatten" => LayerKind::Flatten,
        "Dense" => LayerKind::Dense {
            units: fields.mandatory_usize("units")?,
        },
        other => {
            warn!(index, class_name = other, "unrecognized layer kind, its shape will be unknown");
            LayerKind::Unknown
        }
    };

    let mut layer = LayerDescriptor::new(index, raw.class_name.clone(), kind);
    if let Some(shape) = fields.input_shape()? {
        layer = layer.with_input_shape(shape);
    }
    Ok(layer)
}

/// Typed access to one layer's `config` object.
struct Fields<'a> {
    index: usize,
    class_name: &'a str,
    config: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn malformed(&self, reason: impl Into<String>) -> VisualizerError {
        VisualizerError::layer(self.index, self.class_name, reason)
    }

    fn as_usize(&self, value: &Value, key: &str) -> Result<usize, VisualizerError> {
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| self.malformed(format!("couldn't parse '{}' in field `{}`", value, key)))
    }

    fn mandatory_usize(&self, key: &str) -> Result<usize, VisualizerError> {
        let value = self
            .config
            .get(key)
            .ok_or_else(|| self.malformed(format!("field `{}` is mandatory", key)))?;
        self.as_usize(value, key)
    }

    /// Reads `[a, b]` or a bare `n`, meaning `[n, n]`.
    fn pair(&self, key: &str) -> Result<Option<(usize, usize)>, VisualizerError> {
        match self.config.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => match items.as_slice() {
                [a, b] => Ok(Some((self.as_usize(a, key)?, self.as_usize(b, key)?))),
                _ => Err(self.malformed(format!("field `{}` should hold two values", key))),
            },
            Some(value) => {
                let n = self.as_usize(value, key)?;
                Ok(Some((n, n)))
            }
        }
    }

    fn mandatory_pair(&self, key: &str) -> Result<(usize, usize), VisualizerError> {
        self.pair(key)?
            .ok_or_else(|| self.malformed(format!("field `{}` is mandatory", key)))
    }

    fn padding(&self) -> Result<Padding, VisualizerError> {
        match self.config.get("padding") {
            None | Some(Value::Null) => Ok(Padding::Valid),
            Some(Value::String(mode)) if mode == "same" => Ok(Padding::Same),
            Some(Value::String(_)) => Ok(Padding::Valid),
            Some(other) => Err(self.malformed(format!("couldn't parse padding mode {}", other))),
        }
    }

    fn conv_params(&self) -> Result<Conv2DParams, VisualizerError> {
        Ok(Conv2DParams {
            filters: self.mandatory_usize("filters")?,
            kernel: self.mandatory_pair("kernel_size")?,
            strides: self.pair("strides")?.unwrap_or((1, 1)),
            padding: self.padding()?,
        })
    }

    /// Reads `batch_input_shape` (or `batch_shape`) as `[batch, width, height, depth]`.
    ///
    /// The batch entry is ignored; missing trailing axes default to `1`.
    fn input_shape(&self) -> Result<Option<Shape>, VisualizerError> {
        let key = if self.config.contains_key("batch_input_shape") {
            "batch_input_shape"
        } else {
            "batch_shape"
        };
        let items = match self.config.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(self.malformed(format!("couldn't parse `{}` {}", key, other)));
            }
        };

        let axes = items.get(1..).unwrap_or_default();
        if axes.is_empty() || axes.len() > 3 {
            return Err(self.malformed(format!(
                "`{}` should hold a batch entry and one to three axes, got {} entries",
                key,
                items.len()
            )));
        }

        let mut dims = [1usize; 3];
        for (slot, value) in dims.iter_mut().zip(axes) {
            *slot = self.as_usize(value, key)?;
        }
        Ok(Some(Shape::new(dims[0], dims[1], dims[2])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_CNN: &str = r#"{
        "class_name": "Sequential",
        "config": {
            "name": "small_cnn",
            "layers": [
                {"class_name": "Conv2D", "config": {
                    "batch_input_shape": [null, 32, 32, 3],
                    "filters": 16, "kernel_size": [3, 3], "strides": [1, 1], "padding": "valid"}},
                {"class_name": "MaxPooling2D", "config": {"pool_size": [2, 2], "padding": "valid"}},
                {"class_name": "Dropout", "config": {"rate": 0.25, "noise_shape": null}},
                {"class_name": "Flatten", "config": {}},
                {"class_name": "Dense", "config": {"units": 10, "activation": "softmax"}}
            ]
        }
    }"#;

    #[test]
    fn parses_keras_sequential_document() {
        let model = parse_model(SMALL_CNN).unwrap();
        assert_eq!(model.name.as_deref(), Some("small_cnn"));
        assert_eq!(model.layers.len(), 5);

        let first = &model.layers[0];
        assert_eq!(first.input_shape, Some(Shape::new(32, 32, 3)));
        assert_eq!(
            first.kind,
            LayerKind::Conv2D(Conv2DParams {
                filters: 16,
                kernel: (3, 3),
                strides: (1, 1),
                padding: Padding::Valid,
            })
        );
        assert_eq!(model.layers[2].kind, LayerKind::Unknown);
        assert_eq!(model.layers[2].class_name, "Dropout");
        assert_eq!(model.layers[4].kind, LayerKind::Dense { units: 10 });
        assert!(model.layers[1..].iter().all(|l| l.input_shape.is_none()));
    }

    #[test]
    fn accepts_bare_layer_array_config() {
        let json = r#"{"class_name": "Sequential", "config": [
            {"class_name": "Dense", "config": {"units": 4, "batch_input_shape": [null, 8]}}
        ]}"#;
        let model = parse_model(json).unwrap();
        assert_eq!(model.name, None);
        assert_eq!(model.layers[0].input_shape, Some(Shape::new(8, 1, 1)));
    }

    #[test]
    fn accepts_batch_shape_and_scalar_pairs() {
        let json = r#"{"config": {"layers": [
            {"class_name": "InputLayer", "config": {"batch_shape": [null, 64, 48, 3]}},
            {"class_name": "SeparableConv2D", "config": {
                "filters": 8, "kernel_size": 3, "strides": 2, "padding": "same"}}
        ]}}"#;
        let model = parse_model(json).unwrap();
        assert_eq!(model.layers[0].kind, LayerKind::Input);
        assert_eq!(model.layers[0].input_shape, Some(Shape::new(64, 48, 3)));
        assert_eq!(
            model.layers[1].kind,
            LayerKind::SeparableConv2D(Conv2DParams {
                filters: 8,
                kernel: (3, 3),
                strides: (2, 2),
                padding: Padding::Same,
            })
        );
    }

    #[test]
    fn conv_defaults_to_unit_strides_and_valid_padding() {
        let json = r#"{"config": {"layers": [
            {"class_name": "Conv2D", "config": {
                "filters": 4, "kernel_size": [5, 3], "padding": "causal"}}
        ]}}"#;
        let model = parse_model(json).unwrap();
        assert_eq!(
            model.layers[0].kind,
            LayerKind::Conv2D(Conv2DParams {
                filters: 4,
                kernel: (5, 3),
                strides: (1, 1),
                padding: Padding::Valid,
            })
        );
    }

    #[test]
    fn unknown_layers_never_fail_on_foreign_fields() {
        let json = r#"{"config": {"layers": [
            {"class_name": "ZeroPadding2D", "config": {"padding": [[1, 1], [1, 1]]}}
        ]}}"#;
        let model = parse_model(json).unwrap();
        assert_eq!(model.layers[0].kind, LayerKind::Unknown);
    }

    #[test]
    fn missing_fields_are_reported_with_layer_index() {
        let json = r#"{"config": {"layers": [
            {"class_name": "Flatten", "config": {}},
            {"class_name": "Dense", "config": {"activation": "relu"}}
        ]}}"#;
        match parse_model(json) {
            Err(VisualizerError::MalformedLayer { index, kind, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, "Dense");
                assert!(reason.contains("units"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let json = r#"{"config": {"layers": [
            {"class_name": "Conv2D", "config": {"filters": 3}}
        ]}}"#;
        assert!(matches!(
            parse_model(json),
            Err(VisualizerError::MalformedLayer { index: 0, .. })
        ));
    }

    #[test]
    fn invalid_values_are_malformed_layers() {
        let json = r#"{"config": {"layers": [
            {"class_name": "MaxPooling2D", "config": {"pool_size": [2, 2, 2]}}
        ]}}"#;
        assert!(matches!(parse_model(json), Err(VisualizerError::MalformedLayer { .. })));

        let json = r#"{"config": {"layers": [
            {"class_name": "Dense", "config": {"units": -3}}
        ]}}"#;
        assert!(matches!(parse_model(json), Err(VisualizerError::MalformedLayer { .. })));

        let json = r#"{"config": {"layers": [
            {"class_name": "Flatten", "config": {"batch_input_shape": [null, null, 28, 1]}}
        ]}}"#;
        assert!(matches!(parse_model(json), Err(VisualizerError::MalformedLayer { .. })));

        let json = r#"{"config": {"layers": [
            {"class_name": "Flatten", "config": {"batch_input_shape": [null, 2, 2, 2, 2]}}
        ]}}"#;
        assert!(matches!(parse_model(json), Err(VisualizerError::MalformedLayer { .. })));
    }

    #[test]
    fn structural_problems_are_malformed_input() {
        for json in [
            "not json",
            r#"{"class_name": "Sequential"}"#,
            r#"{"config": {"name": "m"}}"#,
            r#"{"config": {"layers": 3}}"#,
            r#"{"config": 7}"#,
            r#"{"config": {"layers": [{"config": {}}]}}"#,
        ] {
            assert!(
                matches!(parse_model(json), Err(VisualizerError::MalformedInput { .. })),
                "{} should be malformed input",
                json
            );
        }
    }
}
