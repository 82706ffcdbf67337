//! Conversion between [`Model`] and the protobuf message tree.

use prost::Message;

use super::proto::attribute_proto::AttributeType;
use super::proto::tensor_shape_proto::{Dimension, dimension};
use super::proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto, type_proto,
};
use crate::errors::{Error, OnnxError};
use crate::graph::{
    AttributeValue, Dim, ElementType, Graph, Model, Node, OpsetId, TensorConstant, TensorData,
    TensorDescriptor,
};

const PRODUCER_NAME: &str = env!("CARGO_PKG_NAME");
const PRODUCER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the `ModelProto` for `model`.
pub fn to_model_proto(model: &Model) -> ModelProto {
    ModelProto {
        ir_version: Some(model.ir_version()),
        producer_name: Some(PRODUCER_NAME.to_string()),
        producer_version: Some(PRODUCER_VERSION.to_string()),
        doc_string: None,
        graph: Some(graph_to_proto(model.graph())),
        opset_import: model
            .opset_imports()
            .iter()
            .map(|opset| OperatorSetIdProto {
                domain: Some(opset.domain.clone()),
                version: Some(opset.version),
            })
            .collect(),
    }
}

/// Rebuilds a [`Model`] from a `ModelProto`, re-running every structural
/// check.
pub fn from_model_proto(proto: &ModelProto) -> Result<Model, Error> {
    let graph_proto = proto.graph.as_ref().ok_or(OnnxError::MissingGraph)?;
    let graph = graph_from_proto(graph_proto)?;
    let opsets = proto
        .opset_import
        .iter()
        .map(|opset| OpsetId::new(opset.domain.clone().unwrap_or_default(), opset.version.unwrap_or(0)))
        .collect();
    Ok(Model::new(graph, opsets, proto.ir_version.unwrap_or(0))?)
}

/// Decodes a serialized `ModelProto`.
pub fn from_bytes(bytes: &[u8]) -> Result<Model, Error> {
    let proto = ModelProto::decode(bytes)?;
    from_model_proto(&proto)
}

impl Model {
    /// Serializes the model in the ONNX protobuf wire format.
    pub fn to_onnx_bytes(&self) -> Vec<u8> {
        to_model_proto(self).encode_to_vec()
    }

    /// Writes the serialized model into `buf`.
    pub fn write_onnx<B: prost::bytes::BufMut>(&self, buf: &mut B) -> Result<(), Error> {
        to_model_proto(self).encode(buf)?;
        Ok(())
    }
}

fn graph_to_proto(graph: &Graph) -> GraphProto {
    GraphProto {
        node: graph.nodes().iter().map(node_to_proto).collect(),
        name: Some(graph.name().to_string()),
        input: graph.inputs().iter().map(value_info_to_proto).collect(),
        output: graph.outputs().iter().map(value_info_to_proto).collect(),
    }
}

fn node_to_proto(node: &Node) -> NodeProto {
    NodeProto {
        input: node.inputs().to_vec(),
        output: node.outputs().to_vec(),
        name: None,
        op_type: Some(node.op_type().to_string()),
        attribute: node
            .attributes()
            .iter()
            .map(|(name, value)| attribute_to_proto(name, value))
            .collect(),
        domain: Some(node.domain().to_string()),
    }
}

fn attribute_to_proto(name: &str, value: &AttributeValue) -> AttributeProto {
    let mut proto = AttributeProto {
        name: Some(name.to_string()),
        ..Default::default()
    };
    let kind = match value {
        AttributeValue::Int(v) => {
            proto.i = Some(*v);
            AttributeType::Int
        }
        AttributeValue::Float(v) => {
            proto.f = Some(*v);
            AttributeType::Float
        }
        AttributeValue::String(v) => {
            proto.s = Some(v.clone().into_bytes());
            AttributeType::String
        }
        AttributeValue::Ints(v) => {
            proto.ints = v.clone();
            AttributeType::Ints
        }
        AttributeValue::Floats(v) => {
            proto.floats = v.clone();
            AttributeType::Floats
        }
        AttributeValue::Strings(v) => {
            proto.strings = v.iter().map(|s| s.clone().into_bytes()).collect();
            AttributeType::Strings
        }
        AttributeValue::Tensor(t) => {
            proto.t = Some(tensor_to_proto(t));
            AttributeType::Tensor
        }
    };
    proto.r#type = Some(kind as i32);
    proto
}

fn tensor_to_proto(tensor: &TensorConstant) -> TensorProto {
    let mut proto = TensorProto {
        dims: tensor.dims().to_vec(),
        data_type: Some(tensor.element_type().onnx_code()),
        name: Some(tensor.name().to_string()),
        ..Default::default()
    };
    match tensor.data() {
        TensorData::Float(v) => proto.float_data = v.clone(),
        TensorData::Int64(v) => proto.int64_data = v.clone(),
        TensorData::String(v) => {
            proto.string_data = v.iter().map(|s| s.clone().into_bytes()).collect()
        }
    }
    proto
}

fn value_info_to_proto(desc: &TensorDescriptor) -> ValueInfoProto {
    let dim = desc
        .shape()
        .iter()
        .map(|d| Dimension {
            value: match d {
                Dim::Fixed(n) => Some(dimension::Value::DimValue(*n)),
                Dim::Unbound => None,
            },
        })
        .collect();
    ValueInfoProto {
        name: Some(desc.name().to_string()),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: Some(desc.element_type().onnx_code()),
                shape: Some(TensorShapeProto { dim }),
            })),
        }),
    }
}

fn graph_from_proto(proto: &GraphProto) -> Result<Graph, Error> {
    let mut assembler = Graph::assembler(proto.name.clone().unwrap_or_default());
    for input in &proto.input {
        assembler.add_input(value_info_from_proto(input)?)?;
    }
    for node in &proto.node {
        assembler.add_node(node_from_proto(node)?)?;
    }
    for output in &proto.output {
        assembler.add_output(value_info_from_proto(output)?);
    }
    Ok(assembler.finish()?)
}

fn node_from_proto(proto: &NodeProto) -> Result<Node, Error> {
    let mut node = Node::new(
        proto.op_type.clone().unwrap_or_default(),
        proto.input.iter().cloned(),
        proto.output.iter().cloned(),
    )?
    .with_domain(proto.domain.clone().unwrap_or_default());
    for attribute in &proto.attribute {
        let name = attribute.name.clone().unwrap_or_default();
        let value = attribute_from_proto(&name, attribute)?;
        node = node.with_attr(name, value);
    }
    Ok(node)
}

fn attribute_from_proto(name: &str, proto: &AttributeProto) -> Result<AttributeValue, Error> {
    let utf8 = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec()).map_err(|_| OnnxError::InvalidUtf8 {
            name: name.to_string(),
        })
    };
    let value = match proto.r#type() {
        AttributeType::Int => AttributeValue::Int(proto.i.unwrap_or_default()),
        AttributeType::Float => AttributeValue::Float(proto.f.unwrap_or_default()),
        AttributeType::String => AttributeValue::String(utf8(proto.s.as_deref().unwrap_or_default())?),
        AttributeType::Ints => AttributeValue::Ints(proto.ints.clone()),
        AttributeType::Floats => AttributeValue::Floats(proto.floats.clone()),
        AttributeType::Strings => AttributeValue::Strings(
            proto
                .strings
                .iter()
                .map(|s| utf8(s))
                .collect::<Result<_, _>>()?,
        ),
        AttributeType::Tensor => {
            let tensor = proto.t.as_ref().ok_or_else(|| OnnxError::UnsupportedAttribute {
                name: name.to_string(),
                kind: AttributeType::Tensor as i32,
            })?;
            AttributeValue::Tensor(tensor_from_proto(tensor)?)
        }
        other => {
            return Err(OnnxError::UnsupportedAttribute {
                name: name.to_string(),
                kind: other as i32,
            }
            .into());
        }
    };
    Ok(value)
}

fn tensor_from_proto(proto: &TensorProto) -> Result<TensorConstant, Error> {
    let name = proto.name.clone().unwrap_or_default();
    let code = proto.data_type.unwrap_or_default();
    let raw = proto.raw_data.as_deref().filter(|raw| !raw.is_empty());

    let data = match ElementType::from_onnx_code(code) {
        Some(ElementType::Int64) => TensorData::Int64(match raw {
            Some(raw) => decode_raw(&name, raw, i64::from_le_bytes)?,
            None => proto.int64_data.clone(),
        }),
        Some(ElementType::Float) => TensorData::Float(match raw {
            Some(raw) => decode_raw(&name, raw, f32::from_le_bytes)?,
            None => proto.float_data.clone(),
        }),
        Some(ElementType::String) => TensorData::String(
            proto
                .string_data
                .iter()
                .map(|s| {
                    String::from_utf8(s.clone()).map_err(|_| OnnxError::InvalidUtf8 {
                        name: name.clone(),
                    })
                })
                .collect::<Result<_, _>>()?,
        ),
        _ => return Err(OnnxError::UnsupportedTensorData { name, code }.into()),
    };
    Ok(TensorConstant::new(name, proto.dims.clone(), data)?)
}

/// Decodes little-endian fixed-width elements from `raw_data`.
fn decode_raw<T, const N: usize>(
    name: &str,
    raw: &[u8],
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>, OnnxError> {
    let chunks = raw.chunks_exact(N);
    if !chunks.remainder().is_empty() {
        return Err(OnnxError::RawDataLength {
            name: name.to_string(),
            len: raw.len(),
            width: N,
        });
    }
    Ok(chunks
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            from_le(bytes)
        })
        .collect())
}

fn value_info_from_proto(proto: &ValueInfoProto) -> Result<TensorDescriptor, Error> {
    let name = proto.name.clone().unwrap_or_default();
    let tensor = match proto.r#type.as_ref().and_then(|t| t.value.as_ref()) {
        Some(type_proto::Value::TensorType(tensor)) => tensor,
        None => return Err(OnnxError::MissingTensorType { name }.into()),
    };
    let code = tensor.elem_type.unwrap_or_default();
    let element_type = ElementType::from_onnx_code(code).ok_or_else(|| {
        OnnxError::UnknownElementType {
            name: name.clone(),
            code,
        }
    })?;
    let shape: Vec<Dim> = tensor
        .shape
        .as_ref()
        .map(|shape| {
            shape
                .dim
                .iter()
                .map(|d| match d.value {
                    Some(dimension::Value::DimValue(n)) => Dim::Fixed(n),
                    _ => Dim::Unbound,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(TensorDescriptor::new(name, element_type, shape)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{Mapper, MapperConfig, Numericalizer, Tokenizer, Vocabulary};
    use crate::errors::StructuralError;

    fn numericalizer_model() -> Model {
        let vocabulary = Vocabulary::new([("cat", 2), ("dog", 3)]).unwrap();
        let mapper = Mapper::new(MapperConfig::new(vocabulary).output_vector_length(4)).unwrap();
        Numericalizer::new(Tokenizer::default(), mapper).build().unwrap()
    }

    #[test]
    fn test_model_proto_header() {
        let proto = to_model_proto(&numericalizer_model());
        assert_eq!(proto.ir_version, Some(8));
        assert_eq!(proto.producer_name.as_deref(), Some("onnx-numericalizer"));

        let domains: Vec<_> = proto
            .opset_import
            .iter()
            .map(|o| (o.domain.clone().unwrap(), o.version.unwrap()))
            .collect();
        assert!(domains.contains(&("ai.onnx.ml".to_string(), 1)));
        assert!(domains.contains(&("com.microsoft".to_string(), 1)));
        assert!(domains.contains(&(String::new(), 17)));
    }

    #[test]
    fn test_attributes_are_typed() {
        let proto = to_model_proto(&numericalizer_model());
        let graph = proto.graph.unwrap();
        let tokenizer = &graph.node[0];
        assert_eq!(tokenizer.op_type.as_deref(), Some("Tokenizer"));
        assert_eq!(tokenizer.domain.as_deref(), Some("com.microsoft"));

        let separators = tokenizer
            .attribute
            .iter()
            .find(|a| a.name.as_deref() == Some("separators"))
            .unwrap();
        assert_eq!(separators.r#type(), AttributeType::Strings);
        assert_eq!(separators.strings, vec![b" ".to_vec()]);

        let mark = tokenizer
            .attribute
            .iter()
            .find(|a| a.name.as_deref() == Some("mark"))
            .unwrap();
        assert_eq!(mark.r#type(), AttributeType::Int);
        assert_eq!(mark.i, Some(0));
    }

    #[test]
    fn test_unbound_dimension_has_no_value() {
        let proto = to_model_proto(&numericalizer_model());
        let graph = proto.graph.unwrap();
        assert_eq!(graph.input[0].name.as_deref(), Some("string_input"));

        let output = &graph.output[0];
        let Some(type_proto::Value::TensorType(tensor)) =
            output.r#type.as_ref().and_then(|t| t.value.clone())
        else {
            panic!("output should carry a tensor type");
        };
        assert_eq!(tensor.elem_type, Some(ElementType::Int64.onnx_code()));
        let dims: Vec<_> = tensor.shape.unwrap().dim.into_iter().map(|d| d.value).collect();
        assert_eq!(
            dims,
            vec![
                Some(dimension::Value::DimValue(1)),
                Some(dimension::Value::DimValue(4))
            ]
        );
    }

    #[test]
    fn test_bytes_round_trip() {
        let model = numericalizer_model();
        let bytes = model.to_onnx_bytes();
        let decoded = from_bytes(&bytes).expect("Decoding should succeed");
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_missing_graph_rejected() {
        let proto = ModelProto::default();
        assert!(matches!(
            from_model_proto(&proto),
            Err(Error::Onnx(OnnxError::MissingGraph))
        ));
    }

    #[test]
    fn test_raw_data_int64_tensor() {
        let raw: Vec<u8> = [0i64, 0, 0, 7]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let proto = TensorProto {
            dims: vec![4],
            data_type: Some(ElementType::Int64.onnx_code()),
            name: Some("pads_data".to_string()),
            raw_data: Some(raw),
            ..Default::default()
        };
        let tensor = tensor_from_proto(&proto).unwrap();
        assert_eq!(tensor.data(), &TensorData::Int64(vec![0, 0, 0, 7]));
    }

    #[test]
    fn test_truncated_raw_data_rejected() {
        let proto = TensorProto {
            dims: vec![1],
            data_type: Some(ElementType::Int64.onnx_code()),
            raw_data: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(matches!(
            tensor_from_proto(&proto),
            Err(Error::Onnx(OnnxError::RawDataLength { len: 3, width: 8, .. }))
        ));
    }

    #[test]
    fn test_overflowing_constant_dims_rejected() {
        let mut proto = to_model_proto(&numericalizer_model());
        let graph = proto.graph.as_mut().unwrap();
        let pads = graph
            .node
            .iter_mut()
            .find(|n| n.output == ["pads"])
            .unwrap();
        pads.attribute[0].t.as_mut().unwrap().dims = vec![i64::MAX, 4];

        let bytes = proto.encode_to_vec();
        assert!(matches!(
            from_bytes(&bytes),
            Err(Error::Structural(StructuralError::ConstantLength { name, .. })) if name == "pads_data"
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(from_bytes(&[0xff, 0xff, 0xff]).is_err());
    }
}
