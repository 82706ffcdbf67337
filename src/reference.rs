//! Reference evaluator for the operators the builders emit.
//!
//! Executes a [`Model`] node by node over in-memory tensors so that the
//! wiring of a compiled pipeline can be checked end to end without an
//! external runtime. Only `Tokenizer`, `StringNormalizer`, `CategoryMapper`,
//! `Constant`, `Pad` and `Slice` are supported.

use std::collections::HashMap;

use thiserror::Error;

use crate::graph::{AttributeValue, Model, Node, TensorData};

/// A dense tensor value, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Strings { shape: Vec<usize>, data: Vec<String> },
    Int64 { shape: Vec<usize>, data: Vec<i64> },
}

impl Value {
    /// A rank-1 string tensor.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data: Vec<String> = values.into_iter().map(Into::into).collect();
        Value::Strings {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Value::Strings { shape, .. } | Value::Int64 { shape, .. } => shape,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings { data, .. } => Some(data),
            Value::Int64 { .. } => None,
        }
    }

    pub fn as_int64(&self) -> Option<&[i64]> {
        match self {
            Value::Int64 { data, .. } => Some(data),
            Value::Strings { .. } => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Strings { .. } => "STRING",
            Value::Int64 { .. } => "INT64",
        }
    }
}

/// Errors raised while evaluating a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Missing graph input {name}")]
    MissingInput { name: String },

    #[error("Tensor {name} has no value")]
    MissingTensor { name: String },

    #[error("Unsupported operator {domain}::{op_type}")]
    UnsupportedOperator { op_type: String, domain: String },

    #[error("{op_type}: missing or malformed attribute {name}")]
    BadAttribute { op_type: String, name: String },

    #[error("{op_type}: expected {expected} tensor for {name}, got {actual}")]
    TypeMismatch {
        op_type: String,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{op_type}: {message}")]
    InvalidShape { op_type: String, message: String },

    #[error("{op_type}: expected exactly one output, got {count}")]
    OutputCount { op_type: String, count: usize },
}

/// Runs `model` on `inputs` and returns its declared outputs by name.
pub fn evaluate(
    model: &Model,
    inputs: HashMap<String, Value>,
) -> Result<HashMap<String, Value>, EvalError> {
    let graph = model.graph();
    let mut values = HashMap::new();
    for declared in graph.inputs() {
        let value = inputs
            .get(declared.name())
            .cloned()
            .ok_or_else(|| EvalError::MissingInput {
                name: declared.name().to_string(),
            })?;
        values.insert(declared.name().to_string(), value);
    }

    for node in graph.nodes() {
        let args = node
            .inputs()
            .iter()
            .map(|name| {
                if name.is_empty() {
                    return Ok(None);
                }
                values
                    .get(name)
                    .map(Some)
                    .ok_or_else(|| EvalError::MissingTensor { name: name.clone() })
            })
            .collect::<Result<Vec<Option<&Value>>, EvalError>>()?;

        let [output] = node.outputs() else {
            return Err(EvalError::OutputCount {
                op_type: node.op_type().to_string(),
                count: node.outputs().len(),
            });
        };
        let result = run_node(node, &args)?;
        values.insert(output.clone(), result);
    }

    graph
        .outputs()
        .iter()
        .map(|declared| {
            values
                .remove(declared.name())
                .map(|v| (declared.name().to_string(), v))
                .ok_or_else(|| EvalError::MissingTensor {
                    name: declared.name().to_string(),
                })
        })
        .collect()
}

/// Runs a single-input, single-output text model on one string.
pub fn evaluate_text(model: &Model, text: &str) -> Result<Value, EvalError> {
    let graph = model.graph();
    let input = graph.inputs().first().ok_or_else(|| EvalError::MissingInput {
        name: String::new(),
    })?;
    let output = graph
        .outputs()
        .first()
        .ok_or_else(|| EvalError::MissingTensor {
            name: String::new(),
        })?;
    let output_name = output.name().to_string();

    let inputs = HashMap::from([(input.name().to_string(), Value::strings([text]))]);
    let mut outputs = evaluate(model, inputs)?;
    outputs
        .remove(&output_name)
        .ok_or(EvalError::MissingTensor { name: output_name })
}

fn run_node(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    match (node.domain(), node.op_type()) {
        ("com.microsoft", "Tokenizer") => tokenize(node, args),
        ("", "StringNormalizer") => normalize(node, args),
        ("ai.onnx.ml", "CategoryMapper") => map_categories(node, args),
        ("", "Constant") => constant(node),
        ("", "Pad") => pad(node, args),
        ("", "Slice") => slice(node, args),
        (domain, op_type) => Err(EvalError::UnsupportedOperator {
            op_type: op_type.to_string(),
            domain: domain.to_string(),
        }),
    }
}

fn arg<'a>(node: &Node, args: &[Option<&'a Value>], index: usize) -> Result<&'a Value, EvalError> {
    args.get(index)
        .copied()
        .flatten()
        .ok_or_else(|| EvalError::MissingTensor {
            name: node.inputs().get(index).cloned().unwrap_or_default(),
        })
}

fn string_arg<'a>(
    node: &Node,
    args: &[Option<&'a Value>],
    index: usize,
) -> Result<(&'a [usize], &'a [String]), EvalError> {
    match arg(node, args, index)? {
        Value::Strings { shape, data } => Ok((shape, data)),
        other => Err(type_mismatch(node, index, "STRING", other)),
    }
}

fn int_arg<'a>(
    node: &Node,
    args: &[Option<&'a Value>],
    index: usize,
) -> Result<(&'a [usize], &'a [i64]), EvalError> {
    match arg(node, args, index)? {
        Value::Int64 { shape, data } => Ok((shape, data)),
        other => Err(type_mismatch(node, index, "INT64", other)),
    }
}

fn type_mismatch(node: &Node, index: usize, expected: &'static str, actual: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op_type: node.op_type().to_string(),
        name: node.inputs()[index].clone(),
        expected,
        actual: actual.type_name(),
    }
}

fn bad_attribute(node: &Node, name: &str) -> EvalError {
    EvalError::BadAttribute {
        op_type: node.op_type().to_string(),
        name: name.to_string(),
    }
}

fn int_attr(node: &Node, name: &str, default: i64) -> Result<i64, EvalError> {
    match node.attribute(name) {
        None => Ok(default),
        Some(value) => value.as_int().ok_or_else(|| bad_attribute(node, name)),
    }
}

fn strings_attr<'a>(node: &'a Node, name: &str) -> Result<&'a [String], EvalError> {
    match node.attribute(name) {
        None => Ok(&[]),
        Some(value) => value.as_strings().ok_or_else(|| bad_attribute(node, name)),
    }
}

fn invalid_shape(node: &Node, message: impl Into<String>) -> EvalError {
    EvalError::InvalidShape {
        op_type: node.op_type().to_string(),
        message: message.into(),
    }
}

/// Splits every row on any of the literal separators.
fn tokenize(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    let (shape, data) = string_arg(node, args, 0)?;
    if shape.len() != 1 {
        return Err(invalid_shape(node, "input must be rank 1"));
    }
    if int_attr(node, "mark", 0)? != 0 {
        return Err(bad_attribute(node, "mark"));
    }
    let min_chars = int_attr(node, "mincharnum", 1)?.max(1) as usize;
    let pad_value = match node.attribute("pad_value") {
        Some(value) => value
            .as_str()
            .ok_or_else(|| bad_attribute(node, "pad_value"))?,
        None => "",
    };
    let separators = strings_attr(node, "separators")?;
    if separators.is_empty() || separators.iter().any(String::is_empty) {
        return Err(bad_attribute(node, "separators"));
    }

    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|text| {
            split_on_any(text, separators)
                .into_iter()
                .filter(|token| token.chars().count() >= min_chars)
                .map(str::to_string)
                .collect()
        })
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(rows.len() * width);
    for row in &rows {
        out.extend(row.iter().cloned());
        out.extend(std::iter::repeat_n(pad_value.to_string(), width - row.len()));
    }
    Ok(Value::Strings {
        shape: vec![rows.len(), width],
        data: out,
    })
}

/// Splits `text` wherever any separator occurs, trying separators in order at
/// each position.
fn split_on_any<'a>(text: &'a str, separators: &[String]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < text.len() {
        if !text.is_char_boundary(i) {
            i += 1;
            continue;
        }
        match separators.iter().find(|sep| text[i..].starts_with(sep.as_str())) {
            Some(sep) => {
                pieces.push(&text[start..i]);
                i += sep.len();
                start = i;
            }
            None => i += 1,
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Drops stopwords (case-insensitively unless `is_case_sensitive` is set),
/// then applies the case action.
fn normalize(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    let (shape, data) = string_arg(node, args, 0)?;
    let keep_rank_two = match shape {
        [_] => false,
        [1, _] => true,
        _ => return Err(invalid_shape(node, "input must be [C] or [1, C]")),
    };

    let case_sensitive = int_attr(node, "is_case_sensitive", 0)? != 0;
    let action = match node.attribute("case_change_action") {
        Some(value) => value
            .as_str()
            .ok_or_else(|| bad_attribute(node, "case_change_action"))?,
        None => "NONE",
    };
    let stopwords = strings_attr(node, "stopwords")?;

    let is_stopword = |token: &str| {
        stopwords.iter().any(|stop| {
            if case_sensitive {
                stop == token
            } else {
                stop.to_lowercase() == token.to_lowercase()
            }
        })
    };

    let mut kept: Vec<String> = Vec::with_capacity(data.len());
    for token in data.iter().filter(|t| !is_stopword(t.as_str())) {
        let token = match action {
            "LOWER" => token.to_lowercase(),
            "UPPER" => token.to_uppercase(),
            "NONE" => token.clone(),
            _ => return Err(bad_attribute(node, "case_change_action")),
        };
        kept.push(token);
    }
    if kept.is_empty() {
        kept.push(String::new());
    }

    let shape = if keep_rank_two {
        vec![1, kept.len()]
    } else {
        vec![kept.len()]
    };
    Ok(Value::Strings { shape, data: kept })
}

fn map_categories(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    let (shape, data) = string_arg(node, args, 0)?;
    let cats_strings = strings_attr(node, "cats_strings")?;
    let cats_int64s: &[i64] = match node.attribute("cats_int64s") {
        Some(value) => value
            .as_ints()
            .ok_or_else(|| bad_attribute(node, "cats_int64s"))?,
        None => &[],
    };
    if cats_strings.len() != cats_int64s.len() {
        return Err(bad_attribute(node, "cats_int64s"));
    }
    let default = int_attr(node, "default_int64", -1)?;

    let table: HashMap<&str, i64> = cats_strings
        .iter()
        .map(String::as_str)
        .zip(cats_int64s.iter().copied())
        .collect();
    let ids = data
        .iter()
        .map(|token| table.get(token.as_str()).copied().unwrap_or(default))
        .collect();

    Ok(Value::Int64 {
        shape: shape.to_vec(),
        data: ids,
    })
}

fn constant(node: &Node) -> Result<Value, EvalError> {
    let tensor = node
        .attribute("value")
        .and_then(AttributeValue::as_tensor)
        .ok_or_else(|| bad_attribute(node, "value"))?;
    let shape = tensor.dims().iter().map(|d| *d as usize).collect();
    match tensor.data() {
        TensorData::Int64(values) => Ok(Value::Int64 {
            shape,
            data: values.clone(),
        }),
        TensorData::String(values) => Ok(Value::Strings {
            shape,
            data: values.clone(),
        }),
        TensorData::Float(_) => Err(bad_attribute(node, "value")),
    }
}

/// Constant-mode zero padding with non-negative pads.
fn pad(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    let (shape, data) = int_arg(node, args, 0)?;
    let (_, pads) = int_arg(node, args, 1)?;
    let rank = shape.len();
    if pads.len() != 2 * rank || pads.iter().any(|p| *p < 0) {
        return Err(invalid_shape(node, format!("bad pads {pads:?} for rank {rank}")));
    }
    match node.attribute("mode") {
        None => {}
        Some(mode) if mode.as_str() == Some("constant") => {}
        Some(_) => return Err(bad_attribute(node, "mode")),
    }
    let begins: Vec<usize> = pads[..rank].iter().map(|p| *p as usize).collect();
    let out_shape: Vec<usize> = (0..rank)
        .map(|axis| shape[axis] + pads[axis] as usize + pads[rank + axis] as usize)
        .collect();
    let mut out = vec![0; out_shape.iter().product()];

    for (flat, value) in data.iter().enumerate() {
        let index = unravel(flat, shape);
        let target: Vec<usize> = index.iter().zip(&begins).map(|(i, b)| i + b).collect();
        out[ravel(&target, &out_shape)] = *value;
    }
    Ok(Value::Int64 {
        shape: out_shape,
        data: out,
    })
}

/// Unit-step slicing over the leading axes, with ONNX start/end clamping.
fn slice(node: &Node, args: &[Option<&Value>]) -> Result<Value, EvalError> {
    let (shape, data) = int_arg(node, args, 0)?;
    let (_, starts) = int_arg(node, args, 1)?;
    let (_, ends) = int_arg(node, args, 2)?;
    if starts.len() != ends.len() {
        return Err(invalid_shape(node, "starts and ends differ in length"));
    }
    let rank = shape.len();
    if starts.len() > rank {
        return Err(invalid_shape(node, "more starts than axes"));
    }

    let mut lo: Vec<usize> = vec![0; rank];
    let mut hi: Vec<usize> = shape.to_vec();
    for (axis, (start, end)) in starts.iter().zip(ends).enumerate() {
        let dim = shape[axis] as i64;
        let clamp = |v: i64| {
            let v = if v < 0 { v + dim } else { v };
            v.clamp(0, dim) as usize
        };
        lo[axis] = clamp(*start);
        hi[axis] = clamp(*end).max(lo[axis]);
    }

    let out_shape: Vec<usize> = lo.iter().zip(&hi).map(|(l, h)| h - l).collect();
    let count = out_shape.iter().product();
    let mut out = Vec::with_capacity(count);
    for flat in 0..count {
        let index = unravel(flat, &out_shape);
        let source: Vec<usize> = index.iter().zip(&lo).map(|(i, l)| i + l).collect();
        out.push(data[ravel(&source, shape)]);
    }
    Ok(Value::Int64 {
        shape: out_shape,
        data: out,
    })
}

fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for axis in (0..shape.len()).rev() {
        let dim = shape[axis].max(1);
        index[axis] = flat % dim;
        flat /= dim;
    }
    index
}

fn ravel(index: &[usize], shape: &[usize]) -> usize {
    index
        .iter()
        .zip(shape)
        .fold(0, |acc, (i, dim)| acc * dim + i)
}
