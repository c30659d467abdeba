//! The wire shape carried by a `CallPayload.data` byte string: a selector
//! plus positional arguments.

use crate::error::VmError;
use animica_codec::Value;

/// A decoded call: which entrypoint to invoke and what to pass it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallData {
    /// The entrypoint selector to dispatch on.
    pub selector: Vec<u8>,
    /// Positional call arguments, each a byte string, an unsigned integer,
    /// or a boolean.
    pub args: Vec<Value>,
}

impl CallData {
    /// Builds a `CallData`.
    pub fn new(selector: impl Into<Vec<u8>>, args: Vec<Value>) -> Self {
        CallData { selector: selector.into(), args }
    }

    /// Encodes this call as `{selector, args}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::text("selector"), Value::bytes(self.selector.clone())),
            (Value::text("args"), Value::Array(self.args.clone())),
        ])
    }

    /// Encodes this call as canonical CBOR bytes, suitable for a
    /// `CallPayload.data` field.
    pub fn to_cbor(&self) -> Result<Vec<u8>, animica_codec::EncodeError> {
        animica_codec::encode(&self.to_value())
    }

    /// Decodes a call from canonical CBOR bytes. Each argument must be a
    /// byte string, an unsigned integer, or a boolean; anything else is
    /// rejected.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, VmError> {
        let v = animica_codec::decode(bytes).map_err(|_| VmError::ValidationError("calldata_bad_cbor"))?;
        let selector = v
            .map_get_text("selector")
            .and_then(|x| x.as_bytes())
            .ok_or(VmError::ValidationError("calldata_missing_selector"))?
            .to_vec();
        let args_v = v
            .map_get_text("args")
            .and_then(|x| x.as_array())
            .ok_or(VmError::ValidationError("calldata_missing_args"))?;
        let mut args = Vec::with_capacity(args_v.len());
        for a in args_v {
            match a {
                Value::Bytes(_) | Value::Bool(_) => args.push(a.clone()),
                Value::Int(i) if !i.is_negative() => args.push(a.clone()),
                _ => return Err(VmError::ValidationError("calldata_arg_shape")),
            }
        }
        Ok(CallData { selector, args })
    }
}
