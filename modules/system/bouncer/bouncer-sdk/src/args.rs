//! Positional arguments passed to actions and hooks.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ArgumentError;

/// Ordered arguments forwarded from `allows`/`denies`/`authorize` to the
/// action handler and hooks.
///
/// Values are kept as JSON so a single registry can hold actions over
/// different resource types:
///
/// ```ignore
/// let args = ActionArgs::new().arg(post_id).serialized(&post)?;
///
/// // inside the handler
/// let post: Post = args.parse(1)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs(Vec<Value>);

impl ActionArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scalar argument.
    #[must_use]
    pub fn arg(mut self, value: impl IntoArgValue) -> Self {
        self.0.push(value.into_arg_value());
        self
    }

    /// Append any serializable value.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::Serialize`] if `value` cannot be represented as JSON.
    pub fn serialized<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ArgumentError> {
        self.0
            .push(serde_json::to_value(value).map_err(ArgumentError::Serialize)?);
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the argument at `index`.
    ///
    /// # Errors
    ///
    /// - [`ArgumentError::Missing`] if there is no argument at `index`
    /// - [`ArgumentError::Invalid`] if it does not deserialize into `T`
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self.get(index).ok_or(ArgumentError::Missing(index))?;
        T::deserialize(value).map_err(|source| ArgumentError::Invalid { index, source })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl From<Vec<Value>> for ActionArgs {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<'a> IntoIterator for &'a ActionArgs {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Conversion of common scalar types into an action argument.
pub trait IntoArgValue {
    fn into_arg_value(self) -> Value;
}

impl IntoArgValue for Uuid {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoArgValue for &Uuid {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoArgValue for String {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoArgValue for &str {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl IntoArgValue for i64 {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::Number(self.into())
    }
}

impl IntoArgValue for u64 {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::Number(self.into())
    }
}

impl IntoArgValue for bool {
    #[inline]
    fn into_arg_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoArgValue for Value {
    #[inline]
    fn into_arg_value(self) -> Value {
        self
    }
}
