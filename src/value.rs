use std::borrow::Cow;

/// A single cell handed to row sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// 64-bit signed integer.
    Int64(i64),
    /// UTF-8 string, borrowed from the decoded column where possible.
    Str(Cow<'a, str>),
}

impl Value<'_> {
    #[must_use]
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Int64(v) => Value::Int64(v),
            Value::Str(s) => Value::Str(Cow::Owned(s.into_owned())),
        }
    }
}
