//! Conversion of raw command tokens into typed values.
//!
//! A parameter is declared with one [`ArgType`] or with an ordered list of
//! them (a union). [`type_conv`] handles the single case and
//! [`multitype_conv`] the union case. When the user did not supply a token,
//! both hand back the parameter's default untouched.

use std::fmt;

use clap::ValueEnum;
use serde::{Serialize, Serializer};

use super::error::{ArgumentTypeError, ConversionError};

// =============================================================================
// Values
// =============================================================================

/// A converted argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit "nothing" default.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(EnumValue),
}

impl Value {
    #[must_use]
    pub const fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Enum(e) => e.fmt(f),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// A member of an [`EnumType`], e.g. `Direction.page_down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Name of the enum the member belongs to.
    pub type_name: String,
    /// Member name in underscore form.
    pub member: String,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.member)
    }
}

impl Serialize for EnumValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.member)
    }
}

// =============================================================================
// Parameters and types
// =============================================================================

/// How a parameter appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// `cmd VALUE`
    Positional,
    /// `cmd --name VALUE`
    Option,
    /// `cmd --name`, no value.
    Switch,
    /// Last positional; takes every remaining token.
    Remainder,
}

/// A parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// `None` means the parameter has no default.
    pub default: Option<Value>,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    #[must_use]
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Positional)
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn with_none_default(mut self) -> Self {
        self.default = Some(Value::None);
        self
    }

    fn default_value(&self) -> Result<Value, ConversionError> {
        self.default
            .clone()
            .ok_or_else(|| ConversionError::MissingValue {
                param: self.name.clone(),
            })
    }
}

/// An enum-like type whose values are picked by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    members: Vec<String>,
}

impl EnumType {
    /// Members are given in underscore form (`foo_bar`).
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Describe a Rust enum through its `clap` possible values.
    #[must_use]
    pub fn of<E: ValueEnum>() -> Self {
        let full = std::any::type_name::<E>();
        let name = full.rsplit("::").next().unwrap_or(full);
        let members = E::value_variants()
            .iter()
            .filter_map(ValueEnum::to_possible_value)
            .map(|pv| pv.get_name().replace('-', "_"));
        Self::new(name, members)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Values accepted on the command line, in hyphenated form.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        self.members.iter().map(|m| arg_name(m)).collect()
    }

    fn member(&self, member: String) -> EnumValue {
        EnumValue {
            type_name: self.name.clone(),
            member,
        }
    }
}

/// The type a token is converted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Int,
    Float,
    Str,
    Enum(EnumType),
    /// A bare string standing in for a type, the way older command
    /// definitions listed accepted values. Always rejected; declare the
    /// accepted values as choices on a `Str` parameter instead.
    Literal(String),
    /// A type name with no registered converter.
    Unknown(String),
}

impl ArgType {
    /// Resolve a builtin type by name. Unrecognised names become
    /// [`ArgType::Unknown`] and fail at conversion time.
    #[must_use]
    pub fn named(name: &str) -> Self {
        match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Enum(e) => f.write_str(e.name()),
            Self::Literal(s) => write!(f, "'{s}'"),
            Self::Unknown(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Command-line spelling of an identifier: trailing underscores dropped,
/// inner underscores turned into hyphens.
#[must_use]
pub fn arg_name(name: &str) -> String {
    name.trim_end_matches('_').replace('_', "-")
}

fn check_choices<S: AsRef<str>>(
    param: &Param,
    value: &str,
    choices: &[S],
) -> Result<(), ArgumentTypeError> {
    if choices.iter().any(|c| c.as_ref() == value) {
        return Ok(());
    }
    let expected = choices
        .iter()
        .map(|c| arg_name(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ArgumentTypeError::new(format!(
        "{}: Invalid value {value} - expected one of: {expected}",
        param.name
    )))
}

fn invalid_typed(param: &Param, typ: &ArgType, value: &str) -> ConversionError {
    ArgumentTypeError::new(format!("{}: Invalid {typ} value {value}", param.name)).into()
}

/// Convert `value` for `param` to `typ`.
///
/// `value` is `None` when the user supplied nothing; the parameter default is
/// then returned as-is, without checking it against `typ` or `str_choices`.
/// `str_choices` restricts the accepted values of a [`ArgType::Str`]
/// parameter.
///
/// [`ArgType::Int`] is a 64-bit signed integer; tokens outside that range
/// are invalid values rather than being widened.
///
/// # Errors
///
/// - [`ConversionError::InvalidValue`] if the token does not convert
/// - [`ConversionError::LegacyStringType`] for [`ArgType::Literal`]
/// - [`ConversionError::UnknownType`] for [`ArgType::Unknown`]
/// - [`ConversionError::MissingValue`] if there is neither token nor default
pub fn type_conv(
    param: &Param,
    typ: &ArgType,
    value: Option<&str>,
    str_choices: Option<&[String]>,
) -> Result<Value, ConversionError> {
    let Some(token) = value else {
        return param.default_value();
    };

    match typ {
        ArgType::Literal(_) => Err(ConversionError::LegacyStringType {
            param: param.name.clone(),
        }),
        ArgType::Enum(ty) => {
            check_choices(param, token, &ty.choices())?;
            Ok(Value::Enum(ty.member(token.replace('-', "_"))))
        }
        ArgType::Str => {
            if let Some(choices) = str_choices {
                check_choices(param, token, choices)?;
            }
            Ok(Value::Str(token.to_owned()))
        }
        ArgType::Int => token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid_typed(param, typ, token)),
        ArgType::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid_typed(param, typ, token)),
        ArgType::Unknown(name) => Err(ConversionError::UnknownType {
            param: param.name.clone(),
            type_name: name.clone(),
        }),
    }
}

/// Candidate order for a union: duplicates dropped, `str` tried last since it
/// accepts anything.
fn candidates(types: &[ArgType]) -> Vec<&ArgType> {
    let mut ordered: Vec<&ArgType> = Vec::with_capacity(types.len());
    for typ in types {
        if !ordered.contains(&typ) {
            ordered.push(typ);
        }
    }
    if let Some(pos) = ordered.iter().position(|t| **t == ArgType::Str) {
        let str_type = ordered.remove(pos);
        ordered.push(str_type);
    }
    ordered
}

/// Convert `value` to the first of `types` that accepts it.
///
/// The error for a token no candidate accepts does not name the candidates.
///
/// # Errors
///
/// - [`ConversionError::InvalidValue`] if no candidate accepts the token
/// - [`ConversionError::LegacyStringType`] / [`ConversionError::UnknownType`]
///   as soon as such a candidate is reached
/// - [`ConversionError::MissingValue`] if there is neither token nor default
pub fn multitype_conv(
    param: &Param,
    types: &[ArgType],
    value: Option<&str>,
    str_choices: Option<&[String]>,
) -> Result<Value, ConversionError> {
    let Some(token) = value else {
        return param.default_value();
    };

    for typ in candidates(types) {
        match type_conv(param, typ, Some(token), str_choices) {
            Ok(converted) => return Ok(converted),
            Err(ConversionError::InvalidValue(err)) => {
                tracing::trace!(param = %param.name, candidate = %typ, %err, "candidate rejected");
            }
            Err(other) => return Err(other),
        }
    }

    Err(ArgumentTypeError::new(format!("{}: Invalid value {token}", param.name)).into())
}

/// Convert `token` straight into a Rust enum.
///
/// Accepts exactly the hyphenated names `clap` derives for `E`.
///
/// # Errors
///
/// Returns [`ConversionError::InvalidValue`] listing the valid names.
pub fn convert_enum<E: ValueEnum>(param: &Param, token: &str) -> Result<E, ConversionError> {
    let names: Vec<String> = E::value_variants()
        .iter()
        .filter_map(ValueEnum::to_possible_value)
        .map(|pv| arg_name(pv.get_name()))
        .collect();
    check_choices(param, token, &names)?;

    E::value_variants()
        .iter()
        .find(|v| {
            v.to_possible_value()
                .is_some_and(|pv| arg_name(pv.get_name()) == token)
        })
        .cloned()
        .ok_or_else(|| invalid_typed(param, &ArgType::Enum(EnumType::of::<E>()), token))
}
