use std::collections::BTreeMap;
use std::fmt;

/// A value that can be bound to a window shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `uniform float name;`
    Scalar(f32),
    /// `uniform vec3 name;`
    Vec3([f32; 3]),
}

impl UniformValue {
    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Self::Vec3([x, y, z])
    }

    /// GLSL type name matching this value's shape.
    pub fn glsl_type(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "float",
            Self::Vec3(_) => "vec3",
        }
    }

    /// True when both values would bind to the same GLSL type.
    pub fn same_shape(&self, other: &UniformValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn components(&self) -> &[f32] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Vec3(values) => values,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Vec3([x, y, z]) => write!(f, "{x} {y} {z}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniformParseError {
    #[error("argument '{0}' is missing '=' between name and value")]
    MissingEquals(String),
    #[error("argument '{0}' has an empty uniform name")]
    EmptyName(String),
    #[error("uniform '{name}' has invalid number '{raw}'")]
    InvalidNumber { name: String, raw: String },
    #[error("uniform '{name}' expects 1 or 3 components, found {count}")]
    ComponentCount { name: String, count: usize },
}

/// Named uniform values, either a shader's declared defaults or the overrides
/// supplied where the shader is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<String, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<UniformValue>,
    ) -> Option<UniformValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `name=value[,name=value...]` where a value is one float or three
    /// whitespace separated floats.
    pub fn parse_arguments(text: &str) -> Result<Self, UniformParseError> {
        let mut set = Self::new();
        for pair in text.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (name, raw) = pair
                .split_once('=')
                .ok_or_else(|| UniformParseError::MissingEquals(pair.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(UniformParseError::EmptyName(pair.to_string()));
            }

            let mut components = Vec::with_capacity(3);
            for token in raw.split_whitespace() {
                let parsed = token
                    .parse::<f32>()
                    .map_err(|_| UniformParseError::InvalidNumber {
                        name: name.to_string(),
                        raw: token.to_string(),
                    })?;
                components.push(parsed);
            }

            let value = match components.as_slice() {
                [value] => UniformValue::Scalar(*value),
                [x, y, z] => UniformValue::vec3(*x, *y, *z),
                other => {
                    return Err(UniformParseError::ComponentCount {
                        name: name.to_string(),
                        count: other.len(),
                    })
                }
            };
            set.insert(name, value);
        }
        Ok(set)
    }
}

impl<N: Into<String>, V: Into<UniformValue>> FromIterator<(N, V)> for UniformSet {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a UniformSet {
    type Item = (&'a String, &'a UniformValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, UniformValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
