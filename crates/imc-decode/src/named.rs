use serde::Serialize;

/// A decoded field that is total even when the raw code does not match a
/// known variant: the raw integer is always kept, `name` is `None` rather
/// than a guess (spec §3(d): "enum codes that do not match a known variant
/// are preserved as raw integers with a `name = unknown` tag").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Named<T> {
    pub raw: u32,
    pub name: Option<T>,
}

impl<T> Named<T> {
    pub fn known(raw: u32, name: T) -> Self {
        Self { raw, name: Some(name) }
    }

    pub fn unknown(raw: u32) -> Self {
        Self { raw, name: None }
    }

    pub fn from_option(raw: u32, name: Option<T>) -> Self {
        Self { raw, name }
    }

    pub fn is_known(&self) -> bool {
        self.name.is_some()
    }
}
