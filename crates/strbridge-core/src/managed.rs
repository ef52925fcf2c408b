//! Owned, length-tagged string of 16-bit code units.

use std::fmt;

/// A managed string: an owned sequence of `u16` code units whose length is a
/// property of the object, not of its content.
///
/// There is no implicit terminator and `0` is an ordinary code unit. The code
/// units are not required to form valid UTF-16.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ManagedString {
    units: Box<[u16]>,
}

impl ManagedString {
    /// Allocate a string of `len` code units, each set to `fill`.
    #[must_use]
    pub fn new(len: usize, fill: u16) -> Self {
        Self {
            units: vec![fill; len].into_boxed_slice(),
        }
    }

    /// Take ownership of an existing code unit buffer.
    #[must_use]
    pub fn from_units(units: Vec<u16>) -> Self {
        Self {
            units: units.into_boxed_slice(),
        }
    }

    /// Logical length in code units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Borrow the code units.
    #[must_use]
    pub fn as_units(&self) -> &[u16] {
        &self.units
    }

    /// Mutable access for runtimes that fill a freshly made string in place.
    pub fn as_units_mut(&mut self) -> &mut [u16] {
        &mut self.units
    }

    /// Release the code units as a boxed slice.
    #[must_use]
    pub fn into_boxed_units(self) -> Box<[u16]> {
        self.units
    }

    /// Render for humans, replacing unpaired surrogates with U+FFFD.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

impl From<Vec<u16>> for ManagedString {
    fn from(units: Vec<u16>) -> Self {
        Self::from_units(units)
    }
}

impl From<&[u16]> for ManagedString {
    fn from(units: &[u16]) -> Self {
        Self {
            units: units.into(),
        }
    }
}

impl From<&str> for ManagedString {
    fn from(s: &str) -> Self {
        Self::from_units(s.encode_utf16().collect())
    }
}

impl AsRef<[u16]> for ManagedString {
    fn as_ref(&self) -> &[u16] {
        &self.units
    }
}

impl fmt::Debug for ManagedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedString")
            .field("len", &self.len())
            .field("text", &self.to_string_lossy())
            .finish()
    }
}
