//! Element types that can be packed into accessor byte ranges.

use glam::{Vec2, Vec3, Vec4};
use serde_json::Value;

use crate::color::Rgba8;
use crate::error::BuildError;

/// glTF accessor component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// The numeric code written into `accessor.componentType`.
    pub fn code(self) -> u32 {
        match self {
            ComponentType::I8 => 5120,
            ComponentType::U8 => 5121,
            ComponentType::I16 => 5122,
            ComponentType::U16 => 5123,
            ComponentType::U32 => 5125,
            ComponentType::F32 => 5126,
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl Arity {
    pub fn components(self) -> usize {
        match self {
            Arity::Scalar => 1,
            Arity::Vec2 => 2,
            Arity::Vec3 => 3,
            Arity::Vec4 => 4,
        }
    }
}

/// A fixed-layout element of an attribute buffer.
///
/// Implementors describe their wire format (component type, arity, whether
/// the integer components are normalized) and how they fold into running
/// bounds. Bytes are always little-endian.
pub trait Encodable: Copy + std::fmt::Debug {
    const COMPONENT_TYPE: ComponentType;
    const ARITY: Arity;
    const NORMALIZED: bool = false;

    fn byte_size() -> usize {
        Self::COMPONENT_TYPE.byte_size() * Self::ARITY.components()
    }

    fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError>;

    fn component_min(self, other: Self) -> Self;
    fn component_max(self, other: Self) -> Self;

    /// JSON form of a bound, or `None` for types whose accessors carry no
    /// numeric bounds.
    fn bound_value(&self) -> Option<Value>;

    fn fold_bounds(acc: &mut Option<(Self, Self)>, value: Self) {
        *acc = Some(match *acc {
            Some((min, max)) => (min.component_min(value), max.component_max(value)),
            None => (value, value),
        });
    }
}

fn floats_value(components: &[f32]) -> Value {
    Value::from(components.to_vec())
}

impl Encodable for f32 {
    const COMPONENT_TYPE: ComponentType = ComponentType::F32;
    const ARITY: Arity = Arity::Scalar;

    fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError> {
        out.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn component_min(self, other: Self) -> Self {
        self.min(other)
    }

    fn component_max(self, other: Self) -> Self {
        self.max(other)
    }

    fn bound_value(&self) -> Option<Value> {
        Some(floats_value(&[*self]))
    }
}

macro_rules! impl_float_vector {
    ($ty:ty, $arity:expr) => {
        impl Encodable for $ty {
            const COMPONENT_TYPE: ComponentType = ComponentType::F32;
            const ARITY: Arity = $arity;

            fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError> {
                for component in self.to_array() {
                    out.extend_from_slice(&component.to_le_bytes());
                }
                Ok(())
            }

            fn component_min(self, other: Self) -> Self {
                self.min(other)
            }

            fn component_max(self, other: Self) -> Self {
                self.max(other)
            }

            fn bound_value(&self) -> Option<Value> {
                Some(floats_value(&self.to_array()))
            }
        }
    };
}

impl_float_vector!(Vec2, Arity::Vec2);
impl_float_vector!(Vec3, Arity::Vec3);
impl_float_vector!(Vec4, Arity::Vec4);

impl Encodable for u16 {
    const COMPONENT_TYPE: ComponentType = ComponentType::U16;
    const ARITY: Arity = Arity::Scalar;

    fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError> {
        out.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn component_min(self, other: Self) -> Self {
        self.min(other)
    }

    fn component_max(self, other: Self) -> Self {
        self.max(other)
    }

    fn bound_value(&self) -> Option<Value> {
        Some(Value::from(vec![*self]))
    }
}

/// Colors are written as normalized unsigned bytes and carry no bounds.
impl Encodable for Rgba8 {
    const COMPONENT_TYPE: ComponentType = ComponentType::U8;
    const ARITY: Arity = Arity::Vec4;
    const NORMALIZED: bool = true;

    fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError> {
        out.extend_from_slice(&[self.r, self.g, self.b, self.a]);
        Ok(())
    }

    fn component_min(self, other: Self) -> Self {
        Rgba8::new(
            self.r.min(other.r),
            self.g.min(other.g),
            self.b.min(other.b),
            self.a.min(other.a),
        )
    }

    fn component_max(self, other: Self) -> Self {
        Rgba8::new(
            self.r.max(other.r),
            self.g.max(other.g),
            self.b.max(other.b),
            self.a.max(other.a),
        )
    }

    fn bound_value(&self) -> Option<Value> {
        None
    }
}

/// Four floats in `[-1, 1]` stored as normalized signed bytes.
///
/// Encoding multiplies by 127 and rounds. Values that land outside
/// `[-127, 127]` fail with [`BuildError::QuantizationOverflow`] when packed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantized4(pub Vec4);

impl Quantized4 {
    pub fn quantize(value: f32) -> Result<i8, BuildError> {
        let quantized = (value * 127.0).round();
        if !(-127.0..=127.0).contains(&quantized) {
            return Err(BuildError::QuantizationOverflow { value, quantized });
        }
        Ok(quantized as i8)
    }
}

impl Encodable for Quantized4 {
    const COMPONENT_TYPE: ComponentType = ComponentType::I8;
    const ARITY: Arity = Arity::Vec4;
    const NORMALIZED: bool = true;

    fn write_le(&self, out: &mut Vec<u8>) -> Result<(), BuildError> {
        for component in self.0.to_array() {
            out.push(Self::quantize(component)?.to_le_bytes()[0]);
        }
        Ok(())
    }

    fn component_min(self, other: Self) -> Self {
        Quantized4(self.0.min(other.0))
    }

    fn component_max(self, other: Self) -> Self {
        Quantized4(self.0.max(other.0))
    }

    fn bound_value(&self) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(<f32 as Encodable>::byte_size(), 4);
        assert_eq!(<Vec2 as Encodable>::byte_size(), 8);
        assert_eq!(<Vec3 as Encodable>::byte_size(), 12);
        assert_eq!(<Vec4 as Encodable>::byte_size(), 16);
        assert_eq!(<Rgba8 as Encodable>::byte_size(), 4);
        assert_eq!(<Quantized4 as Encodable>::byte_size(), 4);
        assert_eq!(<u16 as Encodable>::byte_size(), 2);
    }

    #[test]
    fn test_vec3_layout() {
        let mut out = Vec::new();
        Vec3::new(1.0, -2.0, 0.5).write_le(&mut out).unwrap();
        assert_eq!(&out[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&out[4..8], &(-2.0f32).to_le_bytes());
        assert_eq!(&out[8..12], &0.5f32.to_le_bytes());
    }

    #[test]
    fn test_quantize() {
        assert_eq!(Quantized4::quantize(1.0).unwrap(), 127);
        assert_eq!(Quantized4::quantize(-1.0).unwrap(), -127);
        assert_eq!(Quantized4::quantize(0.5).unwrap(), 64);
        assert!(matches!(
            Quantized4::quantize(1.01),
            Err(BuildError::QuantizationOverflow { .. })
        ));

        let mut out = Vec::new();
        Quantized4(Vec4::new(0.0, 0.0, -1.0, 1.0))
            .write_le(&mut out)
            .unwrap();
        assert_eq!(out, vec![0, 0, 0x81, 0x7F]);
    }

    #[test]
    fn test_fold_bounds() {
        let mut acc = None;
        for v in [Vec2::new(0.5, 2.0), Vec2::new(-1.0, 3.0), Vec2::new(0.0, 1.0)] {
            Vec2::fold_bounds(&mut acc, v);
        }
        assert_eq!(acc, Some((Vec2::new(-1.0, 1.0), Vec2::new(0.5, 3.0))));
        assert!(Rgba8::WHITE.bound_value().is_none());
    }
}
