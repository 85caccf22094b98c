//! Typed reads out of a flat little-endian byte buffer.
//!
//! Offsets are relative to the start of a buffer view; the caller slices the buffer view out of
//! its buffer first, so that every read is bounds-checked against the view rather than against
//! the whole payload.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3};
use thiserror::Error;

pub const COMPONENT_FLOAT: u32 = 5126;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessorError {
    #[error("Type is invalid (not SCALAR, VEC2, VEC3, or VEC4): {type_name:?}")]
    MalformedAccessor { type_name: String },

    #[error("Expected a {expected} accessor, found {found}")]
    UnexpectedShape {
        expected: AccessorShape,
        found: AccessorShape,
    },

    #[error("Unsupported attribute component type {code}")]
    UnsupportedComponentType { code: u32 },

    #[error("Unsupported index component type {code}")]
    UnsupportedIndexComponent { code: u32 },

    #[error("Reading {length} bytes at offset {offset} overruns a {available} byte buffer view")]
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl AccessorShape {
    pub fn from_type_name(type_name: &str) -> Result<Self, AccessorError> {
        match type_name {
            "SCALAR" => Ok(AccessorShape::Scalar),
            "VEC2" => Ok(AccessorShape::Vec2),
            "VEC3" => Ok(AccessorShape::Vec3),
            "VEC4" => Ok(AccessorShape::Vec4),
            _ => Err(AccessorError::MalformedAccessor {
                type_name: type_name.to_string(),
            }),
        }
    }

    pub fn components(self) -> usize {
        match self {
            AccessorShape::Scalar => 1,
            AccessorShape::Vec2 => 2,
            AccessorShape::Vec3 => 3,
            AccessorShape::Vec4 => 4,
        }
    }

    pub fn expect(self, expected: AccessorShape) -> Result<Self, AccessorError> {
        if self == expected {
            Ok(self)
        } else {
            Err(AccessorError::UnexpectedShape {
                expected,
                found: self,
            })
        }
    }
}

impl fmt::Display for AccessorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessorShape::Scalar => "SCALAR",
            AccessorShape::Vec2 => "VEC2",
            AccessorShape::Vec3 => "VEC3",
            AccessorShape::Vec4 => "VEC4",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexComponent {
    U32,
    U16,
    I16,
}

impl IndexComponent {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5125 => Some(IndexComponent::U32),
            5123 => Some(IndexComponent::U16),
            5122 => Some(IndexComponent::I16),
            _ => None,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            IndexComponent::U32 => 4,
            IndexComponent::U16 | IndexComponent::I16 => 2,
        }
    }
}

/// Byte ranges of `count` elements of `element_size` bytes, `stride` apart.
fn element_ranges(
    view: &[u8],
    byte_offset: usize,
    count: usize,
    element_size: usize,
    stride: Option<usize>,
) -> Result<impl Iterator<Item = usize>, AccessorError> {
    let stride = stride.unwrap_or(element_size).max(element_size);

    if count > 0 {
        let length = (count - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(element_size));
        let end = length.and_then(|length| length.checked_add(byte_offset));

        match (length, end) {
            (Some(_), Some(end)) if end <= view.len() => {}
            _ => {
                return Err(AccessorError::OutOfBounds {
                    offset: byte_offset,
                    length: length.unwrap_or(usize::MAX),
                    available: view.len(),
                })
            }
        }
    }

    Ok((0..count).map(move |i| byte_offset + i * stride))
}

/// Reads `count` elements of `shape` 32-bit floats, flattened.
pub fn read_floats(
    view: &[u8],
    byte_offset: usize,
    count: usize,
    shape: AccessorShape,
    stride: Option<usize>,
) -> Result<Vec<f32>, AccessorError> {
    let components = shape.components();
    let element_size = components * 4;
    let starts = element_ranges(view, byte_offset, count, element_size, stride)?;

    // The range check bounds `count` by the view length
    let mut floats = Vec::with_capacity(count * components);
    for start in starts {
        let element = &view[start..start + element_size];
        floats.extend(element.chunks_exact(4).map(LittleEndian::read_f32));
    }

    Ok(floats)
}

pub fn read_indices(
    view: &[u8],
    byte_offset: usize,
    count: usize,
    component: IndexComponent,
    stride: Option<usize>,
) -> Result<Vec<u32>, AccessorError> {
    let width = component.byte_width();

    let indices = element_ranges(view, byte_offset, count, width, stride)?
        .map(|start| {
            let bytes = &view[start..start + width];
            match component {
                IndexComponent::U32 => LittleEndian::read_u32(bytes),
                IndexComponent::U16 => LittleEndian::read_u16(bytes) as u32,
                IndexComponent::I16 => LittleEndian::read_i16(bytes) as u32,
            }
        })
        .collect();

    Ok(indices)
}

/// Checks that `count` elements of `element_size` bytes, zero-filled for an accessor without a
/// buffer view, stay within `limit` bytes.
pub fn check_zeroed(count: usize, element_size: usize, limit: usize) -> Result<(), AccessorError> {
    match count.checked_mul(element_size) {
        Some(length) if length <= limit => Ok(()),
        length => Err(AccessorError::OutOfBounds {
            offset: 0,
            length: length.unwrap_or(usize::MAX),
            available: limit,
        }),
    }
}

pub fn group_vec2(floats: &[f32]) -> Vec<Vec2> {
    floats.chunks_exact(2).map(Vec2::from_slice).collect()
}

pub fn group_vec3(floats: &[f32]) -> Vec<Vec3> {
    floats.chunks_exact(3).map(Vec3::from_slice).collect()
}

/// RGB of each RGBA quadruple.
pub fn group_vec4_rgb(floats: &[f32]) -> Vec<Vec3> {
    floats
        .chunks_exact(4)
        .map(|rgba| Vec3::from_slice(&rgba[..3]))
        .collect()
}

#[cfg(test)]
mod tests {
    use byteorder::WriteBytesExt;

    use super::*;

    fn encode_floats(values: &[f32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &value in values {
            bytes.write_f32::<LittleEndian>(value).unwrap();
        }
        bytes
    }

    #[test]
    fn float_round_trip_is_bit_exact() {
        let values = [0.0, -0.0, 1.5, -3.25e-7, f32::MAX, f32::MIN_POSITIVE, 1.0 / 3.0];
        let bytes = encode_floats(&values);

        let decoded = read_floats(&bytes, 0, values.len(), AccessorShape::Scalar, None).unwrap();

        let original_bits: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        let decoded_bits: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(decoded_bits, original_bits);
    }

    #[test]
    fn unknown_type_name_is_malformed() {
        assert_eq!(
            AccessorShape::from_type_name("MAT4"),
            Err(AccessorError::MalformedAccessor {
                type_name: "MAT4".to_string()
            })
        );
        assert_eq!(AccessorShape::from_type_name("VEC3"), Ok(AccessorShape::Vec3));
    }

    #[test]
    fn u32_indices_consume_four_bytes_each() {
        let mut bytes = Vec::new();
        for value in [7u32, 9, 11] {
            bytes.write_u32::<LittleEndian>(value).unwrap();
        }

        let indices = read_indices(&bytes, 0, 2, IndexComponent::U32, None).unwrap();
        assert_eq!(indices, vec![7, 9]);

        let shifted = read_indices(&bytes, 4, 2, IndexComponent::U32, None).unwrap();
        assert_eq!(shifted, vec![9, 11]);
    }

    #[test]
    fn sixteen_bit_indices() {
        let mut bytes = Vec::new();
        for value in [1u16, 2, 65535] {
            bytes.write_u16::<LittleEndian>(value).unwrap();
        }

        let unsigned = read_indices(&bytes, 0, 3, IndexComponent::U16, None).unwrap();
        assert_eq!(unsigned, vec![1, 2, 65535]);

        let signed = read_indices(&bytes, 0, 2, IndexComponent::I16, None).unwrap();
        assert_eq!(signed, vec![1, 2]);
    }

    #[test]
    fn recognizes_three_index_codes() {
        assert_eq!(IndexComponent::from_code(5125), Some(IndexComponent::U32));
        assert_eq!(IndexComponent::from_code(5123), Some(IndexComponent::U16));
        assert_eq!(IndexComponent::from_code(5122), Some(IndexComponent::I16));
        assert_eq!(IndexComponent::from_code(5121), None);
        assert_eq!(IndexComponent::from_code(5126), None);
    }

    #[test]
    fn reads_past_the_view_are_rejected() {
        let bytes = encode_floats(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert!(read_floats(&bytes, 4, 2, AccessorShape::Vec2, None).is_ok());

        let result = read_floats(&bytes, 8, 2, AccessorShape::Vec2, None);
        assert_eq!(
            result,
            Err(AccessorError::OutOfBounds {
                offset: 8,
                length: 16,
                available: 20
            })
        );
    }

    #[test]
    fn huge_counts_fail_before_allocating() {
        let bytes = encode_floats(&[1.0, 2.0, 3.0]);

        assert_eq!(
            read_floats(&bytes, 0, 1 << 62, AccessorShape::Vec3, None),
            Err(AccessorError::OutOfBounds {
                offset: 0,
                length: usize::MAX,
                available: 12
            })
        );
        assert!(read_indices(&bytes, 0, usize::MAX, IndexComponent::U32, None).is_err());
    }

    #[test]
    fn zeroed_data_is_bounded() {
        assert!(check_zeroed(3, 12, 36).is_ok());
        assert_eq!(
            check_zeroed(4, 12, 36),
            Err(AccessorError::OutOfBounds {
                offset: 0,
                length: 48,
                available: 36
            })
        );
        assert!(check_zeroed(1 << 62, 12, 36).is_err());
    }

    #[test]
    fn strided_reads_skip_interleaved_data() {
        // position.x, position.y, unrelated
        let bytes = encode_floats(&[1.0, 2.0, 99.0, 3.0, 4.0, 99.0]);

        let floats = read_floats(&bytes, 0, 2, AccessorShape::Vec2, Some(12)).unwrap();
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn zero_count_reads_nothing() {
        assert!(read_floats(&[], 0, 0, AccessorShape::Vec3, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn grouping() {
        let floats = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(
            group_vec3(&floats),
            vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]
        );
        assert_eq!(group_vec2(&floats).len(), 3);
        assert_eq!(
            group_vec4_rgb(&[0.1, 0.2, 0.3, 1.0]),
            vec![Vec3::new(0.1, 0.2, 0.3)]
        );
    }
}
