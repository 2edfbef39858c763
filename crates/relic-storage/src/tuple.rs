//! Row representation and fixed-width serialization.

use bytes::{Bytes, BytesMut};
use relic_common::types::{Field, FieldType, CHAR_WIDTH};
use relic_common::{RelicError, Result};

/// Schema descriptor for a fixed-width row.
///
/// Field offsets are computed once at construction; every row
/// serialized under a descriptor occupies exactly `byte_len` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDesc {
    types: Vec<FieldType>,
    names: Vec<String>,
    offsets: Vec<usize>,
    byte_len: usize,
}

impl TupleDesc {
    /// Creates a descriptor from parallel type and name lists.
    pub fn new(types: Vec<FieldType>, names: Vec<String>) -> Result<Self> {
        if types.len() != names.len() {
            return Err(RelicError::Config(format!(
                "schema has {} types but {} names",
                types.len(),
                names.len()
            )));
        }
        if types.is_empty() {
            return Err(RelicError::Config("schema has no fields".to_string()));
        }
        let mut offsets = Vec::with_capacity(types.len());
        let mut offset = 0;
        for ty in &types {
            offsets.push(offset);
            offset += ty.byte_size();
        }
        Ok(Self {
            types,
            names,
            offsets,
            byte_len: offset,
        })
    }

    /// Number of fields in the row.
    pub fn field_count(&self) -> usize {
        self.types.len()
    }

    /// Serialized row width in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Type of the field at `index`.
    pub fn field_type(&self, index: usize) -> FieldType {
        self.types[index]
    }

    /// Name of the field at `index`.
    pub fn field_name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Byte offset of the field at `index` within a serialized row.
    pub fn offset_of(&self, index: usize) -> usize {
        self.offsets[index]
    }

    /// Serialized width of the field at `index`.
    pub fn field_width(&self, index: usize) -> usize {
        let next = if index + 1 < self.offsets.len() {
            self.offsets[index + 1]
        } else {
            self.byte_len
        };
        next - self.offsets[index]
    }

    /// Resolves a field name to its index.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| RelicError::FieldNotFound(name.to_string()))
    }

    /// Concatenates two schemas, left fields first.
    pub fn merge(left: &TupleDesc, right: &TupleDesc) -> Result<TupleDesc> {
        let mut types = left.types.clone();
        types.extend(right.types.iter().copied());
        let mut names = left.names.clone();
        names.extend(right.names.iter().cloned());
        TupleDesc::new(types, names)
    }

    /// Serializes a row into `dest`, which must be at least `byte_len`
    /// bytes.
    pub fn serialize(&self, dest: &mut [u8], tuple: &Tuple) -> Result<()> {
        let image = self.encode(tuple)?;
        dest[..self.byte_len].copy_from_slice(&image);
        Ok(())
    }

    /// Produces the serialized row image.
    pub fn encode(&self, tuple: &Tuple) -> Result<Bytes> {
        if tuple.field_count() != self.field_count() {
            return Err(RelicError::Config(format!(
                "row has {} fields, schema has {}",
                tuple.field_count(),
                self.field_count()
            )));
        }
        let mut buf = BytesMut::zeroed(self.byte_len);
        for (i, ty) in self.types.iter().enumerate() {
            let offset = self.offsets[i];
            match (ty, tuple.field(i)) {
                (FieldType::Int, Field::Int(v)) => {
                    buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
                }
                (FieldType::Double, Field::Double(v)) => {
                    buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
                }
                (FieldType::Char, Field::Char(v)) => {
                    let raw = v.as_bytes();
                    if raw.len() > CHAR_WIDTH {
                        return Err(RelicError::Config(format!(
                            "char value of {} bytes exceeds width {}",
                            raw.len(),
                            CHAR_WIDTH
                        )));
                    }
                    buf[offset..offset + raw.len()].copy_from_slice(raw);
                }
                (ty, value) => {
                    return Err(RelicError::TypeMismatch {
                        expected: ty.to_string(),
                        actual: value.field_type().to_string(),
                    });
                }
            }
        }
        Ok(buf.freeze())
    }

    /// Deserializes a row from `src`, which must be at least `byte_len`
    /// bytes.
    pub fn deserialize(&self, src: &[u8]) -> Tuple {
        let mut fields = Vec::with_capacity(self.field_count());
        for (i, ty) in self.types.iter().enumerate() {
            let offset = self.offsets[i];
            let field = match ty {
                FieldType::Int => Field::Int(i32::from_le_bytes([
                    src[offset],
                    src[offset + 1],
                    src[offset + 2],
                    src[offset + 3],
                ])),
                FieldType::Double => Field::Double(f64::from_le_bytes([
                    src[offset],
                    src[offset + 1],
                    src[offset + 2],
                    src[offset + 3],
                    src[offset + 4],
                    src[offset + 5],
                    src[offset + 6],
                    src[offset + 7],
                ])),
                FieldType::Char => {
                    let raw = &src[offset..offset + CHAR_WIDTH];
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(CHAR_WIDTH);
                    Field::Char(String::from_utf8_lossy(&raw[..end]).into_owned())
                }
            };
            fields.push(field);
        }
        Tuple::new(fields)
    }
}

impl std::fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", self.names[i], ty)?;
        }
        write!(f, ")")
    }
}

/// A row of field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: Vec<Field>,
}

impl Tuple {
    /// Creates a row from its field values.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Number of fields in the row.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the field at `index`.
    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// Returns all field values.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Consumes the row, returning its field values.
    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}
