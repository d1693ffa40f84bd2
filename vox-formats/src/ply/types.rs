//! PLY scalar types and binary vertex record layout

/// Fixed-width PLY scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    /// Map a PLY type name (classic or sized alias) to a scalar type
    pub fn from_ply_name(name: &str) -> Option<Self> {
        match name {
            "char" | "int8" => Some(ScalarType::I8),
            "uchar" | "uint8" => Some(ScalarType::U8),
            "short" | "int16" => Some(ScalarType::I16),
            "ushort" | "uint16" => Some(ScalarType::U16),
            "int" | "int32" => Some(ScalarType::I32),
            "uint" | "uint32" => Some(ScalarType::U32),
            "float" | "float32" => Some(ScalarType::F32),
            "double" | "float64" => Some(ScalarType::F64),
            _ => None,
        }
    }

    /// Width in bytes
    pub const fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Decode a little-endian value from the start of `b`
    ///
    /// `b` must hold at least `self.size()` bytes.
    pub fn decode_le(self, b: &[u8]) -> f64 {
        match self {
            ScalarType::I8 => b[0] as i8 as f64,
            ScalarType::U8 => b[0] as f64,
            ScalarType::I16 => i16::from_le_bytes([b[0], b[1]]) as f64,
            ScalarType::U16 => u16::from_le_bytes([b[0], b[1]]) as f64,
            ScalarType::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::F64 => f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        }
    }
}

/// Position and type of one property inside a binary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub offset: usize,
    pub scalar: ScalarType,
}

/// Binary vertex record layout with the coordinate fields resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Bytes per vertex record
    pub stride: usize,
    pub x: FieldSlot,
    pub y: FieldSlot,
    pub z: FieldSlot,
}

impl RecordLayout {
    /// Read (x, y, z) in header declaration order from one record
    ///
    /// `record` must be exactly one record (`stride` bytes).
    pub fn read_xyz(&self, record: &[u8]) -> [f64; 3] {
        let read = |slot: FieldSlot| slot.scalar.decode_le(&record[slot.offset..]);
        [read(self.x), read(self.y), read(self.z)]
    }
}
