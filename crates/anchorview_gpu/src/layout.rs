//! Documented GPU layouts of the uniform structures.
//!
//! Each [`StructLayout`] here is written out by hand, field by field, as the
//! shader side declares it. The Rust structs in [`crate::uniform`] are checked
//! against these tables at compile time, the generated WGSL is emitted from
//! them, and the integration tests compare them with what a shader compiler
//! computes. A layout change therefore has to be made here first.
//!
//! Placement follows the usual GPU rules: a field starts at the next multiple
//! of its kind's alignment, and a 3-vector is aligned and stored like a
//! 4-vector (16 bytes).

use crate::error::{ContractError, Result};

/// Scalar and vector kinds used by the uniform structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Float3,
    Float4,
    Float4x4,
}

impl FieldKind {
    /// Bytes the GPU reads for the value itself.
    pub const fn natural_size(self) -> u32 {
        match self {
            FieldKind::Float => 4,
            FieldKind::Float3 => 12,
            FieldKind::Float4 => 16,
            FieldKind::Float4x4 => 64,
        }
    }

    pub const fn align(self) -> u32 {
        match self {
            FieldKind::Float => 4,
            FieldKind::Float3 | FieldKind::Float4 | FieldKind::Float4x4 => 16,
        }
    }

    pub const fn wgsl_type(self) -> &'static str {
        match self {
            FieldKind::Float => "f32",
            FieldKind::Float3 => "vec3<f32>",
            FieldKind::Float4 => "vec4<f32>",
            FieldKind::Float4x4 => "mat4x4<f32>",
        }
    }
}

/// One field: where it starts and how much storage it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub kind: FieldKind,
    pub offset: u32,
    /// Storage size. Larger than the natural size for padded 3-vectors.
    pub size: u32,
}

impl FieldLayout {
    pub const fn new(name: &'static str, kind: FieldKind, offset: u32, size: u32) -> Self {
        Self {
            name,
            kind,
            offset,
            size,
        }
    }

    pub const fn end(&self) -> u32 {
        self.offset + self.size
    }
}

/// A field the shader source has commented out. It takes no space until both
/// sides activate it together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedField {
    pub name: &'static str,
    pub wgsl_type: &'static str,
    pub note: &'static str,
}

/// Expected layout of a uniform structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    pub name: &'static str,
    pub size: u32,
    pub align: u32,
    pub fields: &'static [FieldLayout],
    pub reserved: &'static [ReservedField],
}

/// First inconsistency in a [`StructLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutProblem {
    Misaligned { field: usize },
    Misplaced { field: usize, expected: u32 },
    TooSmall { field: usize },
    OutOfBounds { field: usize },
    Size { expected: u32 },
    Align { expected: u32 },
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Finds the first field or size that disagrees with GPU placement rules.
    pub const fn problem(&self) -> Option<LayoutProblem> {
        let mut cursor = 0;
        let mut max_align = 1;
        let mut i = 0;
        while i < self.fields.len() {
            let field = &self.fields[i];
            let align = field.kind.align();
            if field.offset % align != 0 {
                return Some(LayoutProblem::Misaligned { field: i });
            }
            let expected = align_up(cursor, align);
            if field.offset != expected {
                return Some(LayoutProblem::Misplaced { field: i, expected });
            }
            if field.size < field.kind.natural_size() {
                return Some(LayoutProblem::TooSmall { field: i });
            }
            if field.end() > self.size {
                return Some(LayoutProblem::OutOfBounds { field: i });
            }
            if align > max_align {
                max_align = align;
            }
            cursor = field.end();
            i += 1;
        }

        if self.align != max_align {
            return Some(LayoutProblem::Align { expected: max_align });
        }
        let expected = align_up(cursor, max_align);
        if self.size != expected {
            return Some(LayoutProblem::Size { expected });
        }
        None
    }

    pub const fn is_consistent(&self) -> bool {
        self.problem().is_none()
    }

    pub fn validate(&self) -> Result<()> {
        let structure = self.name.to_string();
        let field_name = |i: usize| self.fields[i].name.to_string();
        match self.problem() {
            None => {
                log::debug!(
                    "{}: {} bytes, {} fields, {} reserved",
                    self.name,
                    self.size,
                    self.fields.len(),
                    self.reserved.len()
                );
                Ok(())
            }
            Some(LayoutProblem::Misaligned { field }) => Err(ContractError::FieldMisaligned {
                structure,
                field: field_name(field),
                offset: self.fields[field].offset,
                align: self.fields[field].kind.align(),
            }),
            Some(LayoutProblem::Misplaced { field, expected }) => Err(ContractError::FieldMisplaced {
                structure,
                field: field_name(field),
                expected,
                found: self.fields[field].offset,
            }),
            Some(LayoutProblem::TooSmall { field }) => Err(ContractError::FieldTooSmall {
                structure,
                field: field_name(field),
                size: self.fields[field].size,
                natural: self.fields[field].kind.natural_size(),
            }),
            Some(LayoutProblem::OutOfBounds { field }) => Err(ContractError::FieldOutOfBounds {
                structure,
                field: field_name(field),
                end: self.fields[field].end(),
                size: self.size,
            }),
            Some(LayoutProblem::Size { expected }) => Err(ContractError::StructSize {
                structure,
                size: self.size,
                expected,
            }),
            Some(LayoutProblem::Align { expected }) => Err(ContractError::StructAlign {
                structure,
                align: self.align,
                expected,
            }),
        }
    }
}

/// A `Pod` struct with a documented GPU layout.
pub trait GpuLayout: bytemuck::Pod {
    const LAYOUT: StructLayout;
}

pub const fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

/// Byte-wise string equality usable in constant assertions.
pub const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

pub const SHARED_UNIFORMS: StructLayout = StructLayout {
    name: "SharedUniforms",
    size: 192,
    align: 16,
    fields: &[
        FieldLayout::new("projection_matrix", FieldKind::Float4x4, 0, 64),
        FieldLayout::new("view_matrix", FieldKind::Float4x4, 64, 64),
        FieldLayout::new("ambient_light_color", FieldKind::Float3, 128, 16),
        FieldLayout::new("directional_light_direction", FieldKind::Float3, 144, 16),
        FieldLayout::new("directional_light_color", FieldKind::Float3, 160, 16),
        FieldLayout::new("material_shininess", FieldKind::Float, 176, 4),
    ],
    reserved: &[ReservedField {
        name: "irradiance_map_weight",
        wgsl_type: "f32",
        note: "weight of the irradiance map against the directional light",
    }],
};

pub const ANCHOR_INSTANCE_UNIFORMS: StructLayout = StructLayout {
    name: "AnchorInstanceUniforms",
    size: 64,
    align: 16,
    fields: &[FieldLayout::new("model_matrix", FieldKind::Float4x4, 0, 64)],
    reserved: &[],
};

pub const MATERIAL_UNIFORMS: StructLayout = StructLayout {
    name: "MaterialUniforms",
    size: 48,
    align: 16,
    fields: &[
        FieldLayout::new("base_color", FieldKind::Float4, 0, 16),
        FieldLayout::new("irradiated_color", FieldKind::Float4, 16, 16),
        FieldLayout::new("roughness", FieldKind::Float, 32, 4),
        FieldLayout::new("metalness", FieldKind::Float, 36, 4),
    ],
    reserved: &[
        ReservedField {
            name: "ambient_occlusion",
            wgsl_type: "f32",
            note: "scalar ambient occlusion; shader-side wiring unresolved",
        },
        ReservedField {
            name: "map_weights",
            wgsl_type: "array<f32, N>",
            note: "per-map blend weights; element count unresolved",
        },
    ],
};

/// Every documented layout.
pub const ALL: [StructLayout; 3] = [SHARED_UNIFORMS, ANCHOR_INSTANCE_UNIFORMS, MATERIAL_UNIFORMS];

const _: () = assert!(SHARED_UNIFORMS.is_consistent());
const _: () = assert!(ANCHOR_INSTANCE_UNIFORMS.is_consistent());
const _: () = assert!(MATERIAL_UNIFORMS.is_consistent());
