//! Shader specialization keys.
//!
//! Optional shader features are selected when a pipeline is built, through
//! override (function) constants, so the shader body never branches on them.
//! The keys form two tiers: material-map presence flags first, then the
//! vertex-format selectors. The vertex-format tier starts at the number of
//! material flags, so adding a flag moves every vertex-format key by one.

use crate::bindings::ShaderFamily;
use crate::error::{ContractError, Result};
use crate::registry::{tiers_are_contiguous, SlotTable};

/// Material-map presence flags (boolean constants).
pub mod material_flag {
    use super::MaterialFeature;
    use crate::registry::SlotTable;

    pub const BASE_COLOR_MAP: u32 = 0;
    pub const NORMAL_MAP: u32 = BASE_COLOR_MAP + 1;
    pub const METALLIC_MAP: u32 = NORMAL_MAP + 1;
    pub const ROUGHNESS_MAP: u32 = METALLIC_MAP + 1;
    pub const AMBIENT_OCCLUSION_MAP: u32 = ROUGHNESS_MAP + 1;
    pub const IRRADIANCE_MAP: u32 = AMBIENT_OCCLUSION_MAP + 1;

    pub const TABLE: SlotTable<'static> =
        SlotTable::new(MaterialFeature::CATEGORY, 0, MaterialFeature::ENTRIES);
}

/// First vertex-format key: the number of material flags.
pub const VERTEX_FORMAT_START: u32 = material_flag::TABLE.end();

/// Vertex-format selectors (u32 constants, see [`VertexComponentFormat`]).
pub mod vertex_format {
    use super::{VertexFormatKey, VERTEX_FORMAT_START};
    use crate::registry::SlotTable;

    pub const POSITION: u32 = VERTEX_FORMAT_START;
    pub const TEXCOORD: u32 = POSITION + 1;
    pub const NORMAL: u32 = TEXCOORD + 1;
    pub const TANGENT: u32 = NORMAL + 1;
    pub const BITANGENT: u32 = TANGENT + 1;

    pub const TABLE: SlotTable<'static> =
        SlotTable::new(VertexFormatKey::CATEGORY, VERTEX_FORMAT_START, VertexFormatKey::ENTRIES);
}

/// One past the last specialization key.
pub const KEY_COUNT: u32 = vertex_format::TABLE.end();

const _: () = assert!(tiers_are_contiguous(&[&material_flag::TABLE, &vertex_format::TABLE]));
const _: () = assert!(VERTEX_FORMAT_START == material_flag::IRRADIANCE_MAP + 1);

slot_roles! {
    /// Optional material maps a shader variant can sample.
    pub enum MaterialFeature in "material_flag" {
        BaseColorMap = material_flag::BASE_COLOR_MAP, "base_color_map", Material;
        NormalMap = material_flag::NORMAL_MAP, "normal_map", Material;
        MetallicMap = material_flag::METALLIC_MAP, "metallic_map", Material;
        RoughnessMap = material_flag::ROUGHNESS_MAP, "roughness_map", Material;
        AmbientOcclusionMap = material_flag::AMBIENT_OCCLUSION_MAP, "ambient_occlusion_map", Material;
        IrradianceMap = material_flag::IRRADIANCE_MAP, "irradiance_map", Scene;
    }
}

slot_roles! {
    /// Per-vertex components whose storage format is chosen per variant.
    pub enum VertexFormatKey in "vertex_format" {
        Position = vertex_format::POSITION, "position", Mesh;
        Texcoord = vertex_format::TEXCOORD, "texcoord", Mesh;
        Normal = vertex_format::NORMAL, "normal", Mesh;
        Tangent = vertex_format::TANGENT, "tangent", Mesh;
        Bitangent = vertex_format::BITANGENT, "bitangent", Mesh;
    }
}

/// Specialization tables, material flags first.
pub fn tables() -> [SlotTable<'static>; 2] {
    [material_flag::TABLE, vertex_format::TABLE]
}

/// Set of present material maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialFeatures(u32);

impl MaterialFeatures {
    pub const NONE: Self = Self(0);

    pub const fn with(self, feature: MaterialFeature) -> Self {
        Self(self.0 | (1 << feature.slot()))
    }

    pub const fn without(self, feature: MaterialFeature) -> Self {
        Self(self.0 & !(1 << feature.slot()))
    }

    pub const fn contains(self, feature: MaterialFeature) -> bool {
        self.0 & (1 << feature.slot()) != 0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn from_present(features: impl IntoIterator<Item = MaterialFeature>) -> Self {
        features
            .into_iter()
            .fold(Self::NONE, |set, feature| set.with(feature))
    }

    pub fn iter(self) -> impl Iterator<Item = MaterialFeature> {
        MaterialFeature::ALL
            .iter()
            .copied()
            .filter(move |feature| self.contains(*feature))
    }
}

/// Storage format selected for one vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexComponentFormat {
    /// Component not present in the vertex data.
    Absent = 0,
    Float2 = 1,
    Float3 = 2,
    Float4 = 3,
}

impl VertexComponentFormat {
    pub const fn value(self) -> u32 {
        self as u32
    }

    pub const fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Absent),
            1 => Some(Self::Float2),
            2 => Some(Self::Float3),
            3 => Some(Self::Float4),
            _ => None,
        }
    }

    /// Bytes per vertex, 0 when absent.
    pub const fn size(self) -> u64 {
        match self {
            Self::Absent => 0,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }
}

/// Format selector for every [`VertexFormatKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexFormats {
    pub position: VertexComponentFormat,
    pub texcoord: VertexComponentFormat,
    pub normal: VertexComponentFormat,
    pub tangent: VertexComponentFormat,
    pub bitangent: VertexComponentFormat,
}

impl VertexFormats {
    pub const fn new(
        position: VertexComponentFormat,
        texcoord: VertexComponentFormat,
        normal: VertexComponentFormat,
        tangent: VertexComponentFormat,
        bitangent: VertexComponentFormat,
    ) -> Self {
        Self {
            position,
            texcoord,
            normal,
            tangent,
            bitangent,
        }
    }

    /// Formats the stock meshes of each shader family are uploaded in.
    pub const fn for_family(family: ShaderFamily) -> Self {
        use VertexComponentFormat::*;
        match family {
            ShaderFamily::ImageCapture => Self::new(Float2, Float2, Absent, Absent, Absent),
            ShaderFamily::Anchor => Self::new(Float3, Float2, Float3, Absent, Absent),
            ShaderFamily::Point => Self::new(Float3, Absent, Absent, Absent, Absent),
        }
    }

    pub const fn get(&self, key: VertexFormatKey) -> VertexComponentFormat {
        match key {
            VertexFormatKey::Position => self.position,
            VertexFormatKey::Texcoord => self.texcoord,
            VertexFormatKey::Normal => self.normal,
            VertexFormatKey::Tangent => self.tangent,
            VertexFormatKey::Bitangent => self.bitangent,
        }
    }

    /// Checks that every attribute `family` reads has a format.
    pub fn validate_for(&self, family: ShaderFamily) -> Result<()> {
        let required: &[VertexFormatKey] = match family {
            ShaderFamily::ImageCapture => &[VertexFormatKey::Position, VertexFormatKey::Texcoord],
            ShaderFamily::Anchor => &[
                VertexFormatKey::Position,
                VertexFormatKey::Texcoord,
                VertexFormatKey::Normal,
            ],
            ShaderFamily::Point => &[VertexFormatKey::Position],
        };
        for key in required {
            if self.get(*key) == VertexComponentFormat::Absent {
                return Err(ContractError::InvalidVariant(format!(
                    "{:?} shaders read {} but its format is absent",
                    family,
                    key.name()
                )));
            }
        }
        Ok(())
    }
}

/// Value of one specialization constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantValue {
    Bool(bool),
    U32(u32),
}

impl ConstantValue {
    /// Numeric form taken by pipeline override constants.
    pub fn as_f64(self) -> f64 {
        match self {
            ConstantValue::Bool(true) => 1.0,
            ConstantValue::Bool(false) => 0.0,
            ConstantValue::U32(value) => f64::from(value),
        }
    }
}

/// A keyed specialization constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionConstant {
    pub key: u32,
    pub name: &'static str,
    pub value: ConstantValue,
}

/// Selects one compiled shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderVariant {
    pub features: MaterialFeatures,
    pub vertex_formats: VertexFormats,
}

impl ShaderVariant {
    pub const fn new(features: MaterialFeatures, vertex_formats: VertexFormats) -> Self {
        Self {
            features,
            vertex_formats,
        }
    }

    /// Every key with its value, ordered by key. No key is ever omitted.
    pub fn constants(&self) -> Vec<FunctionConstant> {
        let flags = MaterialFeature::ALL.iter().map(|feature| FunctionConstant {
            key: feature.slot(),
            name: feature.name(),
            value: ConstantValue::Bool(self.features.contains(*feature)),
        });
        let formats = VertexFormatKey::ALL.iter().map(|key| FunctionConstant {
            key: key.slot(),
            name: key.name(),
            value: ConstantValue::U32(self.vertex_formats.get(*key).value()),
        });
        let mut constants: Vec<FunctionConstant> = flags.chain(formats).collect();
        constants.sort_by_key(|constant| constant.key);
        constants
    }

    /// `(override id, value)` pairs for pipeline compilation options.
    pub fn override_constants(&self) -> Vec<(String, f64)> {
        self.constants()
            .into_iter()
            .map(|constant| (constant.key.to_string(), constant.value.as_f64()))
            .collect()
    }

    /// Stable key for pipeline caches: feature bits in the low word, one
    /// nibble per vertex-format selector above them.
    pub fn cache_key(&self) -> u64 {
        VertexFormatKey::ALL
            .iter()
            .enumerate()
            .fold(u64::from(self.features.bits()), |key, (i, format_key)| {
                let value = u64::from(self.vertex_formats.get(*format_key).value());
                key | (value << (32 + 4 * i))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SlotEntry;
    use super::VertexComponentFormat::*;

    #[test]
    fn test_material_flag_keys() {
        assert_eq!(material_flag::BASE_COLOR_MAP, 0);
        assert_eq!(material_flag::NORMAL_MAP, 1);
        assert_eq!(material_flag::METALLIC_MAP, 2);
        assert_eq!(material_flag::ROUGHNESS_MAP, 3);
        assert_eq!(material_flag::AMBIENT_OCCLUSION_MAP, 4);
        assert_eq!(material_flag::IRRADIANCE_MAP, 5);
        assert!(material_flag::TABLE.validate().is_ok());
    }

    #[test]
    fn test_vertex_format_keys_follow_flags() {
        assert_eq!(VERTEX_FORMAT_START, MaterialFeature::COUNT as u32);
        assert_eq!(vertex_format::POSITION, 6);
        assert_eq!(vertex_format::TEXCOORD, 7);
        assert_eq!(vertex_format::NORMAL, 8);
        assert_eq!(vertex_format::TANGENT, 9);
        assert_eq!(vertex_format::BITANGENT, 10);
        assert_eq!(KEY_COUNT, 11);
        assert!(vertex_format::TABLE.validate().is_ok());
    }

    #[test]
    fn test_adding_flag_shifts_vertex_keys() {
        let format_names: Vec<&str> = VertexFormatKey::ALL.iter().map(|key| key.name()).collect();

        for flag_count in 0..=16u32 {
            let flag_names: Vec<String> = (0..=flag_count).map(|i| format!("flag_{i}")).collect();

            let flags: Vec<SlotEntry<'_>> = flag_names[..flag_count as usize]
                .iter()
                .enumerate()
                .map(|(i, name)| SlotEntry::new(name, i as u32))
                .collect();
            let grown_flags: Vec<SlotEntry<'_>> = flag_names
                .iter()
                .enumerate()
                .map(|(i, name)| SlotEntry::new(name, i as u32))
                .collect();

            let flag_table = SlotTable::new("material_flag", 0, &flags);
            let grown_table = SlotTable::new("material_flag", 0, &grown_flags);

            let keys = |start: u32| -> Vec<SlotEntry<'static>> {
                format_names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| SlotEntry::new(*name, start + i as u32))
                    .collect()
            };
            let before = keys(flag_table.end());
            let after = keys(grown_table.end());

            assert_eq!(before[0].slot, flag_count);
            for (old, new) in before.iter().zip(&after) {
                assert_eq!(new.slot, old.slot + 1);
            }

            let format_table = SlotTable::new("vertex_format", flag_table.end(), &before);
            let shifted_table = SlotTable::new("vertex_format", grown_table.end(), &after);
            assert!(tiers_are_contiguous(&[&flag_table, &format_table]));
            assert!(tiers_are_contiguous(&[&grown_table, &shifted_table]));
        }
    }

    #[test]
    fn test_material_features_set() {
        let features = MaterialFeatures::from_present([
            MaterialFeature::BaseColorMap,
            MaterialFeature::RoughnessMap,
        ]);
        assert!(features.contains(MaterialFeature::BaseColorMap));
        assert!(features.contains(MaterialFeature::RoughnessMap));
        assert!(!features.contains(MaterialFeature::NormalMap));
        assert_eq!(features.bits(), 0b1001);

        let collected: Vec<MaterialFeature> = features.iter().collect();
        assert_eq!(
            collected,
            vec![MaterialFeature::BaseColorMap, MaterialFeature::RoughnessMap]
        );

        let trimmed = features.without(MaterialFeature::BaseColorMap);
        assert_eq!(trimmed.bits(), 0b1000);
        assert_eq!(MaterialFeatures::NONE.iter().count(), 0);
    }

    #[test]
    fn test_constants_cover_every_key() {
        let variant = ShaderVariant::new(
            MaterialFeatures::NONE.with(MaterialFeature::NormalMap),
            VertexFormats::for_family(ShaderFamily::Anchor),
        );
        let constants = variant.constants();
        assert_eq!(constants.len(), KEY_COUNT as usize);
        for (expected, constant) in constants.iter().enumerate() {
            assert_eq!(constant.key, expected as u32);
        }

        assert_eq!(constants[1].name, "normal_map");
        assert_eq!(constants[1].value, ConstantValue::Bool(true));
        assert_eq!(constants[0].value, ConstantValue::Bool(false));
        assert_eq!(
            constants[vertex_format::POSITION as usize].value,
            ConstantValue::U32(Float3.value())
        );
        assert_eq!(
            constants[vertex_format::TANGENT as usize].value,
            ConstantValue::U32(Absent.value())
        );
    }

    #[test]
    fn test_override_constants() {
        let variant = ShaderVariant::new(
            MaterialFeatures::NONE.with(MaterialFeature::IrradianceMap),
            VertexFormats::for_family(ShaderFamily::Point),
        );
        let overrides = variant.override_constants();
        assert_eq!(overrides.len(), KEY_COUNT as usize);
        assert_eq!(overrides[5], ("5".to_string(), 1.0));
        assert_eq!(overrides[4], ("4".to_string(), 0.0));
        assert_eq!(overrides[6], ("6".to_string(), 2.0));
        assert_eq!(overrides[7], ("7".to_string(), 0.0));
    }

    #[test]
    fn test_cache_key_distinguishes_variants() {
        let anchor = VertexFormats::for_family(ShaderFamily::Anchor);
        let plain = ShaderVariant::new(MaterialFeatures::NONE, anchor);
        let mapped = ShaderVariant::new(MaterialFeatures::NONE.with(MaterialFeature::BaseColorMap), anchor);
        let with_tangents = ShaderVariant::new(
            MaterialFeatures::NONE,
            VertexFormats {
                tangent: Float4,
                ..anchor
            },
        );

        assert_ne!(plain.cache_key(), mapped.cache_key());
        assert_ne!(plain.cache_key(), with_tangents.cache_key());
        assert_eq!(mapped.cache_key() & 0xFFFF_FFFF, 1);
        assert_eq!(plain.cache_key(), plain.cache_key());
    }

    #[test]
    fn test_component_format_values() {
        for format in [Absent, Float2, Float3, Float4] {
            assert_eq!(VertexComponentFormat::from_value(format.value()), Some(format));
        }
        assert_eq!(VertexComponentFormat::from_value(4), None);
        assert_eq!(Float3.size(), 12);
    }

    #[test]
    fn test_family_formats_validate() {
        for family in ShaderFamily::ALL {
            assert!(VertexFormats::for_family(family).validate_for(family).is_ok());
        }
        let point = VertexFormats::for_family(ShaderFamily::Point);
        assert!(matches!(
            point.validate_for(ShaderFamily::Anchor),
            Err(ContractError::InvalidVariant(_))
        ));
    }
}
