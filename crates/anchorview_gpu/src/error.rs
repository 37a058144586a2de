use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("{category}: slot {slot} is assigned more than once")]
    DuplicateSlot { category: String, slot: u32 },

    #[error("{category}: slot {slot} is unassigned (tables must be dense)")]
    SlotGap { category: String, slot: u32 },

    #[error("{category}: slot {slot} lies outside {first}..{end}")]
    SlotOutOfRange {
        category: String,
        slot: u32,
        first: u32,
        end: u32,
    },

    #[error("{category}: tier starts at {found}, expected {expected}")]
    TierMisaligned {
        category: String,
        expected: u32,
        found: u32,
    },

    #[error("{structure}.{field}: offset {offset} is not a multiple of {align}")]
    FieldMisaligned {
        structure: String,
        field: String,
        offset: u32,
        align: u32,
    },

    #[error("{structure}.{field}: expected at offset {expected}, documented at {found}")]
    FieldMisplaced {
        structure: String,
        field: String,
        expected: u32,
        found: u32,
    },

    #[error("{structure}.{field}: storage of {size} bytes is smaller than {natural}")]
    FieldTooSmall {
        structure: String,
        field: String,
        size: u32,
        natural: u32,
    },

    #[error("{structure}.{field}: ends at {end}, past struct size {size}")]
    FieldOutOfBounds {
        structure: String,
        field: String,
        end: u32,
        size: u32,
    },

    #[error("{structure}: size {size} does not match {expected}")]
    StructSize {
        structure: String,
        size: u32,
        expected: u32,
    },

    #[error("{structure}: alignment {align} does not match {expected}")]
    StructAlign {
        structure: String,
        align: u32,
        expected: u32,
    },

    #[error("Invalid shader variant: {0}")]
    InvalidVariant(String),

    #[error("Pipeline construction error: {0}")]
    Pipeline(String),

    #[error("Invalid frame configuration: {0}")]
    InvalidFrameConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContractError>;
