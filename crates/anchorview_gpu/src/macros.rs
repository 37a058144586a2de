//! Macros for declaring role enums over slot tables.

/// Declares a role enum whose variants map onto numbered slots.
///
/// Each variant names the constant that holds its slot number, a snake_case
/// label (used for tables and generated shader identifiers) and the consumer
/// category that reads it. The numbers themselves stay in the named
/// constants; the enum only selects among them.
///
/// # Usage
///
/// ```ignore
/// slot_roles! {
///     /// Buffer binding roles.
///     pub enum BufferRole in "buffer" {
///         MeshPositions = buffer::MESH_POSITIONS, "mesh_positions", Mesh;
///         SharedUniforms = buffer::SHARED_UNIFORMS, "shared_uniforms", Scene;
///     }
/// }
/// // Generates: BufferRole::{ALL, COUNT, CATEGORY, ENTRIES}, slot(), name(),
/// // consumer(), from_slot() and a SlotRole impl.
/// ```
macro_rules! slot_roles {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $category:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $slot:expr, $label:literal, $consumer:ident;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $name {
            /// Every role, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];
            pub const COUNT: usize = Self::ALL.len();
            pub const CATEGORY: &'static str = $category;
            /// Named slots for building a [`SlotTable`](crate::registry::SlotTable).
            pub const ENTRIES: &'static [$crate::registry::SlotEntry<'static>] =
                &[$($crate::registry::SlotEntry::new($label, $slot),)*];

            pub const fn slot(self) -> u32 {
                match self {
                    $(Self::$variant => $slot,)*
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                }
            }

            pub const fn consumer(self) -> $crate::bindings::ConsumerCategory {
                match self {
                    $(Self::$variant => $crate::bindings::ConsumerCategory::$consumer,)*
                }
            }

            pub fn from_slot(slot: u32) -> Option<Self> {
                Self::ALL.iter().copied().find(|role| role.slot() == slot)
            }
        }

        impl $crate::bindings::SlotRole for $name {
            const CATEGORY: &'static str = $category;

            fn slot(self) -> u32 {
                $name::slot(self)
            }

            fn name(self) -> &'static str {
                $name::name(self)
            }

            fn consumer(self) -> $crate::bindings::ConsumerCategory {
                $name::consumer(self)
            }
        }
    };
}

/// Asserts at compile time that a `#[repr(C)]` struct matches its documented
/// [`GpuLayout`](crate::layout::GpuLayout): total size, and the name and
/// offset of every listed field, in order.
///
/// # Usage
///
/// ```ignore
/// assert_gpu_layout!(MaterialUniforms, [base_color, irradiated_color, roughness, metalness]);
/// ```
macro_rules! assert_gpu_layout {
    ($ty:ty, [$($field:ident),* $(,)?]) => {
        const _: () = {
            let layout = <$ty as $crate::layout::GpuLayout>::LAYOUT;
            assert!(layout.is_consistent());
            assert!(core::mem::size_of::<$ty>() == layout.size as usize);
            let mut i = 0;
            $(
                assert!(core::mem::offset_of!($ty, $field) == layout.fields[i].offset as usize);
                assert!($crate::layout::str_eq(layout.fields[i].name, stringify!($field)));
                i += 1;
            )*
            assert!(i == layout.fields.len());
        };
    };
}
