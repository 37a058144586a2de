//! Per-frame render configuration.
//!
//! Decides how many passes a frame emits, at which quality tier, and how the
//! per-frame uniform buffers are laid out for double or triple buffering.
//! Frame N writes ring slot `N % frames_in_flight`; waiting for the GPU to
//! release that slot before writing it is the renderer's job.

use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};
use crate::layout::GpuLayout;
use crate::modes::{QualityTier, Viewport};
use crate::uniform::{AnchorInstanceUniforms, MaterialUniforms, SharedUniforms};

/// Upper bound on frames the CPU may prepare ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: u32 = 3;

/// How many eyes a frame renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportMode {
    /// One pass, written to the left-eye slot.
    Mono,
    /// One pass per [`Viewport`].
    Stereo,
}

/// Configuration for building one frame's passes and uniform buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default = "default_viewport_mode")]
    pub viewport_mode: ViewportMode,

    #[serde(default = "default_quality")]
    pub quality: QualityTier,

    /// Frames the CPU may prepare while the GPU still reads older ones.
    #[serde(default = "default_frames_in_flight")]
    pub frames_in_flight: u32,

    /// Minimum offset alignment for dynamic uniform bindings.
    #[serde(default = "default_uniform_offset_alignment")]
    pub uniform_offset_alignment: u32,

    /// Minimum offset alignment for storage bindings.
    #[serde(default = "default_storage_offset_alignment")]
    pub storage_offset_alignment: u32,

    /// Capacity of the anchor instance array per frame.
    #[serde(default = "default_max_anchor_instances")]
    pub max_anchor_instances: u32,
}

fn default_viewport_mode() -> ViewportMode {
    ViewportMode::Mono
}

fn default_quality() -> QualityTier {
    QualityTier::High
}

fn default_frames_in_flight() -> u32 {
    MAX_FRAMES_IN_FLIGHT
}

fn default_uniform_offset_alignment() -> u32 {
    256
}

fn default_storage_offset_alignment() -> u32 {
    256
}

fn default_max_anchor_instances() -> u32 {
    64
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            viewport_mode: default_viewport_mode(),
            quality: default_quality(),
            frames_in_flight: default_frames_in_flight(),
            uniform_offset_alignment: default_uniform_offset_alignment(),
            storage_offset_alignment: default_storage_offset_alignment(),
            max_anchor_instances: default_max_anchor_instances(),
        }
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

impl FrameConfig {
    /// Create config for head-mounted stereo rendering.
    pub fn stereo() -> Self {
        Self {
            viewport_mode: ViewportMode::Stereo,
            ..Self::default()
        }
    }

    /// Create config for low power: mono, low tier, double buffered.
    pub fn power_saving() -> Self {
        Self {
            quality: QualityTier::Low,
            frames_in_flight: 2,
            ..Self::default()
        }
    }

    /// Set viewport mode.
    pub fn with_viewport_mode(mut self, mode: ViewportMode) -> Self {
        self.viewport_mode = mode;
        self
    }

    /// Set quality tier.
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Set frames in flight.
    pub fn with_frames_in_flight(mut self, frames: u32) -> Self {
        self.frames_in_flight = frames;
        self
    }

    /// Set uniform offset alignment, usually the device's
    /// `min_uniform_buffer_offset_alignment`.
    pub fn with_uniform_offset_alignment(mut self, alignment: u32) -> Self {
        self.uniform_offset_alignment = alignment;
        self
    }

    /// Set storage offset alignment, usually the device's
    /// `min_storage_buffer_offset_alignment`.
    pub fn with_storage_offset_alignment(mut self, alignment: u32) -> Self {
        self.storage_offset_alignment = alignment;
        self
    }

    /// Set anchor instance capacity.
    pub fn with_max_anchor_instances(mut self, count: u32) -> Self {
        self.max_anchor_instances = count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&self.frames_in_flight) {
            return Err(ContractError::InvalidFrameConfig(format!(
                "frames_in_flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        for (name, alignment) in [
            ("uniform_offset_alignment", self.uniform_offset_alignment),
            ("storage_offset_alignment", self.storage_offset_alignment),
        ] {
            if !alignment.is_power_of_two() || alignment < SharedUniforms::LAYOUT.align {
                return Err(ContractError::InvalidFrameConfig(format!(
                    "{} must be a power of two of at least {}, got {}",
                    name,
                    SharedUniforms::LAYOUT.align,
                    alignment
                )));
            }
        }
        if self.max_anchor_instances == 0 {
            return Err(ContractError::InvalidFrameConfig(
                "max_anchor_instances must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Viewports rendered each frame, in pass order.
    pub fn viewports(&self) -> &'static [Viewport] {
        match self.viewport_mode {
            ViewportMode::Mono => &[Viewport::Left],
            ViewportMode::Stereo => &Viewport::ALL,
        }
    }

    pub fn pass_count(&self) -> usize {
        self.viewports().len()
    }

    /// Buffer ring slot written while preparing `frame_index`.
    pub fn ring_slot(&self, frame_index: u64) -> Result<usize> {
        self.validate()?;
        Ok((frame_index % u64::from(self.frames_in_flight)) as usize)
    }

    /// Distance between consecutive [`SharedUniforms`] in the ring buffer,
    /// bound by dynamic offset.
    pub fn shared_uniform_stride(&self) -> Result<u64> {
        self.validate()?;
        Ok(align_up(
            u64::from(SharedUniforms::LAYOUT.size),
            u64::from(self.uniform_offset_alignment),
        ))
    }

    /// One [`SharedUniforms`] per pass per frame in flight.
    pub fn shared_uniform_buffer_size(&self) -> Result<u64> {
        Ok(self.shared_uniform_stride()? * self.pass_count() as u64 * u64::from(self.frames_in_flight))
    }

    /// Offset of the [`SharedUniforms`] for `viewport` while preparing
    /// `frame_index`, or `None` if this configuration does not render it.
    pub fn shared_uniform_offset(&self, frame_index: u64, viewport: Viewport) -> Result<Option<u64>> {
        let stride = self.shared_uniform_stride()?;
        let ring_slot = self.ring_slot(frame_index)?;
        Ok(self
            .viewports()
            .iter()
            .position(|v| *v == viewport)
            .map(|pass| (ring_slot * self.pass_count() + pass) as u64 * stride))
    }

    /// Bytes reserved per frame for the anchor instance storage array.
    pub fn anchor_instance_stride(&self) -> Result<u64> {
        self.validate()?;
        let array = u64::from(AnchorInstanceUniforms::LAYOUT.size) * u64::from(self.max_anchor_instances);
        Ok(align_up(array, u64::from(self.storage_offset_alignment)))
    }

    pub fn anchor_instance_buffer_size(&self) -> Result<u64> {
        Ok(self.anchor_instance_stride()? * u64::from(self.frames_in_flight))
    }

    pub fn anchor_instance_offset(&self, frame_index: u64) -> Result<u64> {
        Ok(self.ring_slot(frame_index)? as u64 * self.anchor_instance_stride()?)
    }

    /// Distance between consecutive [`MaterialUniforms`] when several share a
    /// buffer and are bound by dynamic offset, see
    /// [`dynamic_buffer_entry`](crate::pipeline::dynamic_buffer_entry).
    pub fn material_uniform_stride(&self) -> Result<u64> {
        self.validate()?;
        Ok(align_up(
            u64::from(MaterialUniforms::LAYOUT.size),
            u64::from(self.uniform_offset_alignment),
        ))
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FrameConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!("Loaded frame config: {:?}", config);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
