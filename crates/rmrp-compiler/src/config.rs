use crate::error::CompileError;

/// Per-compile render settings baked into the kernel as literals.
///
/// Changing any of these requires a recompile; none of them is uploaded
/// through the parameter buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Maximum march iterations per ray.
    pub step_budget: u32,

    /// Output resolution relative to the target image.
    ///
    /// The kernel multiplies screen positions by `1 / resolution_scale`, so
    /// `0.5` traces a half-resolution image.
    pub resolution_scale: f32,

    /// Edge length of the square `numthreads` group.
    pub thread_group_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            step_budget: 256,
            resolution_scale: 1.0,
            thread_group_size: 8,
        }
    }
}

impl RenderConfig {
    /// Largest supported group edge (32 × 32 = 1024 threads).
    pub const MAX_THREAD_GROUP_SIZE: u32 = 32;

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.step_budget == 0 {
            return Err(CompileError::InvalidRenderConfig(
                "step budget must be at least 1".into(),
            ));
        }
        if !self.resolution_scale.is_finite() || self.resolution_scale <= 0.0 {
            return Err(CompileError::InvalidRenderConfig(format!(
                "resolution scale must be a positive finite number, got {}",
                self.resolution_scale
            )));
        }
        if !(1..=Self::MAX_THREAD_GROUP_SIZE).contains(&self.thread_group_size) {
            return Err(CompileError::InvalidRenderConfig(format!(
                "thread group size must be in 1..={}, got {}",
                Self::MAX_THREAD_GROUP_SIZE,
                self.thread_group_size
            )));
        }
        Ok(())
    }

    /// Resolution factor as it appears in kernel source.
    pub fn resolution_literal(&self) -> String {
        format!("{:.3}", 1.0 / self.resolution_scale)
    }

    /// Thread groups to dispatch for a `width` × `height` output.
    pub fn dispatch_groups(&self, width: u32, height: u32) -> (u32, u32, u32) {
        let g = self.thread_group_size.max(1);
        (width.div_ceil(g), height.div_ceil(g), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn resolution_literal_has_three_digits() {
        let mut c = RenderConfig::default();
        assert_eq!(c.resolution_literal(), "1.000");
        c.resolution_scale = 0.5;
        assert_eq!(c.resolution_literal(), "2.000");
        c.resolution_scale = 3.0;
        assert_eq!(c.resolution_literal(), "0.333");
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            RenderConfig { step_budget: 0, ..Default::default() },
            RenderConfig { resolution_scale: 0.0, ..Default::default() },
            RenderConfig { resolution_scale: -1.0, ..Default::default() },
            RenderConfig { resolution_scale: f32::NAN, ..Default::default() },
            RenderConfig { thread_group_size: 0, ..Default::default() },
            RenderConfig { thread_group_size: 33, ..Default::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(CompileError::InvalidRenderConfig(_))), "{c:?}");
        }
    }

    #[test]
    fn dispatch_groups_round_up() {
        let c = RenderConfig::default();
        assert_eq!(c.dispatch_groups(1920, 1080), (240, 135, 1));
        assert_eq!(c.dispatch_groups(1, 9), (1, 2, 1));
    }
}
