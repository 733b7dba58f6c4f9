use std::sync::Arc;

use crate::compile::CompiledArtifact;
use crate::error::ParameterError;
use crate::layout::BufferLayout;
use crate::params::{ParamKind, ParamValue};

/// Current parameter values of one scene, flattened for upload.
///
/// The store is bound to the layout it was created from. Setting a value
/// rewrites only the words of that parameter's slot; the whole array is
/// what gets uploaded. When the parameter set changes the store is thrown
/// away and a new one is built from the new artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    layout: Arc<BufferLayout>,
    values: Vec<f32>,
    dirty: bool,
}

impl ParameterStore {
    /// Store seeded with `values`, which must be exactly
    /// `layout.total_words()` long.
    pub fn new(layout: Arc<BufferLayout>, values: Vec<f32>) -> Result<Self, ParameterError> {
        let expected = layout.total_words() as usize;
        if values.len() != expected {
            return Err(ParameterError::WordCountMismatch { expected, found: values.len() });
        }
        Ok(Self { layout, values, dirty: true })
    }

    /// Store seeded with an artifact's packed defaults.
    pub fn from_artifact(artifact: &CompiledArtifact) -> Self {
        // `compile` sizes the defaults from the same layout.
        Self {
            layout: Arc::clone(&artifact.layout),
            values: artifact.defaults.clone(),
            dirty: true,
        }
    }

    pub fn layout(&self) -> &Arc<BufferLayout> {
        &self.layout
    }

    /// Writes `value` into the words of `name`'s slot.
    ///
    /// The value's kind must match the declared kind. On error nothing is
    /// written.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParameterError> {
        let value = value.into();
        let slot = self
            .layout
            .slot(name)
            .ok_or_else(|| ParameterError::UnknownParameterName(name.to_string()))?;

        if slot.kind != value.kind() {
            return Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: slot.kind,
                found: value.kind(),
            });
        }

        let range = slot.words();
        self.values[range].copy_from_slice(value.words());
        self.dirty = true;
        log::trace!("parameter {name} = {value:?}");
        Ok(())
    }

    /// Reads back the current value of `name`.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        let slot = self.layout.slot(name)?;
        ParamValue::from_words(&self.values[slot.words()])
    }

    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.layout.slot(name).map(|s| s.kind)
    }

    /// Flattened buffer image, `layout.total_words()` long.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Upload bytes in native IEEE-754 order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.layout.byte_size()
    }

    /// `true` when values changed since the last [`clear_dirty`](Self::clear_dirty).
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call after uploading [`as_bytes`](Self::as_bytes).
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::allocate;
    use crate::params::ParameterDeclaration;

    fn store() -> ParameterStore {
        let a = allocate(&[
            ParameterDeclaration::new("a", 1.0_f32),
            ParameterDeclaration::new("b", [2.0_f32, 3.0, 4.0]),
            ParameterDeclaration::new("c", 5.0_f32),
            ParameterDeclaration::new("q", [6.0_f32, 7.0, 8.0, 9.0]),
        ])
        .unwrap();
        ParameterStore::new(Arc::new(a.layout), a.defaults).unwrap()
    }

    #[test]
    fn set_touches_only_its_slot() {
        let mut s = store();
        let before = s.values().to_vec();
        s.set("a", 10.0_f32).unwrap();

        let after = s.values();
        assert_eq!(after[0], 10.0);
        for i in 1..before.len() {
            assert_eq!(after[i], before[i], "word {i} changed");
        }
    }

    #[test]
    fn vec4_writes_all_four_components() {
        let mut s = store();
        s.set("q", [-1.0_f32, -2.0, -3.0, -4.0]).unwrap();
        assert_eq!(&s.values()[8..12], &[-1.0, -2.0, -3.0, -4.0]);
        assert_eq!(s.get("q"), Some(ParamValue::Vector4([-1.0, -2.0, -3.0, -4.0])));
        // Word 7 belongs to `c`, which must be untouched.
        assert_eq!(s.values()[7], 5.0);
    }

    #[test]
    fn unknown_name_leaves_store_unchanged() {
        let mut s = store();
        let before = s.clone();
        assert_eq!(
            s.set("nope", 1.0_f32),
            Err(ParameterError::UnknownParameterName("nope".into()))
        );
        assert_eq!(s, before);
    }

    #[test]
    fn kind_mismatch_leaves_store_unchanged() {
        let mut s = store();
        let before = s.values().to_vec();
        assert_eq!(
            s.set("b", [1.0_f32, 2.0]),
            Err(ParameterError::TypeMismatch {
                name: "b".into(),
                expected: ParamKind::Vector3,
                found: ParamKind::Vector2,
            })
        );
        assert_eq!(s.values(), &before[..]);
    }

    #[test]
    fn bytes_match_values() {
        let s = store();
        assert_eq!(s.as_bytes().len() as u64, s.byte_size());
        assert_eq!(&s.as_bytes()[0..4], &1.0_f32.to_ne_bytes());
    }

    #[test]
    fn new_rejects_a_wrong_length_image() {
        let a = allocate(&[ParameterDeclaration::new("a", 1.0_f32)]).unwrap();
        let layout = Arc::new(a.layout);
        for found in [0, 3, 5] {
            assert_eq!(
                ParameterStore::new(Arc::clone(&layout), vec![0.0; found]),
                Err(ParameterError::WordCountMismatch { expected: 4, found })
            );
        }
        let s = ParameterStore::new(Arc::clone(&layout), vec![2.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(Arc::ptr_eq(s.layout(), &layout));
        assert_eq!(s.get("a"), Some(ParamValue::Scalar(2.0)));
    }

    #[test]
    fn kind_of_follows_the_layout() {
        let s = store();
        assert_eq!(s.kind_of("a"), Some(ParamKind::Scalar));
        assert_eq!(s.kind_of("b"), Some(ParamKind::Vector3));
        assert_eq!(s.kind_of("q"), Some(ParamKind::Vector4));
        assert_eq!(s.kind_of("nope"), None);
    }

    #[test]
    fn dirty_tracking() {
        let mut s = store();
        assert!(s.is_dirty());
        s.clear_dirty();
        assert!(!s.is_dirty());
        let _ = s.set("nope", 0.0_f32);
        assert!(!s.is_dirty());
        s.set("c", 0.0_f32).unwrap();
        assert!(s.is_dirty());
    }
}
