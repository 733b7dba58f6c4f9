use glam::{Vec3, Vec4};

use rmrp_compiler::host::{Swizzle, TypeName};
use rmrp_compiler::ParamValue;

/// A host-side shader value: one to four `f32` lanes.
///
/// Width-1 values keep all four lanes equal, so a scalar broadcasts by
/// reading any lane. Lanes past `width` are zero otherwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Value {
    lanes: Vec4,
    width: u8,
}

impl Value {
    fn new(lanes: Vec4, width: u8) -> Self {
        let lanes = match width {
            1 => Vec4::splat(lanes.x),
            2 => Vec4::new(lanes.x, lanes.y, 0.0, 0.0),
            3 => lanes.truncate().extend(0.0),
            _ => lanes,
        };
        Self { lanes, width: width.clamp(1, 4) }
    }

    pub fn scalar(x: f32) -> Self {
        Self::new(Vec4::splat(x), 1)
    }

    pub fn vec3(v: Vec3) -> Self {
        Self::new(v.extend(0.0), 3)
    }

    pub fn vec4(v: Vec4) -> Self {
        Self::new(v, 4)
    }

    /// Zero of the given type.
    pub fn zero(ty: TypeName) -> Self {
        Self::new(Vec4::ZERO, ty.width)
    }

    pub fn from_param(value: &ParamValue) -> Self {
        let words = value.words();
        let mut lanes = [0.0; 4];
        lanes[..words.len()].copy_from_slice(words);
        Self::new(Vec4::from_array(lanes), words.len() as u8)
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.lanes.x
    }

    #[inline]
    pub fn lanes(&self) -> Vec4 {
        self.lanes
    }

    #[inline]
    pub fn xyz(&self) -> Vec3 {
        self.lanes.truncate()
    }

    fn active(&self) -> impl Iterator<Item = f32> {
        self.lanes.to_array().into_iter().take(self.width as usize)
    }

    /// Sum of the active lanes.
    pub fn sum(&self) -> f32 {
        self.active().sum()
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(Vec4::from_array(self.lanes.to_array().map(f)), self.width)
    }

    /// Lane-wise `f`. A scalar operand takes the other operand's width;
    /// two vectors of different widths truncate to the narrower.
    pub fn zip(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let width = broadcast(self.width, other.width);
        let (a, b) = (self.lanes.to_array(), other.lanes.to_array());
        Self::new(Vec4::from_array(std::array::from_fn(|i| f(a[i], b[i]))), width)
    }

    pub fn zip3(self, b: Self, c: Self, f: impl Fn(f32, f32, f32) -> f32) -> Self {
        let width = broadcast(broadcast(self.width, b.width), c.width);
        let (a, b, c) = (self.lanes.to_array(), b.lanes.to_array(), c.lanes.to_array());
        Self::new(Vec4::from_array(std::array::from_fn(|i| f(a[i], b[i], c[i]))), width)
    }

    /// Implicit conversion to `width` lanes: scalars splat, wider vectors
    /// truncate, narrower vectors cannot widen.
    pub fn resize(self, width: u8) -> Result<Self, String> {
        if self.width == 1 || self.width >= width {
            Ok(Self::new(self.lanes, width))
        } else {
            Err(format!("cannot convert a {}-lane value to {width} lanes", self.width))
        }
    }

    /// Conversion on store into a local of type `ty`.
    pub fn convert(self, ty: TypeName) -> Result<Self, String> {
        let v = self.resize(ty.width)?;
        Ok(if ty.integer { v.map(f32::trunc) } else { v })
    }

    pub fn swizzle(self, swizzle: &Swizzle) -> Result<Self, String> {
        let mut out = [0.0; 4];
        for (slot, &lane) in out.iter_mut().zip(swizzle.lanes()) {
            if self.width > 1 && lane >= self.width {
                return Err(format!("lane {lane} of a {}-lane value", self.width));
            }
            if self.width == 1 && lane > 0 {
                return Err("scalars only have an x lane".into());
            }
            *slot = self.lanes[lane as usize];
        }
        Ok(Self::new(Vec4::from_array(out), swizzle.lanes().len() as u8))
    }

    /// Writes `value` into the lanes `swizzle` selects.
    pub fn write_lanes(self, swizzle: &Swizzle, value: Self) -> Result<Self, String> {
        if !swizzle.is_writable() {
            return Err("swizzle repeats a lane and cannot be assigned".into());
        }
        let value = value.resize(swizzle.lanes().len() as u8)?;
        let mut lanes = self.lanes;
        for (i, &lane) in swizzle.lanes().iter().enumerate() {
            if lane >= self.width {
                return Err(format!("lane {lane} of a {}-lane value", self.width));
            }
            lanes[lane as usize] = value.lanes[i];
        }
        Ok(Self::new(lanes, self.width))
    }
}

fn broadcast(a: u8, b: u8) -> u8 {
    match (a, b) {
        (1, w) | (w, 1) => w,
        (a, b) => a.min(b),
    }
}
