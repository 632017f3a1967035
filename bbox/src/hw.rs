use crate::common::*;

/// The height and width of an image or a box.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "height and width parameters must be non-negative"
        );
        Ok(Self { h, w })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    /// The unit size, i.e. the whole image in ratio units.
    pub fn unit() -> Self {
        Self {
            h: T::one(),
            w: T::one(),
        }
    }

    pub fn w(&self) -> T {
        self.w
    }

    pub fn h(&self) -> T {
        self.h
    }
}

impl<T> HW<T>
where
    T: Float,
{
    /// The extent of one pixel in ratio units of an image of this size.
    pub fn pixel_extent(&self) -> Self {
        Self {
            h: self.h.recip(),
            w: self.w.recip(),
        }
    }
}
