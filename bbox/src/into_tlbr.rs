use crate::{common::*, rect::Rect, HW};

/// Bounding box in TLBR format.
///
/// The corners are not validated, so values read straight from a dataset,
/// including zero padding rows, can be carried around and measured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TLBR_<T> {
    pub t: T,
    pub l: T,
    pub b: T,
    pub r: T,
}

impl<T> TLBR_<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Convert pixel units of an image of `size` to ratio units.
    ///
    /// Vertical coordinates are divided by the height and horizontal ones by
    /// the width.
    pub fn to_ratio(&self, size: &HW<T>) -> Self {
        let h = size.h();
        let w = size.w();

        TLBR_ {
            t: self.t / h,
            l: self.l / w,
            b: self.b / h,
            r: self.r / w,
        }
    }
}

impl<T> Rect for TLBR_<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        Ok(Self { t, l, b, r })
    }
}
