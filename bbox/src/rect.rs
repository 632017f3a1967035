use crate::{common::*, HW};

/// The generic rectangle.
///
/// The vertical axis is `t`/`b` and the horizontal axis is `l`/`r`. Image
/// annotations usually come in `[x1, y1, x2, y2]` order, which maps to
/// `[l, t, r, b]`.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized,
    {
        let [x1, y1, x2, y2] = xyxy;
        Self::try_from_tlbr([y1, x1, y2, x2])
    }
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_xyxy(xyxy: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    /// Corners in `[x1, y1, x2, y2]` order.
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }

    fn area(&self) -> <Self::Type as Mul<Self::Type>>::Output
    where
        Self::Type: Mul<Self::Type>,
    {
        self.h() * self.w()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Compute IoU with every extent widened by a fixed margin.
    ///
    /// Heights are widened by `margin.h()` and widths by `margin.w()`, both
    /// for the box areas and the intersection. Negative intersection extents
    /// are clamped to zero after widening.
    fn widened_iou_with<R>(&self, other: &R, margin: &HW<Self::Type>) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let zero = Self::Type::zero();
        let margin_h = margin.h();
        let margin_w = margin.w();

        let self_area = (self.r() - self.l() + margin_w) * (self.b() - self.t() + margin_h);
        let other_area = (other.r() - other.l() + margin_w) * (other.b() - other.t() + margin_h);

        let inter_w = (self.r().min(other.r()) - self.l().max(other.l()) + margin_w).max(zero);
        let inter_h = (self.b().min(other.b()) - self.t().max(other.t()) + margin_h).max(zero);
        let inter_area = inter_w * inter_h;

        inter_area / (self_area + other_area - inter_area)
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}
