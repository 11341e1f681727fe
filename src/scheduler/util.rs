use crate::model::{Shift, ShiftId};

/// Chevauchement strict de deux plages `[start, end)`.
pub(crate) fn ranges_overlap<T: PartialOrd>(a: (T, T), b: (T, T)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

pub(super) fn find_shift_index(shifts: &[Shift], shift_id: &ShiftId) -> Option<usize> {
    shifts.iter().position(|s| &s.id == shift_id)
}
