//! Named-axis access to variable arrays.
//!
//! Callers address array regions by [`Axis`] name instead of by position.
//! Axes that are not mentioned in a [`Selection`] default to their full
//! range. A variable declared over the scalar axis `I` answers to requests
//! expressed over the measurement axis `M`: reads synthesize the repeated
//! view, writes target the single scalar slot.

use std::collections::BTreeMap;
use std::ops::Range;

use ndarray::{ArrayBase, ArrayD, ArrayViewD, Axis as NdAxis, IxDyn, RawData, Slice};

use crate::axis::{with_measurement_alias, Axis};
use crate::dimension::Dimensions;
use crate::error::{FormatError, Result};

/// Index along a single named axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// A single position; the axis is dropped from the result.
    At(usize),
    /// A half-open range of positions.
    Range(Range<usize>),
    /// The full axis.
    All,
}

/// A mapping from axis name to [`Index`].
///
/// # Example
///
/// ```
/// use sofa_format::{Axis, Index, Selection};
///
/// let sel = Selection::new().at(Axis::M, 3).range(Axis::R, 0..1);
/// assert_eq!(sel.get(Axis::M), Some(&Index::At(3)));
/// assert_eq!(sel.get(Axis::C), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: BTreeMap<Axis, Index>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, axis: Axis, index: usize) -> Self {
        self.indices.insert(axis, Index::At(index));
        self
    }

    pub fn range(mut self, axis: Axis, range: Range<usize>) -> Self {
        self.indices.insert(axis, Index::Range(range));
        self
    }

    /// Names `axis` explicitly with its full range.
    pub fn all(mut self, axis: Axis) -> Self {
        self.indices.insert(axis, Index::All);
        self
    }

    pub fn insert(&mut self, axis: Axis, index: Index) {
        self.indices.insert(axis, index);
    }

    pub fn get(&self, axis: Axis) -> Option<&Index> {
        self.indices.get(&axis)
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.indices.contains_key(&axis)
    }

    /// A copy of this selection with `axis` removed.
    pub fn without(&self, axis: Axis) -> Self {
        let mut indices = self.indices.clone();
        indices.remove(&axis);
        Self { indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &Index)> + '_ {
        self.indices.iter().map(|(a, i)| (*a, i))
    }

    /// The index that applies to a variable axis, resolving the I/M alias.
    ///
    /// A scalar axis selected through `M` collapses to its only slot when `M`
    /// is indexed by position and stays whole otherwise.
    pub fn index_for(&self, axis: Axis) -> Option<Index> {
        if let Some(index) = self.indices.get(&axis) {
            return Some(index.clone());
        }
        if axis == Axis::I {
            return self.indices.get(&Axis::M).map(|m| match m {
                Index::At(_) => Index::At(0),
                _ => Index::All,
            });
        }
        None
    }
}

/// Position of `axis` in `dims`, falling back to its I/M alias partner.
pub fn axis_position(dims: &[Axis], axis: Axis) -> Option<usize> {
    dims.iter().position(|d| *d == axis).or_else(|| {
        axis.alias()
            .and_then(|alias| dims.iter().position(|d| *d == alias))
    })
}

/// Axis order of a read result when no explicit order is requested:
/// the variable's axes minus those indexed by a single position.
pub fn default_order(dims: &[Axis], selection: &Selection) -> Vec<Axis> {
    dims.iter()
        .copied()
        .filter(|d| !matches!(selection.index_for(*d), Some(Index::At(_))))
        .collect()
}

/// Permutation that reorders axes `old` into the order `new`.
fn transposition(variable: &str, old: &[Axis], new: &[Axis]) -> Result<Vec<usize>> {
    if old.len() != new.len() {
        return Err(FormatError::mismatch(
            variable,
            format!("cannot transpose from {old:?} to {new:?}"),
        ));
    }
    let mut perm = Vec::with_capacity(new.len());
    for axis in new {
        let pos = axis_position(old, *axis).ok_or_else(|| {
            FormatError::mismatch(
                variable,
                format!("axis {axis} not available in {old:?}"),
            )
        })?;
        if perm.contains(&pos) {
            return Err(FormatError::mismatch(
                variable,
                format!("axis {axis} requested twice in {new:?}"),
            ));
        }
        perm.push(pos);
    }
    Ok(perm)
}

/// Narrows `array` to the region named by `selection`.
fn apply_selection<S>(
    variable: &str,
    mut array: ArrayBase<S, IxDyn>,
    dims: &[Axis],
    selection: &Selection,
) -> Result<ArrayBase<S, IxDyn>>
where
    S: RawData,
{
    if array.ndim() != dims.len() {
        return Err(FormatError::mismatch(
            variable,
            format!("array has {} axes, declared {dims:?}", array.ndim()),
        ));
    }
    // Walk backwards so removing an axis keeps earlier positions valid.
    for (pos, axis) in dims.iter().enumerate().rev() {
        let len = array.len_of(NdAxis(pos));
        match selection.index_for(*axis) {
            None | Some(Index::All) => {}
            Some(Index::At(i)) => {
                if i >= len {
                    return Err(FormatError::mismatch(
                        variable,
                        format!("index {i} out of range for {axis} of size {len}"),
                    ));
                }
                array = array.index_axis_move(NdAxis(pos), i);
            }
            Some(Index::Range(r)) => {
                if r.start > r.end || r.end > len {
                    return Err(FormatError::mismatch(
                        variable,
                        format!("range {r:?} out of bounds for {axis} of size {len}"),
                    ));
                }
                array.slice_axis_inplace(NdAxis(pos), Slice::from(r));
            }
        }
    }
    Ok(array)
}

/// Reads a region of `array`, optionally reordered to `dim_order`.
///
/// When `dim_order` requests `M` where the array only has `I`, the scalar
/// slot is repeated to the measurement count (or to the length of an `M`
/// range in `selection`).
///
/// # Errors
///
/// Returns [`FormatError::DimensionMismatch`] if an index is out of range or
/// `dim_order` names an axis that is neither present nor alias-resolvable.
pub fn read<T: Clone>(
    variable: &str,
    array: &ArrayD<T>,
    dims: &[Axis],
    dimensions: &Dimensions,
    selection: &Selection,
    dim_order: Option<&[Axis]>,
) -> Result<ArrayD<T>> {
    let view = apply_selection(variable, array.view(), dims, selection)?;
    let Some(order) = dim_order else {
        return Ok(view.to_owned());
    };

    let old = default_order(dims, selection);
    let perm = transposition(variable, &old, order)?;
    let view = view.permuted_axes(perm.clone());

    let mut shape = view.shape().to_vec();
    let mut repeated = false;
    for (p, wanted) in order.iter().enumerate() {
        if *wanted == Axis::M && old[perm[p]] == Axis::I {
            shape[p] = match selection.get(Axis::M) {
                Some(Index::Range(r)) => r.len(),
                _ => dimensions.get(Axis::M).unwrap_or(1),
            };
            repeated = true;
        }
    }
    if !repeated {
        return Ok(view.to_owned());
    }
    broadcast_owned(variable, view, &shape)
}

fn broadcast_owned<T: Clone>(
    variable: &str,
    view: ArrayViewD<'_, T>,
    shape: &[usize],
) -> Result<ArrayD<T>> {
    let from = view.shape().to_vec();
    view.broadcast(IxDyn(shape))
        .map(|b| b.to_owned())
        .ok_or_else(|| {
            FormatError::mismatch(
                variable,
                format!("cannot broadcast shape {from:?} to {shape:?}"),
            )
        })
}

/// Writes `values` into the region of `array` named by `selection`.
///
/// `dim_order` names the axes of `values`; without it `values` must already
/// follow the variable's axis order. `repeat_along` names axes that
/// `values` lacks and along which it is tiled before assignment.
///
/// Axes are compared in measurement-axis terms: for a variable over `I`,
/// `I` and `M` name the same slot.
///
/// # Errors
///
/// - [`FormatError::RepeatConflict`] if an axis is in both `dim_order` and
///   `repeat_along`.
/// - [`FormatError::DimensionMismatch`] if an axis cannot be resolved, an
///   axis of `values` is indexed by a single position, an unselected axis is
///   missing from the order, or the shapes do not broadcast.
pub fn write<T: Clone>(
    variable: &str,
    array: &mut ArrayD<T>,
    dims: &[Axis],
    values: ArrayViewD<'_, T>,
    selection: &Selection,
    dim_order: Option<&[Axis]>,
    repeat_along: &[Axis],
) -> Result<()> {
    let logical = with_measurement_alias(dims);
    let resolved: Vec<Option<Index>> = dims.iter().map(|d| selection.index_for(*d)).collect();
    let region_axes: Vec<Axis> = logical
        .iter()
        .zip(&resolved)
        .filter(|(_, idx)| !matches!(idx, Some(Index::At(_))))
        .map(|(a, _)| *a)
        .collect();

    let dim_order = dim_order.map(with_measurement_alias);
    let repeat_along = with_measurement_alias(repeat_along);

    let mut region = apply_selection(variable, array.view_mut(), dims, selection)?;
    let mut values = values.to_owned();

    let mut full_order = dim_order.clone();
    if !repeat_along.is_empty() {
        let mut order = full_order.take().unwrap_or_else(|| {
            region_axes
                .iter()
                .copied()
                .filter(|a| !repeat_along.contains(a))
                .collect()
        });
        for axis in &repeat_along {
            if dim_order.as_ref().is_some_and(|o| o.contains(axis)) {
                return Err(FormatError::RepeatConflict {
                    variable: variable.to_string(),
                    axis: *axis,
                });
            }
            let pos = region_axes.iter().position(|a| a == axis).ok_or_else(|| {
                FormatError::mismatch(
                    variable,
                    format!("cannot repeat along {axis}: not a free axis of {logical:?}"),
                )
            })?;
            let count = region.len_of(NdAxis(pos));
            let mut shape = vec![count];
            shape.extend_from_slice(values.shape());
            let expanded = values.insert_axis(NdAxis(0));
            values = broadcast_owned(variable, expanded.view(), &shape)?;
            order.insert(0, *axis);
        }
        full_order = Some(order);
    }

    if let Some(order) = full_order {
        values = reorder_to_layout(variable, values, &logical, &resolved, &region_axes, &order)?;
    }

    let target = region.shape().to_vec();
    let source = values.shape().to_vec();
    let Some(broadcast) = values.broadcast(IxDyn(&target)) else {
        return Err(FormatError::mismatch(
            variable,
            format!("cannot assign values of shape {source:?} to region {target:?}"),
        ));
    };
    region.assign(&broadcast);
    Ok(())
}

/// Transposes `values` (axes named by `order`) into the variable's layout.
///
/// Explicitly selected axes absent from `order` get a length-1 slot so the
/// value broadcasts along them.
fn reorder_to_layout<T: Clone>(
    variable: &str,
    values: ArrayD<T>,
    logical: &[Axis],
    resolved: &[Option<Index>],
    region_axes: &[Axis],
    order: &[Axis],
) -> Result<ArrayD<T>> {
    if order.len() != values.ndim() {
        return Err(FormatError::mismatch(
            variable,
            format!(
                "value order {order:?} names {} axes, values have {}",
                order.len(),
                values.ndim()
            ),
        ));
    }
    if let Some(stray) = order.iter().find(|a| !logical.contains(a)) {
        return Err(FormatError::mismatch(
            variable,
            format!("axis {stray} is not used by {logical:?}"),
        ));
    }
    for (i, axis) in order.iter().enumerate() {
        if order[..i].contains(axis) {
            return Err(FormatError::mismatch(
                variable,
                format!("axis {axis} listed twice in {order:?}"),
            ));
        }
    }

    let mut perm = Vec::with_capacity(order.len());
    let mut padded = Vec::new();
    for (axis, index) in logical.iter().zip(resolved) {
        match (order.iter().position(|a| a == axis), index) {
            (Some(_), Some(Index::At(i))) => {
                return Err(FormatError::mismatch(
                    variable,
                    format!("axis {axis} is indexed at {i}, not a range"),
                ));
            }
            (Some(p), _) => perm.push(p),
            (None, None) => {
                return Err(FormatError::mismatch(
                    variable,
                    format!("values are missing axis {axis}"),
                ));
            }
            (None, Some(Index::At(_))) => {}
            (None, Some(_)) => {
                // Region position of this axis once the values are permuted.
                let region_pos = region_axes.iter().position(|a| a == axis).unwrap_or(0);
                padded.push(region_pos);
            }
        }
    }

    let mut values = values.permuted_axes(perm);
    for pos in padded {
        values = values.insert_axis(NdAxis(pos));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array};

    fn dims(m: usize, r: usize) -> Dimensions {
        let mut d = Dimensions::new();
        d.create(Axis::I, 1).unwrap();
        d.create(Axis::C, 3).unwrap();
        d.create(Axis::M, m).unwrap();
        d.create(Axis::R, r).unwrap();
        d
    }

    fn counting(shape: &[usize]) -> ArrayD<f64> {
        let n: usize = shape.iter().product();
        Array::from_shape_vec(IxDyn(shape), (0..n).map(|x| x as f64).collect()).unwrap()
    }

    #[test]
    fn test_axis_position_with_alias() {
        let d = [Axis::R, Axis::C, Axis::I];
        assert_eq!(axis_position(&d, Axis::C), Some(1));
        assert_eq!(axis_position(&d, Axis::M), Some(2));
        assert_eq!(axis_position(&d, Axis::E), None);
        assert_eq!(axis_position(&[Axis::M, Axis::C], Axis::I), Some(0));
    }

    #[test]
    fn test_read_full() {
        let array = counting(&[4, 3]);
        let out = read("v", &array, &[Axis::M, Axis::C], &dims(4, 1), &Selection::new(), None).unwrap();
        assert_eq!(out, array);
    }

    #[test]
    fn test_read_indexed_drops_axis() {
        let array = counting(&[4, 3]);
        let sel = Selection::new().at(Axis::M, 2);
        let out = read("v", &array, &[Axis::M, Axis::C], &dims(4, 1), &sel, None).unwrap();
        assert_eq!(out, arr1(&[6.0, 7.0, 8.0]).into_dyn());
    }

    #[test]
    fn test_read_range() {
        let array = counting(&[4, 3]);
        let sel = Selection::new().range(Axis::M, 1..3).at(Axis::C, 0);
        let out = read("v", &array, &[Axis::M, Axis::C], &dims(4, 1), &sel, None).unwrap();
        assert_eq!(out, arr1(&[3.0, 6.0]).into_dyn());
    }

    #[test]
    fn test_read_transposed() {
        let array = counting(&[2, 3, 4]);
        let d = [Axis::R, Axis::C, Axis::M];
        let out = read(
            "v",
            &array,
            &d,
            &dims(4, 2),
            &Selection::new(),
            Some(&[Axis::M, Axis::R, Axis::C]),
        )
        .unwrap();
        assert_eq!(out.shape(), &[4, 2, 3]);
        assert_eq!(out[[3, 1, 2]], array[[1, 2, 3]]);
    }

    #[test]
    fn test_read_scalar_as_measurements_repeats() {
        let array = arr2(&[[1.0, 2.0, 3.0]]).into_dyn();
        let out = read(
            "v",
            &array,
            &[Axis::I, Axis::C],
            &dims(5, 1),
            &Selection::new(),
            Some(&[Axis::M, Axis::C]),
        )
        .unwrap();
        assert_eq!(out.shape(), &[5, 3]);
        for m in 0..5 {
            assert_eq!(out[[m, 0]], 1.0);
            assert_eq!(out[[m, 1]], 2.0);
            assert_eq!(out[[m, 2]], 3.0);
        }
    }

    #[test]
    fn test_read_scalar_with_measurement_index() {
        let array = arr2(&[[1.0, 2.0, 3.0]]).into_dyn();
        let sel = Selection::new().at(Axis::M, 4);
        let out = read("v", &array, &[Axis::I, Axis::C], &dims(5, 1), &sel, Some(&[Axis::C])).unwrap();
        assert_eq!(out, arr1(&[1.0, 2.0, 3.0]).into_dyn());
    }

    #[test]
    fn test_read_unknown_order_axis() {
        let array = counting(&[4, 3]);
        let err = read(
            "v",
            &array,
            &[Axis::M, Axis::C],
            &dims(4, 1),
            &Selection::new(),
            Some(&[Axis::R, Axis::C]),
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_read_index_out_of_range() {
        let array = counting(&[4, 3]);
        let sel = Selection::new().at(Axis::M, 4);
        assert!(matches!(
            read("v", &array, &[Axis::M, Axis::C], &dims(4, 1), &sel, None),
            Err(FormatError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_write_repeat_across_measurements() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr1(&[0.0, 0.0, 1.0]).into_dyn();
        write(
            "v",
            &mut array,
            &[Axis::M, Axis::C],
            v.view(),
            &Selection::new(),
            Some(&[Axis::C]),
            &[Axis::M],
        )
        .unwrap();
        for m in 0..4 {
            assert_eq!(array.index_axis(NdAxis(0), m), v.view());
        }

        let mut other = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        write(
            "v",
            &mut other,
            &[Axis::M, Axis::C],
            v.view(),
            &Selection::new(),
            None,
            &[Axis::M],
        )
        .unwrap();
        assert_eq!(other, array);
    }

    #[test]
    fn test_write_repeat_conflict() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr2(&[[1.0, 2.0, 3.0]]).into_dyn();
        let err = write(
            "v",
            &mut array,
            &[Axis::M, Axis::C],
            v.view(),
            &Selection::new(),
            Some(&[Axis::M, Axis::C]),
            &[Axis::M],
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::RepeatConflict { axis: Axis::M, .. }));
    }

    #[test]
    fn test_write_reordered_with_repeat() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 4]));
        let ears = arr2(&[[0.0, 0.09, 0.0], [0.0, -0.09, 0.0]]).into_dyn();
        write(
            "ReceiverPosition",
            &mut array,
            &[Axis::R, Axis::C, Axis::M],
            ears.view(),
            &Selection::new(),
            Some(&[Axis::R, Axis::C]),
            &[Axis::M],
        )
        .unwrap();
        for m in 0..4 {
            assert_eq!(array[[0, 1, m]], 0.09);
            assert_eq!(array[[1, 1, m]], -0.09);
            assert_eq!(array[[0, 0, m]], 0.0);
        }
    }

    #[test]
    fn test_write_scalar_variable_through_measurement_terms() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 1]));
        let ears = arr2(&[[0.0, 0.09, 0.0], [0.0, -0.09, 0.0]]).into_dyn();
        write(
            "ReceiverPosition",
            &mut array,
            &[Axis::R, Axis::C, Axis::I],
            ears.view(),
            &Selection::new(),
            Some(&[Axis::R, Axis::C]),
            &[Axis::M],
        )
        .unwrap();
        assert_eq!(array[[0, 1, 0]], 0.09);
        assert_eq!(array[[1, 1, 0]], -0.09);
    }

    #[test]
    fn test_write_single_measurement() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let sel = Selection::new().at(Axis::M, 2);
        write("v", &mut array, &[Axis::M, Axis::C], v.view(), &sel, None, &[]).unwrap();
        assert_eq!(array[[2, 2]], 3.0);
        assert_eq!(array[[1, 2]], 0.0);
    }

    #[test]
    fn test_write_indexed_axis_in_order_rejected() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr2(&[[1.0, 2.0, 3.0]]).into_dyn();
        let sel = Selection::new().at(Axis::M, 0);
        assert!(matches!(
            write("v", &mut array, &[Axis::M, Axis::C], v.view(), &sel, Some(&[Axis::M, Axis::C]), &[]),
            Err(FormatError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_write_missing_axis_rejected() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        assert!(matches!(
            write("v", &mut array, &[Axis::M, Axis::C], v.view(), &Selection::new(), Some(&[Axis::C]), &[]),
            Err(FormatError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_write_explicit_full_axis_broadcasts() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let sel = Selection::new().all(Axis::M);
        write("v", &mut array, &[Axis::M, Axis::C], v.view(), &sel, Some(&[Axis::C]), &[]).unwrap();
        assert_eq!(array[[3, 0]], 1.0);
        assert_eq!(array[[0, 2]], 3.0);
    }

    #[test]
    fn test_write_shape_mismatch() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[4, 3]));
        let v = arr1(&[1.0, 2.0]).into_dyn();
        assert!(matches!(
            write("v", &mut array, &[Axis::M, Axis::C], v.view(), &Selection::new(), None, &[]),
            Err(FormatError::DimensionMismatch { .. })
        ));
        assert!(array.iter().all(|x| *x == 0.0));
    }
}
