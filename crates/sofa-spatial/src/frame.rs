//! Reference-frame resolution.
//!
//! Every coordinate variable is stored in the frame of its object's anchor:
//! Receiver values are relative to the Listener, Emitter values to the
//! Source, Listener and Source values are global. Resolving a value into
//! another frame goes through the global frame:
//!
//! 1. local → global with the anchor's pose (rotate, then translate positions)
//! 2. global → reference with the reference's pose (translate positions
//!    back, then apply the inverse rotation)
//!
//! Internally values are laid out as `(local?, m, C)` grids. The measurement
//! axis has length one unless the grid's source varies over measurements, in
//! which case it has `M` entries; grids of length one repeat against
//! varying ones.

use nalgebra::Vector3;
use ndarray::{Array3, Array4, ArrayD, Axis as NdAxis, Ix3};
use sofa_format::access;
use sofa_format::axis::with_measurement_alias;
use sofa_format::{Axis, Dataset, FormatError};

use crate::coordinates::{select_converted, AngleUnit, Representation, System};
use crate::error::{Result, SpatialError};
use crate::object::{Descriptor, ObjectKind};
use crate::rotation::Frame;
use crate::variable::{Coordinates, Query};

/// Position, View and Up of an object, each shaped like a coordinate query
/// result.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub position: ArrayD<f64>,
    pub view: ArrayD<f64>,
    pub up: ArrayD<f64>,
}

impl Pose {
    pub fn get(&self, descriptor: Descriptor) -> &ArrayD<f64> {
        match descriptor {
            Descriptor::Position => &self.position,
            Descriptor::View => &self.view,
            Descriptor::Up => &self.up,
        }
    }
}

/// Global pose of `kind`.
///
/// Undeclared variables fall back to a default: origin, +x and +z for
/// objects in the global frame, and the anchor's pose repeated over the
/// local count for Receiver and Emitter. Defaults keep a measurement axis
/// of length one unless the anchor varies. Spherical output defaults to
/// radians.
///
/// # Errors
///
/// Returns [`SpatialError::MissingPose`] if a defaulted Receiver or Emitter
/// has no local count dimension yet.
pub fn pose(dataset: &Dataset, kind: ObjectKind, query: &Query) -> Result<Pose> {
    let query = query
        .clone()
        .with_angle_unit(query.angle_unit.unwrap_or(AngleUnit::Radian));
    let resolve = |descriptor| {
        let coords = Coordinates::new(kind, descriptor);
        if coords.exists(dataset) {
            relative_values(dataset, &coords, None, &query)
        } else {
            default_values(dataset, kind, descriptor, &query)
        }
    };
    Ok(Pose {
        position: resolve(Descriptor::Position)?,
        view: resolve(Descriptor::View)?,
        up: resolve(Descriptor::Up)?,
    })
}

fn default_values(
    dataset: &Dataset,
    kind: ObjectKind,
    descriptor: Descriptor,
    query: &Query,
) -> Result<ArrayD<f64>> {
    let name = descriptor.variable_name(kind);
    let grid = default_grid(dataset, kind, descriptor)?;
    tracing::debug!(object = %kind, descriptor = %descriptor, "Using default pose values");

    let local = kind.local_axis();
    let measurement = measurement_axis(grid.varies);
    let mut data = grid.values.into_dyn();
    if local.is_none() {
        data = data.index_axis_move(NdAxis(0), 0);
    }
    let dims = grid_dims(local, measurement);

    let standard = kind.standard_dims(grid.varies);
    let order = query
        .dim_order
        .clone()
        .unwrap_or_else(|| access::default_order(&standard, &query.selection));
    let to = Representation::new(
        query.system.unwrap_or(System::Cartesian),
        query.angle_unit.unwrap_or(AngleUnit::Radian),
    );
    select_converted(
        &name,
        &data,
        &dims,
        dataset.dimensions(),
        &query.selection,
        Some(&order),
        Representation::cartesian(),
        to,
    )
}

fn measurement_axis(varies: bool) -> Axis {
    if varies {
        Axis::M
    } else {
        Axis::I
    }
}

/// Axis labels of an internal grid.
fn grid_dims(local: Option<Axis>, measurement: Axis) -> Vec<Axis> {
    local.into_iter().chain([measurement, Axis::C]).collect()
}

/// Brings a `(local?, m, C)` array to three axes.
fn to_grid(values: ArrayD<f64>, has_local: bool) -> Result<Array3<f64>> {
    let values = if has_local {
        values
    } else {
        values.insert_axis(NdAxis(0))
    };
    Ok(values.into_dimensionality::<Ix3>()?)
}

/// Row `(l, m)` of a grid, repeating axes of length one.
fn row(grid: &Array3<f64>, l: usize, m: usize) -> Vector3<f64> {
    let (rows, cols, _) = grid.dim();
    let l = if rows == 1 { 0 } else { l };
    let m = if cols == 1 { 0 } else { m };
    Vector3::new(grid[[l, m, 0]], grid[[l, m, 1]], grid[[l, m, 2]])
}

/// Common length of axes that must either agree or be one.
fn broadcast_len(name: &str, what: &str, lens: &[usize]) -> Result<usize> {
    let n = lens.iter().copied().max().unwrap_or(1);
    if lens.iter().any(|len| *len != 1 && *len != n) {
        return Err(FormatError::mismatch(name, format!("{what} lengths {lens:?} do not broadcast")).into());
    }
    Ok(n)
}

/// Global Cartesian values of one descriptor as a `(local, m, C)` grid.
struct Grid {
    values: Array3<f64>,
    varies: bool,
}

/// Global values of `kind`'s `descriptor`, declared or defaulted.
fn global_grid(dataset: &Dataset, kind: ObjectKind, descriptor: Descriptor) -> Result<Grid> {
    let coords = Coordinates::new(kind, descriptor);
    if !coords.exists(dataset) {
        return default_grid(dataset, kind, descriptor);
    }
    let resolved = resolve(dataset, &coords, None)?;
    Ok(Grid {
        values: resolved.values.index_axis_move(NdAxis(1), 0),
        varies: resolved.varies,
    })
}

fn default_grid(dataset: &Dataset, kind: ObjectKind, descriptor: Descriptor) -> Result<Grid> {
    match (kind.anchor(), kind.local_axis()) {
        (Some(anchor), Some(local)) => {
            let count = dataset
                .dimensions()
                .get(local)
                .ok_or(SpatialError::MissingPose {
                    object: kind,
                    axis: local,
                })?;
            let anchor_grid = global_grid(dataset, anchor, descriptor)?;
            let (_, cols, _) = anchor_grid.values.dim();
            let values = anchor_grid
                .values
                .broadcast((count, cols, 3))
                .ok_or_else(|| {
                    FormatError::mismatch(
                        &descriptor.variable_name(kind),
                        format!("cannot repeat {anchor} values over {count} {local} entries"),
                    )
                })?
                .to_owned();
            Ok(Grid {
                values,
                varies: anchor_grid.varies,
            })
        }
        _ => {
            let v = descriptor.default_vector();
            Ok(Grid {
                values: Array3::from_shape_vec((1, 1, 3), vec![v.x, v.y, v.z])?,
                varies: false,
            })
        }
    }
}

/// Frames of an object per `(local, measurement)` slot.
struct FrameGrid {
    local: Option<Axis>,
    rows: usize,
    cols: usize,
    varies: bool,
    frames: Vec<Frame>,
}

impl FrameGrid {
    fn global() -> Self {
        Self {
            local: None,
            rows: 1,
            cols: 1,
            varies: false,
            frames: vec![Frame::identity()],
        }
    }

    fn of(dataset: &Dataset, reference: Option<ObjectKind>) -> Result<Self> {
        let Some(kind) = reference else {
            return Ok(Self::global());
        };
        let position = global_grid(dataset, kind, Descriptor::Position)?;
        let view = global_grid(dataset, kind, Descriptor::View)?;
        let up = global_grid(dataset, kind, Descriptor::Up)?;
        let varies = position.varies || view.varies || up.varies;
        let (position, view, up) = (position.values, view.values, up.values);

        let name = kind.as_str();
        let rows = broadcast_len(name, "local", &[position.dim().0, view.dim().0, up.dim().0])?;
        let cols = broadcast_len(name, "measurement", &[position.dim().1, view.dim().1, up.dim().1])?;
        let mut frames = Vec::with_capacity(rows * cols);
        for l in 0..rows {
            for m in 0..cols {
                frames.push(Frame::from_pose(
                    row(&position, l, m),
                    row(&view, l, m),
                    row(&up, l, m),
                ));
            }
        }
        Ok(Self {
            local: kind.local_axis(),
            rows,
            cols,
            varies,
            frames,
        })
    }

    fn get(&self, l: usize, m: usize) -> &Frame {
        let l = if self.rows == 1 { 0 } else { l };
        let m = if self.cols == 1 { 0 } else { m };
        &self.frames[l * self.cols + m]
    }
}

/// Cartesian values in the reference frame as a `(l, k, m, C)` grid, `k`
/// running over the reference's local axis when it is not paired.
struct Resolved {
    values: Array4<f64>,
    extra: Option<Axis>,
    varies: bool,
}

fn resolve(dataset: &Dataset, coords: &Coordinates, reference: Option<ObjectKind>) -> Result<Resolved> {
    let name = coords.name();
    let kind = coords.kind();
    let is_position = coords.descriptor().is_position();
    let local = kind.local_axis();
    let own_varies = dataset.variable(&name)?.varies();

    let local_query = Query::new()
        .with_dim_order(&grid_dims(local, measurement_axis(own_varies)))
        .with_system(System::Cartesian);
    let values = to_grid(coords.get_values(dataset, &local_query)?, local.is_some())?;
    let anchor = FrameGrid::of(dataset, kind.anchor())?;
    let target = FrameGrid::of(dataset, reference)?;

    let (l_count, m_values, _) = values.dim();
    let m_count = broadcast_len(&name, "measurement", &[m_values, anchor.cols, target.cols])?;
    let paired = target.local.is_some() && target.local == local;
    let extra = if paired { None } else { target.local };
    if paired && target.rows != l_count && target.rows != 1 {
        return Err(FormatError::mismatch(
            &name,
            format!("{l_count} transducers cannot pair with {} reference frames", target.rows),
        )
        .into());
    }
    let k_count = if extra.is_some() { target.rows } else { 1 };

    let mut out = Array4::<f64>::zeros((l_count, k_count, m_count, 3));
    for l in 0..l_count {
        for m in 0..m_count {
            let global = anchor.get(0, m).to_global(&row(&values, l, m), is_position);
            for k in 0..k_count {
                let frame = if paired { target.get(l, m) } else { target.get(k, m) };
                let rel = frame.to_local(&global, is_position);
                for c in 0..3 {
                    out[[l, k, m, c]] = rel[c];
                }
            }
        }
    }
    Ok(Resolved {
        values: out,
        extra,
        varies: own_varies || anchor.varies || target.varies,
    })
}

/// Values of `coords` expressed in the frame of `reference`, or in the
/// global frame when `reference` is `None`.
///
/// The result's default axis order is the variable's own and, when
/// `reference` has a local axis the variable lacks, that axis prepended.
/// The measurement axis stays as stored (`I`, length one) unless the
/// variable, its anchor or the reference varies over measurements; then it
/// reads as `M`. A reference of the same kind as the variable's object pairs
/// transducers element-wise. An object taken relative to itself lands in
/// its own frame: positions at the origin, views along +x, ups along +z.
/// An index on `C` is applied after conversion. The output system defaults
/// to the stored one; spherical output defaults to the stored angle unit,
/// or degree for Cartesian variables.
pub fn relative_values(
    dataset: &Dataset,
    coords: &Coordinates,
    reference: Option<ObjectKind>,
    query: &Query,
) -> Result<ArrayD<f64>> {
    let name = coords.name();
    let local = coords.kind().local_axis();
    tracing::debug!(variable = %name, reference = ?reference, "Resolving relative values");

    let resolved = resolve(dataset, coords, reference)?;
    let extra = resolved.extra;
    let mut data = resolved.values.into_dyn();
    let mut dims = Vec::with_capacity(4);
    dims.extend(local);
    if extra.is_none() {
        data = data.index_axis_move(NdAxis(1), 0);
    } else {
        dims.extend(extra);
    }
    if local.is_none() {
        data = data.index_axis_move(NdAxis(0), 0);
    }
    dims.extend([measurement_axis(resolved.varies), Axis::C]);

    let variable = dataset.variable(&name)?;
    let mut default_dims: Vec<Axis> = extra.into_iter().collect();
    if resolved.varies {
        default_dims.extend(with_measurement_alias(variable.dims()));
    } else {
        default_dims.extend_from_slice(variable.dims());
    }
    let order = query
        .dim_order
        .clone()
        .unwrap_or_else(|| access::default_order(&default_dims, &query.selection));

    let own = coords.representation(dataset)?;
    let to_system = query.system.unwrap_or(own.system);
    let to_unit = query.angle_unit.unwrap_or(match own.system {
        System::Spherical => own.angle_unit,
        System::Cartesian => AngleUnit::Degree,
    });
    select_converted(
        &name,
        &data,
        &dims,
        dataset.dimensions(),
        &query.selection,
        Some(&order),
        Representation::cartesian(),
        Representation::new(to_system, to_unit),
    )
}
