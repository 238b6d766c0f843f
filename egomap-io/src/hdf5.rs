//! HDF5/NeXus output of tuning maps (`NXdata`).
//!
//! Layout: `/entry` (`NXentry`) holds one `NXcollection` group per cell, and
//! each cell group holds one `NXdata` group per computed kind.

use crate::{Error, Result};
use egomap_algorithms::{PlotKind, PlotOutput, SessionMaps};
use egomap_core::{BinAxis, Trajectory, TuningCurve, TuningMap};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{Array2, ArrayView1};
use std::path::Path;
use std::str::FromStr;

/// A rate matrix read back from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRate {
    pub rate: Array2<f64>,
    pub row_edges: Vec<f64>,
    pub col_edges: Vec<f64>,
}

/// Writes every output of a session to one HDF5 file.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_session_hdf5<P: AsRef<Path>>(path: P, maps: &SessionMaps) -> Result<()> {
    let file = File::create(path)?;
    set_attr_str_file(&file, "egomap_format_version", "0.1")?;

    let entry = file.create_group("entry")?;
    set_attr_str_group(&entry, "NX_class", "NXentry")?;
    set_attr_str_group(&entry, "session_id", &maps.session_id)?;
    entry
        .new_attr::<u64>()
        .create("frames")?
        .write_scalar(&(maps.frames as u64))?;

    for cell in &maps.cells {
        let group = entry.create_group(cell_group_name(&cell.cell).as_str())?;
        set_attr_str_group(&group, "NX_class", "NXcollection")?;
        set_attr_str_group(&group, "cell_name", &cell.cell)?;
        group
            .new_attr::<u64>()
            .create("spike_count")?
            .write_scalar(&(cell.spike_count as u64))?;

        for (kind, output) in &cell.outputs {
            let data = group.create_group(kind.name())?;
            set_attr_str_group(&data, "NX_class", "NXdata")?;
            match output {
                PlotOutput::RateMap(map) => write_map(&data, map, kind.is_polar())?,
                PlotOutput::Curve(curve) => write_curve(&data, curve)?,
                PlotOutput::Trajectory(trajectory) => write_trajectory(&data, trajectory)?,
            }
        }
    }
    Ok(())
}

/// Reads the rate matrix of one cell and kind.
///
/// # Errors
/// Returns an error if the group is missing or the dataset is not 2-D.
pub fn read_rate_hdf5<P: AsRef<Path>>(path: P, cell: &str, kind: PlotKind) -> Result<StoredRate> {
    let file = File::open(path)?;
    let data = file
        .group("entry")?
        .group(cell_group_name(cell).as_str())?
        .group(kind.name())?;
    let dataset = data.dataset("rate")?;
    let shape = dataset.shape();
    if shape.len() != 2 {
        return Err(Error::InvalidFormat(format!(
            "rate dataset for {cell} {kind} must be 2-D"
        )));
    }
    let rate = Array2::from_shape_vec((shape[0], shape[1]), dataset.read_raw::<f64>()?)
        .map_err(|e| Error::InvalidFormat(format!("rate shape mismatch: {e}")))?;
    let axes = read_axes_attr(&data)?;
    let (Some(rows), Some(cols)) = (axes.first(), axes.get(1)) else {
        return Err(Error::InvalidFormat("rate group lacks two axes".to_string()));
    };
    Ok(StoredRate {
        rate,
        row_edges: data.dataset(rows)?.read_raw::<f64>()?,
        col_edges: data.dataset(cols)?.read_raw::<f64>()?,
    })
}

fn cell_group_name(cell: &str) -> String {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        "cell".to_string()
    } else {
        trimmed.replace('/', "_")
    }
}

fn write_map(group: &Group, map: &TuningMap, closed: bool) -> Result<()> {
    let rate = if closed {
        map.closed_rate()
    } else {
        map.rate.clone()
    };
    set_attr_str_group(group, "signal", "rate")?;
    set_axes_attr(group, &[map.rows.label.as_str(), map.cols.label.as_str()])?;
    set_axis_indices(group, &map.rows.label, 0)?;
    set_axis_indices(group, &map.cols.label, 1)?;

    let rate_ds = create_fixed_dataset::<f64, _>(group, "rate", rate.dim())?;
    set_dataset_units(&rate_ds, "Hz")?;
    rate_ds.write(rate.view())?;

    let occupancy_ds = create_fixed_dataset::<f64, _>(group, "occupancy", map.occupancy.dim())?;
    set_dataset_units(&occupancy_ds, "s")?;
    occupancy_ds.write(map.occupancy.view())?;

    // Closed maps carry one extra row, matched by the count + 1 row edges.
    let row_edges = if closed {
        map.rows.edges()
    } else {
        map.rows.edges()[..map.rows.count].to_vec()
    };
    write_axis(group, &map.rows, &row_edges)?;
    write_axis(group, &map.cols, &map.cols.edges()[..map.cols.count])?;
    Ok(())
}

fn write_axis(group: &Group, axis: &BinAxis, values: &[f64]) -> Result<()> {
    let ds = create_fixed_dataset::<f64, _>(group, &axis.label, (values.len(),))?;
    set_dataset_units(&ds, &axis.unit)?;
    ds.write(ArrayView1::from(values))?;
    Ok(())
}

fn write_curve(group: &Group, curve: &TuningCurve) -> Result<()> {
    set_attr_str_group(group, "signal", "rate")?;
    set_axes_attr(group, &["angle"])?;
    set_axis_indices(group, "angle", 0)?;

    write_vec(group, "rate", &curve.rate, "Hz")?;
    write_vec(group, "angle", &curve.angles_deg, "deg")?;
    write_vec(group, "occupancy", &curve.occupancy, "s")?;
    Ok(())
}

fn write_trajectory(group: &Group, trajectory: &Trajectory) -> Result<()> {
    set_attr_str_group(group, "signal", "path_y")?;
    set_axes_attr(group, &["path_x"])?;
    write_vec(group, "path_x", &trajectory.path_x, "cm")?;
    write_vec(group, "path_y", &trajectory.path_y, "cm")?;
    write_vec(group, "spike_x", &trajectory.spike_x, "cm")?;
    write_vec(group, "spike_y", &trajectory.spike_y, "cm")?;
    write_vec(group, "spike_heading", &trajectory.spike_heading, "deg")?;
    Ok(())
}

fn write_vec(group: &Group, name: &str, values: &[f64], units: &str) -> Result<()> {
    let ds = create_fixed_dataset::<f64, _>(group, name, (values.len(),))?;
    set_dataset_units(&ds, units)?;
    ds.write(ArrayView1::from(values))?;
    Ok(())
}

fn create_fixed_dataset<T: H5Type, S>(group: &Group, name: &str, shape: S) -> Result<Dataset>
where
    S: Into<hdf5::Extents>,
{
    Ok(group.new_dataset::<T>().shape(shape).create(name)?)
}

fn set_axes_attr(group: &Group, axes: &[&str]) -> Result<()> {
    let values: Vec<VarLenUnicode> = axes
        .iter()
        .map(|axis| to_var_len_unicode(axis))
        .collect::<Result<Vec<_>>>()?;
    let attr = group
        .new_attr::<VarLenUnicode>()
        .shape((values.len(),))
        .create("axes")?;
    attr.write(ArrayView1::from(values.as_slice()))?;
    Ok(())
}

fn read_axes_attr(group: &Group) -> Result<Vec<String>> {
    let values: Vec<VarLenUnicode> = group.attr("axes")?.read_raw()?;
    Ok(values.iter().map(ToString::to_string).collect())
}

fn set_axis_indices(group: &Group, name: &str, index: i32) -> Result<()> {
    let attr_name = format!("{name}_indices");
    group
        .new_attr::<i32>()
        .create(attr_name.as_str())?
        .write_scalar(&index)?;
    Ok(())
}

fn set_dataset_units(dataset: &Dataset, units: &str) -> Result<()> {
    let value = to_var_len_unicode(units)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("units")?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_file(file: &File, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_group(group: &Group, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
