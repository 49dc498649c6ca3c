//! Low-level helpers around the native netcdf library.
//!
//! CAMS products store most variables as packed shorts, and the netcdf crate
//! reads values in the variable's own storage type. The helpers here read any
//! numeric variable as `f64` and expose the attributes needed for unpacking.

use std::sync::Once;

use netcdf::types::{FloatType, IntType, NcVariableType};

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist, or when a corrupt product is skipped). This
/// creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// This function disables that output by calling H5Eset_auto2 with null handlers.
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read a hyperslab of a numeric variable, widened to `f64`.
///
/// `start` and `count` must have one entry per variable dimension.
pub(crate) fn read_f64(
    var: &netcdf::Variable,
    start: &[usize],
    count: &[usize],
) -> NetCdfResult<Vec<f64>> {
    let name = var.name();
    let failed = |e: netcdf::Error| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e));
    let extents = (start, count);

    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F64) => var.get_values::<f64, _>(extents).map_err(failed)?,
        NcVariableType::Float(FloatType::F32) => widen(var.get_values::<f32, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::I8) => widen(var.get_values::<i8, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::U8) => widen(var.get_values::<u8, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::I16) => widen(var.get_values::<i16, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::U16) => widen(var.get_values::<u16, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::I32) => widen(var.get_values::<i32, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::U32) => widen(var.get_values::<u32, _>(extents).map_err(failed)?),
        NcVariableType::Int(IntType::I64) => var
            .get_values::<i64, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        NcVariableType::Int(IntType::U64) => var
            .get_values::<u64, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        other => {
            return Err(NetCdfError::InvalidFormat(format!(
                "Variable {} has non-numeric type {:?}",
                name, other
            )))
        }
    };

    Ok(values)
}

/// Read every value of a numeric variable, widened to `f64`.
pub(crate) fn read_all_f64(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let count: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let start = vec![0; count.len()];
    read_f64(var, &start, &count)
}

fn widen<T: Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}

/// Packing attributes of a CF variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Packing {
    pub fn of(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
        }
    }

    /// Unpack one stored value; fill and missing markers become NaN.
    pub fn unpack(&self, raw: f64) -> f64 {
        if self.fill_value == Some(raw) || self.missing_value == Some(raw) || raw.is_nan() {
            f64::NAN
        } else {
            raw * self.scale_factor + self.add_offset
        }
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f64 attribute.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a string attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
