//! Arakawa C-grid destaggering.
//!
//! WRF stores horizontal wind components on cell faces and some vertical
//! fields on layer interfaces. Destaggering averages each pair of adjacent
//! edge values onto the cell centre, shrinking the staggered dimension by
//! one and renaming it to its unstaggered counterpart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::dataset::{DataArray, Dataset, Variable};
use crate::error::{Result, WrfError};

/// Suffix that marks a staggered dimension
pub const STAGGER_SUFFIX: &str = "_stag";

/// Attributes describing the staggering state, dropped on destaggering
const STAGGER_ATTRS: [&str; 2] = ["stagger", "c_grid_axis_shift"];

/// Inputs accepted by [`destag_variable`].
///
/// Only a bare [`Variable`] can be destaggered directly; coordinate-bearing
/// containers must go through their own destagger entry points.
pub trait DestaggerInput {
    fn as_bare_variable(&self) -> Result<&Variable>;
}

impl DestaggerInput for Variable {
    fn as_bare_variable(&self) -> Result<&Variable> {
        Ok(self)
    }
}

impl DestaggerInput for DataArray {
    fn as_bare_variable(&self) -> Result<&Variable> {
        Err(type_mismatch("DataArray"))
    }
}

impl DestaggerInput for Dataset {
    fn as_bare_variable(&self) -> Result<&Variable> {
        Err(type_mismatch("Dataset"))
    }
}

fn type_mismatch(found: &str) -> WrfError {
    WrfError::TypeMismatch {
        param: "datavar".to_string(),
        expected: "Variable".to_string(),
        found: found.to_string(),
    }
}

/// Key/value view over mapping-like attribute containers
pub trait AttrItems<V> {
    /// The entries, or `None` when the container is not a mapping
    fn attr_items(&self) -> Option<Vec<(&str, &V)>>;
}

impl<V> AttrItems<V> for BTreeMap<String, V> {
    fn attr_items(&self) -> Option<Vec<(&str, &V)>> {
        Some(self.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }
}

impl<V> AttrItems<V> for HashMap<String, V> {
    fn attr_items(&self) -> Option<Vec<(&str, &V)>> {
        Some(self.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }
}

impl<V> AttrItems<V> for str {
    fn attr_items(&self) -> Option<Vec<(&str, &V)>> {
        None
    }
}

/// Copy `attrs` without the keys in `keys_to_drop`.
///
/// Values, including counts of a counter-like map, are copied as they are.
/// Returns `None` when `attrs` is not a mapping.
pub fn drop_attrs<V, M>(attrs: &M, keys_to_drop: &[&str]) -> Option<BTreeMap<String, V>>
where
    V: Clone,
    M: AttrItems<V> + ?Sized,
{
    attrs.attr_items().map(|items| {
        items
            .into_iter()
            .filter(|(k, _)| !keys_to_drop.contains(k))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    })
}

/// The single `_stag` dimension of a variable
fn infer_stagger_dim(var: &Variable) -> Result<String> {
    let staggered: Vec<&String> = var
        .dims()
        .iter()
        .filter(|d| d.ends_with(STAGGER_SUFFIX))
        .collect();
    match staggered.as_slice() {
        [] => Err(WrfError::NotStaggered),
        [dim] => Ok((*dim).clone()),
        _ => Err(WrfError::NotImplemented {
            message: format!(
                "Expected a single destagger dimension. Found multiple destagger dimensions: {:?}",
                staggered
            ),
        }),
    }
}

/// The part of a staggered dimension name before `_stag`
fn unstaggered_name(stagger_dim: &str) -> &str {
    match stagger_dim.find(STAGGER_SUFFIX) {
        Some(i) => &stagger_dim[..i],
        None => stagger_dim,
    }
}

/// Destagger a single variable.
///
/// `stagger_dim` defaults to the variable's only dimension ending in
/// `_stag`; `unstag_dim_name` defaults to that name without the suffix.
pub fn destag_variable<V: DestaggerInput + ?Sized>(
    datavar: &V,
    stagger_dim: Option<&str>,
    unstag_dim_name: Option<&str>,
) -> Result<Variable> {
    let var = datavar.as_bare_variable()?;

    let stagger_dim = match stagger_dim {
        Some(dim) if !var.has_dim(dim) => {
            return Err(WrfError::invalid(format!("{} not in {:?}", dim, var.dims())));
        }
        Some(dim) => dim.to_string(),
        None => infer_stagger_dim(var)?,
    };

    let size = var
        .size_of(&stagger_dim)
        .ok_or_else(|| WrfError::invalid(format!("{} not in {:?}", stagger_dim, var.dims())))?;
    if size == 0 {
        return Err(WrfError::invalid(format!(
            "Cannot destagger empty dimension {}",
            stagger_dim
        )));
    }

    let new_dim = unstag_dim_name.unwrap_or_else(|| unstaggered_name(&stagger_dim));
    if new_dim != stagger_dim && var.has_dim(new_dim) {
        return Err(WrfError::invalid(format!(
            "Cannot rename {} to {}: the variable already has that dimension",
            stagger_dim, new_dim
        )));
    }

    let left_or_bottom = var.slice_along(&stagger_dim, 0, size - 1)?;
    let right_or_top = var.slice_along(&stagger_dim, 1, size)?;
    let center_mean = left_or_bottom.zip_with(&right_or_top, |a, b| (a + b) * 0.5)?;

    let attrs = drop_attrs(&var.attrs, &STAGGER_ATTRS).unwrap_or_default();
    Ok(center_mean
        .rename_dim(&stagger_dim, new_dim)
        .with_attrs(attrs)
        .with_encoding(var.encoding.clone()))
}

/// Pick the name an auxiliary coordinate takes after destaggering.
///
/// The staggered dimension coordinate takes the requested unstaggered
/// name; otherwise a trailing `_U`/`_V` or `_stag` suffix is removed.
pub fn rename_staggered_coordinate(
    name: &str,
    stagger_dim: Option<&str>,
    unstag_dim_name: Option<&str>,
) -> String {
    if let (Some(stagger_dim), Some(target)) = (stagger_dim, unstag_dim_name) {
        if name == stagger_dim {
            return target.to_string();
        }
    }
    strip_suffix_ignore_case(name, "_u")
        .or_else(|| strip_suffix_ignore_case(name, "_v"))
        .or_else(|| strip_suffix_ignore_case(name, STAGGER_SUFFIX))
        .unwrap_or(name)
        .to_string()
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    let head = name.get(..split)?;
    let tail = name.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Destagger every data variable of a dataset.
///
/// `staggered_to_unstaggered_dims` maps staggered dimension names to the
/// names they become; by default every `_stag` dimension is destaggered
/// and renamed by removing the suffix. Coordinates are kept as they are.
/// A data variable with more than one targeted staggered dimension is
/// rejected rather than destaggered along an arbitrary axis.
pub fn destagger_dataset(
    ds: &Dataset,
    staggered_to_unstaggered_dims: Option<&BTreeMap<String, String>>,
) -> Result<Dataset> {
    let staggered_dims: BTreeSet<String> = match staggered_to_unstaggered_dims {
        None => ds
            .sizes()
            .into_keys()
            .filter(|d| d.ends_with(STAGGER_SUFFIX))
            .collect(),
        Some(map) => map.keys().cloned().collect(),
    };

    let mut out = Dataset::with_attrs(ds.attrs.clone());
    for (name, coord) in ds.coords() {
        out.insert_coord(name.clone(), coord.clone())?;
    }

    for (name, var) in ds.data_vars() {
        let hits: Vec<&String> = var
            .dims()
            .iter()
            .filter(|d| staggered_dims.contains(*d))
            .collect();
        let new_var = match hits.as_slice() {
            [] => var.clone(),
            [dim] => {
                let target = staggered_to_unstaggered_dims
                    .and_then(|map| map.get(dim.as_str()))
                    .map(String::as_str);
                debug!(variable = %name, stagger_dim = %dim, "Destaggering variable");
                destag_variable(var, Some(dim.as_str()), target)?
            }
            _ => {
                return Err(WrfError::NotImplemented {
                    message: format!(
                        "Variable {} has multiple staggered dimensions {:?}; \
                         destagger it explicitly along one of them",
                        name, hits
                    ),
                });
            }
        };
        out.insert(name.clone(), new_var)?;
    }

    Ok(out)
}

/// Destagger a data array together with its coordinates.
///
/// Coordinates that still carry the staggered dimension after the data is
/// destaggered are destaggered the same way and renamed. With
/// `exclude_staggered_auxiliary_coords`, such recomputed coordinates are
/// kept only when they are a dimension coordinate of the result.
pub fn destagger_data_array(
    array: &DataArray,
    stagger_dim: Option<&str>,
    unstaggered_dim_name: Option<&str>,
    exclude_staggered_auxiliary_coords: bool,
) -> Result<DataArray> {
    let new_variable = destag_variable(array.variable(), stagger_dim, unstaggered_dim_name)?;

    let mut new_coords = BTreeMap::new();
    for (coord_name, coord) in array.coords() {
        if coord.dims().iter().any(|d| !new_variable.has_dim(d)) {
            let new_name =
                rename_staggered_coordinate(coord_name, stagger_dim, unstaggered_dim_name);
            if !exclude_staggered_auxiliary_coords || new_variable.has_dim(&new_name) {
                let destaggered = destag_variable(coord, stagger_dim, unstaggered_dim_name)?;
                new_coords.insert(new_name, destaggered);
            } else {
                debug!(coordinate = %coord_name, "Dropping staggered auxiliary coordinate");
            }
        } else {
            new_coords.insert(coord_name.clone(), coord.clone());
        }
    }

    let mut out = DataArray::new(new_variable, new_coords)?;
    out.name = array.name.clone();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AttributeValue;
    use ndarray::{arr1, arr2, Array, ArrayD, IxDyn};
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_drop_attrs_successful() {
        let cases = [
            (attrs(&[("a", 0.0), ("b", 1.0), ("c", 2.0)]), attrs(&[("a", 0.0), ("c", 2.0)])),
            (attrs(&[("b", 3.0)]), attrs(&[])),
            (attrs(&[("a", 4.0), ("c", 5.0)]), attrs(&[("a", 4.0), ("c", 5.0)])),
        ];
        for (input, expected) in cases {
            assert_eq!(drop_attrs(&input, &["b"]), Some(expected));
        }
    }

    #[test]
    fn test_drop_attrs_counter() {
        let mut counter: HashMap<String, usize> = HashMap::new();
        for key in ["a", "a", "b", "c"] {
            *counter.entry(key.to_string()).or_default() += 1;
        }
        let expected: BTreeMap<String, usize> =
            [("a".to_string(), 2), ("c".to_string(), 1)].into_iter().collect();
        assert_eq!(drop_attrs(&counter, &["b"]), Some(expected));
    }

    #[test]
    fn test_drop_attrs_unsuccessful() {
        assert_eq!(drop_attrs::<f64, _>("not a Mapping", &["a"]), None);
    }

    #[test]
    fn test_rename_staggered_coordinate() {
        let cases = [
            ("bottom_top", Some("bottom_top_stag"), None, "bottom_top"),
            ("bottom_top_stag", Some("bottom_top_stag"), Some("z"), "z"),
            ("bottom_top_stag", Some("bottom_top_stag"), None, "bottom_top"),
            ("XLAT_U", Some("west_east"), None, "XLAT"),
            ("XLONG_V", Some("south_north"), None, "XLONG"),
            ("xlat_u", None, None, "xlat"),
            ("U", None, None, "U"),
        ];
        for (name, stagger_dim, target, expected) in cases {
            assert_eq!(
                rename_staggered_coordinate(name, stagger_dim, target),
                expected
            );
        }
    }

    #[test]
    fn test_destag_variable_data_array() {
        let var = Variable::from_f64(vec!["x_stag", "y"], ArrayD::zeros(IxDyn(&[2, 2]))).unwrap();
        let array = DataArray::new(var, BTreeMap::new()).unwrap();
        let err = destag_variable(&array, None, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter datavar must be Variable, not DataArray"
        );
    }

    #[test]
    fn test_destag_variable_unstaggered() {
        let var = Variable::from_f64(vec!["x", "y"], ArrayD::zeros(IxDyn(&[2, 2]))).unwrap();
        let err = destag_variable(&var, None, None).unwrap_err();
        assert!(matches!(err, WrfError::NotStaggered));
        assert_eq!(
            err.to_string(),
            "No dimension available to destagger. This variable does not appear to be staggered."
        );
    }

    #[test]
    fn test_destag_variable_missing_dim() {
        let var = Variable::from_f64(vec!["x", "y"], ArrayD::zeros(IxDyn(&[2, 2]))).unwrap();
        assert!(matches!(
            destag_variable(&var, Some("z_stag"), None),
            Err(WrfError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_destag_variable_multiple_dims() {
        let var =
            Variable::from_f64(vec!["x_stag", "y_stag"], ArrayD::zeros(IxDyn(&[2, 2]))).unwrap();
        assert!(matches!(
            destag_variable(&var, None, None),
            Err(WrfError::NotImplemented { .. })
        ));
        // naming the axis resolves the ambiguity
        let out = destag_variable(&var, Some("y_stag"), None).unwrap();
        assert_eq!(out.dims(), &["x_stag".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_destag_variable_1d() {
        for (target, expected_dim) in [(Some("z"), "z"), (None, "bottom_top")] {
            let mut staggered =
                Variable::from_f64(vec!["bottom_top_stag"], Array::range(0.0, 5.0, 1.0).into_dyn())
                    .unwrap();
            staggered.attrs.insert("foo".to_string(), AttributeValue::from("bar"));
            staggered.attrs.insert("stagger".to_string(), AttributeValue::from("Z"));
            staggered
                .encoding
                .insert("dtype".to_string(), AttributeValue::from("float32"));

            let output = destag_variable(&staggered, None, target).unwrap();
            assert_eq!(
                output.as_f64().unwrap(),
                &arr1(&[0.5, 1.5, 2.5, 3.5]).into_dyn()
            );
            assert_eq!(output.dims(), &[expected_dim.to_string()]);
            assert_eq!(output.attrs.len(), 1);
            assert_eq!(output.attrs["foo"], AttributeValue::from("bar"));
            assert_eq!(output.encoding, staggered.encoding);
        }
    }

    #[test]
    fn test_destag_variable_2d() {
        let staggered = Variable::from_f64(
            vec!["x", "y_stag"],
            Array::range(0.0, 9.0, 1.0).into_shape((3, 3)).unwrap().into_dyn(),
        )
        .unwrap();
        let output = destag_variable(&staggered, None, None).unwrap();
        assert_eq!(output.dims(), &["x".to_string(), "y".to_string()]);
        assert_eq!(
            output.as_f64().unwrap(),
            &arr2(&[[0.5, 1.5], [3.5, 4.5], [6.5, 7.5]]).into_dyn()
        );
    }

    #[test]
    fn test_destagger_dataset_multiple_staggered_dims_fails() {
        let mut ds = Dataset::new();
        ds.insert(
            "corner",
            Variable::from_f64(vec!["x_stag", "y_stag"], ArrayD::zeros(IxDyn(&[3, 3]))).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            destagger_dataset(&ds, None),
            Err(WrfError::NotImplemented { .. })
        ));

        // restricting the target dims makes it unambiguous
        let map: BTreeMap<String, String> =
            [("x_stag".to_string(), "x".to_string())].into_iter().collect();
        let out = destagger_dataset(&ds, Some(&map)).unwrap();
        assert_eq!(out.variable("corner").unwrap().shape(), vec![2, 3]);
    }
}
