//! Sampling and artifact round trips on generated CAMS products.

use chrono::{TimeZone, Utc};

use cams_common::SiteCoordinate;
use netcdf_parser::{read_site_series, sample_site, write_site_series, NetCdfError, SeriesVariable, SiteSeries};
use test_utils::{assert_approx_eq, grid, sites, AotProductBuilder, PACKED_SCALE};

fn toulouse() -> SiteCoordinate {
    SiteCoordinate::new(sites::TOULOUSE.0, sites::TOULOUSE.1)
}

#[test]
fn test_sample_float_product() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("product.nc");
    let builder = AotProductBuilder::five_species(grid::TOULOUSE_0P4);
    builder.write(&path).unwrap();

    let cell = sample_site(&path, &toulouse()).unwrap();

    // 43.6N is row 4 (45.2 - 4 * 0.4); 1.44E is closest to 1.6 (column 4)
    assert_eq!((cell.lat_index, cell.lon_index), (4, 4));
    assert_approx_eq!(cell.latitude, 43.6, 1e-4);
    assert_approx_eq!(cell.longitude, 1.6, 1e-4);

    assert_eq!(cell.values.len(), 5);
    for name in ["duaod550", "ssaod550"] {
        let expected = builder.expected(name, 4, 4).unwrap();
        assert_approx_eq!(cell.value(name).unwrap(), expected, 1e-6);
    }
    assert_eq!(
        cell.long_names.get("duaod550").map(String::as_str),
        Some("duaod550 at 550nm")
    );
}

#[test]
fn test_sample_packed_product_is_unpacked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packed.nc");
    let builder = AotProductBuilder::seven_species(grid::TOULOUSE_0P4).packed();
    builder.write(&path).unwrap();

    let cell = sample_site(&path, &toulouse()).unwrap();

    assert_eq!(cell.values.len(), 7);
    let expected = builder.expected("amaod550", 4, 4).unwrap();
    assert_approx_eq!(cell.value("amaod550").unwrap(), expected, PACKED_SCALE);
}

#[test]
fn test_fill_value_at_site_is_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filled.nc");
    AotProductBuilder::five_species(grid::TOULOUSE_0P4)
        .packed()
        .with_fill_at(4, 4)
        .write(&path)
        .unwrap();

    let cell = sample_site(&path, &toulouse()).unwrap();
    assert!(cell.value("duaod550").unwrap().is_nan());
}

#[test]
fn test_negative_longitude_wraps_onto_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("global.nc");
    AotProductBuilder::five_species(grid::GLOBAL_10DEG)
        .write(&path)
        .unwrap();

    let lisbon = SiteCoordinate::new(sites::LISBON.0, sites::LISBON.1);
    let cell = sample_site(&path, &lisbon).unwrap();

    // 38.7N -> 40N (row 5); -9.1E -> 350.9E -> 350E (column 35)
    assert_eq!((cell.lat_index, cell.lon_index), (5, 35));
    assert_approx_eq!(cell.longitude, 350.0, 1e-4);
}

#[test]
fn test_extra_spatial_variables_are_sampled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra.nc");
    AotProductBuilder::five_species(grid::TOULOUSE_0P4)
        .with_extra("aod550", 0.25)
        .write(&path)
        .unwrap();

    let cell = sample_site(&path, &toulouse()).unwrap();
    assert_eq!(cell.values.len(), 6);
    assert_approx_eq!(cell.value("aod550").unwrap(), 0.25, 1e-6);
    assert!(cell.value("time").is_none());
}

#[test]
fn test_corrupt_product_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.nc");
    test_utils::write_corrupt_product(&path).unwrap();

    assert!(matches!(
        sample_site(&path, &toulouse()),
        Err(NetCdfError::OpenFailed(_))
    ));
}

#[test]
fn test_site_series_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site_5.nc");
    let series = SiteSeries {
        latitude: 43.6,
        longitude: 1.6,
        site: Some((43.6, 1.44)),
        times: vec![
            Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2019, 7, 9, 12, 0, 0).unwrap(),
        ],
        variables: vec![
            SeriesVariable {
                name: "duaod550".to_string(),
                long_name: Some("Dust aerosol optical depth at 550nm".to_string()),
                values: vec![0.125, 0.25],
            },
            SeriesVariable {
                name: "omaod550".to_string(),
                long_name: None,
                values: vec![0.5, f64::NAN],
            },
        ],
    };

    write_site_series(&path, &series).unwrap();
    let back = read_site_series(&path).unwrap();

    assert_eq!(back.times, series.times);
    assert_eq!(back.latitude, 43.6);
    assert_eq!(back.longitude, 1.6);
    assert_eq!(back.site, Some((43.6, 1.44)));

    let names: Vec<_> = back.variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["duaod550", "omaod550"]);
    assert_eq!(back.variable("duaod550").unwrap().values, vec![0.125, 0.25]);
    assert_eq!(
        back.variable("duaod550").unwrap().long_name.as_deref(),
        Some("Dust aerosol optical depth at 550nm")
    );
    let om = &back.variable("omaod550").unwrap().values;
    assert_eq!(om[0], 0.5);
    assert!(om[1].is_nan());
}

#[test]
fn test_write_rejects_ragged_series() {
    let dir = tempfile::tempdir().unwrap();
    let series = SiteSeries {
        latitude: 0.0,
        longitude: 0.0,
        site: None,
        times: vec![Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap()],
        variables: vec![SeriesVariable {
            name: "duaod550".to_string(),
            long_name: None,
            values: vec![0.1, 0.2],
        }],
    };
    assert!(matches!(
        write_site_series(dir.path().join("bad_5.nc"), &series),
        Err(NetCdfError::InvalidFormat(_))
    ));
}

/// Real CAMS product, when available (set TEST_DATA_DIR).
#[test]
fn test_real_product_has_five_or_seven_species() {
    let path = test_utils::require_test_file!("CAMS_AOT_sample.nc");
    let cell = sample_site(&path, &toulouse()).unwrap();
    let species = cell.values.keys().filter(|k| k.ends_with("aod550")).count();
    assert!(species >= 5, "found {} AOD variables", species);
}
