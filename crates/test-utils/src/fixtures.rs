//! Common test fixtures for CAMS extraction tests.
//!
//! This module provides pre-defined test data that mirrors the layout of
//! real CAMS AOT products.

/// AOD variable sets found in real products.
pub mod species {
    /// Variables of products before 2019-07-10.
    pub const FIVE: [&str; 5] = ["duaod550", "omaod550", "bcaod550", "suaod550", "ssaod550"];

    /// Variables of products from 2019-07-10 on.
    pub const SEVEN: [&str; 7] = [
        "duaod550", "omaod550", "bcaod550", "suaod550", "ssaod550", "niaod550", "amaod550",
    ];

    /// Base AOD of a species in generated products (distinct per species).
    pub fn base_value(index: usize) -> f64 {
        0.01 * (index + 1) as f64
    }
}

/// Common grid specifications for testing.
pub mod grid {
    /// Coarse global grid, north to south, longitude in [0, 360).
    pub const GLOBAL_10DEG: GridSpec = GridSpec {
        lat_start: 90.0,
        lat_step: -10.0,
        lat_count: 19,
        lon_start: 0.0,
        lon_step: 10.0,
        lon_count: 36,
    };

    /// Small regional grid around south-west France at CAMS resolution.
    pub const TOULOUSE_0P4: GridSpec = GridSpec {
        lat_start: 45.2,
        lat_step: -0.4,
        lat_count: 8,
        lon_start: 0.0,
        lon_step: 0.4,
        lon_count: 6,
    };

    /// Regular grid described by its first value, step and length per axis.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub lat_start: f64,
        pub lat_step: f64,
        pub lat_count: usize,
        pub lon_start: f64,
        pub lon_step: f64,
        pub lon_count: usize,
    }

    impl GridSpec {
        pub fn latitudes(&self) -> Vec<f64> {
            (0..self.lat_count)
                .map(|i| self.lat_start + self.lat_step * i as f64)
                .collect()
        }

        pub fn longitudes(&self) -> Vec<f64> {
            (0..self.lon_count)
                .map(|i| self.lon_start + self.lon_step * i as f64)
                .collect()
        }
    }
}

/// Common sites for testing.
pub mod sites {
    /// Toulouse, France (latitude, longitude)
    pub const TOULOUSE: (f64, f64) = (43.6, 1.44);

    /// A site west of Greenwich, given with a negative longitude.
    pub const LISBON: (f64, f64) = (38.7, -9.1);
}

/// Product file naming.
pub mod names {
    /// File name of an AOT product observed at `timestamp` (`YYYYMMDDTHHMMSS`).
    pub fn aot_file_name(timestamp: &str) -> String {
        format!("S2__OPER_EXO_CAMS_AOT_{}.nc", timestamp)
    }

    /// Directory name of the CAMS delivery a product belongs to.
    pub fn delivery_dir_name(timestamp: &str) -> String {
        format!("S2__OPER_EXO_CAMS_{}_21000101T000000.DBL.DIR", timestamp)
    }
}
