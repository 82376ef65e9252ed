//! Species definitions and the built-in thermo catalog.

use crate::thermo::Nasa7;
use serde::{Deserialize, Serialize};

/// One species of a mechanism.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesData {
    /// Mechanism name (e.g. `"H2O"`), case sensitive.
    pub name: String,
    /// Molar mass [kg/kmol].
    pub molar_mass: f64,
    /// Ideal-gas thermodynamics.
    pub thermo: Nasa7,
}

impl SpeciesData {
    pub fn new(name: impl Into<String>, molar_mass: f64, thermo: Nasa7) -> Self {
        Self {
            name: name.into(),
            molar_mass,
            thermo,
        }
    }

    /// Look up a species in the built-in catalog (GRI-Mech 3.0 thermo).
    pub fn builtin(name: &str) -> Option<Self> {
        let (mw, ranges, low, high) = match name {
            "H2" => (
                2.015_88,
                [200.0, 1000.0, 3500.0],
                [
                    2.344_331_12e+00,
                    7.980_520_75e-03,
                    -1.947_815_10e-05,
                    2.015_720_94e-08,
                    -7.376_117_61e-12,
                    -9.179_351_73e+02,
                    6.830_102_38e-01,
                ],
                [
                    3.337_279_20e+00,
                    -4.940_247_31e-05,
                    4.994_567_78e-07,
                    -1.795_663_94e-10,
                    2.002_553_76e-14,
                    -9.501_589_22e+02,
                    -3.205_023_31e+00,
                ],
            ),
            "O2" => (
                31.998_8,
                [200.0, 1000.0, 3500.0],
                [
                    3.782_456_36e+00,
                    -2.996_734_16e-03,
                    9.847_302_01e-06,
                    -9.681_295_09e-09,
                    3.243_728_37e-12,
                    -1.063_943_56e+03,
                    3.657_675_73e+00,
                ],
                [
                    3.282_537_84e+00,
                    1.483_087_54e-03,
                    -7.579_666_69e-07,
                    2.094_705_55e-10,
                    -2.167_177_94e-14,
                    -1.088_457_72e+03,
                    5.453_231_29e+00,
                ],
            ),
            "H2O" => (
                18.015_28,
                [200.0, 1000.0, 3500.0],
                [
                    4.198_640_56e+00,
                    -2.036_434_10e-03,
                    6.520_402_11e-06,
                    -5.487_970_62e-09,
                    1.771_978_17e-12,
                    -3.029_372_67e+04,
                    -8.490_322_08e-01,
                ],
                [
                    3.033_992_49e+00,
                    2.176_918_04e-03,
                    -1.640_725_18e-07,
                    -9.704_198_70e-11,
                    1.682_009_92e-14,
                    -3.000_429_71e+04,
                    4.966_770_10e+00,
                ],
            ),
            "OH" => (
                17.007_34,
                [200.0, 1000.0, 3500.0],
                [
                    3.992_015_43e+00,
                    -2.401_317_52e-03,
                    4.617_938_41e-06,
                    -3.881_133_33e-09,
                    1.364_114_70e-12,
                    3.615_080_56e+03,
                    -1.039_254_58e-01,
                ],
                [
                    3.092_887_67e+00,
                    5.484_297_16e-04,
                    1.265_052_28e-07,
                    -8.794_615_56e-11,
                    1.174_123_76e-14,
                    3.858_657_00e+03,
                    4.476_696_10e+00,
                ],
            ),
            "H" => (
                1.007_94,
                [200.0, 1000.0, 3500.0],
                [2.5, 0.0, 0.0, 0.0, 0.0, 2.547_365_99e+04, -4.466_828_53e-01],
                [2.5, 0.0, 0.0, 0.0, 0.0, 2.547_365_99e+04, -4.466_828_53e-01],
            ),
            "O" => (
                15.999_4,
                [200.0, 1000.0, 3500.0],
                [
                    3.168_267_10e+00,
                    -3.279_318_84e-03,
                    6.643_063_96e-06,
                    -6.128_066_24e-09,
                    2.112_659_71e-12,
                    2.912_225_92e+04,
                    2.051_933_46e+00,
                ],
                [
                    2.569_420_78e+00,
                    -8.597_411_37e-05,
                    4.194_845_89e-08,
                    -1.001_777_99e-11,
                    1.228_336_91e-15,
                    2.921_757_91e+04,
                    4.784_338_64e+00,
                ],
            ),
            "N2" => (
                28.013_4,
                [300.0, 1000.0, 5000.0],
                [
                    3.298_677e+00,
                    1.408_240_4e-03,
                    -3.963_222e-06,
                    5.641_515e-09,
                    -2.444_854e-12,
                    -1.020_899_9e+03,
                    3.950_372e+00,
                ],
                [
                    2.926_640e+00,
                    1.487_976_8e-03,
                    -5.684_760e-07,
                    1.009_703_8e-10,
                    -6.753_351e-15,
                    -9.227_977e+02,
                    5.980_528e+00,
                ],
            ),
            "AR" => (
                39.948,
                [300.0, 1000.0, 5000.0],
                [2.5, 0.0, 0.0, 0.0, 0.0, -7.453_75e+02, 4.366],
                [2.5, 0.0, 0.0, 0.0, 0.0, -7.453_75e+02, 4.366],
            ),
            _ => return None,
        };
        Some(Self::new(name, mw, Nasa7::new(ranges, low, high)))
    }
}

/// Names accepted by [`SpeciesData::builtin`].
pub const BUILTIN_SPECIES: [&str; 8] = ["H2", "O2", "H2O", "OH", "H", "O", "N2", "AR"];
