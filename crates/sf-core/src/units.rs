// sf-core/src/units.rs

use uom::si::f64::{
    MassDensity as UomMassDensity, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn atm(v: f64) -> Pressure {
    use uom::si::pressure::atmosphere;
    Pressure::new::<atmosphere>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgpm3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

pub mod constants {
    /// Universal gas constant [J/(kmol·K)].
    pub const GAS_CONSTANT: f64 = 8_314.462_618_153_24;

    /// Standard atmosphere [Pa].
    pub const ONE_ATM_PA: f64 = 101_325.0;

    /// Reference pressure of the species thermo polynomials [Pa].
    pub const STANDARD_PRESSURE_PA: f64 = ONE_ATM_PA;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _rho = kgpm3(1.2);
    }

    #[test]
    fn atmosphere_matches_constant() {
        assert!((atm(2.0).value - 2.0 * constants::ONE_ATM_PA).abs() < 1e-9);
    }
}
