/// Physical constants shared by every component.
/// Constructed once at startup and passed by reference.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhysicalConstants {
    /// Speed of light, normalized.
    pub c: f64,
    /// Electron rest energy in MeV.
    pub e0: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants {
            c: 1.0,
            e0: 0.511875,
        }
    }
}

impl PhysicalConstants {
    /// Electron rest mass, `e0 / c^2`.
    pub fn me(&self) -> f64 {
        self.e0 / (self.c * self.c)
    }

    /// Kinetic energy for momentum `p`.
    pub fn p2e(&self, p: f64) -> f64 {
        (p * p * self.c * self.c + self.e0 * self.e0).sqrt() - self.e0
    }

    /// Momentum for kinetic energy `e`.
    pub fn e2p(&self, e: f64) -> f64 {
        (e * (e + 2.0 * self.e0)).sqrt() / self.c
    }

    /// Factor applied to raw table entries: normalized units to per day.
    pub fn table_denormalization(&self) -> f64 {
        const SECONDS_PER_DAY: f64 = 3600.0 * 24.0;
        let me = self.me();
        me * me * self.c * self.c * SECONDS_PER_DAY
    }
}
