pub struct DefaultsConfig {
    pub resolution: f64,
    pub dimension: f64,
    pub radius_scale: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            resolution: 0.5,
            dimension: 23.5,
            radius_scale: 1.0,
        }
    }
}
