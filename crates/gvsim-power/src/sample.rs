/// A named power reading, possibly with children.
///
/// Mirrors the hierarchical report the host control API's `report_get`
/// hands back: a named subtree with its own dynamic/static split, plus
/// nested samples for sub-components (the core, the prefetch buffer, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSample {
    pub name: String,
    pub dynamic_power: f64,
    pub static_power: f64,
    pub children: Vec<PowerSample>,
}

impl PowerSample {
    #[must_use]
    pub fn leaf(name: impl Into<String>, dynamic_power: f64, static_power: f64) -> Self {
        Self {
            name: name.into(),
            dynamic_power,
            static_power,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(name: impl Into<String>, children: Vec<PowerSample>) -> Self {
        let (dynamic_power, static_power) = children
            .iter()
            .fold((0.0, 0.0), |(d, s), c| (d + c.dynamic_power, s + c.static_power));
        Self {
            name: name.into(),
            dynamic_power,
            static_power,
            children,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.dynamic_power + self.static_power
    }
}
