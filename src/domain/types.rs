//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the forecast transformer and cluster grouping
//! - exported to JSON/CSV
//! - passed between the fetch threads and the TUI

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Reference "today" used by the future-units aggregate unless overridden (2024-01-01).
pub fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// One day of model output from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// One observed sales value. Sparse: not every forecast date has one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActualPoint {
    pub date: NaiveDate,
    pub actual: f64,
}

/// Validated forecast payload: predicted points strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub predicted: Vec<ForecastPoint>,
    pub actual: Vec<ActualPoint>,
}

impl ForecastData {
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// Calendar granularity used to thin the chart's dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Weekly,
    Monthly,
    Quarterly,
    /// Keep every date.
    None,
}

impl Interval {
    pub const ALL: [Interval; 4] = [
        Interval::Weekly,
        Interval::Monthly,
        Interval::Quarterly,
        Interval::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Quarterly => "quarterly",
            Interval::None => "none",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

/// What the forecast chart should show. Replaced wholesale on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub interval: Interval,
    pub show_predicted: bool,
    pub show_min: bool,
    pub show_max: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            interval: Interval::Weekly,
            show_predicted: true,
            show_min: true,
            show_max: true,
        }
    }
}

impl DisplayConfig {
    pub fn with_interval(self, interval: Interval) -> Self {
        Self { interval, ..self }
    }

    pub fn toggle_predicted(self) -> Self {
        Self {
            show_predicted: !self.show_predicted,
            ..self
        }
    }

    pub fn toggle_min(self) -> Self {
        Self {
            show_min: !self.show_min,
            ..self
        }
    }

    pub fn toggle_max(self) -> Self {
        Self {
            show_max: !self.show_max,
            ..self
        }
    }
}

/// Requested forecast window. Only the end date feeds the future-units aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Dealership stores known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Store {
    S001,
    S002,
    S003,
    S004,
    S005,
}

impl Store {
    pub const ALL: [Store; 5] = [Store::S001, Store::S002, Store::S003, Store::S004, Store::S005];

    pub fn id(self) -> &'static str {
        match self {
            Store::S001 => "S001",
            Store::S002 => "S002",
            Store::S003 => "S003",
            Store::S004 => "S004",
            Store::S005 => "S005",
        }
    }

    /// Integer code used by the clustering endpoint.
    pub fn code(self) -> i64 {
        match self {
            Store::S001 => 0,
            Store::S002 => 1,
            Store::S003 => 2,
            Store::S004 => 3,
            Store::S005 => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|store| store.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown store '{trimmed}' (expected S001..S005)"))
    }
}

/// Spare parts the backend can forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    AirFilter,
    Alternator,
    Battery,
    BrakePad,
    Coolant,
    DiscRotor,
    EngineOil,
    Fans,
    Fuse,
    Led,
    Radiator,
    RearviewMirror,
    Resistors,
    Sensor,
    SideviewMirror,
    SparkPlugs,
    Thermostat,
    WaterPump,
    Windshield,
    Wires,
}

impl Product {
    pub const ALL: [Product; 20] = [
        Product::AirFilter,
        Product::Alternator,
        Product::Battery,
        Product::BrakePad,
        Product::Coolant,
        Product::DiscRotor,
        Product::EngineOil,
        Product::Fans,
        Product::Fuse,
        Product::Led,
        Product::Radiator,
        Product::RearviewMirror,
        Product::Resistors,
        Product::Sensor,
        Product::SideviewMirror,
        Product::SparkPlugs,
        Product::Thermostat,
        Product::WaterPump,
        Product::Windshield,
        Product::Wires,
    ];

    /// Name as sent to (and understood by) the backend.
    pub fn name(self) -> &'static str {
        match self {
            Product::AirFilter => "Air Filter",
            Product::Alternator => "Alternator",
            Product::Battery => "Battery",
            Product::BrakePad => "Brake Pad",
            Product::Coolant => "Coolant",
            Product::DiscRotor => "Disc Rotor",
            Product::EngineOil => "Engine Oil",
            Product::Fans => "Fans",
            Product::Fuse => "Fuse",
            Product::Led => "LED",
            Product::Radiator => "Radiator",
            Product::RearviewMirror => "Rearview Mirror",
            Product::Resistors => "Resistors",
            Product::Sensor => "Sensor",
            Product::SideviewMirror => "Sideview Mirror",
            Product::SparkPlugs => "Spark Plugs",
            Product::Thermostat => "Thermostat",
            Product::WaterPump => "Water Pump",
            Product::Windshield => "Windshield",
            Product::Wires => "Wires",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = String;

    /// Accepts the display name case-insensitively, with `-` or `_` in place of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|p| normalize_name(p.name()) == wanted)
            .ok_or_else(|| format!("unknown product '{}'", s.trim()))
    }
}

fn normalize_name(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Part categories used by the clustering endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Accessories,
    Breaks,
    CoolingSystem,
    Electrical,
    Engine,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Accessories,
        Category::Breaks,
        Category::CoolingSystem,
        Category::Electrical,
        Category::Engine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Accessories => "Accessories",
            Category::Breaks => "Breaks",
            Category::CoolingSystem => "Cooling System",
            Category::Electrical => "Electrical",
            Category::Engine => "Engine",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Category::Accessories => 0,
            Category::Breaks => 1,
            Category::CoolingSystem => 2,
            Category::Electrical => 3,
            Category::Engine => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

/// Raw store code from the wire; may not map to a known store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreCode(pub i64);

impl StoreCode {
    pub fn store(self) -> Option<Store> {
        Store::from_code(self.0)
    }
}

impl fmt::Display for StoreCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store() {
            Some(store) => f.write_str(store.id()),
            None => write!(f, "Unknown ({})", self.0),
        }
    }
}

/// Raw category code from the wire; may not map to a known category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCode(pub i64);

impl CategoryCode {
    pub fn category(self) -> Option<Category> {
        Category::from_code(self.0)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category() {
            Some(category) => f.write_str(category.label()),
            None => write!(f, "Unknown ({})", self.0),
        }
    }
}

/// One (store, category) aggregate assigned to a k-means cluster by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub sales: f64,
    pub category: CategoryCode,
    pub store: StoreCode,
    pub cluster: i64,
}

fn cycle<T: Copy + PartialEq>(all: &[T], cur: T, step: isize) -> T {
    let len = all.len() as isize;
    let idx = all.iter().position(|x| *x == cur).unwrap_or(0) as isize;
    all[(idx + step).rem_euclid(len) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_render_with_fallback_label() {
        assert_eq!(StoreCode(2).to_string(), "S003");
        assert_eq!(StoreCode(9).to_string(), "Unknown (9)");
        assert_eq!(CategoryCode(2).to_string(), "Cooling System");
        assert_eq!(CategoryCode(-1).to_string(), "Unknown (-1)");
    }

    #[test]
    fn product_parses_loose_names() {
        assert_eq!("brake-pad".parse::<Product>(), Ok(Product::BrakePad));
        assert_eq!("  Spark Plugs ".parse::<Product>(), Ok(Product::SparkPlugs));
        assert_eq!("led".parse::<Product>(), Ok(Product::Led));
        assert!("Muffler".parse::<Product>().is_err());
    }

    #[test]
    fn store_parses_and_cycles() {
        assert_eq!("s004".parse::<Store>(), Ok(Store::S004));
        assert!("S009".parse::<Store>().is_err());
        assert_eq!(Store::S005.next(), Store::S001);
        assert_eq!(Store::S001.prev(), Store::S005);
    }

    #[test]
    fn display_config_toggles_are_independent() {
        let cfg = DisplayConfig::default().toggle_min();
        assert!(cfg.show_predicted);
        assert!(!cfg.show_min);
        assert!(cfg.show_max);
        assert_eq!(cfg.with_interval(Interval::Monthly).interval, Interval::Monthly);
    }

    #[test]
    fn interval_cycles_through_all_values() {
        let mut cur = Interval::Weekly;
        for _ in 0..Interval::ALL.len() {
            cur = cur.next();
        }
        assert_eq!(cur, Interval::Weekly);
        assert_eq!(Interval::Weekly.prev(), Interval::None);
    }
}
