//! Backend JSON shapes and their validation into domain types.
//!
//! Record lists are kept as raw JSON values and checked one record at a time,
//! so a missing or badly typed field never fails the whole response. Records that can't be used are dropped and reported as a
//! [`ValidationIssue`]; the remaining records are returned as-is.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ActualPoint, CategoryCode, ClusterPoint, DateRange, ForecastData, ForecastPoint, Product, Store, StoreCode};

/// Body of `POST /forecast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    pub store_id: String,
    pub product_name: String,
    pub start_date: String,
    pub end_date: String,
}

impl ForecastRequest {
    pub fn new(store: Store, product: Product, range: &DateRange) -> Self {
        Self {
            store_id: store.id().to_string(),
            product_name: product.name().to_string(),
            start_date: range.start.format("%Y-%m-%d").to_string(),
            end_date: range.end.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Body of a successful `POST /forecast`.
///
/// Records stay untyped JSON until [`validate_forecast`] so that one badly
/// typed field drops that record only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub predicted_sales: Vec<Value>,
    #[serde(default)]
    pub actual_sales: Vec<Value>,
}

/// Body of a successful `GET /clustering`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterResponse {
    #[serde(default)]
    pub clusters: Vec<Value>,
}

/// Which list a dropped record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Predicted,
    Actual,
    Cluster,
}

impl RecordSource {
    fn as_str(self) -> &'static str {
        match self {
            RecordSource::Predicted => "predicted_sales",
            RecordSource::Actual => "actual_sales",
            RecordSource::Cluster => "clusters",
        }
    }
}

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    MissingField(&'static str),
    NonFinite(&'static str),
    /// Present but not the JSON type the field needs (or the record is not an object).
    WrongType(&'static str),
    /// A numeric code with a fractional part.
    NotInteger(&'static str),
    InvalidDate(String),
    /// Date not strictly after the previous kept predicted point.
    OutOfOrder(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub source: RecordSource,
    pub index: usize,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = format!("{}[{}]", self.source.as_str(), self.index);
        match &self.kind {
            IssueKind::MissingField(field) => write!(f, "{at}: missing `{field}`"),
            IssueKind::NonFinite(field) => write!(f, "{at}: non-finite `{field}`"),
            IssueKind::WrongType(field) => write!(f, "{at}: wrong type for `{field}`"),
            IssueKind::NotInteger(field) => write!(f, "{at}: `{field}` is not an integer"),
            IssueKind::InvalidDate(raw) => write!(f, "{at}: invalid date '{raw}'"),
            IssueKind::OutOfOrder(date) => write!(f, "{at}: date {date} out of order"),
        }
    }
}

/// Short status-line summary of dropped records, e.g. `2 records dropped (predicted_sales[3]: missing ...)`.
pub fn summarize_issues(issues: &[ValidationIssue]) -> Option<String> {
    let first = issues.first()?;
    let noun = if issues.len() == 1 { "record" } else { "records" };
    Some(format!("{} {noun} dropped ({first})", issues.len()))
}

/// Validate a forecast response.
pub fn validate_forecast(resp: ForecastResponse) -> (ForecastData, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let mut predicted: Vec<ForecastPoint> = Vec::with_capacity(resp.predicted_sales.len());

    for (index, raw) in resp.predicted_sales.iter().enumerate() {
        let parsed = record(raw).and_then(|r| {
            Ok(ForecastPoint {
                date: r.date()?,
                predicted: r.number("predicted")?,
                lower_bound: r.number("lower_bound")?,
                upper_bound: r.number("upper_bound")?,
            })
        });
        let kind = match parsed {
            Ok(point) if predicted.last().is_some_and(|prev| point.date <= prev.date) => {
                IssueKind::OutOfOrder(point.date)
            }
            Ok(point) => {
                predicted.push(point);
                continue;
            }
            Err(kind) => kind,
        };
        issues.push(ValidationIssue {
            source: RecordSource::Predicted,
            index,
            kind,
        });
    }

    let mut actual = Vec::with_capacity(resp.actual_sales.len());
    for (index, raw) in resp.actual_sales.iter().enumerate() {
        let parsed = record(raw).and_then(|r| {
            Ok(ActualPoint {
                date: r.date()?,
                actual: r.number("actual")?,
            })
        });
        match parsed {
            Ok(point) => actual.push(point),
            Err(kind) => issues.push(ValidationIssue {
                source: RecordSource::Actual,
                index,
                kind,
            }),
        }
    }

    (ForecastData { predicted, actual }, issues)
}

/// Validate a clustering response.
///
/// Codes may arrive as integral floats (`3.0`); those are accepted.
pub fn validate_clusters(resp: ClusterResponse) -> (Vec<ClusterPoint>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let mut points = Vec::with_capacity(resp.clusters.len());

    for (index, raw) in resp.clusters.iter().enumerate() {
        let parsed = record(raw).and_then(|r| {
            Ok(ClusterPoint {
                sales: r.number("sales")?,
                category: CategoryCode(r.code("category")?),
                store: StoreCode(r.code("store_id")?),
                cluster: r.code("cluster")?,
            })
        });
        match parsed {
            Ok(point) => points.push(point),
            Err(kind) => issues.push(ValidationIssue {
                source: RecordSource::Cluster,
                index,
                kind,
            }),
        }
    }

    (points, issues)
}

/// Typed field access on one JSON record.
struct Record<'a>(&'a Map<String, Value>);

fn record(raw: &Value) -> Result<Record<'_>, IssueKind> {
    raw.as_object().map(Record).ok_or(IssueKind::WrongType("record"))
}

impl Record<'_> {
    /// `null` counts as missing.
    fn field(&self, name: &'static str) -> Result<&Value, IssueKind> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(IssueKind::MissingField(name)),
            Some(v) => Ok(v),
        }
    }

    fn date(&self) -> Result<NaiveDate, IssueKind> {
        let raw = self.field("date")?.as_str().ok_or(IssueKind::WrongType("date"))?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| IssueKind::InvalidDate(raw.to_string()))
    }

    fn number(&self, name: &'static str) -> Result<f64, IssueKind> {
        let v = self.field(name)?.as_f64().ok_or(IssueKind::WrongType(name))?;
        if !v.is_finite() {
            return Err(IssueKind::NonFinite(name));
        }
        Ok(v)
    }

    fn code(&self, name: &'static str) -> Result<i64, IssueKind> {
        let value = self.field(name)?;
        if let Some(code) = value.as_i64() {
            return Ok(code);
        }
        let v = self.number(name)?;
        if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
            return Err(IssueKind::NotInteger(name));
        }
        Ok(v as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn request_body_matches_backend_contract() {
        let range = DateRange { start: ymd(2024, 1, 1), end: ymd(2024, 3, 31) };
        let req = ForecastRequest::new(Store::S002, Product::BrakePad, &range);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "store_id": "S002",
                "product_name": "Brake Pad",
                "start_date": "2024-01-01",
                "end_date": "2024-03-31",
            })
        );
    }

    #[test]
    fn well_formed_response_passes_through() {
        let body = r#"{
            "store_id": "S001",
            "product_name": "Battery",
            "predicted_sales": [
                {"date": "2024-01-01", "predicted": 5.5, "lower_bound": 3.0, "upper_bound": 8.0},
                {"date": "2024-01-02", "predicted": 6.0, "lower_bound": 3.5, "upper_bound": 8.5}
            ],
            "actual_sales": [{"date": "2024-01-01", "actual": 5.0}]
        }"#;
        let resp: ForecastResponse = serde_json::from_str(body).unwrap();
        let (data, issues) = validate_forecast(resp);
        assert!(issues.is_empty());
        assert_eq!(data.predicted.len(), 2);
        assert_eq!(data.predicted[1].upper_bound, 8.5);
        assert_eq!(data.actual, vec![ActualPoint { date: ymd(2024, 1, 1), actual: 5.0 }]);
    }

    #[test]
    fn bad_records_are_dropped_and_reported() {
        let body = r#"{
            "predicted_sales": [
                {"date": "2024-01-01", "predicted": 1.0, "lower_bound": 0.5, "upper_bound": 1.5},
                {"date": "2024-01-02", "predicted": 1.0, "upper_bound": 1.5},
                {"date": "01/03/2024", "predicted": 1.0, "lower_bound": 0.5, "upper_bound": 1.5},
                {"date": "2024-01-01", "predicted": 1.0, "lower_bound": 0.5, "upper_bound": 1.5},
                {"date": "2024-01-04", "predicted": 2.0, "lower_bound": 1.0, "upper_bound": 3.0}
            ],
            "actual_sales": [{"date": "2024-01-01"}, {"actual": 3.0}]
        }"#;
        let resp: ForecastResponse = serde_json::from_str(body).unwrap();
        let (data, issues) = validate_forecast(resp);

        let dates: Vec<NaiveDate> = data.predicted.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 4)]);
        assert!(data.actual.is_empty());

        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::MissingField("lower_bound"),
                IssueKind::InvalidDate("01/03/2024".to_string()),
                IssueKind::OutOfOrder(ymd(2024, 1, 1)),
                IssueKind::MissingField("actual"),
                IssueKind::MissingField("date"),
            ]
        );
        assert_eq!(issues[0].to_string(), "predicted_sales[1]: missing `lower_bound`");
        assert_eq!(
            summarize_issues(&issues).unwrap(),
            "5 records dropped (predicted_sales[1]: missing `lower_bound`)"
        );
    }

    #[test]
    fn missing_lists_mean_empty_payload() {
        let resp: ForecastResponse = serde_json::from_str("{}").unwrap();
        let (data, issues) = validate_forecast(resp);
        assert!(data.is_empty());
        assert!(issues.is_empty());
        assert!(summarize_issues(&issues).is_none());
    }

    #[test]
    fn clusters_keep_unknown_codes() {
        let body = r#"{"clusters": [
            {"sales": 120.5, "category": 3, "store_id": 0, "cluster": 1},
            {"sales": 80.0, "category": 7, "store_id": 12, "cluster": 0},
            {"sales": 10.0, "category": 1, "cluster": 0}
        ]}"#;
        let resp: ClusterResponse = serde_json::from_str(body).unwrap();
        let (points, issues) = validate_clusters(resp);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].store.to_string(), "Unknown (12)");
        assert_eq!(points[1].category.to_string(), "Unknown (7)");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingField("store_id"));
    }

    #[test]
    fn badly_typed_field_drops_only_that_record() {
        let body = r#"{
            "predicted_sales": [
                {"date": "2024-01-01", "predicted": 1.0, "lower_bound": 0.5, "upper_bound": 1.5},
                {"date": "2024-01-02", "predicted": "n/a", "lower_bound": 0.5, "upper_bound": 1.5},
                "2024-01-03",
                {"date": 20240104, "predicted": 1.0, "lower_bound": 0.5, "upper_bound": 1.5}
            ],
            "actual_sales": [{"date": "2024-01-01", "actual": null}]
        }"#;
        let resp: ForecastResponse = serde_json::from_str(body).unwrap();
        let (data, issues) = validate_forecast(resp);

        assert_eq!(data.predicted.len(), 1);
        assert_eq!(data.predicted[0].date, ymd(2024, 1, 1));
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::WrongType("predicted"),
                IssueKind::WrongType("record"),
                IssueKind::WrongType("date"),
                IssueKind::MissingField("actual"),
            ]
        );
        assert_eq!(issues[0].to_string(), "predicted_sales[1]: wrong type for `predicted`");
    }

    #[test]
    fn cluster_codes_accept_integral_floats() {
        // pandas `iterrows()` upcasts the category column to float.
        let body = r#"{"clusters": [
            {"category": 3.0, "store_id": 0, "sales": 120.5, "cluster": 1},
            {"category": 1, "store_id": 2.0, "sales": 40.0, "cluster": 0.0},
            {"category": 2.5, "store_id": 1, "sales": 10.0, "cluster": 0},
            {"category": "3", "store_id": 1, "sales": 10.0, "cluster": 0}
        ]}"#;
        let resp: ClusterResponse = serde_json::from_str(body).unwrap();
        let (points, issues) = validate_clusters(resp);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].category, CategoryCode(3));
        assert_eq!(points[0].category.to_string(), "Electrical");
        assert_eq!(points[0].store.to_string(), "S001");
        assert_eq!(points[1].store, StoreCode(2));
        assert_eq!(points[1].cluster, 0);

        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind.clone()).collect();
        assert_eq!(kinds, vec![IssueKind::NotInteger("category"), IssueKind::WrongType("category")]);
        assert_eq!(issues[0].to_string(), "clusters[2]: `category` is not an integer");
    }
}
