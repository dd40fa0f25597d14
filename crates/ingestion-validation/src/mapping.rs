//! Structural validation of shapefile features.
//!
//! A feature is checked against the attribute table layout of a polygon
//! parts shapefile and, when it passes, mapped to the property names the
//! validation service expects. A failing feature yields the list of its
//! structural issues instead and is never sent downstream.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ingestion_entity::feature::{Feature, geometry};
use serde::Serialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

/// Attribute columns of the source shapefile.
pub mod columns {
    pub const ID: &str = "id";
    pub const SOURCE_ID: &str = "sourceId";
    pub const SOURCE_NAME: &str = "sourceName";
    pub const DESCRIPTION: &str = "desc";
    pub const EP90: &str = "ep90";
    pub const SOURCE_RESOLUTION: &str = "sourceRes";
    pub const UPDATE_DATE: &str = "updateDate";
    pub const SENSORS: &str = "sensors";
    pub const COUNTRIES: &str = "countries";
    pub const CITIES: &str = "cities";
}

/// Job-level values applied to every mapped feature.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext {
    /// Ingestion resolution of the job, in degrees.
    pub resolution_degree: f64,
}

/// Properties of a polygon part as sent to the validation service.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolygonPartProperties {
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[validate(length(min = 1, message = "sourceName must not be empty"))]
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "horizontalAccuracyCE90")]
    #[validate(range(min = 0.01, max = 4000.0, message = "ep90 must be between 0.01 and 4000"))]
    pub horizontal_accuracy_ce90: f64,
    #[validate(range(
        min = 0.0185,
        max = 78271.52,
        message = "sourceRes must be between 0.0185 and 78271.52"
    ))]
    pub source_resolution_meter: f64,
    #[validate(range(
        min = 1.67638e-7,
        max = 0.703125,
        message = "ingestion resolution must be between 1.67638e-7 and 0.703125 degrees"
    ))]
    pub resolution_degree: f64,
    #[serde(rename = "imagingTimeBeginUTC")]
    pub imaging_time_begin_utc: DateTime<Utc>,
    #[serde(rename = "imagingTimeEndUTC")]
    pub imaging_time_end_utc: DateTime<Utc>,
    #[validate(length(min = 1, message = "sensors must list at least one sensor"))]
    pub sensors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<Vec<String>>,
}

/// Validate a feature and map it to a polygon part.
pub fn validate_and_map(feature: &Feature, ctx: &MappingContext) -> Result<Feature, Vec<String>> {
    let mut fields = FieldReader::new(&feature.properties);

    match &feature.geometry {
        Some(shape) if geometry::is_polygonal(shape) => {}
        Some(shape) => fields.issue(format!(
            "geometry must be a Polygon or MultiPolygon, got {}",
            geometry::type_name(shape)
        )),
        None => fields.issue("geometry is missing".to_string()),
    }

    let id = fields.required_string(columns::ID);
    let source_id = fields.optional_string(columns::SOURCE_ID);
    let source_name = fields.required_string(columns::SOURCE_NAME);
    let description = fields.optional_string(columns::DESCRIPTION);
    let ep90 = fields.required_number(columns::EP90);
    let source_res = fields.required_number(columns::SOURCE_RESOLUTION);
    let update_date = fields.required_date(columns::UPDATE_DATE);
    let sensors = fields.required_list(columns::SENSORS);
    let countries = fields.optional_list(columns::COUNTRIES);
    let cities = fields.optional_list(columns::CITIES);

    let (
        Some(id),
        Some(source_name),
        Some(ep90),
        Some(source_res),
        Some(update_date),
        Some(sensors),
    ) = (id, source_name, ep90, source_res, update_date, sensors)
    else {
        return Err(fields.into_issues());
    };

    let part = PolygonPartProperties {
        id,
        source_id,
        source_name,
        description,
        horizontal_accuracy_ce90: ep90,
        source_resolution_meter: source_res,
        resolution_degree: ctx.resolution_degree,
        imaging_time_begin_utc: update_date,
        imaging_time_end_utc: update_date,
        sensors,
        countries,
        cities,
    };
    if let Err(errors) = part.validate() {
        fields.issues.extend(messages(&errors));
    }
    if !fields.issues.is_empty() {
        return Err(fields.into_issues());
    }

    match serde_json::to_value(&part) {
        Ok(Value::Object(properties)) => Ok(Feature {
            id: feature.id.clone(),
            geometry: feature.geometry.clone(),
            properties,
        }),
        Ok(_) => Err(vec!["properties could not be mapped".to_string()]),
        Err(e) => Err(vec![format!("properties could not be mapped: {e}")]),
    }
}

fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut out: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect();
    out.sort();
    out
}

/// Reads typed values out of an attribute row, collecting issues.
struct FieldReader<'a> {
    properties: &'a Map<String, Value>,
    issues: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(properties: &'a Map<String, Value>) -> Self {
        Self {
            properties,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, message: String) {
        self.issues.push(message);
    }

    fn into_issues(self) -> Vec<String> {
        self.issues
    }

    fn text(&self, column: &str) -> Option<String> {
        match self.properties.get(column)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn optional_string(&self, column: &str) -> Option<String> {
        self.text(column)
    }

    fn required_string(&mut self, column: &str) -> Option<String> {
        let value = self.text(column);
        if value.is_none() {
            self.issue(format!("{column} is required"));
        }
        value
    }

    fn required_number(&mut self, column: &str) -> Option<f64> {
        let parsed = match self.properties.get(column) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
            Some(Value::Null) | None => {
                self.issue(format!("{column} is required"));
                return None;
            }
            _ => None,
        };
        if parsed.is_none() {
            self.issue(format!("{column} must be a number"));
        }
        parsed
    }

    fn required_date(&mut self, column: &str) -> Option<DateTime<Utc>> {
        let Some(text) = self.text(column) else {
            self.issue(format!("{column} is required"));
            return None;
        };
        match parse_date(&text) {
            Some(date) if date > Utc::now() => {
                self.issue(format!("{column} must not be in the future"));
                None
            }
            Some(date) => Some(date),
            None => {
                self.issue(format!("{column} must be a valid date, got \"{text}\""));
                None
            }
        }
    }

    fn optional_list(&self, column: &str) -> Option<Vec<String>> {
        let items = split_list(&self.text(column)?);
        if items.is_empty() { None } else { Some(items) }
    }

    fn required_list(&mut self, column: &str) -> Option<Vec<String>> {
        let value = self.text(column);
        if value.is_none() {
            self.issue(format!("{column} is required"));
        }
        value.map(|v| split_list(&v))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use ingestion_entity::feature::Geometry;
    use serde_json::json;

    const CTX: MappingContext = MappingContext {
        resolution_degree: 0.000171661376953125,
    };

    fn square() -> Geometry {
        let ring = LineString::from(vec![
            (34.0, 31.0),
            (34.0, 31.1),
            (34.1, 31.1),
            (34.1, 31.0),
            (34.0, 31.0),
        ]);
        Geometry::Polygon(Polygon::new(ring, vec![]))
    }

    fn valid_props() -> Map<String, Value> {
        let Value::Object(map) = json!({
            "id": "part-1",
            "sourceId": "src-9",
            "sourceName": "Satellite pass 12",
            "desc": "north block",
            "ep90": 3.5,
            "sourceRes": "0.5",
            "updateDate": "2023-11-02",
            "sensors": "WV02, GE01",
            "countries": "",
            "cities": "Haifa"
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn test_valid_feature_is_mapped() {
        let feature = Feature::new(Some(square()), valid_props());
        let mapped = validate_and_map(&feature, &CTX).unwrap();

        assert_eq!(mapped.properties["id"], "part-1");
        assert_eq!(mapped.properties["horizontalAccuracyCE90"], json!(3.5));
        assert_eq!(mapped.properties["sourceResolutionMeter"], json!(0.5));
        assert_eq!(mapped.properties["sensors"], json!(["WV02", "GE01"]));
        assert_eq!(mapped.properties["cities"], json!(["Haifa"]));
        assert!(mapped.properties.get("countries").is_none());
        assert!(
            mapped.properties["imagingTimeBeginUTC"]
                .as_str()
                .unwrap()
                .starts_with("2023-11-02T00:00:00")
        );
        assert_eq!(mapped.geometry, feature.geometry);
    }

    #[test]
    fn test_missing_and_malformed_fields_are_all_reported() {
        let mut props = valid_props();
        props.remove("sourceName");
        props.insert("ep90".into(), json!("abc"));
        props.insert("updateDate".into(), json!("yesterday"));
        let feature = Feature::new(Some(square()), props);

        let issues = validate_and_map(&feature, &CTX).unwrap_err();
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&"sourceName is required".to_string()));
        assert!(issues.contains(&"ep90 must be a number".to_string()));
        assert!(issues.iter().any(|i| i.starts_with("updateDate must be a valid date")));
    }

    #[test]
    fn test_out_of_range_values_use_validator_messages() {
        let mut props = valid_props();
        props.insert("ep90".into(), json!(5000));
        props.insert("sourceRes".into(), json!(0.001));
        let feature = Feature::new(Some(square()), props);

        let issues = validate_and_map(&feature, &CTX).unwrap_err();
        assert_eq!(
            issues,
            vec![
                "ep90 must be between 0.01 and 4000".to_string(),
                "sourceRes must be between 0.0185 and 78271.52".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_polygon_geometry_is_rejected() {
        let feature = Feature::new(
            Some(Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]))),
            valid_props(),
        );
        let issues = validate_and_map(&feature, &CTX).unwrap_err();
        assert_eq!(issues, vec!["geometry must be a Polygon or MultiPolygon, got LineString"]);
    }

    #[test]
    fn test_future_date_and_alternate_formats() {
        let mut props = valid_props();
        props.insert("updateDate".into(), json!("01/02/2999"));
        let feature = Feature::new(Some(square()), props);
        let issues = validate_and_map(&feature, &CTX).unwrap_err();
        assert_eq!(issues, vec!["updateDate must not be in the future"]);

        let mut props = valid_props();
        props.insert("updateDate".into(), json!("15/03/2022"));
        let feature = Feature::new(Some(square()), props);
        assert!(validate_and_map(&feature, &CTX).is_ok());
    }

    #[test]
    fn test_job_resolution_out_of_range() {
        let feature = Feature::new(Some(square()), valid_props());
        let ctx = MappingContext {
            resolution_degree: 1.5,
        };
        let issues = validate_and_map(&feature, &ctx).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("ingestion resolution"));
    }
}
