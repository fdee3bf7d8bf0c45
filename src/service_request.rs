//! Service-request validation
//!
//! Checks incident records before they are handed to the data store and
//! fills in the fields a client may leave out (id, resolution date and
//! timestamp). Every failing field is reported, not just the first.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            _ => None,
        }
    }
}

/// A record as submitted, every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestDraft {
    pub id: Option<String>,
    pub service_name: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub resolution_date: Option<String>,
    pub reporter_name: Option<String>,
    pub contact_email: Option<String>,
    pub location: Option<String>,
    pub timestamp: Option<i64>,
}

/// Validated fields shared by new and existing records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestFields {
    pub service_name: String,
    pub description: String,
    pub severity: Severity,
    #[serde(serialize_with = "serialize_iso")]
    pub resolution_date: DateTime<Utc>,
    pub reporter_name: String,
    pub contact_email: String,
    pub location: String,
}

/// A fully validated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: ServiceRequestFields,
    pub timestamp: Option<i64>,
}

/// Field name to failure messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn to_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso(date))
}

/// Parse an ISO 8601 date, accepting only the canonical millisecond UTC form
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);
    (to_iso(&parsed) == raw).then_some(parsed)
}

fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn required(value: &Option<String>, field: &str, message: &str, errors: &mut ValidationErrors) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, message);
            None
        }
    }
}

fn check_fields(draft: &ServiceRequestDraft, errors: &mut ValidationErrors) -> Option<ServiceRequestFields> {
    let service_name = required(&draft.service_name, "serviceName", "Service name is required", errors);
    let description = required(&draft.description, "description", "Description is required", errors);
    let reporter_name = required(&draft.reporter_name, "reporterName", "Reporter name is required", errors);
    let location = required(&draft.location, "location", "Location is required", errors);

    let severity = draft.severity.as_deref().and_then(Severity::parse);
    if severity.is_none() {
        errors.add("severity", "Invalid severity, expected LOW, MEDIUM or HIGH");
    }

    let resolution_date = draft.resolution_date.as_deref().and_then(parse_iso);
    if resolution_date.is_none() {
        errors.add("resolutionDate", "Invalid ISO 8601 date format");
    }

    let contact_email = draft
        .contact_email
        .as_deref()
        .filter(|email| is_valid_email(email))
        .map(String::from);
    if contact_email.is_none() {
        errors.add("contactEmail", "Invalid email format");
    }

    Some(ServiceRequestFields {
        service_name: service_name?,
        description: description?,
        severity: severity?,
        resolution_date: resolution_date?,
        reporter_name: reporter_name?,
        contact_email: contact_email?,
        location: location?,
    })
}

/// Validate a record that has no id yet
pub fn validate_without_id(draft: &ServiceRequestDraft) -> Result<ServiceRequestFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    match check_fields(draft, &mut errors) {
        Some(fields) if errors.is_empty() => Ok(fields),
        _ => Err(errors),
    }
}

/// Hyphenated 8-4-4-4-12 form only; simple, braced and urn forms are refused
fn parse_uuid(raw: &str) -> Option<Uuid> {
    let id = Uuid::parse_str(raw).ok()?;
    let mut buf = Uuid::encode_buffer();
    let canonical = id.hyphenated().encode_lower(&mut buf);
    canonical.eq_ignore_ascii_case(raw).then_some(id)
}

/// Validate a complete record, id included
pub fn validate(draft: &ServiceRequestDraft) -> Result<ServiceRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let id = draft.id.as_deref().and_then(parse_uuid);
    if id.is_none() {
        errors.add("id", "Invalid uuid");
    }
    let fields = check_fields(draft, &mut errors);

    match (id, fields) {
        (Some(id), Some(fields)) if errors.is_empty() => Ok(ServiceRequest {
            id,
            fields,
            timestamp: draft.timestamp,
        }),
        _ => Err(errors),
    }
}

/// Fill derived defaults, then validate
///
/// A missing id gets a fresh v4 UUID, a missing resolution date becomes
/// `now`, a missing timestamp becomes `now` in epoch seconds.
pub fn normalize(mut draft: ServiceRequestDraft, now: DateTime<Utc>) -> Result<ServiceRequest, ValidationErrors> {
    if draft.id.as_deref().map_or(true, str::is_empty) {
        draft.id = Some(Uuid::new_v4().to_string());
    }
    if draft.resolution_date.as_deref().map_or(true, str::is_empty) {
        draft.resolution_date = Some(to_iso(&now));
    }
    if draft.timestamp.is_none() {
        draft.timestamp = Some(now.timestamp());
    }
    validate(&draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> ServiceRequestDraft {
        ServiceRequestDraft {
            id: Some("7b4a1d0e-6a43-4c1e-9a35-2f3c8f0b9d11".to_string()),
            service_name: Some("Street light".to_string()),
            description: Some("Lamp post flickering".to_string()),
            severity: Some("HIGH".to_string()),
            resolution_date: Some("2025-03-01T10:30:00.000Z".to_string()),
            reporter_name: Some("Sam Doe".to_string()),
            contact_email: Some("sam@example.com".to_string()),
            location: Some("Main St & 5th".to_string()),
            timestamp: None,
        }
    }

    #[test]
    fn test_id_must_be_hyphenated() {
        for id in [
            "7b4a1d0e6a434c1e9a352f3c8f0b9d11",
            "urn:uuid:7b4a1d0e-6a43-4c1e-9a35-2f3c8f0b9d11",
            "{7b4a1d0e-6a43-4c1e-9a35-2f3c8f0b9d11}",
        ] {
            let mut draft = draft();
            draft.id = Some(id.to_string());
            let errors = validate(&draft).unwrap_err();
            assert_eq!(errors.field("id"), ["Invalid uuid"], "{id}");
        }

        let mut upper = draft();
        upper.id = Some("7B4A1D0E-6A43-4C1E-9A35-2F3C8F0B9D11".to_string());
        assert!(validate(&upper).is_ok());
    }

    #[test]
    fn test_valid_record() {
        let record = validate(&draft()).unwrap();
        assert_eq!(record.fields.severity, Severity::High);
        assert_eq!(to_iso(&record.fields.resolution_date), "2025-03-01T10:30:00.000Z");
    }

    #[test]
    fn test_collects_every_failure() {
        let mut bad = draft();
        bad.id = Some("not-a-uuid".into());
        bad.service_name = Some("   ".into());
        bad.severity = Some("low".into());
        bad.contact_email = Some("sam@localhost".into());
        bad.resolution_date = Some("2025-03-01".into());

        let errors = validate(&bad).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["contactEmail", "id", "resolutionDate", "serviceName", "severity"]
        );
        assert_eq!(errors.field("serviceName"), ["Service name is required"]);
        assert_eq!(errors.field("contactEmail"), ["Invalid email format"]);
    }

    #[test]
    fn test_without_id_ignores_id() {
        let mut no_id = draft();
        no_id.id = None;
        assert!(validate_without_id(&no_id).is_ok());
        assert!(validate(&no_id).is_err());
    }

    #[test]
    fn test_iso_dates_must_be_canonical() {
        assert!(parse_iso("2025-03-01T10:30:00.000Z").is_some());
        assert!(parse_iso("2025-03-01T10:30:00Z").is_none());
        assert!(parse_iso("2025-03-01T10:30:00.000+01:00").is_none());
        assert!(parse_iso("yesterday").is_none());
    }

    #[test]
    fn test_email_check() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a@b..co"));
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut partial = draft();
        partial.id = None;
        partial.resolution_date = None;

        let record = normalize(partial, now).unwrap();
        assert_eq!(record.id.get_version_num(), 4);
        assert_eq!(record.fields.resolution_date, now);
        assert_eq!(record.timestamp, Some(now.timestamp()));
    }

    #[test]
    fn test_normalize_keeps_given_values() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut given = draft();
        given.timestamp = Some(42);

        let record = normalize(given.clone(), now).unwrap();
        assert_eq!(record.id.to_string(), given.id.unwrap());
        assert_eq!(record.timestamp, Some(42));
        assert_eq!(to_iso(&record.fields.resolution_date), "2025-03-01T10:30:00.000Z");
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = validate(&draft()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["serviceName"], "Street light");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["resolutionDate"], "2025-03-01T10:30:00.000Z");
        assert_eq!(json["id"], "7b4a1d0e-6a43-4c1e-9a35-2f3c8f0b9d11");
    }
}
