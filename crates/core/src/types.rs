/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Open-ended key-value bag attached to a source unit. No fixed schema.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
