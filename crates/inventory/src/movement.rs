use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use restock_core::{Entity, MovementId, ProductId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock-increasing transaction (restock).
    Inflow,
    /// Stock-decreasing transaction (sale or other removal).
    Outflow,
}

/// One entry of the append-only movement log.
///
/// `timestamp` is kept exactly as the store recorded it; the log mixes
/// several date formats, so it is only interpreted on read (see
/// [`parse_timestamp`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Positive in a well-formed log; zero rows are ignored by the sales history.
    pub quantity: u32,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Movement {
    pub fn new(
        id: MovementId,
        product_id: ProductId,
        kind: MovementKind,
        quantity: u32,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id,
            product_id,
            kind,
            quantity,
            timestamp: timestamp.into(),
            note: None,
        }
    }

    pub fn outflow(id: i64, product_id: i64, quantity: u32, timestamp: impl Into<String>) -> Self {
        Self::new(
            MovementId::new(id),
            ProductId::new(product_id),
            MovementKind::Outflow,
            quantity,
            timestamp,
        )
    }

    pub fn inflow(id: i64, product_id: i64, quantity: u32, timestamp: impl Into<String>) -> Self {
        Self::new(
            MovementId::new(id),
            ProductId::new(product_id),
            MovementKind::Inflow,
            quantity,
            timestamp,
        )
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_outflow(&self) -> bool {
        self.kind == MovementKind::Outflow
    }

    /// Parsed timestamp, or `None` when the raw value is in no known format.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// Calendar day of the movement.
    pub fn occurred_on(&self) -> Option<NaiveDate> {
        self.occurred_at().map(|dt| dt.date())
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Best-effort parse of a movement timestamp.
///
/// Accepts RFC 3339 (offset dropped, wall-clock time kept) and a fixed list
/// of ISO-like layouts; date-only values map to midnight. Returns `None` for
/// anything else so callers can drop the row.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        let cases = [
            "2024-03-05 14:30:00",
            "2024-03-05 14:30:00.123456",
            "2024-03-05T14:30:00",
            "2024-03-05T14:30:00Z",
            "2024-03-05T14:30:00-03:00",
            "2024-03-05 14:30",
            "2024-03-05",
            "2024/03/05",
            "05/03/2024 14:30:00",
            "05/03/2024",
            "  2024-03-05 09:00:00  ",
        ];
        for raw in cases {
            let parsed = parse_timestamp(raw).unwrap_or_else(|| panic!("failed to parse {raw:?}"));
            assert_eq!(parsed.date(), day(2024, 3, 5), "{raw}");
        }
    }

    #[test]
    fn rfc3339_keeps_recorded_wall_clock_day() {
        let dt = parse_timestamp("2024-03-05T23:30:00-03:00").unwrap();
        assert_eq!(dt.date(), day(2024, 3, 5));
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "yesterday", "2024-13-45", "05-03-2024 xx", "31/02/2024"] {
            assert!(parse_timestamp(raw).is_none(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn movement_kind_uses_lowercase_names() {
        let m = Movement::outflow(1, 2, 3, "2024-01-01").with_note("sale");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["kind"], "outflow");
        assert_eq!(json["note"], "sale");

        let back: Movement = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
        assert!(back.is_outflow());
        assert_eq!(back.occurred_on(), Some(day(2024, 1, 1)));
    }
}
