//! Field-level change detection between consecutive observations.

use std::collections::BTreeSet;
use std::fmt;

use crate::CanonicalStatus;

/// A canonical field that participates in change detection.
///
/// The observation timestamp and the consecutive-failure counter are not
/// compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum StatusField {
    Name,
    Outcome,
    AlliesCount,
    AxisCount,
    #[cfg_attr(feature = "serde", serde(rename = "gameTimeSeconds"))]
    GameTime,
    AlliesScore,
    AxisScore,
    CurrentMap,
    NextMap,
    ErrorDetail,
}

/// The set of fields that differ between two observations of one server.
pub type ChangeSet = BTreeSet<StatusField>;

impl StatusField {
    /// Every compared field, in display order.
    pub const ALL: [StatusField; 10] = [
        StatusField::Name,
        StatusField::Outcome,
        StatusField::AlliesCount,
        StatusField::AxisCount,
        StatusField::GameTime,
        StatusField::AlliesScore,
        StatusField::AxisScore,
        StatusField::CurrentMap,
        StatusField::NextMap,
        StatusField::ErrorDetail,
    ];

    /// The field's name in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusField::Name => "name",
            StatusField::Outcome => "outcome",
            StatusField::AlliesCount => "alliesCount",
            StatusField::AxisCount => "axisCount",
            StatusField::GameTime => "gameTimeSeconds",
            StatusField::AlliesScore => "alliesScore",
            StatusField::AxisScore => "axisScore",
            StatusField::CurrentMap => "currentMap",
            StatusField::NextMap => "nextMap",
            StatusField::ErrorDetail => "errorDetail",
        }
    }

    fn differs(&self, a: &CanonicalStatus, b: &CanonicalStatus) -> bool {
        match self {
            StatusField::Name => a.name != b.name,
            StatusField::Outcome => a.outcome != b.outcome,
            StatusField::AlliesCount => a.allies_count != b.allies_count,
            StatusField::AxisCount => a.axis_count != b.axis_count,
            StatusField::GameTime => a.game_time != b.game_time,
            StatusField::AlliesScore => a.allies_score != b.allies_score,
            StatusField::AxisScore => a.axis_score != b.axis_score,
            StatusField::CurrentMap => a.current_map != b.current_map,
            StatusField::NextMap => a.next_map != b.next_map,
            StatusField::ErrorDetail => a.error_detail != b.error_detail,
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CanonicalStatus {
    /// Fields of `self` that differ from `previous`.
    ///
    /// With no previous observation every field counts as changed.
    pub fn diff(&self, previous: Option<&CanonicalStatus>) -> ChangeSet {
        match previous {
            None => StatusField::ALL.into_iter().collect(),
            Some(prev) => StatusField::ALL
                .into_iter()
                .filter(|field| field.differs(self, prev))
                .collect(),
        }
    }
}
