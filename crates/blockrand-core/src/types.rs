use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, RandError};

/// Format used for every persisted assignment timestamp (local clock).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field names of an [`AssignmentRecord`] in their fixed persisted order.
pub const RECORD_FIELDS: [&str; 7] = [
    "subject_id",
    "age_level",
    "duration_level",
    "bev_free_level",
    "stratum_key",
    "assigned_group",
    "timestamp",
];

/// Returns the current local time formatted with [`TIMESTAMP_FORMAT`].
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Named categorical stratification axis with an ordered set of level labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Factor {
    /// Factor name as it appears in records and prompts.
    pub name: &'static str,
    /// Level labels in declaration order.
    pub levels: &'static [&'static str],
}

macro_rules! level_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $factor:literal, {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// All levels in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Level labels in declaration order.
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            /// Name of the stratification factor this level belongs to.
            pub const FACTOR: &'static str = $factor;

            /// Returns the label used in stratum keys and persisted records.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = RandError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                $(
                    if trimmed == $label {
                        return Ok($name::$variant);
                    }
                )+
                Err(RandError::Validation(
                    ErrorInfo::new(
                        "blockrand.unknown_level",
                        format!("unknown {} level '{raw}'", $factor),
                    )
                    .with_context("factor", $factor)
                    .with_hint(format!("expected one of: {}", Self::LABELS.join(", "))),
                ))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

level_enum!(
    /// Age at enrolment.
    AgeLevel, "age", {
        /// Younger than 75 years.
        Under75 => "<75",
        /// 75 years or older.
        Over75 => ">=75",
    }
);

level_enum!(
    /// Duration of prior treatment.
    DurationLevel, "duration", {
        /// Shorter than 18 months.
        Under18Months => "<18mo",
        /// 18 months or longer.
        Over18Months => ">=18mo",
    }
);

level_enum!(
    /// Bevacizumab-free interval.
    BevFreeLevel, "bev_free", {
        /// Shorter than 2 months.
        Under2Months => "<2mo",
        /// 2 months or longer.
        Over2Months => ">=2mo",
    }
);

/// Treatment arm a subject can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Group {
    /// First arm.
    #[serde(rename = "Group A")]
    A,
    /// Second arm.
    #[serde(rename = "Group B")]
    B,
    /// Third arm.
    #[serde(rename = "Group C")]
    C,
}

impl Group {
    /// Returns the label stored in assignment records.
    pub fn label(&self) -> &'static str {
        match self {
            Group::A => "Group A",
            Group::B => "Group B",
            Group::C => "Group C",
        }
    }
}

impl FromStr for Group {
    type Err = RandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "Group A" => Ok(Group::A),
            "Group B" => Ok(Group::B),
            "Group C" => Ok(Group::C),
            other => Err(RandError::Validation(
                ErrorInfo::new("blockrand.unknown_group", format!("unknown group '{other}'"))
                    .with_hint("expected one of: Group A, Group B, Group C"),
            )),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite identifier of a stratum: level labels joined by `_` in factor order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StratumKey(String);

impl StratumKey {
    /// Wraps a key read back from storage without re-deriving it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StratumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cell of the stratification grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stratum {
    /// Age level.
    pub age: AgeLevel,
    /// Prior treatment duration level.
    pub duration: DurationLevel,
    /// Bevacizumab-free interval level.
    pub bev_free: BevFreeLevel,
}

impl Stratum {
    /// Creates a stratum from typed levels.
    pub fn new(age: AgeLevel, duration: DurationLevel, bev_free: BevFreeLevel) -> Self {
        Self {
            age,
            duration,
            bev_free,
        }
    }

    /// Parses the three level labels entered by an operator.
    pub fn from_labels(age: &str, duration: &str, bev_free: &str) -> Result<Self, RandError> {
        Ok(Self {
            age: age.parse()?,
            duration: duration.parse()?,
            bev_free: bev_free.parse()?,
        })
    }

    /// Enumerates every stratum, outer-to-inner in factor declaration order.
    pub fn all() -> Vec<Stratum> {
        let mut strata = Vec::with_capacity(
            AgeLevel::ALL.len() * DurationLevel::ALL.len() * BevFreeLevel::ALL.len(),
        );
        for &age in AgeLevel::ALL {
            for &duration in DurationLevel::ALL {
                for &bev_free in BevFreeLevel::ALL {
                    strata.push(Stratum::new(age, duration, bev_free));
                }
            }
        }
        strata
    }

    /// Derives the composite key. Pure: equal levels always yield equal keys.
    pub fn key(&self) -> StratumKey {
        StratumKey(format!(
            "{}_{}_{}",
            self.age.label(),
            self.duration.label(),
            self.bev_free.label()
        ))
    }
}

/// Immutable record of a completed allocation.
///
/// Field order matches [`RECORD_FIELDS`] and is the order used by every
/// persistence backend and CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Operator supplied subject identifier.
    pub subject_id: String,
    /// Age level at enrolment.
    pub age_level: AgeLevel,
    /// Prior treatment duration level.
    pub duration_level: DurationLevel,
    /// Bevacizumab-free interval level.
    pub bev_free_level: BevFreeLevel,
    /// Key of the stratum whose queue served the allocation.
    pub stratum_key: StratumKey,
    /// Assigned treatment arm.
    pub assigned_group: Group,
    /// Local allocation time formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl AssignmentRecord {
    /// Returns the stratum described by the record's levels.
    pub fn stratum(&self) -> Stratum {
        Stratum::new(self.age_level, self.duration_level, self.bev_free_level)
    }

    /// Returns the record as ordered string fields.
    pub fn to_fields(&self) -> [String; 7] {
        [
            self.subject_id.clone(),
            self.age_level.label().to_string(),
            self.duration_level.label().to_string(),
            self.bev_free_level.label().to_string(),
            self.stratum_key.as_str().to_string(),
            self.assigned_group.label().to_string(),
            self.timestamp.clone(),
        ]
    }

    /// Rebuilds a record from ordered string fields.
    pub fn from_fields(fields: &[String]) -> Result<Self, RandError> {
        if fields.len() != RECORD_FIELDS.len() {
            return Err(RandError::Validation(
                ErrorInfo::new(
                    "blockrand.record_arity",
                    format!(
                        "expected {} fields, found {}",
                        RECORD_FIELDS.len(),
                        fields.len()
                    ),
                )
                .with_context("fields", fields.join(",")),
            ));
        }
        Ok(Self {
            subject_id: fields[0].clone(),
            age_level: fields[1].parse()?,
            duration_level: fields[2].parse()?,
            bev_free_level: fields[3].parse()?,
            stratum_key: StratumKey::from_raw(fields[4].clone()),
            assigned_group: fields[5].parse()?,
            timestamp: fields[6].clone(),
        })
    }
}
