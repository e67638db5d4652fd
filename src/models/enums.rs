use serde::{Deserialize, Serialize};

/// A string that did not match any variant of a closed enum.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Variants serialize to their exact wire strings.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ValidationStatus {
    Pending => "PENDING",
    Done => "Done",
});

str_enum!(ActionType {
    AddDoctor => "ADD_DOCTOR",
    UpdateDoctor => "UPDATE_DOCTOR",
    DeleteDoctor => "DELETE_DOCTOR",
    UpdatePatient => "UPDATE_PATIENT",
    DeletePatient => "DELETE_PATIENT",
    UploadImage => "UPLOAD_IMAGE",
    AiAnalysis => "AI_ANALYSIS",
    DoctorReview => "DOCTOR_REVIEW",
    ChangePassword => "CHANGE_PASSWORD",
});

/// Roles the navigation guard knows how to gate on.
///
/// The `users.role` column stays a raw string in the row model; this enum is
/// for guard decisions and query filters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Doctor,
}

impl Role {
    /// Parse from the stored string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "doctor" => Some(Self::Doctor),
            _ => None,
        }
    }

    /// Stored string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
        }
    }

    /// The role's own landing area, used when redirecting an
    /// unauthorized navigation.
    pub fn default_area(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Doctor => "/doctor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validation_status_wire_strings() {
        assert_eq!(ValidationStatus::Pending.as_str(), "PENDING");
        assert_eq!(ValidationStatus::Done.as_str(), "Done");
        assert_eq!(
            serde_json::to_value(ValidationStatus::Pending).unwrap(),
            serde_json::json!("PENDING")
        );
        assert_eq!(
            ValidationStatus::from_str("Done").unwrap(),
            ValidationStatus::Done
        );
        assert!(ValidationStatus::from_str("done").is_err());
    }

    #[test]
    fn action_type_wire_strings() {
        assert_eq!(ActionType::AddDoctor.as_str(), "ADD_DOCTOR");
        assert_eq!(
            ActionType::from_str("DOCTOR_REVIEW").unwrap(),
            ActionType::DoctorReview
        );
    }

    #[test]
    fn role_parse_is_exact() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("doctor"), Some(Role::Doctor));
        assert_eq!(Role::from_str("Doctor"), None);
        assert_eq!(Role::from_str("nurse"), None);
    }

    #[test]
    fn role_default_areas() {
        assert_eq!(Role::Admin.default_area(), "/admin");
        assert_eq!(Role::Doctor.default_area(), "/doctor");
    }
}
