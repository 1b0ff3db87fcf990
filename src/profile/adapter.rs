/// Bidirectional mapping between storage codes and the UI-facing profile
/// vocabulary. One table per enumeration pair; every storage value maps to
/// exactly one UI value and back. Gender is the single mapping with a
/// defined fallback: an unset or unknown code decodes to a caller-supplied
/// default sex (household heads default male, spouses female).
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Religion {
    Catholic,
    Islamic,
    Christian,
    Hindu,
    Buddhist,
    Confucian,
}

impl Religion {
    pub const ALL: [Religion; 6] = [
        Religion::Catholic,
        Religion::Islamic,
        Religion::Christian,
        Religion::Hindu,
        Religion::Buddhist,
        Religion::Confucian,
    ];

    pub fn storage_code(&self) -> &'static str {
        match self {
            Religion::Catholic => "KATOLIK",
            Religion::Islamic => "ISLAM",
            Religion::Christian => "KRISTEN",
            Religion::Hindu => "HINDU",
            Religion::Buddhist => "BUDDHA",
            Religion::Confucian => "KONGHUCU",
        }
    }

    pub fn from_storage_code(code: &str) -> Option<Religion> {
        Religion::ALL.iter().copied().find(|r| r.storage_code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LivingStatus {
    Alive,
    Moved,
    Deceased,
}

impl LivingStatus {
    pub const ALL: [LivingStatus; 3] =
        [LivingStatus::Alive, LivingStatus::Moved, LivingStatus::Deceased];

    pub fn storage_code(&self) -> &'static str {
        match self {
            LivingStatus::Alive => "HIDUP",
            LivingStatus::Moved => "PINDAH",
            LivingStatus::Deceased => "MENINGGAL",
        }
    }

    pub fn from_storage_code(code: &str) -> Option<LivingStatus> {
        LivingStatus::ALL.iter().copied().find(|s| s.storage_code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Married,
    Unmarried,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 4] = [
        MaritalStatus::Married,
        MaritalStatus::Unmarried,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
    ];

    pub fn storage_code(&self) -> &'static str {
        match self {
            MaritalStatus::Married => "MENIKAH",
            MaritalStatus::Unmarried => "TIDAK_MENIKAH",
            MaritalStatus::Divorced => "CERAI_HIDUP",
            MaritalStatus::Widowed => "CERAI_MATI",
        }
    }

    pub fn from_storage_code(code: &str) -> Option<MaritalStatus> {
        MaritalStatus::ALL.iter().copied().find(|s| s.storage_code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependentType {
    Child,
    Relative,
}

impl DependentType {
    pub const ALL: [DependentType; 2] = [DependentType::Child, DependentType::Relative];

    pub fn storage_code(&self) -> &'static str {
        match self {
            DependentType::Child => "ANAK",
            DependentType::Relative => "KERABAT",
        }
    }

    pub fn from_storage_code(code: &str) -> Option<DependentType> {
        DependentType::ALL.iter().copied().find(|t| t.storage_code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn storage_code(&self) -> &'static str {
        match self {
            Gender::Male => "LAKI-LAKI",
            Gender::Female => "PEREMPUAN",
        }
    }

    pub fn from_storage_code(code: &str) -> Option<Gender> {
        match code {
            "LAKI-LAKI" => Some(Gender::Male),
            "PEREMPUAN" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Decode with the documented fallback default for unset columns
    pub fn from_storage_code_or(code: Option<&str>, default: Gender) -> Gender {
        code.and_then(Gender::from_storage_code).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn religion_mapping_is_total_both_ways() {
        for religion in Religion::ALL {
            assert_eq!(Religion::from_storage_code(religion.storage_code()), Some(religion));
        }
        assert_eq!(Religion::from_storage_code("ATHEIS"), None);
    }

    #[test]
    fn living_status_mapping_is_total_both_ways() {
        for status in LivingStatus::ALL {
            assert_eq!(LivingStatus::from_storage_code(status.storage_code()), Some(status));
        }
    }

    #[test]
    fn marital_status_mapping_is_total_both_ways() {
        for status in MaritalStatus::ALL {
            assert_eq!(MaritalStatus::from_storage_code(status.storage_code()), Some(status));
        }
    }

    #[test]
    fn dependent_type_mapping_is_total_both_ways() {
        for kind in DependentType::ALL {
            assert_eq!(DependentType::from_storage_code(kind.storage_code()), Some(kind));
        }
    }

    #[test]
    fn gender_falls_back_to_supplied_default() {
        assert_eq!(Gender::from_storage_code_or(None, Gender::Male), Gender::Male);
        assert_eq!(Gender::from_storage_code_or(Some(""), Gender::Female), Gender::Female);
        assert_eq!(
            Gender::from_storage_code_or(Some("PEREMPUAN"), Gender::Male),
            Gender::Female
        );
    }
}
