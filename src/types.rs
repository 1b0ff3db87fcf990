/// Shared vocabulary used across the codebase
///
/// Enumerated columns are persisted as TEXT codes; every enum here owns its
/// code set via `as_code` / `from_code` so the database never sees a value
/// the application cannot name.
use serde::{Deserialize, Serialize};

/// Organizational positions recognized by the access-control table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperUser,
    Ketua,
    WakilKetua,
    Sekretaris,
    WakilSekretaris,
    Bendahara,
    WakilBendahara,
    Umat,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::SuperUser,
        Role::Ketua,
        Role::WakilKetua,
        Role::Sekretaris,
        Role::WakilSekretaris,
        Role::Bendahara,
        Role::WakilBendahara,
        Role::Umat,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            Role::SuperUser => "SUPER_USER",
            Role::Ketua => "KETUA",
            Role::WakilKetua => "WAKIL_KETUA",
            Role::Sekretaris => "SEKRETARIS",
            Role::WakilSekretaris => "WAKIL_SEKRETARIS",
            Role::Bendahara => "BENDAHARA",
            Role::WakilBendahara => "WAKIL_BENDAHARA",
            Role::Umat => "UMAT",
        }
    }

    pub fn from_code(code: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.as_code() == code)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_code(s).ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Service type of a prayer meeting (jenis ibadat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JenisIbadat {
    DoaLingkungan,
    Misa,
    Pertemuan,
    BaktiSosial,
    KegiatanLain,
}

impl JenisIbadat {
    pub const ALL: [JenisIbadat; 5] = [
        JenisIbadat::DoaLingkungan,
        JenisIbadat::Misa,
        JenisIbadat::Pertemuan,
        JenisIbadat::BaktiSosial,
        JenisIbadat::KegiatanLain,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            JenisIbadat::DoaLingkungan => "DOA_LINGKUNGAN",
            JenisIbadat::Misa => "MISA",
            JenisIbadat::Pertemuan => "PERTEMUAN",
            JenisIbadat::BaktiSosial => "BAKTI_SOSIAL",
            JenisIbadat::KegiatanLain => "KEGIATAN_LAIN",
        }
    }

    pub fn from_code(code: &str) -> Option<JenisIbadat> {
        JenisIbadat::ALL.iter().copied().find(|j| j.as_code() == code)
    }
}

/// Closed sub-type enumeration. Free-text sub-types live in a separate
/// column and are never validated against this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubIbadat {
    IbadatSabda,
    IbadatSabdaTematik,
    Prapaskah,
    Bksn,
    BulanRosario,
    NovenaNatal,
    MisaSyukur,
    MisaRequem,
    MisaArwah,
    MisaPelindung,
}

impl SubIbadat {
    pub const ALL: [SubIbadat; 10] = [
        SubIbadat::IbadatSabda,
        SubIbadat::IbadatSabdaTematik,
        SubIbadat::Prapaskah,
        SubIbadat::Bksn,
        SubIbadat::BulanRosario,
        SubIbadat::NovenaNatal,
        SubIbadat::MisaSyukur,
        SubIbadat::MisaRequem,
        SubIbadat::MisaArwah,
        SubIbadat::MisaPelindung,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            SubIbadat::IbadatSabda => "IBADAT_SABDA",
            SubIbadat::IbadatSabdaTematik => "IBADAT_SABDA_TEMATIK",
            SubIbadat::Prapaskah => "PRAPASKAH",
            SubIbadat::Bksn => "BKSN",
            SubIbadat::BulanRosario => "BULAN_ROSARIO",
            SubIbadat::NovenaNatal => "NOVENA_NATAL",
            SubIbadat::MisaSyukur => "MISA_SYUKUR",
            SubIbadat::MisaRequem => "MISA_REQUEM",
            SubIbadat::MisaArwah => "MISA_ARWAH",
            SubIbadat::MisaPelindung => "MISA_PELINDUNG",
        }
    }

    pub fn from_code(code: &str) -> Option<SubIbadat> {
        SubIbadat::ALL.iter().copied().find(|s| s.as_code() == code)
    }
}

/// Activity status of a scheduled meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKegiatan {
    BelumSelesai,
    Selesai,
    Dibatalkan,
}

impl StatusKegiatan {
    pub fn as_code(&self) -> &'static str {
        match self {
            StatusKegiatan::BelumSelesai => "BELUM_SELESAI",
            StatusKegiatan::Selesai => "SELESAI",
            StatusKegiatan::Dibatalkan => "DIBATALKAN",
        }
    }

    pub fn from_code(code: &str) -> Option<StatusKegiatan> {
        match code {
            "BELUM_SELESAI" => Some(StatusKegiatan::BelumSelesai),
            "SELESAI" => Some(StatusKegiatan::Selesai),
            "DIBATALKAN" => Some(StatusKegiatan::Dibatalkan),
            _ => None,
        }
    }

    /// Display status shown in listings
    pub fn display(&self) -> &'static str {
        match self {
            StatusKegiatan::Selesai => "selesai",
            StatusKegiatan::Dibatalkan => "dibatalkan",
            StatusKegiatan::BelumSelesai => "menunggu",
        }
    }
}

/// Sign-off workflow status attached to a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusApproval {
    Pending,
    Approved,
    Rejected,
}

impl StatusApproval {
    pub fn as_code(&self) -> &'static str {
        match self {
            StatusApproval::Pending => "PENDING",
            StatusApproval::Approved => "APPROVED",
            StatusApproval::Rejected => "REJECTED",
        }
    }

    pub fn from_code(code: &str) -> Option<StatusApproval> {
        match code {
            "PENDING" => Some(StatusApproval::Pending),
            "APPROVED" => Some(StatusApproval::Approved),
            "REJECTED" => Some(StatusApproval::Rejected),
            _ => None,
        }
    }
}

/// Fine-grained attendance category recorded per household per meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKehadiran {
    TidakHadir,
    SuamiHadir,
    IstriHadir,
    SuamiIstriHadir,
}

impl StatusKehadiran {
    pub fn as_code(&self) -> &'static str {
        match self {
            StatusKehadiran::TidakHadir => "TIDAK_HADIR",
            StatusKehadiran::SuamiHadir => "SUAMI_HADIR",
            StatusKehadiran::IstriHadir => "ISTRI_HADIR",
            StatusKehadiran::SuamiIstriHadir => "SUAMI_ISTRI_HADIR",
        }
    }

    pub fn from_code(code: &str) -> Option<StatusKehadiran> {
        match code {
            "TIDAK_HADIR" => Some(StatusKehadiran::TidakHadir),
            "SUAMI_HADIR" => Some(StatusKehadiran::SuamiHadir),
            "ISTRI_HADIR" => Some(StatusKehadiran::IstriHadir),
            "SUAMI_ISTRI_HADIR" => Some(StatusKehadiran::SuamiIstriHadir),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.as_code()), Some(role));
        }
        assert_eq!(Role::from_code("ADMIN"), None);
    }

    #[test]
    fn sub_ibadat_rejects_unknown_codes() {
        assert_eq!(SubIbadat::from_code("IBADAT_SABDA"), Some(SubIbadat::IbadatSabda));
        assert_eq!(SubIbadat::from_code("ROSARIO_KELUARGA"), None);
    }

    #[test]
    fn status_kegiatan_display_strings() {
        assert_eq!(StatusKegiatan::BelumSelesai.display(), "menunggu");
        assert_eq!(StatusKegiatan::Selesai.display(), "selesai");
        assert_eq!(StatusKegiatan::Dibatalkan.display(), "dibatalkan");
    }
}
