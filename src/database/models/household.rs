use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dashboard account. Role is also carried in the session token; the row is
/// the durable record linking an account to its household.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub keluarga_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Head-of-household record. The three jumlah_* columns are caches over the
/// spouse/dependent relations and are recomputed by the profile service
/// whenever a dependent row changes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct KeluargaUmat {
    pub id: Uuid,
    pub nama_kepala_keluarga: String,
    pub alamat: String,
    pub nomor_telepon: Option<String>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: Option<DateTime<Utc>>,
    pub nik: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub kota_domisili: Option<String>,
    pub jenis_kelamin: Option<String>,
    pub agama: String,
    pub status: String,
    pub status_pernikahan: String,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
    pub tanggal_meninggal: Option<DateTime<Utc>>,
    pub jumlah_anak_tertanggung: i32,
    pub jumlah_kerabat_tertanggung: i32,
    pub jumlah_anggota_keluarga: i32,
    pub tanggal_bergabung: DateTime<Utc>,
    pub tanggal_keluar: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Spouse, one-to-one with a household
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Pasangan {
    pub id: Uuid,
    pub keluarga_id: Uuid,
    pub nama: String,
    pub jenis_kelamin: Option<String>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub nik: Option<String>,
    pub alamat: Option<String>,
    pub kota_domisili: Option<String>,
    pub nomor_telepon: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: String,
    pub status: String,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
    pub tanggal_meninggal: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dependent (child or relative), many-to-one with a household
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tanggungan {
    pub id: Uuid,
    pub keluarga_id: Uuid,
    pub nama: String,
    pub jenis_tanggungan: String,
    pub jenis_kelamin: Option<String>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: String,
    pub status: String,
    pub status_pernikahan: String,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
