use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::cache::PageCache;
use crate::database::models::{KeluargaUmat, Pasangan, Tanggungan, User};
use crate::profile::adapter::{DependentType, Gender, LivingStatus, MaritalStatus, Religion};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Head-of-household view with storage codes decoded to the profile
/// vocabulary. An unset sex column decodes to male for heads.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyHeadProfile {
    pub keluarga_id: Uuid,
    pub nama: String,
    pub jenis_kelamin: Gender,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: Option<DateTime<Utc>>,
    pub nik: Option<String>,
    pub alamat: String,
    pub kota_domisili: Option<String>,
    pub nomor_telepon: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Option<Religion>,
    pub status: Option<LivingStatus>,
    pub status_pernikahan: Option<MaritalStatus>,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

/// Spouse view; an unset sex column decodes to female here
#[derive(Debug, Clone, Serialize)]
pub struct SpouseProfile {
    pub id: Uuid,
    pub nama: String,
    pub jenis_kelamin: Gender,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub nik: Option<String>,
    pub alamat: Option<String>,
    pub kota_domisili: Option<String>,
    pub nomor_telepon: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Option<Religion>,
    pub status: Option<LivingStatus>,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependentProfile {
    pub id: Uuid,
    pub nama: String,
    pub jenis_tanggungan: Option<DependentType>,
    pub jenis_kelamin: Option<Gender>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Option<Religion>,
    pub status: Option<LivingStatus>,
    pub status_pernikahan: Option<MaritalStatus>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyProfile {
    pub kepala_keluarga: FamilyHeadProfile,
    pub pasangan: Option<SpouseProfile>,
    pub tanggungan: Vec<DependentProfile>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFamilyHead {
    pub nama: String,
    pub jenis_kelamin: Option<Gender>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: Option<DateTime<Utc>>,
    pub nik: Option<String>,
    pub alamat: String,
    pub kota_domisili: Option<String>,
    pub nomor_telepon: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Religion,
    pub status_pernikahan: MaritalStatus,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertSpouse {
    pub nama: String,
    pub jenis_kelamin: Option<Gender>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub nik: Option<String>,
    pub alamat: Option<String>,
    pub kota_domisili: Option<String>,
    pub nomor_telepon: Option<String>,
    pub email: Option<String>,
    pub pekerjaan: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Religion,
    pub no_biduk: Option<String>,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DependentInput {
    pub nama: String,
    pub jenis_tanggungan: DependentType,
    pub jenis_kelamin: Option<Gender>,
    pub tempat_lahir: Option<String>,
    pub tanggal_lahir: DateTime<Utc>,
    pub pendidikan_terakhir: Option<String>,
    pub agama: Religion,
    pub status_pernikahan: MaritalStatus,
    pub tanggal_baptis: Option<DateTime<Utc>>,
    pub tanggal_krisma: Option<DateTime<Utc>>,
}

/// Self-service family profile: the account's own household, spouse and
/// dependents. The member-count caches on the household row are recomputed
/// inside every transaction that changes family composition.
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the account to its household; accounts without one cannot use
    /// profile self-service.
    async fn keluarga_id_for(&self, user_id: Uuid) -> Result<Uuid, ProfileError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match user {
            Some(user) => user.keluarga_id.ok_or_else(|| {
                ProfileError::Validation("Akun tidak terhubung dengan data keluarga".to_string())
            }),
            None => Err(ProfileError::NotFound("Akun tidak ditemukan".to_string())),
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;

        let head: Option<KeluargaUmat> =
            sqlx::query_as("SELECT * FROM keluarga_umat WHERE id = $1")
                .bind(keluarga_id)
                .fetch_optional(&self.pool)
                .await?;
        let head = head.ok_or_else(|| {
            ProfileError::NotFound("Data keluarga tidak ditemukan".to_string())
        })?;

        let spouse: Option<Pasangan> =
            sqlx::query_as("SELECT * FROM pasangan WHERE keluarga_id = $1")
                .bind(keluarga_id)
                .fetch_optional(&self.pool)
                .await?;

        let dependents: Vec<Tanggungan> = sqlx::query_as(
            "SELECT * FROM tanggungan WHERE keluarga_id = $1 ORDER BY tanggal_lahir ASC",
        )
        .bind(keluarga_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(FamilyProfile {
            kepala_keluarga: map_head(head),
            pasangan: spouse.map(map_spouse),
            tanggungan: dependents.into_iter().map(map_dependent).collect(),
        })
    }

    /// Update the head-of-household record. Leaving the married state drops
    /// the spouse row; counts are recomputed in the same transaction.
    pub async fn update_family_head(
        &self,
        user_id: Uuid,
        data: UpdateFamilyHead,
    ) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;
        let mut tx = self.pool.begin().await?;

        let jenis_kelamin = data.jenis_kelamin.unwrap_or(Gender::Male);

        let result = sqlx::query(
            r#"
            UPDATE keluarga_umat SET
                nama_kepala_keluarga = $2,
                jenis_kelamin = $3,
                tempat_lahir = $4,
                tanggal_lahir = $5,
                nik = $6,
                alamat = $7,
                kota_domisili = $8,
                nomor_telepon = $9,
                email = $10,
                pekerjaan = $11,
                pendidikan_terakhir = $12,
                agama = $13,
                status_pernikahan = $14,
                no_biduk = $15,
                tanggal_baptis = $16,
                tanggal_krisma = $17,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(keluarga_id)
        .bind(&data.nama)
        .bind(jenis_kelamin.storage_code())
        .bind(&data.tempat_lahir)
        .bind(data.tanggal_lahir)
        .bind(&data.nik)
        .bind(&data.alamat)
        .bind(&data.kota_domisili)
        .bind(&data.nomor_telepon)
        .bind(&data.email)
        .bind(&data.pekerjaan)
        .bind(&data.pendidikan_terakhir)
        .bind(data.agama.storage_code())
        .bind(data.status_pernikahan.storage_code())
        .bind(&data.no_biduk)
        .bind(data.tanggal_baptis)
        .bind(data.tanggal_krisma)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileError::NotFound(
                "Data keluarga tidak ditemukan".to_string(),
            ));
        }

        if data.status_pernikahan == MaritalStatus::Unmarried {
            sqlx::query("DELETE FROM pasangan WHERE keluarga_id = $1")
                .bind(keluarga_id)
                .execute(&mut *tx)
                .await?;
        }

        recompute_member_counts(&mut tx, keluarga_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/pengaturan/profil").await;
        self.get_profile(user_id).await
    }

    /// Create or replace the spouse record. Creating one marks the household
    /// as married.
    pub async fn upsert_spouse(
        &self,
        user_id: Uuid,
        data: UpsertSpouse,
    ) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM pasangan WHERE keluarga_id = $1")
                .bind(keluarga_id)
                .fetch_optional(&mut *tx)
                .await?;

        let jenis_kelamin = data.jenis_kelamin.unwrap_or(Gender::Female);

        sqlx::query(
            r#"
            INSERT INTO pasangan
                (keluarga_id, nama, jenis_kelamin, tempat_lahir, tanggal_lahir,
                 nik, alamat, kota_domisili, nomor_telepon, email, pekerjaan,
                 pendidikan_terakhir, agama, status, no_biduk, tanggal_baptis,
                 tanggal_krisma)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17)
            ON CONFLICT (keluarga_id)
            DO UPDATE SET nama = EXCLUDED.nama,
                          jenis_kelamin = EXCLUDED.jenis_kelamin,
                          tempat_lahir = EXCLUDED.tempat_lahir,
                          tanggal_lahir = EXCLUDED.tanggal_lahir,
                          nik = EXCLUDED.nik,
                          alamat = EXCLUDED.alamat,
                          kota_domisili = EXCLUDED.kota_domisili,
                          nomor_telepon = EXCLUDED.nomor_telepon,
                          email = EXCLUDED.email,
                          pekerjaan = EXCLUDED.pekerjaan,
                          pendidikan_terakhir = EXCLUDED.pendidikan_terakhir,
                          agama = EXCLUDED.agama,
                          no_biduk = EXCLUDED.no_biduk,
                          tanggal_baptis = EXCLUDED.tanggal_baptis,
                          tanggal_krisma = EXCLUDED.tanggal_krisma,
                          updated_at = NOW()
            "#,
        )
        .bind(keluarga_id)
        .bind(&data.nama)
        .bind(jenis_kelamin.storage_code())
        .bind(&data.tempat_lahir)
        .bind(data.tanggal_lahir)
        .bind(&data.nik)
        .bind(&data.alamat)
        .bind(&data.kota_domisili)
        .bind(&data.nomor_telepon)
        .bind(&data.email)
        .bind(&data.pekerjaan)
        .bind(&data.pendidikan_terakhir)
        .bind(data.agama.storage_code())
        .bind(LivingStatus::Alive.storage_code())
        .bind(&data.no_biduk)
        .bind(data.tanggal_baptis)
        .bind(data.tanggal_krisma)
        .execute(&mut *tx)
        .await?;

        if existing.is_none() {
            sqlx::query(
                "UPDATE keluarga_umat SET status_pernikahan = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(keluarga_id)
            .bind(MaritalStatus::Married.storage_code())
            .execute(&mut *tx)
            .await?;
        }

        recompute_member_counts(&mut tx, keluarga_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/pengaturan/profil").await;
        self.get_profile(user_id).await
    }

    pub async fn add_dependent(
        &self,
        user_id: Uuid,
        data: DependentInput,
    ) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tanggungan
                (keluarga_id, nama, jenis_tanggungan, jenis_kelamin,
                 tempat_lahir, tanggal_lahir, pendidikan_terakhir, agama,
                 status, status_pernikahan, tanggal_baptis, tanggal_krisma)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(keluarga_id)
        .bind(&data.nama)
        .bind(data.jenis_tanggungan.storage_code())
        .bind(data.jenis_kelamin.map(|g| g.storage_code()))
        .bind(&data.tempat_lahir)
        .bind(data.tanggal_lahir)
        .bind(&data.pendidikan_terakhir)
        .bind(data.agama.storage_code())
        .bind(LivingStatus::Alive.storage_code())
        .bind(data.status_pernikahan.storage_code())
        .bind(data.tanggal_baptis)
        .bind(data.tanggal_krisma)
        .execute(&mut *tx)
        .await?;

        recompute_member_counts(&mut tx, keluarga_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/pengaturan/profil").await;
        self.get_profile(user_id).await
    }

    /// Update one dependent; the row must belong to the caller's household
    pub async fn update_dependent(
        &self,
        user_id: Uuid,
        tanggungan_id: Uuid,
        data: DependentInput,
    ) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE tanggungan SET
                nama = $3,
                jenis_tanggungan = $4,
                jenis_kelamin = $5,
                tempat_lahir = $6,
                tanggal_lahir = $7,
                pendidikan_terakhir = $8,
                agama = $9,
                status_pernikahan = $10,
                tanggal_baptis = $11,
                tanggal_krisma = $12,
                updated_at = NOW()
            WHERE id = $1 AND keluarga_id = $2
            "#,
        )
        .bind(tanggungan_id)
        .bind(keluarga_id)
        .bind(&data.nama)
        .bind(data.jenis_tanggungan.storage_code())
        .bind(data.jenis_kelamin.map(|g| g.storage_code()))
        .bind(&data.tempat_lahir)
        .bind(data.tanggal_lahir)
        .bind(&data.pendidikan_terakhir)
        .bind(data.agama.storage_code())
        .bind(data.status_pernikahan.storage_code())
        .bind(data.tanggal_baptis)
        .bind(data.tanggal_krisma)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileError::NotFound(format!(
                "Tanggungan dengan ID {} tidak ditemukan",
                tanggungan_id
            )));
        }

        recompute_member_counts(&mut tx, keluarga_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/pengaturan/profil").await;
        self.get_profile(user_id).await
    }

    pub async fn delete_dependent(
        &self,
        user_id: Uuid,
        tanggungan_id: Uuid,
    ) -> Result<FamilyProfile, ProfileError> {
        let keluarga_id = self.keluarga_id_for(user_id).await?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM tanggungan WHERE id = $1 AND keluarga_id = $2")
            .bind(tanggungan_id)
            .bind(keluarga_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileError::NotFound(format!(
                "Tanggungan dengan ID {} tidak ditemukan",
                tanggungan_id
            )));
        }

        recompute_member_counts(&mut tx, keluarga_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/pengaturan/profil").await;
        self.get_profile(user_id).await
    }
}

/// Recompute the cached member counts from the spouse and dependent
/// relations, inside the caller's transaction. The household member total is
/// the head plus spouse plus dependents.
async fn recompute_member_counts(
    tx: &mut Transaction<'_, Postgres>,
    keluarga_id: Uuid,
) -> Result<(), sqlx::Error> {
    #[derive(FromRow)]
    struct Counts {
        anak: i64,
        kerabat: i64,
        pasangan: i64,
    }

    let counts: Counts = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM tanggungan
             WHERE keluarga_id = $1 AND jenis_tanggungan = 'ANAK') AS anak,
            (SELECT COUNT(*) FROM tanggungan
             WHERE keluarga_id = $1 AND jenis_tanggungan = 'KERABAT') AS kerabat,
            (SELECT COUNT(*) FROM pasangan WHERE keluarga_id = $1) AS pasangan
        "#,
    )
    .bind(keluarga_id)
    .fetch_one(&mut **tx)
    .await?;

    let anggota = 1 + counts.pasangan + counts.anak + counts.kerabat;

    sqlx::query(
        r#"
        UPDATE keluarga_umat SET
            jumlah_anak_tertanggung = $2,
            jumlah_kerabat_tertanggung = $3,
            jumlah_anggota_keluarga = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(keluarga_id)
    .bind(counts.anak as i32)
    .bind(counts.kerabat as i32)
    .bind(anggota as i32)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn map_head(head: KeluargaUmat) -> FamilyHeadProfile {
    FamilyHeadProfile {
        keluarga_id: head.id,
        nama: head.nama_kepala_keluarga,
        jenis_kelamin: Gender::from_storage_code_or(head.jenis_kelamin.as_deref(), Gender::Male),
        tempat_lahir: head.tempat_lahir,
        tanggal_lahir: head.tanggal_lahir,
        nik: head.nik,
        alamat: head.alamat,
        kota_domisili: head.kota_domisili,
        nomor_telepon: head.nomor_telepon,
        email: head.email,
        pekerjaan: head.pekerjaan,
        pendidikan_terakhir: head.pendidikan_terakhir,
        agama: Religion::from_storage_code(&head.agama),
        status: LivingStatus::from_storage_code(&head.status),
        status_pernikahan: MaritalStatus::from_storage_code(&head.status_pernikahan),
        no_biduk: head.no_biduk,
        tanggal_baptis: head.tanggal_baptis,
        tanggal_krisma: head.tanggal_krisma,
    }
}

fn map_spouse(spouse: Pasangan) -> SpouseProfile {
    SpouseProfile {
        id: spouse.id,
        nama: spouse.nama,
        jenis_kelamin: Gender::from_storage_code_or(
            spouse.jenis_kelamin.as_deref(),
            Gender::Female,
        ),
        tempat_lahir: spouse.tempat_lahir,
        tanggal_lahir: spouse.tanggal_lahir,
        nik: spouse.nik,
        alamat: spouse.alamat,
        kota_domisili: spouse.kota_domisili,
        nomor_telepon: spouse.nomor_telepon,
        email: spouse.email,
        pekerjaan: spouse.pekerjaan,
        pendidikan_terakhir: spouse.pendidikan_terakhir,
        agama: Religion::from_storage_code(&spouse.agama),
        status: LivingStatus::from_storage_code(&spouse.status),
        no_biduk: spouse.no_biduk,
        tanggal_baptis: spouse.tanggal_baptis,
        tanggal_krisma: spouse.tanggal_krisma,
    }
}

fn map_dependent(dependent: Tanggungan) -> DependentProfile {
    DependentProfile {
        id: dependent.id,
        nama: dependent.nama,
        jenis_tanggungan: DependentType::from_storage_code(&dependent.jenis_tanggungan),
        jenis_kelamin: dependent
            .jenis_kelamin
            .as_deref()
            .and_then(Gender::from_storage_code),
        tempat_lahir: dependent.tempat_lahir,
        tanggal_lahir: dependent.tanggal_lahir,
        pendidikan_terakhir: dependent.pendidikan_terakhir,
        agama: Religion::from_storage_code(&dependent.agama),
        status: LivingStatus::from_storage_code(&dependent.status),
        status_pernikahan: MaritalStatus::from_storage_code(&dependent.status_pernikahan),
        tanggal_baptis: dependent.tanggal_baptis,
        tanggal_krisma: dependent.tanggal_krisma,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_head() -> KeluargaUmat {
        KeluargaUmat {
            id: Uuid::new_v4(),
            nama_kepala_keluarga: "Antonius Wijaya".to_string(),
            alamat: "Jl. Melati 5".to_string(),
            nomor_telepon: None,
            tempat_lahir: None,
            tanggal_lahir: None,
            nik: None,
            email: None,
            pekerjaan: None,
            pendidikan_terakhir: None,
            kota_domisili: None,
            jenis_kelamin: None,
            agama: "KATOLIK".to_string(),
            status: "HIDUP".to_string(),
            status_pernikahan: "MENIKAH".to_string(),
            no_biduk: None,
            tanggal_baptis: None,
            tanggal_krisma: None,
            tanggal_meninggal: None,
            jumlah_anak_tertanggung: 0,
            jumlah_kerabat_tertanggung: 0,
            jumlah_anggota_keluarga: 1,
            tanggal_bergabung: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            tanggal_keluar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unset_head_sex_decodes_to_male() {
        let profile = map_head(sample_head());
        assert_eq!(profile.jenis_kelamin, Gender::Male);
        assert_eq!(profile.agama, Some(Religion::Catholic));
        assert_eq!(profile.status_pernikahan, Some(MaritalStatus::Married));
    }

    #[test]
    fn explicit_head_sex_wins_over_default() {
        let mut head = sample_head();
        head.jenis_kelamin = Some("PEREMPUAN".to_string());
        assert_eq!(map_head(head).jenis_kelamin, Gender::Female);
    }
}
