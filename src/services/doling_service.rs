use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::cache::PageCache;
use crate::config;
use crate::types::{JenisIbadat, StatusApproval, StatusKegiatan, StatusKehadiran, SubIbadat};

pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

#[derive(Debug, thiserror::Error)]
pub enum DolingError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("stored value outside vocabulary: {0}")]
    Decode(String),
}

/// Meeting detail joined with its host household and approval status
#[derive(Debug, Clone, Serialize)]
pub struct DolingData {
    pub id: Uuid,
    pub tanggal: DateTime<Utc>,
    /// Wall-clock time of the meeting in the parish timezone, HH:MM
    pub waktu: String,
    pub tuan_rumah: String,
    pub tuan_rumah_id: Uuid,
    pub alamat: String,
    pub nomor_telepon: Option<String>,
    pub jenis_ibadat: JenisIbadat,
    pub sub_ibadat: Option<SubIbadat>,
    pub custom_sub_ibadat: Option<String>,
    pub tema_ibadat: Option<String>,
    pub status: &'static str,
    pub status_kegiatan: StatusKegiatan,
    pub jumlah_kk_hadir: i32,
    pub bapak: i32,
    pub ibu: i32,
    pub omk: i32,
    pub bir: i32,
    pub bia_bawah: i32,
    pub bia_atas: i32,
    pub kolekte_i: i64,
    pub kolekte_ii: i64,
    pub ucapan_syukur: i64,
    pub pemimpin_ibadat: Option<String>,
    pub pemimpin_rosario: Option<String>,
    pub pembawa_renungan: Option<String>,
    pub pembawa_lagu: Option<String>,
    pub doa_umat: Option<String>,
    pub bacaan: Option<String>,
    pub pemimpin_misa: Option<String>,
    pub bacaan_i: Option<String>,
    pub pemazmur: Option<String>,
    pub jumlah_peserta: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbsensiData {
    pub id: Uuid,
    pub doa_lingkungan_id: Uuid,
    pub keluarga_id: Uuid,
    pub nama_keluarga: String,
    pub hadir: bool,
    pub status_kehadiran: StatusKehadiran,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeluargaForSelect {
    pub id: Uuid,
    pub nama: String,
    pub alamat: String,
    pub nomor_telepon: Option<String>,
    pub sudah_terpilih: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewDoling {
    pub tanggal: DateTime<Utc>,
    pub tuan_rumah_id: Uuid,
    pub jenis_ibadat: JenisIbadat,
    /// Raw sub-type code; values outside the closed enumeration are stored
    /// as null rather than rejected
    pub sub_ibadat: Option<String>,
    pub custom_sub_ibadat: Option<String>,
    pub tema_ibadat: Option<String>,
}

/// Partial update. Absent fields keep their stored value; an absent
/// attendance count is recomputed from live attendance rows instead of
/// trusting the cache.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDolingDetail {
    pub jumlah_kk_hadir: Option<i32>,
    pub bapak: Option<i32>,
    pub ibu: Option<i32>,
    pub omk: Option<i32>,
    pub bir: Option<i32>,
    pub bia_bawah: Option<i32>,
    pub bia_atas: Option<i32>,
    pub kolekte_i: Option<i64>,
    pub kolekte_ii: Option<i64>,
    pub ucapan_syukur: Option<i64>,
    pub pemimpin_ibadat: Option<String>,
    pub pemimpin_rosario: Option<String>,
    pub pembawa_renungan: Option<String>,
    pub pembawa_lagu: Option<String>,
    pub doa_umat: Option<String>,
    pub bacaan: Option<String>,
    pub pemimpin_misa: Option<String>,
    pub bacaan_i: Option<String>,
    pub pemazmur: Option<String>,
    pub jumlah_peserta: Option<i32>,
    pub status_kegiatan: Option<StatusKegiatan>,
    pub custom_sub_ibadat: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AbsensiInput {
    pub keluarga_id: Option<Uuid>,
    pub hadir: bool,
    pub status_kehadiran: StatusKehadiran,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiwayatKehadiran {
    pub nama: String,
    pub total_hadir: i64,
    /// Attendance percentage over past meetings, rounded half-up
    pub persentase: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RekapBulanan {
    pub bulan: String,
    pub jumlah_kegiatan: i64,
    pub rata_rata_hadir: f64,
}

#[derive(Debug, FromRow)]
struct DolingRow {
    id: Uuid,
    tanggal: DateTime<Utc>,
    tuan_rumah_id: Uuid,
    jenis_ibadat: String,
    sub_ibadat: Option<String>,
    custom_sub_ibadat: Option<String>,
    tema_ibadat: Option<String>,
    status_kegiatan: String,
    jumlah_kk_hadir: i32,
    bapak: i32,
    ibu: i32,
    omk: i32,
    bir: i32,
    bia_bawah: i32,
    bia_atas: i32,
    kolekte_i: i64,
    kolekte_ii: i64,
    ucapan_syukur: i64,
    pemimpin_ibadat: Option<String>,
    pemimpin_rosario: Option<String>,
    pembawa_renungan: Option<String>,
    pembawa_lagu: Option<String>,
    doa_umat: Option<String>,
    bacaan: Option<String>,
    pemimpin_misa: Option<String>,
    bacaan_i: Option<String>,
    pemazmur: Option<String>,
    jumlah_peserta: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    nama_kepala_keluarga: String,
    tuan_rumah_alamat: String,
    tuan_rumah_telepon: Option<String>,
    approval_status: Option<String>,
}

const DOLING_SELECT: &str = r#"
    SELECT d.id, d.tanggal, d.tuan_rumah_id, d.jenis_ibadat, d.sub_ibadat,
           d.custom_sub_ibadat, d.tema_ibadat, d.status_kegiatan,
           d.jumlah_kk_hadir, d.bapak, d.ibu, d.omk, d.bir, d.bia_bawah,
           d.bia_atas, d.kolekte_i, d.kolekte_ii, d.ucapan_syukur,
           d.pemimpin_ibadat, d.pemimpin_rosario, d.pembawa_renungan,
           d.pembawa_lagu, d.doa_umat, d.bacaan, d.pemimpin_misa, d.bacaan_i,
           d.pemazmur, d.jumlah_peserta, d.created_at, d.updated_at,
           k.nama_kepala_keluarga,
           k.alamat AS tuan_rumah_alamat,
           k.nomor_telepon AS tuan_rumah_telepon,
           a.status AS approval_status
    FROM doa_lingkungan d
    JOIN keluarga_umat k ON k.id = d.tuan_rumah_id
    LEFT JOIN approval a ON a.doa_lingkungan_id = d.id
"#;

/// Prayer-meeting record manager. Every mutation that touches attendance
/// rows recomputes the meeting's cached present-count inside the same
/// transaction; nothing else writes that column.
pub struct DolingService {
    pool: PgPool,
}

impl DolingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All meetings, newest first
    pub async fn list(&self) -> Result<Vec<DolingData>, DolingError> {
        let sql = format!("{} ORDER BY d.tanggal DESC", DOLING_SELECT);
        let rows: Vec<DolingRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(map_doling_row).collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<DolingData, DolingError> {
        let sql = format!("{} WHERE d.id = $1", DOLING_SELECT);
        let row: Option<DolingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => map_doling_row(row),
            None => Err(DolingError::NotFound(format!(
                "Doa lingkungan tidak ditemukan untuk id: {}",
                id
            ))),
        }
    }

    /// Active households offered as hosts, flagged when they already carry an
    /// attendance row for the given meeting
    pub async fn households_for_selection(
        &self,
        doling_id: Option<Uuid>,
    ) -> Result<Vec<KeluargaForSelect>, DolingError> {
        #[derive(FromRow)]
        struct Row {
            id: Uuid,
            nama_kepala_keluarga: String,
            alamat: String,
            nomor_telepon: Option<String>,
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT id, nama_kepala_keluarga, alamat, nomor_telepon
            FROM keluarga_umat
            WHERE status = 'HIDUP' AND tanggal_keluar IS NULL
            ORDER BY nama_kepala_keluarga ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let chosen: Vec<Uuid> = match doling_id {
            Some(doling_id) => {
                sqlx::query_scalar(
                    "SELECT keluarga_id FROM absensi_doling WHERE doa_lingkungan_id = $1",
                )
                .bind(doling_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => Vec::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| KeluargaForSelect {
                sudah_terpilih: chosen.contains(&row.id),
                id: row.id,
                nama: row.nama_kepala_keluarga,
                alamat: row.alamat,
                nomor_telepon: row.nomor_telepon,
            })
            .collect())
    }

    /// Schedule a meeting. Creates the meeting row with zeroed counters and
    /// its PENDING approval in one transaction.
    pub async fn schedule(&self, data: NewDoling) -> Result<DolingData, DolingError> {
        // Out-of-vocabulary sub-types degrade to null, never to an error
        let sub_ibadat = data.sub_ibadat.as_deref().and_then(SubIbadat::from_code);

        let host: Option<Uuid> = sqlx::query_scalar("SELECT id FROM keluarga_umat WHERE id = $1")
            .bind(data.tuan_rumah_id)
            .fetch_optional(&self.pool)
            .await?;
        if host.is_none() {
            return Err(DolingError::Validation(format!(
                "Keluarga dengan ID {} tidak ditemukan",
                data.tuan_rumah_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        let doling_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO doa_lingkungan
                (tanggal, tuan_rumah_id, jenis_ibadat, sub_ibadat,
                 custom_sub_ibadat, tema_ibadat, status_kegiatan)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(data.tanggal)
        .bind(data.tuan_rumah_id)
        .bind(data.jenis_ibadat.as_code())
        .bind(sub_ibadat.map(|s| s.as_code()))
        .bind(&data.custom_sub_ibadat)
        .bind(&data.tema_ibadat)
        .bind(StatusKegiatan::BelumSelesai.as_code())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO approval (doa_lingkungan_id, status) VALUES ($1, $2)")
            .bind(doling_id)
            .bind(StatusApproval::Pending.as_code())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        PageCache::revalidate_path("/approval").await;

        self.get(doling_id).await
    }

    /// Merge a partial detail update. When the caller does not supply the
    /// attendance-household count it is recomputed from live rows so the
    /// cache never goes stale.
    pub async fn update_detail(
        &self,
        id: Uuid,
        data: UpdateDolingDetail,
    ) -> Result<DolingData, DolingError> {
        let mut tx = self.pool.begin().await?;

        let jumlah_kk_hadir = match data.jumlah_kk_hadir {
            Some(count) => count,
            None => count_hadir(&mut tx, id).await? as i32,
        };

        let status_kegiatan = data.status_kegiatan.unwrap_or(StatusKegiatan::BelumSelesai);

        let result = sqlx::query(
            r#"
            UPDATE doa_lingkungan SET
                jumlah_kk_hadir = $2,
                bapak = COALESCE($3, bapak),
                ibu = COALESCE($4, ibu),
                omk = COALESCE($5, omk),
                bir = COALESCE($6, bir),
                bia_bawah = COALESCE($7, bia_bawah),
                bia_atas = COALESCE($8, bia_atas),
                kolekte_i = COALESCE($9, kolekte_i),
                kolekte_ii = COALESCE($10, kolekte_ii),
                ucapan_syukur = COALESCE($11, ucapan_syukur),
                pemimpin_ibadat = COALESCE($12, pemimpin_ibadat),
                pemimpin_rosario = COALESCE($13, pemimpin_rosario),
                pembawa_renungan = COALESCE($14, pembawa_renungan),
                pembawa_lagu = COALESCE($15, pembawa_lagu),
                doa_umat = COALESCE($16, doa_umat),
                bacaan = COALESCE($17, bacaan),
                pemimpin_misa = COALESCE($18, pemimpin_misa),
                bacaan_i = COALESCE($19, bacaan_i),
                pemazmur = COALESCE($20, pemazmur),
                jumlah_peserta = COALESCE($21, jumlah_peserta),
                custom_sub_ibadat = COALESCE($22, custom_sub_ibadat),
                status_kegiatan = $23,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(jumlah_kk_hadir)
        .bind(data.bapak)
        .bind(data.ibu)
        .bind(data.omk)
        .bind(data.bir)
        .bind(data.bia_bawah)
        .bind(data.bia_atas)
        .bind(data.kolekte_i)
        .bind(data.kolekte_ii)
        .bind(data.ucapan_syukur)
        .bind(&data.pemimpin_ibadat)
        .bind(&data.pemimpin_rosario)
        .bind(&data.pembawa_renungan)
        .bind(&data.pembawa_lagu)
        .bind(&data.doa_umat)
        .bind(&data.bacaan)
        .bind(&data.pemimpin_misa)
        .bind(&data.bacaan_i)
        .bind(&data.pemazmur)
        .bind(data.jumlah_peserta)
        .bind(&data.custom_sub_ibadat)
        .bind(status_kegiatan.as_code())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DolingError::NotFound(format!(
                "Doa lingkungan tidak ditemukan untuk id: {}",
                id
            )));
        }

        tx.commit().await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        PageCache::revalidate_path("/approval").await;

        self.get(id).await
    }

    /// Attendance rows for one meeting, ordered by household name
    pub async fn absensi_list(&self, doling_id: Uuid) -> Result<Vec<AbsensiData>, DolingError> {
        #[derive(FromRow)]
        struct Row {
            id: Uuid,
            doa_lingkungan_id: Uuid,
            keluarga_id: Uuid,
            hadir: bool,
            status_kehadiran: Option<String>,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
            nama_kepala_keluarga: String,
        }

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM doa_lingkungan WHERE id = $1")
            .bind(doling_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(Vec::new());
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT a.id, a.doa_lingkungan_id, a.keluarga_id, a.hadir,
                   a.status_kehadiran, a.created_at, a.updated_at,
                   k.nama_kepala_keluarga
            FROM absensi_doling a
            JOIN keluarga_umat k ON k.id = a.keluarga_id
            WHERE a.doa_lingkungan_id = $1
            ORDER BY k.nama_kepala_keluarga ASC
            "#,
        )
        .bind(doling_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                // Legacy rows may lack a category; derive one from the flag
                let status_kehadiran = row
                    .status_kehadiran
                    .as_deref()
                    .and_then(StatusKehadiran::from_code)
                    .unwrap_or(if row.hadir {
                        StatusKehadiran::SuamiIstriHadir
                    } else {
                        StatusKehadiran::TidakHadir
                    });
                AbsensiData {
                    id: row.id,
                    doa_lingkungan_id: row.doa_lingkungan_id,
                    keluarga_id: row.keluarga_id,
                    nama_keluarga: row.nama_kepala_keluarga,
                    hadir: row.hadir,
                    status_kehadiran,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }
            })
            .collect())
    }

    /// Batch attendance upsert for one meeting. Rows without a household
    /// reference or with an unknown one are skipped, not failed; the cached
    /// present-count is recomputed at the end of the same transaction.
    pub async fn record_attendance(
        &self,
        doling_id: Uuid,
        data: Vec<AbsensiInput>,
    ) -> Result<(), DolingError> {
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM doa_lingkungan WHERE id = $1")
            .bind(doling_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DolingError::NotFound(format!(
                "Doa lingkungan tidak ditemukan untuk id: {}",
                doling_id
            )));
        }

        if data.is_empty() {
            return Err(DolingError::Validation("Data absensi kosong".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        for item in &data {
            let Some(keluarga_id) = item.keluarga_id else {
                continue;
            };

            let keluarga: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM keluarga_umat WHERE id = $1")
                    .bind(keluarga_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if keluarga.is_none() {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO absensi_doling (doa_lingkungan_id, keluarga_id, hadir, status_kehadiran)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (doa_lingkungan_id, keluarga_id)
                DO UPDATE SET hadir = EXCLUDED.hadir,
                              status_kehadiran = EXCLUDED.status_kehadiran,
                              updated_at = NOW()
                "#,
            )
            .bind(doling_id)
            .bind(keluarga_id)
            .bind(item.hadir)
            .bind(item.status_kehadiran.as_code())
            .execute(&mut *tx)
            .await?;
        }

        recount_hadir(&mut tx, doling_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        Ok(())
    }

    /// Delete one attendance row and recount its meeting in one transaction
    pub async fn delete_attendance(&self, absensi_id: Uuid) -> Result<(), DolingError> {
        let doling_id: Option<Uuid> =
            sqlx::query_scalar("SELECT doa_lingkungan_id FROM absensi_doling WHERE id = $1")
                .bind(absensi_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(doling_id) = doling_id else {
            return Err(DolingError::NotFound(format!(
                "Absensi dengan ID {} tidak ditemukan",
                absensi_id
            )));
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM absensi_doling WHERE id = $1")
            .bind(absensi_id)
            .execute(&mut *tx)
            .await?;

        recount_hadir(&mut tx, doling_id).await?;
        tx.commit().await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        Ok(())
    }

    /// Upsert the approval status for a meeting
    pub async fn set_approval(
        &self,
        doling_id: Uuid,
        status: StatusApproval,
    ) -> Result<(), DolingError> {
        sqlx::query(
            r#"
            INSERT INTO approval (doa_lingkungan_id, status)
            VALUES ($1, $2)
            ON CONFLICT (doa_lingkungan_id)
            DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
            "#,
        )
        .bind(doling_id)
        .bind(status.as_code())
        .execute(&self.pool)
        .await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        PageCache::revalidate_path("/approval").await;
        Ok(())
    }

    /// Delete a meeting with referential cleanup: attendance rows first,
    /// then the approval, then the meeting itself.
    pub async fn delete(&self, doling_id: Uuid) -> Result<(), DolingError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM absensi_doling WHERE doa_lingkungan_id = $1")
            .bind(doling_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM approval WHERE doa_lingkungan_id = $1")
            .bind(doling_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM doa_lingkungan WHERE id = $1")
            .bind(doling_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DolingError::NotFound(format!(
                "Doa lingkungan tidak ditemukan untuk id: {}",
                doling_id
            )));
        }

        tx.commit().await?;

        PageCache::revalidate_path("/kesekretariatan/doling").await;
        Ok(())
    }

    /// Attendance percentage per active household over meetings whose date
    /// has already passed, sorted descending
    pub async fn attendance_history(&self) -> Result<Vec<RiwayatKehadiran>, DolingError> {
        #[derive(FromRow)]
        struct Row {
            nama_kepala_keluarga: String,
            total_absensi: i64,
            total_hadir: i64,
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT k.nama_kepala_keluarga,
                   COUNT(a.id) FILTER (WHERE d.tanggal <= NOW()) AS total_absensi,
                   COUNT(a.id) FILTER (WHERE d.tanggal <= NOW() AND a.hadir) AS total_hadir
            FROM keluarga_umat k
            LEFT JOIN absensi_doling a ON a.keluarga_id = k.id
            LEFT JOIN doa_lingkungan d ON d.id = a.doa_lingkungan_id
            WHERE k.status = 'HIDUP' AND k.tanggal_keluar IS NULL
            GROUP BY k.id, k.nama_kepala_keluarga
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut history: Vec<RiwayatKehadiran> = rows
            .into_iter()
            .map(|row| RiwayatKehadiran {
                nama: row.nama_kepala_keluarga,
                total_hadir: row.total_hadir,
                persentase: attendance_percentage(row.total_hadir, row.total_absensi),
            })
            .collect();

        history.sort_by(|a, b| b.persentase.cmp(&a.persentase));
        Ok(history)
    }

    /// Twelve per-month entries for a year: meeting count plus average
    /// present-count over meetings that have already taken place. Month
    /// boundaries use the parish timezone.
    pub async fn monthly_recap(&self, tahun: i32) -> Result<Vec<RekapBulanan>, DolingError> {
        let tz = config::config().org.timezone;
        let mut recap = Vec::with_capacity(12);

        for month in 1..=12u32 {
            let (start, end) = month_range(tz, tahun, month)?;

            let jumlah_kegiatan: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM doa_lingkungan WHERE tanggal >= $1 AND tanggal < $2",
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

            #[derive(FromRow)]
            struct PastRow {
                kegiatan: i64,
                hadir: i64,
            }

            let past: PastRow = sqlx::query_as(
                r#"
                SELECT COUNT(DISTINCT d.id) AS kegiatan,
                       COUNT(a.id) FILTER (WHERE a.hadir) AS hadir
                FROM doa_lingkungan d
                LEFT JOIN absensi_doling a ON a.doa_lingkungan_id = d.id
                WHERE d.tanggal >= $1 AND d.tanggal < $2 AND d.tanggal <= NOW()
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

            recap.push(RekapBulanan {
                bulan: format!("{} {}", MONTH_NAMES[(month - 1) as usize], tahun),
                jumlah_kegiatan,
                rata_rata_hadir: average_attendance(past.hadir, past.kegiatan),
            });
        }

        Ok(recap)
    }
}

/// Count attendance rows marked present for a meeting, inside the caller's
/// transaction
async fn count_hadir(
    tx: &mut Transaction<'_, Postgres>,
    doling_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM absensi_doling WHERE doa_lingkungan_id = $1 AND hadir",
    )
    .bind(doling_id)
    .fetch_one(&mut **tx)
    .await
}

/// Single writer for the cached present-count: recompute from live rows and
/// persist, inside the caller's transaction
async fn recount_hadir(
    tx: &mut Transaction<'_, Postgres>,
    doling_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let hadir = count_hadir(tx, doling_id).await?;
    sqlx::query("UPDATE doa_lingkungan SET jumlah_kk_hadir = $2, updated_at = NOW() WHERE id = $1")
        .bind(doling_id)
        .bind(hadir as i32)
        .execute(&mut **tx)
        .await?;
    Ok(hadir)
}

fn map_doling_row(row: DolingRow) -> Result<DolingData, DolingError> {
    let jenis_ibadat = JenisIbadat::from_code(&row.jenis_ibadat)
        .ok_or_else(|| DolingError::Decode(format!("jenis_ibadat: {}", row.jenis_ibadat)))?;
    let status_kegiatan = StatusKegiatan::from_code(&row.status_kegiatan)
        .ok_or_else(|| DolingError::Decode(format!("status_kegiatan: {}", row.status_kegiatan)))?;
    // A stored sub-type outside the vocabulary behaves like none at all
    let sub_ibadat = row.sub_ibadat.as_deref().and_then(SubIbadat::from_code);
    let approved = row.approval_status.as_deref() == Some(StatusApproval::Approved.as_code());

    let tz = config::config().org.timezone;
    let waktu = row.tanggal.with_timezone(&tz).format("%H:%M").to_string();

    Ok(DolingData {
        id: row.id,
        tanggal: row.tanggal,
        waktu,
        tuan_rumah: row.nama_kepala_keluarga,
        tuan_rumah_id: row.tuan_rumah_id,
        alamat: row.tuan_rumah_alamat,
        nomor_telepon: row.tuan_rumah_telepon,
        jenis_ibadat,
        sub_ibadat,
        custom_sub_ibadat: row.custom_sub_ibadat,
        tema_ibadat: row.tema_ibadat,
        status: status_kegiatan.display(),
        status_kegiatan,
        jumlah_kk_hadir: row.jumlah_kk_hadir,
        bapak: row.bapak,
        ibu: row.ibu,
        omk: row.omk,
        bir: row.bir,
        bia_bawah: row.bia_bawah,
        bia_atas: row.bia_atas,
        kolekte_i: row.kolekte_i,
        kolekte_ii: row.kolekte_ii,
        ucapan_syukur: row.ucapan_syukur,
        pemimpin_ibadat: row.pemimpin_ibadat,
        pemimpin_rosario: row.pemimpin_rosario,
        pembawa_renungan: row.pembawa_renungan,
        pembawa_lagu: row.pembawa_lagu,
        doa_umat: row.doa_umat,
        bacaan: row.bacaan,
        pemimpin_misa: row.pemimpin_misa,
        bacaan_i: row.bacaan_i,
        pemazmur: row.pemazmur,
        jumlah_peserta: row.jumlah_peserta,
        approved,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Present / total as a whole percentage, rounded half-up; zero applicable
/// meetings yield 0, never a division error
pub fn attendance_percentage(hadir: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((hadir as f64 / total as f64) * 100.0).round() as i64
}

/// Average present-count across past meetings, rounded to 2 decimal places
pub fn average_attendance(total_hadir: i64, kegiatan: i64) -> f64 {
    if kegiatan <= 0 {
        return 0.0;
    }
    ((total_hadir as f64 / kegiatan as f64) * 100.0).round() / 100.0
}

/// Half-open UTC range covering one calendar month in the given timezone
pub fn month_range(
    tz: Tz,
    year: i32,
    month: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DolingError> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    let start = local_midnight(tz, year, month)?;
    let end = local_midnight(tz, next_year, next_month)?;
    Ok((start, end))
}

fn local_midnight(tz: Tz, year: i32, month: u32) -> Result<DateTime<Utc>, DolingError> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DolingError::Validation(format!("Tahun tidak valid: {}-{}", year, month)))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DolingError::Validation(format!("Tahun tidak valid: {}-{}", year, month)))?;
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| DolingError::Validation(format!("Tahun tidak valid: {}-{}", year, month)))?;
    Ok(local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(attendance_percentage(1, 3), 33);
        assert_eq!(attendance_percentage(2, 3), 67);
        assert_eq!(attendance_percentage(1, 2), 50);
        assert_eq!(attendance_percentage(1, 8), 13); // 12.5 rounds up
    }

    #[test]
    fn percentage_with_no_meetings_is_zero() {
        assert_eq!(attendance_percentage(0, 0), 0);
        assert_eq!(attendance_percentage(5, 0), 0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(average_attendance(10, 3), 3.33);
        assert_eq!(average_attendance(20, 3), 6.67);
        assert_eq!(average_attendance(0, 0), 0.0);
        assert_eq!(average_attendance(7, 2), 3.5);
    }

    #[test]
    fn month_range_uses_parish_timezone() {
        let tz = chrono_tz::Asia::Jakarta;
        let (start, end) = month_range(tz, 2024, 1).expect("range");
        // Jakarta is UTC+7, so local midnight is 17:00 the previous day in UTC
        assert_eq!(start.to_rfc3339(), "2023-12-31T17:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-31T17:00:00+00:00");
    }

    #[test]
    fn month_range_rolls_over_december() {
        let tz = chrono_tz::Asia::Jakarta;
        let (start, end) = month_range(tz, 2024, 12).expect("range");
        assert!(start < end);
        assert_eq!(end.to_rfc3339(), "2024-12-31T17:00:00+00:00");
    }

    #[test]
    fn month_names_cover_the_year() {
        assert_eq!(MONTH_NAMES.len(), 12);
        assert_eq!(MONTH_NAMES[0], "Januari");
        assert_eq!(MONTH_NAMES[11], "Desember");
    }
}
