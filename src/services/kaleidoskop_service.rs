use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config;
use crate::services::doling_service::{
    average_attendance, month_range, DolingError, MONTH_NAMES,
};
use crate::types::{JenisIbadat, SubIbadat};

/// Yearly activity overview (kaleidoskop) built from completed and upcoming
/// meeting records. Aggregation happens in-process; the queries only narrow
/// the date window.
pub struct KaleidoskopService {
    pool: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KegiatanItem {
    pub id: Uuid,
    pub tanggal: DateTime<Utc>,
    pub jenis_ibadat: JenisIbadat,
    pub sub_ibadat: Option<SubIbadat>,
    pub custom_sub_ibadat: Option<String>,
    pub tema_ibadat: Option<String>,
    pub tuan_rumah: String,
    pub jumlah_kk_hadir: i32,
    pub jumlah_peserta: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubIbadatStat {
    pub nama: String,
    pub jumlah: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JenisIbadatStat {
    pub jenis_ibadat: JenisIbadat,
    pub jumlah: i64,
    /// Share of all activities in the window, rounded to 2 decimal places
    pub persentase: f64,
    pub sub_ibadat: Vec<SubIbadatStat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ringkasan {
    pub total_kegiatan: i64,
    pub rata_rata_kehadiran: f64,
    pub jenis_terbanyak: Option<JenisIbadat>,
    pub total_peserta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KehadiranBulan {
    pub bulan: String,
    pub jumlah_kegiatan: i64,
    pub total_kk_hadir: i64,
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    tanggal: DateTime<Utc>,
    jenis_ibadat: String,
    sub_ibadat: Option<String>,
    custom_sub_ibadat: Option<String>,
    tema_ibadat: Option<String>,
    jumlah_kk_hadir: i32,
    jumlah_peserta: i32,
    bapak: i32,
    ibu: i32,
    omk: i32,
    bir: i32,
    bia_bawah: i32,
    bia_atas: i32,
    nama_kepala_keluarga: String,
}

impl KaleidoskopService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Meetings inside an optional date window, oldest first
    pub async fn activities(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<KegiatanItem>, DolingError> {
        let rows = self.fetch_window(start, end).await?;
        rows.into_iter()
            .map(|row| {
                let jenis_ibadat = decode_jenis(&row.jenis_ibadat)?;
                Ok(KegiatanItem {
                    id: row.id,
                    tanggal: row.tanggal,
                    jenis_ibadat,
                    sub_ibadat: row.sub_ibadat.as_deref().and_then(SubIbadat::from_code),
                    custom_sub_ibadat: row.custom_sub_ibadat,
                    tema_ibadat: row.tema_ibadat,
                    tuan_rumah: row.nama_kepala_keluarga,
                    jumlah_kk_hadir: row.jumlah_kk_hadir,
                    jumlah_peserta: row.jumlah_peserta,
                })
            })
            .collect()
    }

    /// Activity counts and percentage share per service type, with a
    /// sub-type breakdown. A free-text sub-type takes precedence over the
    /// enumerated one when both are present.
    pub async fn statistik_per_jenis(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<JenisIbadatStat>, DolingError> {
        let rows = self.fetch_window(start, end).await?;
        let total = rows.len() as i64;

        let mut stats: Vec<JenisIbadatStat> = Vec::new();
        for row in &rows {
            let jenis = decode_jenis(&row.jenis_ibadat)?;
            let sub_name = sub_label(row);

            let idx = match stats.iter().position(|s| s.jenis_ibadat == jenis) {
                Some(idx) => idx,
                None => {
                    stats.push(JenisIbadatStat {
                        jenis_ibadat: jenis,
                        jumlah: 0,
                        persentase: 0.0,
                        sub_ibadat: Vec::new(),
                    });
                    stats.len() - 1
                }
            };
            let entry = &mut stats[idx];
            entry.jumlah += 1;

            if let Some(name) = sub_name {
                match entry.sub_ibadat.iter_mut().find(|s| s.nama == name) {
                    Some(sub) => sub.jumlah += 1,
                    None => entry.sub_ibadat.push(SubIbadatStat { nama: name, jumlah: 1 }),
                }
            }
        }

        for entry in &mut stats {
            entry.persentase = share_percentage(entry.jumlah, total);
            entry.sub_ibadat.sort_by(|a, b| b.jumlah.cmp(&a.jumlah));
        }
        stats.sort_by(|a, b| b.jumlah.cmp(&a.jumlah));
        Ok(stats)
    }

    /// Headline numbers for the window: total activities, average household
    /// attendance, the most frequent service type, and a participant total.
    pub async fn ringkasan(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Ringkasan, DolingError> {
        let rows = self.fetch_window(start, end).await?;
        let total_kegiatan = rows.len() as i64;

        let total_hadir: i64 = rows.iter().map(|r| r.jumlah_kk_hadir as i64).sum();
        let total_peserta: i64 = rows.iter().map(total_peserta).sum();

        let mut counts: Vec<(JenisIbadat, i64)> = Vec::new();
        for row in &rows {
            let jenis = decode_jenis(&row.jenis_ibadat)?;
            match counts.iter_mut().find(|(j, _)| *j == jenis) {
                Some((_, n)) => *n += 1,
                None => counts.push((jenis, 1)),
            }
        }
        let jenis_terbanyak = counts
            .into_iter()
            .max_by_key(|(_, n)| *n)
            .map(|(jenis, _)| jenis);

        Ok(Ringkasan {
            total_kegiatan,
            rata_rata_kehadiran: average_attendance(total_hadir, total_kegiatan),
            jenis_terbanyak,
            total_peserta,
        })
    }

    /// Activity count and summed household attendance per calendar month of
    /// a year, using parish-timezone month boundaries
    pub async fn kehadiran_per_bulan(
        &self,
        tahun: i32,
    ) -> Result<Vec<KehadiranBulan>, DolingError> {
        let tz = config::config().org.timezone;
        let mut result = Vec::with_capacity(12);

        for month in 1..=12u32 {
            let (start, end) = month_range(tz, tahun, month)?;

            #[derive(FromRow)]
            struct Row {
                kegiatan: i64,
                hadir: i64,
            }

            let row: Row = sqlx::query_as(
                r#"
                SELECT COUNT(*) AS kegiatan,
                       COALESCE(SUM(jumlah_kk_hadir), 0) AS hadir
                FROM doa_lingkungan
                WHERE tanggal >= $1 AND tanggal < $2
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

            result.push(KehadiranBulan {
                bulan: format!("{} {}", MONTH_NAMES[(month - 1) as usize], tahun),
                jumlah_kegiatan: row.kegiatan,
                total_kk_hadir: row.hadir,
            });
        }

        Ok(result)
    }

    async fn fetch_window(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRow>, DolingError> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.tanggal, d.jenis_ibadat, d.sub_ibadat,
                   d.custom_sub_ibadat, d.tema_ibadat, d.jumlah_kk_hadir,
                   d.jumlah_peserta, d.bapak, d.ibu, d.omk, d.bir,
                   d.bia_bawah, d.bia_atas,
                   k.nama_kepala_keluarga
            FROM doa_lingkungan d
            JOIN keluarga_umat k ON k.id = d.tuan_rumah_id
            WHERE ($1::timestamptz IS NULL OR d.tanggal >= $1)
              AND ($2::timestamptz IS NULL OR d.tanggal <= $2)
            ORDER BY d.tanggal ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn decode_jenis(code: &str) -> Result<JenisIbadat, DolingError> {
    JenisIbadat::from_code(code)
        .ok_or_else(|| DolingError::Decode(format!("jenis_ibadat: {}", code)))
}

fn sub_label(row: &ActivityRow) -> Option<String> {
    if let Some(custom) = row.custom_sub_ibadat.as_deref() {
        if !custom.trim().is_empty() {
            return Some(custom.to_string());
        }
    }
    row.sub_ibadat
        .as_deref()
        .and_then(SubIbadat::from_code)
        .map(|s| s.as_code().to_string())
}

/// Recorded participant total when one was captured, otherwise the sum of
/// the demographic buckets
fn total_peserta(row: &ActivityRow) -> i64 {
    if row.jumlah_peserta > 0 {
        row.jumlah_peserta as i64
    } else {
        (row.bapak + row.ibu + row.omk + row.bir + row.bia_bawah + row.bia_atas) as i64
    }
}

fn share_percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((count as f64 / total as f64) * 10000.0).round() / 100.0
}

/// Calendar year of an instant in the parish timezone
pub fn parish_year(at: DateTime<Utc>) -> i32 {
    at.with_timezone(&config::config().org.timezone).year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(jumlah_peserta: i32, buckets: [i32; 6]) -> ActivityRow {
        ActivityRow {
            id: Uuid::new_v4(),
            tanggal: Utc::now(),
            jenis_ibadat: "DOA_LINGKUNGAN".to_string(),
            sub_ibadat: None,
            custom_sub_ibadat: None,
            tema_ibadat: None,
            jumlah_kk_hadir: 0,
            jumlah_peserta,
            bapak: buckets[0],
            ibu: buckets[1],
            omk: buckets[2],
            bir: buckets[3],
            bia_bawah: buckets[4],
            bia_atas: buckets[5],
            nama_kepala_keluarga: "Keluarga Uji".to_string(),
        }
    }

    #[test]
    fn participant_total_prefers_recorded_value() {
        assert_eq!(total_peserta(&row(42, [1, 1, 1, 1, 1, 1])), 42);
    }

    #[test]
    fn participant_total_falls_back_to_bucket_sum() {
        assert_eq!(total_peserta(&row(0, [5, 4, 3, 2, 1, 0])), 15);
    }

    #[test]
    fn custom_sub_type_takes_precedence() {
        let mut r = row(0, [0; 6]);
        r.sub_ibadat = Some("IBADAT_SABDA".to_string());
        r.custom_sub_ibadat = Some("Ziarah Gua Maria".to_string());
        assert_eq!(sub_label(&r), Some("Ziarah Gua Maria".to_string()));
    }

    #[test]
    fn blank_custom_sub_type_is_ignored() {
        let mut r = row(0, [0; 6]);
        r.sub_ibadat = Some("BKSN".to_string());
        r.custom_sub_ibadat = Some("   ".to_string());
        assert_eq!(sub_label(&r), Some("BKSN".to_string()));
    }

    #[test]
    fn share_handles_empty_window() {
        assert_eq!(share_percentage(0, 0), 0.0);
        assert_eq!(share_percentage(1, 3), 33.33);
        assert_eq!(share_percentage(2, 3), 66.67);
    }
}
