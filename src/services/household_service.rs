use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config;
use crate::database::models::KeluargaUmat;

#[derive(Debug, thiserror::Error)]
pub enum HouseholdError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Where a birthday celebrant sits in their household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PosisiKeluarga {
    KepalaKeluarga,
    Pasangan,
    Tanggungan,
}

#[derive(Debug, Clone, Serialize)]
pub struct UlangTahun {
    pub id: Uuid,
    pub nama: String,
    pub posisi: PosisiKeluarga,
    pub nama_keluarga: String,
    pub tanggal_lahir: NaiveDate,
    /// Humanized age, e.g. "3 hari", "8 bulan", "42 tahun"
    pub umur: String,
}

/// Household registry reads: the active roster and the birthday list that
/// feeds the reminder page
pub struct HouseholdService {
    pool: PgPool,
}

impl HouseholdService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Households still part of the community: alive and not moved out
    pub async fn list_active(&self) -> Result<Vec<KeluargaUmat>, HouseholdError> {
        let rows: Vec<KeluargaUmat> = sqlx::query_as(
            r#"
            SELECT * FROM keluarga_umat
            WHERE status = 'HIDUP' AND tanggal_keluar IS NULL
            ORDER BY nama_kepala_keluarga ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<KeluargaUmat, HouseholdError> {
        let row: Option<KeluargaUmat> =
            sqlx::query_as("SELECT * FROM keluarga_umat WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| {
            HouseholdError::NotFound(format!("Keluarga tidak ditemukan untuk id: {}", id))
        })
    }

    /// Birthday celebrants across heads, spouses and dependents of active
    /// households, optionally narrowed to one calendar month (1..=12).
    /// Sorted by day of month, then name.
    pub async fn birthdays(&self, bulan: Option<u32>) -> Result<Vec<UlangTahun>, HouseholdError> {
        #[derive(FromRow)]
        struct Row {
            id: Uuid,
            nama: String,
            tanggal_lahir: Option<DateTime<Utc>>,
            nama_kepala_keluarga: String,
            posisi: String,
        }

        let rows: Vec<Row> = sqlx::query_as(
            r#"
            SELECT k.id, k.nama_kepala_keluarga AS nama, k.tanggal_lahir,
                   k.nama_kepala_keluarga, 'KEPALA' AS posisi
            FROM keluarga_umat k
            WHERE k.status = 'HIDUP' AND k.tanggal_keluar IS NULL

            UNION ALL

            SELECT p.id, p.nama, p.tanggal_lahir,
                   k.nama_kepala_keluarga, 'PASANGAN' AS posisi
            FROM pasangan p
            JOIN keluarga_umat k ON k.id = p.keluarga_id
            WHERE k.status = 'HIDUP' AND k.tanggal_keluar IS NULL

            UNION ALL

            SELECT t.id, t.nama, t.tanggal_lahir,
                   k.nama_kepala_keluarga, 'TANGGUNGAN' AS posisi
            FROM tanggungan t
            JOIN keluarga_umat k ON k.id = t.keluarga_id
            WHERE k.status = 'HIDUP' AND k.tanggal_keluar IS NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let tz = config::config().org.timezone;
        let today = Utc::now().with_timezone(&tz).date_naive();

        let mut birthdays: Vec<UlangTahun> = rows
            .into_iter()
            .filter_map(|row| {
                let tanggal_lahir = row.tanggal_lahir?.with_timezone(&tz).date_naive();
                if let Some(bulan) = bulan {
                    if tanggal_lahir.month() != bulan {
                        return None;
                    }
                }
                let posisi = match row.posisi.as_str() {
                    "KEPALA" => PosisiKeluarga::KepalaKeluarga,
                    "PASANGAN" => PosisiKeluarga::Pasangan,
                    _ => PosisiKeluarga::Tanggungan,
                };
                Some(UlangTahun {
                    id: row.id,
                    nama: row.nama,
                    posisi,
                    nama_keluarga: row.nama_kepala_keluarga,
                    tanggal_lahir,
                    umur: humanize_age(tanggal_lahir, today),
                })
            })
            .collect();

        birthdays.sort_by(|a, b| {
            a.tanggal_lahir
                .day()
                .cmp(&b.tanggal_lahir.day())
                .then_with(|| a.nama.cmp(&b.nama))
        });

        Ok(birthdays)
    }
}

/// Age in the unit that reads naturally: days under a month, months under a
/// year, whole years after that
pub fn humanize_age(birth: NaiveDate, today: NaiveDate) -> String {
    let months = whole_months_between(birth, today);
    if months < 1 {
        let days = (today - birth).num_days().max(0);
        format!("{} hari", days)
    } else if months < 12 {
        format!("{} bulan", months)
    } else {
        format!("{} tahun", months / 12)
    }
}

fn whole_months_between(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut months =
        (today.year() - birth.year()) * 12 + today.month() as i32 - birth.month() as i32;
    if today.day() < birth.day() {
        months -= 1;
    }
    months.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn newborns_are_counted_in_days() {
        assert_eq!(humanize_age(date(2024, 3, 1), date(2024, 3, 11)), "10 hari");
        assert_eq!(humanize_age(date(2024, 3, 1), date(2024, 3, 1)), "0 hari");
    }

    #[test]
    fn infants_are_counted_in_months() {
        assert_eq!(humanize_age(date(2024, 1, 15), date(2024, 4, 20)), "3 bulan");
        assert_eq!(humanize_age(date(2023, 6, 1), date(2024, 5, 1)), "11 bulan");
    }

    #[test]
    fn month_count_waits_for_the_day_of_month() {
        // One day short of three whole months
        assert_eq!(humanize_age(date(2024, 1, 15), date(2024, 4, 14)), "2 bulan");
    }

    #[test]
    fn adults_are_counted_in_years() {
        assert_eq!(humanize_age(date(1980, 8, 24), date(2026, 8, 24)), "46 tahun");
        assert_eq!(humanize_age(date(1980, 8, 25), date(2026, 8, 24)), "45 tahun");
    }

    #[test]
    fn future_dates_never_go_negative() {
        assert_eq!(humanize_age(date(2030, 1, 1), date(2026, 8, 24)), "0 hari");
    }
}
