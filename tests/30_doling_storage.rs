// Transactional behavior of the prayer-meeting record manager against a
// real database. Each test gets its own migrated schema.
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use lingkungan_api::services::doling_service::{
    AbsensiInput, DolingError, DolingService, NewDoling,
};
use lingkungan_api::types::{JenisIbadat, StatusApproval, StatusKehadiran};

async fn seed_household(pool: &PgPool, nama: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO keluarga_umat (nama_kepala_keluarga, alamat) VALUES ($1, $2) RETURNING id",
    )
    .bind(nama)
    .bind("Jl. Kenanga 1")
    .fetch_one(pool)
    .await
    .expect("seed household")
}

async fn schedule_meeting(service: &DolingService, host: Uuid) -> Uuid {
    service
        .schedule(NewDoling {
            tanggal: Utc::now() - Duration::days(1),
            tuan_rumah_id: host,
            jenis_ibadat: JenisIbadat::DoaLingkungan,
            sub_ibadat: Some("IBADAT_SABDA".to_string()),
            custom_sub_ibadat: None,
            tema_ibadat: None,
        })
        .await
        .expect("schedule")
        .id
}

async fn cached_present_count(pool: &PgPool, doling_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT jumlah_kk_hadir FROM doa_lingkungan WHERE id = $1")
        .bind(doling_id)
        .fetch_one(pool)
        .await
        .expect("cached count")
}

async fn live_present_count(pool: &PgPool, doling_id: Uuid) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM absensi_doling WHERE doa_lingkungan_id = $1 AND hadir",
    )
    .bind(doling_id)
    .fetch_one(pool)
    .await
    .expect("live count")
}

fn present(keluarga_id: Uuid) -> AbsensiInput {
    AbsensiInput {
        keluarga_id: Some(keluarga_id),
        hadir: true,
        status_kehadiran: StatusKehadiran::SuamiIstriHadir,
    }
}

fn absent(keluarga_id: Uuid) -> AbsensiInput {
    AbsensiInput {
        keluarga_id: Some(keluarga_id),
        hadir: false,
        status_kehadiran: StatusKehadiran::TidakHadir,
    }
}

#[sqlx::test]
async fn cached_count_matches_live_rows_after_every_batch(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let kel_a = seed_household(&pool, "Keluarga Santoso").await;
    let kel_b = seed_household(&pool, "Keluarga Wibowo").await;
    let doling_id = schedule_meeting(&service, host).await;

    service
        .record_attendance(doling_id, vec![present(host), present(kel_a), absent(kel_b)])
        .await
        .expect("first batch");
    assert_eq!(cached_present_count(&pool, doling_id).await, 2);
    assert_eq!(live_present_count(&pool, doling_id).await, 2);

    // Re-recording the same households updates rows in place and the cache
    // follows the flipped flags.
    service
        .record_attendance(doling_id, vec![absent(host), present(kel_a), present(kel_b)])
        .await
        .expect("second batch");
    assert_eq!(cached_present_count(&pool, doling_id).await, 2);
    assert_eq!(live_present_count(&pool, doling_id).await, 2);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM absensi_doling WHERE doa_lingkungan_id = $1",
    )
    .bind(doling_id)
    .fetch_one(&pool)
    .await
    .expect("row count");
    assert_eq!(rows, 3, "upsert must not duplicate attendance rows");
}

#[sqlx::test]
async fn batch_skips_missing_and_unknown_households(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let doling_id = schedule_meeting(&service, host).await;

    service
        .record_attendance(
            doling_id,
            vec![
                present(host),
                present(Uuid::new_v4()),
                AbsensiInput {
                    keluarga_id: None,
                    hadir: true,
                    status_kehadiran: StatusKehadiran::SuamiHadir,
                },
            ],
        )
        .await
        .expect("batch with skippable rows");

    assert_eq!(live_present_count(&pool, doling_id).await, 1);
    assert_eq!(cached_present_count(&pool, doling_id).await, 1);
}

#[sqlx::test]
async fn deleting_one_attendance_row_recounts_in_the_same_transaction(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let kel_a = seed_household(&pool, "Keluarga Santoso").await;
    let doling_id = schedule_meeting(&service, host).await;

    service
        .record_attendance(doling_id, vec![present(host), present(kel_a)])
        .await
        .expect("batch");
    assert_eq!(cached_present_count(&pool, doling_id).await, 2);

    let absensi_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM absensi_doling WHERE doa_lingkungan_id = $1 AND keluarga_id = $2",
    )
    .bind(doling_id)
    .bind(kel_a)
    .fetch_one(&pool)
    .await
    .expect("attendance row");

    service.delete_attendance(absensi_id).await.expect("delete");
    assert_eq!(cached_present_count(&pool, doling_id).await, 1);
    assert_eq!(live_present_count(&pool, doling_id).await, 1);
}

#[sqlx::test]
async fn deleting_an_unknown_attendance_row_fails_without_writes(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let doling_id = schedule_meeting(&service, host).await;
    service
        .record_attendance(doling_id, vec![present(host)])
        .await
        .expect("batch");

    let err = service
        .delete_attendance(Uuid::new_v4())
        .await
        .expect_err("unknown id");
    assert!(matches!(err, DolingError::NotFound(_)), "{:?}", err);

    assert_eq!(live_present_count(&pool, doling_id).await, 1);
    assert_eq!(cached_present_count(&pool, doling_id).await, 1);
}

#[sqlx::test]
async fn scheduling_stores_out_of_vocabulary_sub_type_as_null(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;

    let created = service
        .schedule(NewDoling {
            tanggal: Utc::now(),
            tuan_rumah_id: host,
            jenis_ibadat: JenisIbadat::DoaLingkungan,
            sub_ibadat: Some("ROSARIO_KELUARGA".to_string()),
            custom_sub_ibadat: Some("Rosario keluarga".to_string()),
            tema_ibadat: None,
        })
        .await
        .expect("schedule");

    let stored: Option<String> =
        sqlx::query_scalar("SELECT sub_ibadat FROM doa_lingkungan WHERE id = $1")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .expect("stored sub type");
    assert_eq!(stored, None);
    assert_eq!(created.custom_sub_ibadat.as_deref(), Some("Rosario keluarga"));

    // Scheduling always creates the PENDING sign-off alongside the meeting.
    let approval: String =
        sqlx::query_scalar("SELECT status FROM approval WHERE doa_lingkungan_id = $1")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .expect("approval row");
    assert_eq!(approval, StatusApproval::Pending.as_code());
    assert!(!created.approved);
}

#[sqlx::test]
async fn scheduling_for_an_unknown_host_is_rejected(pool: PgPool) {
    let service = DolingService::new(pool.clone());

    let err = service
        .schedule(NewDoling {
            tanggal: Utc::now(),
            tuan_rumah_id: Uuid::new_v4(),
            jenis_ibadat: JenisIbadat::Misa,
            sub_ibadat: None,
            custom_sub_ibadat: None,
            tema_ibadat: None,
        })
        .await
        .expect_err("unknown host");
    assert!(matches!(err, DolingError::Validation(_)), "{:?}", err);

    let meetings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doa_lingkungan")
        .fetch_one(&pool)
        .await
        .expect("meeting count");
    assert_eq!(meetings, 0);
}

#[sqlx::test]
async fn setting_approval_twice_keeps_a_single_row(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let doling_id = schedule_meeting(&service, host).await;

    service
        .set_approval(doling_id, StatusApproval::Approved)
        .await
        .expect("approve");
    service
        .set_approval(doling_id, StatusApproval::Rejected)
        .await
        .expect("reject");

    let rows: Vec<String> =
        sqlx::query_scalar("SELECT status FROM approval WHERE doa_lingkungan_id = $1")
            .bind(doling_id)
            .fetch_all(&pool)
            .await
            .expect("approval rows");
    assert_eq!(rows, vec![StatusApproval::Rejected.as_code().to_string()]);
}

#[sqlx::test]
async fn deleting_a_meeting_leaves_no_referencing_rows(pool: PgPool) {
    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let kel_a = seed_household(&pool, "Keluarga Santoso").await;
    let doling_id = schedule_meeting(&service, host).await;
    service
        .record_attendance(doling_id, vec![present(host), absent(kel_a)])
        .await
        .expect("batch");

    service.delete(doling_id).await.expect("delete meeting");

    let absensi: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM absensi_doling WHERE doa_lingkungan_id = $1")
            .bind(doling_id)
            .fetch_one(&pool)
            .await
            .expect("absensi count");
    let approvals: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM approval WHERE doa_lingkungan_id = $1")
            .bind(doling_id)
            .fetch_one(&pool)
            .await
            .expect("approval count");
    let meetings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doa_lingkungan WHERE id = $1")
        .bind(doling_id)
        .fetch_one(&pool)
        .await
        .expect("meeting count");
    assert_eq!((absensi, approvals, meetings), (0, 0, 0));

    let err = service.get(doling_id).await.expect_err("gone");
    assert!(matches!(err, DolingError::NotFound(_)), "{:?}", err);
}

#[sqlx::test]
async fn omitted_attendance_count_is_recomputed_from_live_rows(pool: PgPool) {
    use lingkungan_api::services::doling_service::UpdateDolingDetail;

    let service = DolingService::new(pool.clone());
    let host = seed_household(&pool, "Keluarga Hartono").await;
    let kel_a = seed_household(&pool, "Keluarga Santoso").await;
    let doling_id = schedule_meeting(&service, host).await;
    service
        .record_attendance(doling_id, vec![present(host), present(kel_a)])
        .await
        .expect("batch");

    // Drift the cache on purpose, then run a detail update that does not
    // supply the count.
    sqlx::query("UPDATE doa_lingkungan SET jumlah_kk_hadir = 99 WHERE id = $1")
        .bind(doling_id)
        .execute(&pool)
        .await
        .expect("drift");

    let updated = service
        .update_detail(
            doling_id,
            UpdateDolingDetail {
                bapak: Some(4),
                ..Default::default()
            },
        )
        .await
        .expect("detail update");

    assert_eq!(updated.jumlah_kk_hadir, 2);
    assert_eq!(updated.bapak, 4);
    assert_eq!(cached_present_count(&pool, doling_id).await, 2);
}
