// src/db/application_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::application::{
        Application, CreateApplicationPayload, Document, FinancingRequest, FinancingRequestPayload,
        Job, JobPayload, Nasabah, NasabahPayload, UpdateApplicationPayload,
        UpdateFinancingRequestPayload, UpdateJobPayload, UpdateNasabahPayload,
    },
};

// Repositório do agregado de aplicações. Cada método roda UM statement e
// recebe o executor de fora: assim o serviço decide se a chamada entra numa
// transação (`&mut *tx`) ou vai direto no pool.
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

// Violação de unicidade nas tabelas do agregado → 409 com mensagem legível
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("nasabahs_nik_key") => "This NIK is already registered".to_string(),
                Some("nasabahs_no_hp_key") => "This phone number is already registered".to_string(),
                Some("nasabahs_email_key") => "This email is already registered".to_string(),
                Some("applications_no_aplikasi_key") => {
                    "This application number is already in use".to_string()
                }
                Some("documents_application_id_dokumen_name_key") => {
                    "Duplicate document name for this application".to_string()
                }
                Some(constraint) => format!("Duplicate value for {constraint}"),
                None => "Duplicate value".to_string(),
            };
            return AppError::UniqueConstraintViolation(message);
        }
    }
    e.into()
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  NASABAH
    // =========================================================================

    pub async fn insert_nasabah<'e, E>(
        &self,
        executor: E,
        payload: &NasabahPayload,
    ) -> Result<Nasabah, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Nasabah>(
            r#"
            INSERT INTO nasabahs (
                nama, nik, tempat_lahir, tanggal_lahir, jenis_kelamin,
                alamat_lengkap, kelurahan, kecamatan, kabupaten, provinsi,
                kode_pos, no_rekening_tabungan, no_hp, email, ktp
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&payload.nama)
        .bind(&payload.nik)
        .bind(&payload.tempat_lahir)
        .bind(payload.tanggal_lahir)
        .bind(payload.jenis_kelamin)
        .bind(&payload.alamat_lengkap)
        .bind(&payload.kelurahan)
        .bind(&payload.kecamatan)
        .bind(&payload.kabupaten)
        .bind(&payload.provinsi)
        .bind(&payload.kode_pos)
        .bind(&payload.no_rekening_tabungan)
        .bind(&payload.no_hp)
        .bind(&payload.email)
        .bind(&payload.ktp)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn find_nasabah<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<Option<Nasabah>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let nasabah = sqlx::query_as::<_, Nasabah>("SELECT * FROM nasabahs WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(nasabah)
    }

    pub async fn update_nasabah<'e, E>(
        &self,
        executor: E,
        id: i64,
        payload: &UpdateNasabahPayload,
    ) -> Result<Nasabah, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Nasabah>(
            r#"
            UPDATE nasabahs SET
                nama = COALESCE($2, nama),
                nik = COALESCE($3, nik),
                tempat_lahir = COALESCE($4, tempat_lahir),
                tanggal_lahir = COALESCE($5, tanggal_lahir),
                jenis_kelamin = COALESCE($6, jenis_kelamin),
                alamat_lengkap = COALESCE($7, alamat_lengkap),
                kelurahan = COALESCE($8, kelurahan),
                kecamatan = COALESCE($9, kecamatan),
                kabupaten = COALESCE($10, kabupaten),
                provinsi = COALESCE($11, provinsi),
                kode_pos = COALESCE($12, kode_pos),
                no_rekening_tabungan = COALESCE($13, no_rekening_tabungan),
                no_hp = COALESCE($14, no_hp),
                email = COALESCE($15, email),
                ktp = COALESCE($16, ktp),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nama.as_deref())
        .bind(payload.nik.as_deref())
        .bind(payload.tempat_lahir.as_deref())
        .bind(payload.tanggal_lahir)
        .bind(payload.jenis_kelamin)
        .bind(payload.alamat_lengkap.as_deref())
        .bind(payload.kelurahan.as_deref())
        .bind(payload.kecamatan.as_deref())
        .bind(payload.kabupaten.as_deref())
        .bind(payload.provinsi.as_deref())
        .bind(payload.kode_pos.as_deref())
        .bind(payload.no_rekening_tabungan.as_deref())
        .bind(payload.no_hp.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.ktp.as_deref())
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn delete_nasabah<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM nasabahs WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  JOB
    // =========================================================================

    pub async fn insert_job<'e, E>(
        &self,
        executor: E,
        nasabah_id: i64,
        payload: &JobPayload,
    ) -> Result<Job, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                nasabah_id, nama_instansi, no_instansi, golongan_jabatan, nip,
                masa_kerja_hari, masa_kerja_bulan, masa_kerja_tahun,
                nama_atasan, alamat_kantor
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(nasabah_id)
        .bind(&payload.nama_instansi)
        .bind(&payload.no_instansi)
        .bind(&payload.golongan_jabatan)
        .bind(&payload.nip)
        .bind(payload.masa_kerja_hari)
        .bind(payload.masa_kerja_bulan)
        .bind(payload.masa_kerja_tahun)
        .bind(&payload.nama_atasan)
        .bind(&payload.alamat_kantor)
        .fetch_one(executor)
        .await?;
        Ok(job)
    }

    // O único lugar que sabe que o job da aplicação é resolvido pelo
    // nasabah_id compartilhado. Todos os caminhos de leitura/atualização
    // passam por aqui.
    pub async fn find_job_by_nasabah<'e, E>(
        &self,
        executor: E,
        nasabah_id: i64,
    ) -> Result<Option<Job>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE nasabah_id = $1")
            .bind(nasabah_id)
            .fetch_optional(executor)
            .await?;
        Ok(job)
    }

    pub async fn update_job<'e, E>(
        &self,
        executor: E,
        id: i64,
        payload: &UpdateJobPayload,
    ) -> Result<Job, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                nama_instansi = COALESCE($2, nama_instansi),
                no_instansi = COALESCE($3, no_instansi),
                golongan_jabatan = COALESCE($4, golongan_jabatan),
                nip = COALESCE($5, nip),
                masa_kerja_hari = COALESCE($6, masa_kerja_hari),
                masa_kerja_bulan = COALESCE($7, masa_kerja_bulan),
                masa_kerja_tahun = COALESCE($8, masa_kerja_tahun),
                nama_atasan = COALESCE($9, nama_atasan),
                alamat_kantor = COALESCE($10, alamat_kantor),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nama_instansi.as_deref())
        .bind(payload.no_instansi.as_deref())
        .bind(payload.golongan_jabatan.as_deref())
        .bind(payload.nip.as_deref())
        .bind(payload.masa_kerja_hari)
        .bind(payload.masa_kerja_bulan)
        .bind(payload.masa_kerja_tahun)
        .bind(payload.nama_atasan.as_deref())
        .bind(payload.alamat_kantor.as_deref())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::JobNotFound)
    }

    pub async fn delete_job<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  APPLICATION
    // =========================================================================

    pub async fn insert_application<'e, E>(
        &self,
        executor: E,
        nasabah_id: i64,
        no_aplikasi: &str,
        tanggal_aplikasi: NaiveDate,
        payload: &CreateApplicationPayload,
    ) -> Result<Application, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (
                nasabah_id, no_aplikasi, tanggal_aplikasi, nama_ao,
                jumlah_penghasilan, jumlah_permohonan, jumlah_penghasilan_lainnya,
                jangka_waktu, maksimal_pembiayaan, tujuan_pembiayaan,
                status_perkawinan, upload_npwp, slip_gaji
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(nasabah_id)
        .bind(no_aplikasi)
        .bind(tanggal_aplikasi)
        .bind(&payload.nama_ao)
        .bind(payload.jumlah_penghasilan)
        .bind(payload.jumlah_permohonan)
        .bind(payload.jumlah_penghasilan_lainnya)
        .bind(payload.jangka_waktu)
        .bind(payload.maksimal_pembiayaan)
        .bind(&payload.tujuan_pembiayaan)
        .bind(payload.status_perkawinan)
        .bind(&payload.upload_npwp)
        .bind(&payload.slip_gaji)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn find_application<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<Option<Application>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let application =
            sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(application)
    }

    // Sem filtro e sem paginação: limitação conhecida
    pub async fn list_applications(&self) -> Result<Vec<Application>, AppError> {
        let applications =
            sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(applications)
    }

    // Merge só dos campos presentes; campos ausentes ficam como estão
    pub async fn update_application<'e, E>(
        &self,
        executor: E,
        id: i64,
        payload: &UpdateApplicationPayload,
    ) -> Result<Application, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications SET
                nama_ao = COALESCE($2, nama_ao),
                jumlah_penghasilan = COALESCE($3, jumlah_penghasilan),
                jumlah_permohonan = COALESCE($4, jumlah_permohonan),
                jumlah_penghasilan_lainnya = COALESCE($5, jumlah_penghasilan_lainnya),
                jangka_waktu = COALESCE($6, jangka_waktu),
                maksimal_pembiayaan = COALESCE($7, maksimal_pembiayaan),
                tujuan_pembiayaan = COALESCE($8, tujuan_pembiayaan),
                status_perkawinan = COALESCE($9, status_perkawinan),
                upload_npwp = COALESCE($10, upload_npwp),
                slip_gaji = COALESCE($11, slip_gaji),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nama_ao.as_deref())
        .bind(payload.jumlah_penghasilan)
        .bind(payload.jumlah_permohonan)
        .bind(payload.jumlah_penghasilan_lainnya)
        .bind(payload.jangka_waktu)
        .bind(payload.maksimal_pembiayaan)
        .bind(payload.tujuan_pembiayaan.as_deref())
        .bind(payload.status_perkawinan)
        .bind(payload.upload_npwp.as_deref())
        .bind(payload.slip_gaji.as_deref())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ApplicationNotFound)
    }

    pub async fn delete_application<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  DOCUMENTS
    // =========================================================================

    pub async fn insert_document<'e, E>(
        &self,
        executor: E,
        application_id: i64,
        name: &str,
        status: &str,
        file_path: Option<&str>,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (application_id, dokumen_name, checklist_status, file_path)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(name)
        .bind(status)
        .bind(file_path)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn list_documents<'e, E>(
        &self,
        executor: E,
        application_id: i64,
    ) -> Result<Vec<Document>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let documents = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE application_id = $1 ORDER BY id ASC",
        )
        .bind(application_id)
        .fetch_all(executor)
        .await?;
        Ok(documents)
    }

    // Upsert pela chave (application_id, dokumen_name): atualiza o status do
    // checklist se o documento já existe, senão insere.
    pub async fn upsert_document<'e, E>(
        &self,
        executor: E,
        application_id: i64,
        name: &str,
        status: &str,
        file_path: Option<&str>,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (application_id, dokumen_name, checklist_status, file_path)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (application_id, dokumen_name) DO UPDATE SET
                checklist_status = EXCLUDED.checklist_status,
                file_path = COALESCE(EXCLUDED.file_path, documents.file_path),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(name)
        .bind(status)
        .bind(file_path)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn delete_document_by_name<'e, E>(
        &self,
        executor: E,
        application_id: i64,
        name: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM documents WHERE application_id = $1 AND dokumen_name = $2")
            .bind(application_id)
            .bind(name)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_documents<'e, E>(
        &self,
        executor: E,
        application_id: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM documents WHERE application_id = $1")
            .bind(application_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  FINANCING REQUEST
    // =========================================================================

    pub async fn insert_financing_request<'e, E>(
        &self,
        executor: E,
        application_id: i64,
        payload: &FinancingRequestPayload,
    ) -> Result<FinancingRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let financing_request = sqlx::query_as::<_, FinancingRequest>(
            r#"
            INSERT INTO financing_requests (
                application_id, total_angsuran_biaya, jangka_waktu, cabang, capem
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(payload.total_angsuran_biaya)
        .bind(payload.jangka_waktu)
        .bind(&payload.cabang)
        .bind(&payload.capem)
        .fetch_one(executor)
        .await?;
        Ok(financing_request)
    }

    pub async fn find_financing_request<'e, E>(
        &self,
        executor: E,
        application_id: i64,
    ) -> Result<Option<FinancingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let financing_request = sqlx::query_as::<_, FinancingRequest>(
            "SELECT * FROM financing_requests WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_optional(executor)
        .await?;
        Ok(financing_request)
    }

    pub async fn update_financing_request<'e, E>(
        &self,
        executor: E,
        id: i64,
        payload: &UpdateFinancingRequestPayload,
    ) -> Result<FinancingRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, FinancingRequest>(
            r#"
            UPDATE financing_requests SET
                total_angsuran_biaya = COALESCE($2, total_angsuran_biaya),
                jangka_waktu = COALESCE($3, jangka_waktu),
                cabang = COALESCE($4, cabang),
                capem = COALESCE($5, capem),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.total_angsuran_biaya)
        .bind(payload.jangka_waktu)
        .bind(payload.cabang.as_deref())
        .bind(payload.capem.as_deref())
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::FinancingRequestNotFound)
    }

    pub async fn delete_financing_request<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM financing_requests WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
