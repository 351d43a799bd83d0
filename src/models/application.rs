// src/models/application.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// --- ENUMS ---

// Mapeia o CREATE TYPE jenis_kelamin do banco.
// No formato de entrada/saída os valores continuam "L" e "P".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "jenis_kelamin")]
pub enum Gender {
    #[sqlx(rename = "L")]
    #[serde(rename = "L")]
    Male,
    #[sqlx(rename = "P")]
    #[serde(rename = "P")]
    Female,
}

// Mapeia o CREATE TYPE status_perkawinan do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_perkawinan")]
pub enum MaritalStatus {
    Single,
    Married,
    Widowed,
    Divorced,
}

// --- LINHAS DO BANCO ---

// Perfil do solicitante
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Nasabah {
    pub id: i64,
    pub nama: String,
    pub nik: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: NaiveDate,
    pub jenis_kelamin: Gender,
    pub alamat_lengkap: String,
    pub kelurahan: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
    pub kode_pos: String,
    pub no_rekening_tabungan: String,
    pub no_hp: String,
    pub email: String,
    pub ktp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Registro de emprego (1:1 com o nasabah; a aplicação chega nele
// pelo nasabah_id compartilhado)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Job {
    pub id: i64,
    pub nasabah_id: i64,
    pub nama_instansi: String,
    pub no_instansi: String,
    pub golongan_jabatan: String,
    pub nip: String,
    pub masa_kerja_hari: i32,
    pub masa_kerja_bulan: i32,
    pub masa_kerja_tahun: i32,
    pub nama_atasan: String,
    pub alamat_kantor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// A raiz do agregado
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Application {
    pub id: i64,
    pub nasabah_id: i64,
    pub no_aplikasi: String,
    pub tanggal_aplikasi: NaiveDate,
    pub nama_ao: String,
    pub jumlah_penghasilan: Option<Decimal>,
    pub jumlah_permohonan: Option<Decimal>,
    pub jumlah_penghasilan_lainnya: Option<Decimal>,
    pub jangka_waktu: Option<i32>,
    pub maksimal_pembiayaan: Option<Decimal>,
    pub tujuan_pembiayaan: Option<String>,
    pub status_perkawinan: Option<MaritalStatus>,
    pub upload_npwp: Option<String>,
    pub slip_gaji: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item do checklist de documentos.
// checklist_status é um código enumerado ("1", "2", "3"...), não booleano.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Document {
    pub id: i64,
    pub application_id: i64,
    pub dokumen_name: String,
    pub checklist_status: String,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FinancingRequest {
    pub id: i64,
    pub application_id: i64,
    pub total_angsuran_biaya: Decimal,
    pub jangka_waktu: i32,
    pub cabang: String,
    pub capem: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O agregado completo, do jeito que a API devolve: os campos da aplicação
// no nível de cima e as associações como chaves aninhadas.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub nasabah: Nasabah,
    pub job: Option<Job>,
    pub documents: Vec<Document>,
    pub financing_request: Option<FinancingRequest>,
}

// ---
// Validação customizada para valores monetários
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("The amount must be at least 0.".into());
        return Err(err);
    }
    Ok(())
}

// --- PAYLOADS DE CRIAÇÃO ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NasabahPayload {
    #[validate(length(min = 1, max = 255, message = "The nama field is required."))]
    pub nama: String,

    #[validate(length(min = 1, max = 20, message = "The nik field is required."))]
    pub nik: String,

    #[validate(length(min = 1, max = 255, message = "The tempat lahir field is required."))]
    pub tempat_lahir: String,

    #[schema(value_type = String, format = Date, example = "1990-01-01")]
    pub tanggal_lahir: NaiveDate,

    #[schema(example = "L")]
    pub jenis_kelamin: Gender,

    #[validate(length(min = 1, max = 255, message = "The alamat lengkap field is required."))]
    pub alamat_lengkap: String,

    #[validate(length(min = 1, max = 255, message = "The kelurahan field is required."))]
    pub kelurahan: String,

    #[validate(length(min = 1, max = 255, message = "The kecamatan field is required."))]
    pub kecamatan: String,

    #[validate(length(min = 1, max = 255, message = "The kabupaten field is required."))]
    pub kabupaten: String,

    #[validate(length(min = 1, max = 255, message = "The provinsi field is required."))]
    pub provinsi: String,

    #[validate(length(min = 1, max = 10, message = "The kode pos field is required."))]
    pub kode_pos: String,

    #[validate(length(min = 1, max = 20, message = "The no rekening tabungan field is required."))]
    pub no_rekening_tabungan: String,

    #[validate(length(min = 1, max = 15, message = "The no hp field is required."))]
    pub no_hp: String,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    // Referência do arquivo do KTP já enviada pelo cliente
    #[validate(length(min = 1, message = "The ktp field is required."))]
    pub ktp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct JobPayload {
    #[validate(length(min = 1, max = 255, message = "The nama instansi field is required."))]
    pub nama_instansi: String,

    #[validate(length(min = 1, max = 50, message = "The no instansi field is required."))]
    pub no_instansi: String,

    #[validate(length(min = 1, max = 50, message = "The golongan jabatan field is required."))]
    pub golongan_jabatan: String,

    #[validate(length(min = 1, max = 50, message = "The nip field is required."))]
    pub nip: String,

    #[validate(range(min = 0, message = "The masa kerja hari must be at least 0."))]
    pub masa_kerja_hari: i32,

    #[validate(range(min = 0, message = "The masa kerja bulan must be at least 0."))]
    pub masa_kerja_bulan: i32,

    #[validate(range(min = 0, message = "The masa kerja tahun must be at least 0."))]
    pub masa_kerja_tahun: i32,

    #[validate(length(min = 1, max = 255, message = "The nama atasan field is required."))]
    pub nama_atasan: String,

    #[validate(length(min = 1, max = 255, message = "The alamat kantor field is required."))]
    pub alamat_kantor: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct DocumentPayload {
    #[validate(length(min = 1, message = "The document name field is required."))]
    pub name: String,

    #[validate(length(min = 1, message = "The document status field is required."))]
    pub status: String,

    #[validate(length(min = 1, max = 255, message = "The document file path field is required."))]
    pub file_path: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FinancingRequestPayload {
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 1500000.0)]
    pub total_angsuran_biaya: Decimal,

    #[validate(range(min = 1, message = "The jangka waktu must be at least 1."))]
    pub jangka_waktu: i32,

    #[validate(length(min = 1, max = 255, message = "The cabang field is required."))]
    pub cabang: String,

    #[validate(length(min = 1, max = 255, message = "The capem field is required."))]
    pub capem: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApplicationPayload {
    #[validate(nested)]
    pub nasabah: NasabahPayload,

    #[validate(nested)]
    pub job: JobPayload,

    #[validate(length(min = 1, max = 255, message = "The nama ao field is required."))]
    pub nama_ao: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 7500000.0)]
    pub jumlah_penghasilan: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 50000000.0)]
    pub jumlah_permohonan: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>, example = 1000000.0)]
    pub jumlah_penghasilan_lainnya: Option<Decimal>,

    #[validate(range(min = 1, message = "The jangka waktu must be at least 1."))]
    pub jangka_waktu: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 60000000.0)]
    pub maksimal_pembiayaan: Decimal,

    #[validate(length(min = 1, max = 255, message = "The tujuan pembiayaan field is required."))]
    pub tujuan_pembiayaan: String,

    #[schema(example = "Married")]
    pub status_perkawinan: MaritalStatus,

    #[validate(length(min = 1, message = "The upload npwp field is required."))]
    pub upload_npwp: String,

    #[validate(length(min = 1, message = "The slip gaji field is required."))]
    pub slip_gaji: String,

    #[validate(length(min = 1, message = "At least one document is required."), nested)]
    pub documents: Vec<DocumentPayload>,

    #[validate(nested)]
    pub financing_request: FinancingRequestPayload,
}

// --- PAYLOADS DE ATUALIZAÇÃO (tudo opcional, merge só do que veio) ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateNasabahPayload {
    #[validate(length(min = 1, max = 255, message = "The nama field is required."))]
    pub nama: Option<String>,

    #[validate(length(min = 1, max = 20, message = "The nik field is required."))]
    pub nik: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The tempat lahir field is required."))]
    pub tempat_lahir: Option<String>,

    #[schema(value_type = Option<String>, format = Date)]
    pub tanggal_lahir: Option<NaiveDate>,

    pub jenis_kelamin: Option<Gender>,

    #[validate(length(min = 1, max = 255, message = "The alamat lengkap field is required."))]
    pub alamat_lengkap: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The kelurahan field is required."))]
    pub kelurahan: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The kecamatan field is required."))]
    pub kecamatan: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The kabupaten field is required."))]
    pub kabupaten: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The provinsi field is required."))]
    pub provinsi: Option<String>,

    #[validate(length(min = 1, max = 10, message = "The kode pos field is required."))]
    pub kode_pos: Option<String>,

    #[validate(length(min = 1, max = 20, message = "The no rekening tabungan field is required."))]
    pub no_rekening_tabungan: Option<String>,

    #[validate(length(min = 1, max = 15, message = "The no hp field is required."))]
    pub no_hp: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "The ktp field is required."))]
    pub ktp: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 255, message = "The nama instansi field is required."))]
    pub nama_instansi: Option<String>,

    #[validate(length(min = 1, max = 50, message = "The no instansi field is required."))]
    pub no_instansi: Option<String>,

    #[validate(length(min = 1, max = 50, message = "The golongan jabatan field is required."))]
    pub golongan_jabatan: Option<String>,

    #[validate(length(min = 1, max = 50, message = "The nip field is required."))]
    pub nip: Option<String>,

    #[validate(range(min = 0, message = "The masa kerja hari must be at least 0."))]
    pub masa_kerja_hari: Option<i32>,

    #[validate(range(min = 0, message = "The masa kerja bulan must be at least 0."))]
    pub masa_kerja_bulan: Option<i32>,

    #[validate(range(min = 0, message = "The masa kerja tahun must be at least 0."))]
    pub masa_kerja_tahun: Option<i32>,

    #[validate(length(min = 1, max = 255, message = "The nama atasan field is required."))]
    pub nama_atasan: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The alamat kantor field is required."))]
    pub alamat_kantor: Option<String>,
}

// No update o file_path é opcional: o checklist pode ser marcado
// sem reenviar o arquivo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DocumentChecklistPayload {
    #[validate(length(min = 1, message = "The document name field is required."))]
    pub name: String,

    #[validate(length(min = 1, message = "The document status field is required."))]
    pub status: String,

    #[validate(length(min = 1, max = 255, message = "The document file path field is required."))]
    pub file_path: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFinancingRequestPayload {
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub total_angsuran_biaya: Option<Decimal>,

    #[validate(range(min = 1, message = "The jangka waktu must be at least 1."))]
    pub jangka_waktu: Option<i32>,

    #[validate(length(min = 1, max = 255, message = "The cabang field is required."))]
    pub cabang: Option<String>,

    #[validate(length(min = 1, max = 255, message = "The capem field is required."))]
    pub capem: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateApplicationPayload {
    #[validate(nested)]
    pub nasabah: Option<UpdateNasabahPayload>,

    #[validate(nested)]
    pub job: Option<UpdateJobPayload>,

    #[validate(length(min = 1, max = 255, message = "The nama ao field is required."))]
    pub nama_ao: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub jumlah_penghasilan: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub jumlah_permohonan: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub jumlah_penghasilan_lainnya: Option<Decimal>,

    #[validate(range(min = 1, message = "The jangka waktu must be at least 1."))]
    pub jangka_waktu: Option<i32>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub maksimal_pembiayaan: Option<Decimal>,

    #[validate(length(min = 1, max = 255, message = "The tujuan pembiayaan field is required."))]
    pub tujuan_pembiayaan: Option<String>,

    pub status_perkawinan: Option<MaritalStatus>,

    #[validate(length(min = 1, message = "The upload npwp field is required."))]
    pub upload_npwp: Option<String>,

    #[validate(length(min = 1, message = "The slip gaji field is required."))]
    pub slip_gaji: Option<String>,

    #[validate(nested)]
    pub documents: Option<Vec<DocumentChecklistPayload>>,

    #[validate(nested)]
    pub financing_request: Option<UpdateFinancingRequestPayload>,
}

impl UpdateApplicationPayload {
    // Diz se algum campo escalar da própria aplicação veio no request.
    // O UPDATE só roda (e só mexe no updated_at) se houver algo a gravar.
    pub fn has_application_fields(&self) -> bool {
        self.nama_ao.is_some()
            || self.jumlah_penghasilan.is_some()
            || self.jumlah_permohonan.is_some()
            || self.jumlah_penghasilan_lainnya.is_some()
            || self.jangka_waktu.is_some()
            || self.maksimal_pembiayaan.is_some()
            || self.tujuan_pembiayaan.is_some()
            || self.status_perkawinan.is_some()
            || self.upload_npwp.is_some()
            || self.slip_gaji.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationErrorsKind;

    fn sample_nasabah() -> NasabahPayload {
        NasabahPayload {
            nama: "John Doe".into(),
            nik: "1234567890123456".into(),
            tempat_lahir: "Bandung".into(),
            tanggal_lahir: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            jenis_kelamin: Gender::Male,
            alamat_lengkap: "Jl. Kebon Jati".into(),
            kelurahan: "Kebon Jati".into(),
            kecamatan: "Kota Bandung".into(),
            kabupaten: "Kota Bandung".into(),
            provinsi: "Jawa Barat".into(),
            kode_pos: "40111".into(),
            no_rekening_tabungan: "1234567890".into(),
            no_hp: "08123456789".into(),
            email: "john@example.com".into(),
            ktp: "uploads/ktp/john.jpg".into(),
        }
    }

    fn sample_payload() -> CreateApplicationPayload {
        CreateApplicationPayload {
            nasabah: sample_nasabah(),
            job: JobPayload {
                nama_instansi: "Dinas Pendidikan".into(),
                no_instansi: "021-555".into(),
                golongan_jabatan: "III/a".into(),
                nip: "197001011990011001".into(),
                masa_kerja_hari: 10,
                masa_kerja_bulan: 4,
                masa_kerja_tahun: 8,
                nama_atasan: "Budi Santoso".into(),
                alamat_kantor: "Jl. Merdeka 12".into(),
            },
            nama_ao: "AO Test".into(),
            jumlah_penghasilan: Decimal::new(7_500_000, 0),
            jumlah_permohonan: Decimal::new(50_000_000, 0),
            jumlah_penghasilan_lainnya: None,
            jangka_waktu: 24,
            maksimal_pembiayaan: Decimal::new(60_000_000, 0),
            tujuan_pembiayaan: "Renovasi rumah".into(),
            status_perkawinan: MaritalStatus::Married,
            upload_npwp: "uploads/npwp/john.pdf".into(),
            slip_gaji: "uploads/slip/john.pdf".into(),
            documents: vec![
                DocumentPayload {
                    name: "KTP".into(),
                    status: "2".into(),
                    file_path: "uploads/docs/ktp.jpg".into(),
                },
                DocumentPayload {
                    name: "SLIP GAJI".into(),
                    status: "1".into(),
                    file_path: "uploads/docs/slip.pdf".into(),
                },
            ],
            financing_request: FinancingRequestPayload {
                total_angsuran_biaya: Decimal::new(2_500_000, 0),
                jangka_waktu: 24,
                cabang: "Bandung".into(),
                capem: "Cicendo".into(),
            },
        }
    }

    #[test]
    fn valid_create_payload_passes() {
        assert!(sample_payload().validate().is_ok());
    }

    #[test]
    fn missing_nasabah_name_fails_on_that_field() {
        let mut payload = sample_payload();
        payload.nasabah.nama = String::new();

        let errors = payload.validate().unwrap_err();
        match errors.errors().get("nasabah") {
            Some(ValidationErrorsKind::Struct(nested)) => {
                assert!(nested.errors().contains_key("nama"));
            }
            other => panic!("expected nested nasabah errors, got {other:?}"),
        }
    }

    #[test]
    fn zero_tenor_is_rejected() {
        let mut payload = sample_payload();
        payload.jangka_waktu = 0;

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("jangka_waktu"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut payload = sample_payload();
        payload.jumlah_permohonan = Decimal::new(-1, 0);

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("jumlah_permohonan"));
    }

    #[test]
    fn empty_document_list_is_rejected() {
        let mut payload = sample_payload();
        payload.documents.clear();

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("documents"));
    }

    #[test]
    fn gender_uses_the_l_p_wire_format() {
        assert_eq!(
            serde_json::from_str::<Gender>("\"L\"").unwrap(),
            Gender::Male
        );
        assert_eq!(
            serde_json::from_str::<Gender>("\"P\"").unwrap(),
            Gender::Female
        );
        assert!(serde_json::from_str::<Gender>("\"M\"").is_err());
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"P\"");
    }

    #[test]
    fn marital_status_rejects_unknown_values() {
        assert!(serde_json::from_str::<MaritalStatus>("\"Married\"").is_ok());
        assert!(serde_json::from_str::<MaritalStatus>("\"Widow\"").is_err());
    }

    #[test]
    fn update_payload_reports_scalar_presence() {
        let empty = UpdateApplicationPayload {
            nasabah: None,
            job: None,
            nama_ao: None,
            jumlah_penghasilan: None,
            jumlah_permohonan: None,
            jumlah_penghasilan_lainnya: None,
            jangka_waktu: None,
            maksimal_pembiayaan: None,
            tujuan_pembiayaan: None,
            status_perkawinan: None,
            upload_npwp: None,
            slip_gaji: None,
            documents: None,
            financing_request: None,
        };
        assert!(!empty.has_application_fields());

        let with_ao = UpdateApplicationPayload {
            nama_ao: Some("AO Updated".into()),
            ..empty
        };
        assert!(with_ao.has_application_fields());
    }
}
