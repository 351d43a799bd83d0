// src/services/application_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ApplicationRepository,
    models::application::{
        Application, ApplicationDetail, CreateApplicationPayload, DocumentChecklistPayload,
        UpdateApplicationPayload,
    },
};

// O serviço do agregado. Cada operação de escrita roda dentro de UMA
// transação: ou o agregado inteiro entra/muda/sai, ou nada acontece.
#[derive(Clone)]
pub struct ApplicationService {
    repo: ApplicationRepository,
    pool: PgPool,
}

// Nomes de documentos existentes que NÃO vieram no array do request.
// O array recebido é autoritativo: o que ficou de fora é removido.
// A comparação é case-sensitive, como a chave única no banco.
fn stale_document_names<'a>(
    existing: &'a [String],
    incoming: &[DocumentChecklistPayload],
) -> Vec<&'a str> {
    existing
        .iter()
        .filter(|name| !incoming.iter().any(|doc| doc.name == **name))
        .map(String::as_str)
        .collect()
}

// "APP-" + sufixo único de 13 caracteres hex
fn generate_application_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("APP-{}", &suffix[..13])
}

impl ApplicationService {
    pub fn new(repo: ApplicationRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // Monta o agregado completo a partir da raiz já carregada.
    // O job é resolvido pelo nasabah_id compartilhado, nunca por FK própria.
    async fn assemble(&self, application: Application) -> Result<ApplicationDetail, AppError> {
        let nasabah = self
            .repo
            .find_nasabah(&self.pool, application.nasabah_id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "nasabah {} missing for application {}",
                    application.nasabah_id,
                    application.id
                )
            })?;

        let job = self
            .repo
            .find_job_by_nasabah(&self.pool, application.nasabah_id)
            .await?;
        let documents = self.repo.list_documents(&self.pool, application.id).await?;
        let financing_request = self
            .repo
            .find_financing_request(&self.pool, application.id)
            .await?;

        Ok(ApplicationDetail {
            application,
            nasabah,
            job,
            documents,
            financing_request,
        })
    }

    pub async fn get(&self, id: i64) -> Result<ApplicationDetail, AppError> {
        let application = self
            .repo
            .find_application(&self.pool, id)
            .await?
            .ok_or(AppError::ApplicationNotFound)?;

        self.assemble(application).await
    }

    // Sem paginação nem filtro: limitação conhecida da listagem
    pub async fn list(&self) -> Result<Vec<ApplicationDetail>, AppError> {
        let applications = self.repo.list_applications().await?;

        let mut details = Vec::with_capacity(applications.len());
        for application in applications {
            details.push(self.assemble(application).await?);
        }
        Ok(details)
    }

    // Cria o agregado inteiro numa única transação:
    // nasabah → job → application → documents → financing request.
    // Qualquer falha no meio desfaz tudo (rollback no drop do tx).
    pub async fn create(
        &self,
        payload: &CreateApplicationPayload,
    ) -> Result<ApplicationDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let nasabah = self.repo.insert_nasabah(&mut *tx, &payload.nasabah).await?;

        let job = self
            .repo
            .insert_job(&mut *tx, nasabah.id, &payload.job)
            .await?;

        let no_aplikasi = generate_application_number();
        let tanggal_aplikasi = Utc::now().date_naive();
        let application = self
            .repo
            .insert_application(&mut *tx, nasabah.id, &no_aplikasi, tanggal_aplikasi, payload)
            .await?;

        let mut documents = Vec::with_capacity(payload.documents.len());
        for doc in &payload.documents {
            let inserted = self
                .repo
                .insert_document(
                    &mut *tx,
                    application.id,
                    &doc.name,
                    &doc.status,
                    Some(&doc.file_path),
                )
                .await?;
            documents.push(inserted);
        }

        let financing_request = self
            .repo
            .insert_financing_request(&mut *tx, application.id, &payload.financing_request)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Aplicação {} criada para o nasabah {}",
            application.no_aplikasi,
            nasabah.id
        );

        Ok(ApplicationDetail {
            application,
            nasabah,
            job: Some(job),
            documents,
            financing_request: Some(financing_request),
        })
    }

    // Atualização parcial do agregado: só as seções presentes no payload são
    // tocadas, tudo dentro de uma transação.
    pub async fn update(
        &self,
        id: i64,
        payload: &UpdateApplicationPayload,
    ) -> Result<ApplicationDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let application = self
            .repo
            .find_application(&mut *tx, id)
            .await?
            .ok_or(AppError::ApplicationNotFound)?;

        if let Some(nasabah_payload) = &payload.nasabah {
            self.repo
                .update_nasabah(&mut *tx, application.nasabah_id, nasabah_payload)
                .await?;
        }

        if let Some(job_payload) = &payload.job {
            // Job ausente é um 404 explícito, nunca um panic
            let job = self
                .repo
                .find_job_by_nasabah(&mut *tx, application.nasabah_id)
                .await?
                .ok_or(AppError::JobNotFound)?;
            self.repo.update_job(&mut *tx, job.id, job_payload).await?;
        }

        if payload.has_application_fields() {
            self.repo.update_application(&mut *tx, id, payload).await?;
        }

        // Reconciliação do checklist: upsert do que veio, remoção do que sumiu
        if let Some(docs) = &payload.documents {
            let existing_names: Vec<String> = self
                .repo
                .list_documents(&mut *tx, id)
                .await?
                .into_iter()
                .map(|d| d.dokumen_name)
                .collect();

            for doc in docs {
                self.repo
                    .upsert_document(&mut *tx, id, &doc.name, &doc.status, doc.file_path.as_deref())
                    .await?;
            }

            for stale in stale_document_names(&existing_names, docs) {
                self.repo.delete_document_by_name(&mut *tx, id, stale).await?;
            }
        }

        if let Some(financing_payload) = &payload.financing_request {
            let financing_request = self
                .repo
                .find_financing_request(&mut *tx, id)
                .await?
                .ok_or(AppError::FinancingRequestNotFound)?;
            self.repo
                .update_financing_request(&mut *tx, financing_request.id, financing_payload)
                .await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    // Remove o agregado inteiro, filhos antes dos pais. A aplicação sai antes
    // do nasabah porque applications.nasabah_id referencia nasabahs.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let application = self
            .repo
            .find_application(&mut *tx, id)
            .await?
            .ok_or(AppError::ApplicationNotFound)?;

        self.repo.delete_documents(&mut *tx, id).await?;

        if let Some(financing_request) = self.repo.find_financing_request(&mut *tx, id).await? {
            self.repo
                .delete_financing_request(&mut *tx, financing_request.id)
                .await?;
        }

        if let Some(job) = self
            .repo
            .find_job_by_nasabah(&mut *tx, application.nasabah_id)
            .await?
        {
            self.repo.delete_job(&mut *tx, job.id).await?;
        }

        self.repo.delete_application(&mut *tx, id).await?;
        self.repo.delete_nasabah(&mut *tx, application.nasabah_id).await?;

        tx.commit().await?;

        tracing::info!("🗑️ Aplicação {} removida com todo o agregado", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, status: &str) -> DocumentChecklistPayload {
        DocumentChecklistPayload {
            name: name.into(),
            status: status.into(),
            file_path: None,
        }
    }

    #[test]
    fn reconciliation_removes_names_absent_from_the_request() {
        let existing = vec!["KTP".to_string(), "SLIP GAJI".to_string()];
        let incoming = vec![doc("KTP", "3")];

        let stale = stale_document_names(&existing, &incoming);
        assert_eq!(stale, vec!["SLIP GAJI"]);
    }

    #[test]
    fn reconciliation_keeps_everything_when_all_names_come_back() {
        let existing = vec!["KTP".to_string(), "SLIP GAJI".to_string()];
        let incoming = vec![doc("SLIP GAJI", "1"), doc("KTP", "2")];

        assert!(stale_document_names(&existing, &incoming).is_empty());
    }

    #[test]
    fn reconciliation_with_empty_request_drops_all_documents() {
        let existing = vec!["KTP".to_string(), "NPWP".to_string()];
        let incoming: Vec<DocumentChecklistPayload> = vec![];

        let stale = stale_document_names(&existing, &incoming);
        assert_eq!(stale, vec!["KTP", "NPWP"]);
    }

    #[test]
    fn reconciliation_ignores_brand_new_names() {
        // Nomes novos são tratados pelo upsert; aqui só interessa o que sai
        let existing = vec!["KTP".to_string()];
        let incoming = vec![doc("KTP", "1"), doc("NPWP", "1")];

        assert!(stale_document_names(&existing, &incoming).is_empty());
    }

    #[test]
    fn reconciliation_is_case_sensitive() {
        let existing = vec!["KTP".to_string()];
        let incoming = vec![doc("ktp", "1")];

        assert_eq!(stale_document_names(&existing, &incoming), vec!["KTP"]);
    }

    #[test]
    fn application_numbers_have_the_expected_shape() {
        let number = generate_application_number();
        assert!(number.starts_with("APP-"));
        assert_eq!(number.len(), "APP-".len() + 13);
    }

    #[test]
    fn application_numbers_are_unique_across_generations() {
        let first = generate_application_number();
        let second = generate_application_number();
        assert_ne!(first, second);
    }
}
