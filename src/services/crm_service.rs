// src/services/crm_service.rs
//
// O fluxo de conversão lead -> membro e as operações de CRM que o cercam.
// As etapas 1-3 da conversão são "duras" (abortam tudo); as etapas 4-5 são
// "suaves" (melhor esforço: logam e seguem). Depois que conta + perfil
// existem, a operação é considerada bem-sucedida do ponto de vista do
// chamador, mesmo que a contabilidade secundária atrase ou falhe.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{decode_row, Filter, RemoteDataService, Table},
    models::{
        crm::{FollowUpRecord, FollowUpStatus, FollowUpType, FunnelStage, Lead, LeadStatus, NewFollowUp},
        members::{Member, MembershipStatus, NewMemberData},
    },
};

#[derive(Clone)]
pub struct CrmService {
    remote: Arc<dyn RemoteDataService>,
}

impl CrmService {
    pub fn new(remote: Arc<dyn RemoteDataService>) -> Self {
        Self { remote }
    }

    // =========================================================================
    //  LEADS (CRUD usado pela API)
    // =========================================================================

    pub async fn list_leads(&self, branch_id: Uuid) -> Result<Vec<Lead>, AppError> {
        let rows = self
            .remote
            .fetch_all(
                Table::Leads,
                &Filter::new().eq("branch_id", json!(branch_id)),
            )
            .await?;
        rows.into_iter().map(decode_row).collect()
    }

    pub async fn create_lead(
        &self,
        branch_id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Lead, AppError> {
        let row = json!({
            "branch_id": branch_id,
            "name": name,
            "email": email,
            "phone": phone,
            "notes": notes,
            "status": LeadStatus::New,
            "funnel_stage": FunnelStage::Cold,
        });
        let inserted = self.remote.insert(Table::Leads, row).await?;
        decode_row(inserted)
    }

    // =========================================================================
    //  CONVERSÃO LEAD -> MEMBRO
    // =========================================================================

    // Sem chave de idempotência e sem lock: duas chamadas simultâneas para
    // o mesmo lead podem gerar duas contas. Comportamento conhecido,
    // fixado pelos testes de integração.
    pub async fn convert_lead_to_member(
        &self,
        lead_id: Uuid,
        data: NewMemberData,
        converted_by: &str,
    ) -> Result<Member, AppError> {
        // 1. Busca o lead. Ausência OU falha da busca abortam sem nenhum
        //    efeito colateral.
        let lead = self.fetch_lead(lead_id).await?;

        // 2. Cria a conta de acesso (papel member, filial do lead).
        //    Senha fornecida ou gerada aleatoriamente.
        let password = data
            .password
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let metadata = json!({
            "role": "member",
            "branch_id": lead.branch_id,
            "full_name": data.full_name,
        });
        let account_id = self
            .remote
            .create_account(&data.email, &password, metadata)
            .await
            .map_err(|e| {
                tracing::error!("Conversão do lead {}: falha ao criar conta: {}", lead_id, e);
                AppError::AccountCreationFailed
            })?;

        // 3. Grava o perfil de membro com o id da conta nova.
        //    Se falhar aqui, a conta criada acima fica órfã — não há
        //    compensação. Risco aceito e fixado pelos testes.
        let stamp = Utc::now();
        let member_row = json!({
            "id": account_id,
            "branch_id": lead.branch_id,
            "lead_id": lead.id,
            "full_name": data.full_name,
            "email": data.email,
            "phone": data.phone.clone().or_else(|| lead.phone.clone()),
            "membership_plan_id": data.membership_plan_id,
            "membership_start": data.membership_start,
            "membership_end": data.membership_end,
            "membership_status": data.membership_status.unwrap_or(MembershipStatus::Active),
            "address": data.address,
            "emergency_contact": data.emergency_contact,
            "notes": data.notes.clone().or_else(|| lead.notes.clone()),
            "status": "active",
        });
        let inserted = self
            .remote
            .insert(Table::Members, member_row)
            .await
            .map_err(|e| {
                tracing::error!("Conversão do lead {}: falha ao gravar perfil: {}", lead_id, e);
                AppError::ProfileUpdateFailed
            })?;
        let member: Member = decode_row(inserted)?;

        // 4. Marca o lead como convertido (melhor esforço). O membro já
        //    existe; falha aqui não desfaz nada.
        let note = append_note(
            lead.notes.as_deref(),
            &format!("Convertido em {}", stamp.to_rfc3339()),
        );
        let lead_patch = json!({
            "status": LeadStatus::Converted,
            "conversion_date": stamp,
            "conversion_value": data.membership_plan_id,
            "notes": note,
            "updated_at": stamp,
        });
        if let Err(e) = self
            .remote
            .update(Table::Leads, lead_patch, &Filter::by_id(lead.id))
            .await
        {
            tracing::warn!("Conversão do lead {}: status não atualizado: {}", lead_id, e);
        }

        // 5. Registro de auditoria na trilha de follow-ups (melhor esforço).
        let audit = json!({
            "lead_id": lead.id,
            "follow_up_type": FollowUpType::Meeting,
            "content": format!("Lead convertido em membro: {}", data.full_name),
            "sent_by": converted_by,
            "sent_at": stamp,
            "status": FollowUpStatus::Sent,
            "response": "Membership activated",
        });
        if let Err(e) = self.remote.insert(Table::FollowUps, audit).await {
            tracing::warn!("Conversão do lead {}: auditoria não gravada: {}", lead_id, e);
        }

        // 6. O perfil gravado, já no formato de domínio, é o resultado.
        tracing::info!("✅ Lead {} convertido no membro {}", lead_id, member.id);
        Ok(member)
    }

    // =========================================================================
    //  FOLLOW-UPS
    // =========================================================================

    // O sucesso da operação é o insert do follow-up; tarefa-satélite e
    // datas do lead são disparos de melhor esforço.
    pub async fn schedule_follow_up(
        &self,
        lead_id: Uuid,
        data: NewFollowUp,
    ) -> Result<FollowUpRecord, AppError> {
        let lead = self.fetch_lead(lead_id).await?;
        let now = Utc::now();

        let row = json!({
            "lead_id": lead.id,
            "follow_up_type": data.follow_up_type,
            "content": data.content,
            "sent_by": data.sent_by,
            "sent_at": now,
            "status": FollowUpStatus::Scheduled,
        });
        let inserted = self.remote.insert(Table::FollowUps, row).await?;
        let record: FollowUpRecord = decode_row(inserted)?;

        let task = json!({
            "lead_id": lead.id,
            "title": format!("Follow-up: {}", lead.name),
            "due_date": data.due_date,
            "assigned_to": data.sent_by,
        });
        if let Err(e) = self.remote.insert(Table::Tasks, task).await {
            tracing::warn!("Follow-up do lead {}: tarefa não criada: {}", lead_id, e);
        }

        let lead_patch = json!({
            "follow_up_date": data.due_date,
            "last_contact_date": now,
            "updated_at": now,
        });
        if let Err(e) = self
            .remote
            .update(Table::Leads, lead_patch, &Filter::by_id(lead.id))
            .await
        {
            tracing::warn!("Follow-up do lead {}: datas não atualizadas: {}", lead_id, e);
        }

        Ok(record)
    }

    // =========================================================================
    //  ESTÁGIO DO FUNIL
    // =========================================================================

    // Uma única escrita: estágio + status derivado + nota anexada.
    pub async fn update_lead_stage(
        &self,
        lead_id: Uuid,
        stage: FunnelStage,
        notes: Option<&str>,
    ) -> Result<Lead, AppError> {
        let lead = self.fetch_lead(lead_id).await?;
        let now = Utc::now();

        let mut patch = json!({
            "funnel_stage": stage,
            "status": stage.derived_status(),
            "updated_at": now,
        });
        if let Some(extra) = notes {
            patch["notes"] = json!(append_note(lead.notes.as_deref(), extra));
        }

        let mut rows = self
            .remote
            .update(Table::Leads, patch, &Filter::by_id(lead.id))
            .await?;
        match rows.pop() {
            Some(row) => decode_row(row),
            None => Err(AppError::LeadNotFound),
        }
    }

    // =========================================================================
    //  MEMBROS (leitura)
    // =========================================================================

    pub async fn list_members(&self, branch_id: Uuid) -> Result<Vec<Member>, AppError> {
        let rows = self
            .remote
            .fetch_all(
                Table::Members,
                &Filter::new().eq("branch_id", json!(branch_id)),
            )
            .await?;
        rows.into_iter().map(decode_row).collect()
    }

    pub async fn find_member(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        let row = self.remote.fetch_one(Table::Members, &Filter::by_id(id)).await?;
        row.map(decode_row).transpose()
    }

    // --- helpers ---

    // "Não encontrado" e "busca falhou" colapsam no mesmo aborto.
    async fn fetch_lead(&self, lead_id: Uuid) -> Result<Lead, AppError> {
        let row: Option<Value> = self
            .remote
            .fetch_one(Table::Leads, &Filter::by_id(lead_id))
            .await
            .map_err(|e| {
                tracing::warn!("Busca do lead {} falhou: {}", lead_id, e);
                AppError::LeadNotFound
            })?;
        match row {
            Some(value) => decode_row(value).map_err(|e| {
                tracing::warn!("Lead {} em formato inesperado: {}", lead_id, e);
                AppError::LeadNotFound
            }),
            None => Err(AppError::LeadNotFound),
        }
    }
}

fn append_note(existing: Option<&str>, extra: &str) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!("{}\n{}", current, extra),
        _ => extra.to_string(),
    }
}
