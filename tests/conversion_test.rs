// tests/conversion_test.rs
//
// Testa o fluxo de conversão e as operações de CRM contra um colaborador
// em memória com injeção de falha por etapa. Os testes de falha "dura"
// conferem que nada vazou; os de falha "suave" conferem que o resultado
// não muda; o de dupla conversão fixa a limitação conhecida (sem chave
// de idempotência, duas contas nascem).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use academia_backend::{
    common::error::AppError,
    db::{Filter, RemoteDataService, Table},
    models::{
        crm::{FollowUpType, FunnelStage, Lead, LeadStatus, NewFollowUp},
        members::{MembershipStatus, NewMemberData},
    },
    services::crm_service::CrmService,
};

// =========================================================================
//  COLABORADOR EM MEMÓRIA
// =========================================================================

#[derive(Default)]
struct MockRemote {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    // (id da conta, e-mail) na ordem de criação.
    accounts: Mutex<Vec<(Uuid, String)>>,

    fail_insert: Mutex<HashSet<Table>>,
    fail_update: Mutex<HashSet<Table>>,
    fail_create_account: AtomicBool,
}

impl MockRemote {
    fn seed(&self, table: Table, row: Value) {
        self.tables.lock().unwrap().entry(table).or_default().push(row);
    }

    fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    fn fail_insert_on(&self, table: Table) {
        self.fail_insert.lock().unwrap().insert(table);
    }

    fn fail_update_on(&self, table: Table) {
        self.fail_update.lock().unwrap().insert(table);
    }

    fn injected() -> AppError {
        AppError::InternalServerError(anyhow::anyhow!("falha injetada"))
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    filter
        .conds()
        .iter()
        .all(|(column, value)| row.get(*column) == Some(value))
}

// Simula o row_to_json do Postgres: toda coluna presente, defaults
// preenchidos.
fn complete_row(table: Table, row: Value) -> Value {
    let mut obj = row.as_object().cloned().unwrap_or_default();
    for column in table.columns() {
        obj.entry(column.to_string()).or_insert(Value::Null);
    }
    if obj.get("id") == Some(&Value::Null) {
        obj.insert("id".into(), json!(Uuid::new_v4()));
    }
    for ts in ["created_at", "updated_at"] {
        if obj.get(ts) == Some(&Value::Null) {
            obj.insert(ts.into(), json!(Utc::now()));
        }
    }
    Value::Object(obj)
}

#[async_trait]
impl RemoteDataService for MockRemote {
    async fn fetch_one(&self, table: Table, filter: &Filter) -> Result<Option<Value>, AppError> {
        Ok(self.rows(table).into_iter().find(|r| matches(r, filter)))
    }

    async fn fetch_all(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, AppError> {
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|r| matches(r, filter))
            .collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, AppError> {
        if self.fail_insert.lock().unwrap().contains(&table) {
            return Err(Self::injected());
        }
        let row = complete_row(table, row);
        self.seed(table, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        patch: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, AppError> {
        if self.fail_update.lock().unwrap().contains(&table) {
            return Err(Self::injected());
        }
        let patch_obj = patch.as_object().cloned().unwrap_or_default();
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !matches(row, filter) {
                continue;
            }
            if let Some(obj) = row.as_object_mut() {
                for (key, value) in &patch_obj {
                    obj.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        _metadata: Value,
    ) -> Result<Uuid, AppError> {
        if self.fail_create_account.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        let id = Uuid::new_v4();
        self.accounts.lock().unwrap().push((id, email.to_owned()));
        Ok(id)
    }
}

// =========================================================================
//  HELPERS
// =========================================================================

fn seed_lead(mock: &MockRemote) -> Lead {
    let now = Utc::now();
    let lead = Lead {
        id: Uuid::new_v4(),
        branch_id: Uuid::new_v4(),
        name: "João Pereira".into(),
        email: Some("joao@email.com".into()),
        phone: Some("+55 11 91234-5678".into()),
        status: LeadStatus::New,
        funnel_stage: FunnelStage::Warm,
        notes: Some("Veio por indicação".into()),
        follow_up_date: None,
        last_contact_date: None,
        conversion_date: None,
        conversion_value: None,
        created_at: now,
        updated_at: now,
    };
    mock.seed(Table::Leads, serde_json::to_value(&lead).unwrap());
    lead
}

fn member_data(plan: Option<Uuid>) -> NewMemberData {
    NewMemberData {
        full_name: "João Pereira".into(),
        email: "joao@email.com".into(),
        password: None,
        // Ausente de propósito: deve cair para o telefone do lead.
        phone: None,
        membership_plan_id: plan,
        membership_start: None,
        membership_end: None,
        membership_status: Some(MembershipStatus::Active),
        address: None,
        emergency_contact: None,
        notes: None,
    }
}

fn stored_lead(mock: &MockRemote, id: Uuid) -> Value {
    mock.rows(Table::Leads)
        .into_iter()
        .find(|r| r.get("id") == Some(&json!(id)))
        .expect("lead sumiu da tabela")
}

// =========================================================================
//  CONVERSÃO
// =========================================================================

#[tokio::test]
async fn conversao_feliz_cria_membro_com_id_da_conta() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    let plan = Uuid::new_v4();

    let member = service
        .convert_lead_to_member(lead.id, member_data(Some(plan)), "recepcao@academia.com")
        .await
        .expect("conversão deveria funcionar");

    // O id do membro É o id da conta recém-criada.
    let accounts = mock.accounts.lock().unwrap().clone();
    assert_eq!(accounts.len(), 1);
    assert_eq!(member.id, accounts[0].0);
    assert_eq!(accounts[0].1, "joao@email.com");

    // Fallbacks do lead.
    assert_eq!(member.phone, lead.phone);
    assert_eq!(member.notes, lead.notes);
    assert_eq!(member.lead_id, Some(lead.id));
    assert_eq!(member.branch_id, lead.branch_id);

    // O lead foi marcado como convertido, com data e valor de conversão.
    let row = stored_lead(&mock, lead.id);
    assert_eq!(row["status"], json!("converted"));
    assert!(!row["conversion_date"].is_null());
    assert_eq!(row["conversion_value"], json!(plan));

    // E a auditoria entrou na trilha de follow-ups.
    let audits = mock.rows(Table::FollowUps);
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0]["follow_up_type"], json!("meeting"));
    assert_eq!(audits[0]["status"], json!("sent"));
    assert_eq!(audits[0]["response"], json!("Membership activated"));
}

#[tokio::test]
async fn lead_inexistente_aborta_sem_efeitos() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());

    let result = service
        .convert_lead_to_member(Uuid::new_v4(), member_data(None), "alguem")
        .await;

    assert!(matches!(result, Err(AppError::LeadNotFound)));
    assert!(mock.accounts.lock().unwrap().is_empty());
    assert!(mock.rows(Table::Members).is_empty());
}

#[tokio::test]
async fn falha_na_conta_aborta_sem_tocar_no_lead() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    mock.fail_create_account.store(true, Ordering::SeqCst);

    let result = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await;

    assert!(matches!(result, Err(AppError::AccountCreationFailed)));
    assert!(mock.rows(Table::Members).is_empty());
    assert!(mock.rows(Table::FollowUps).is_empty());

    // Nenhum campo do lead mudou.
    let row = stored_lead(&mock, lead.id);
    assert_eq!(row["status"], json!("new"));
    assert!(row["conversion_date"].is_null());
}

#[tokio::test]
async fn falha_no_perfil_aborta_mas_deixa_conta_orfa() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    mock.fail_insert_on(Table::Members);

    let result = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await;

    assert!(matches!(result, Err(AppError::ProfileUpdateFailed)));
    assert!(mock.rows(Table::Members).is_empty());
    assert_eq!(stored_lead(&mock, lead.id)["status"], json!("new"));

    // Risco conhecido: a conta criada na etapa 2 não é desfeita.
    assert_eq!(mock.accounts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn falha_suave_no_status_do_lead_nao_afeta_o_membro() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    mock.fail_update_on(Table::Leads);

    let member = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await
        .expect("o membro é retornado mesmo com a escrita secundária falhando");

    assert_eq!(mock.rows(Table::Members).len(), 1);
    assert_eq!(member.lead_id, Some(lead.id));

    // O status do lead ficou para trás — tolerado.
    assert_eq!(stored_lead(&mock, lead.id)["status"], json!("new"));

    // A auditoria ainda roda.
    assert_eq!(mock.rows(Table::FollowUps).len(), 1);
}

#[tokio::test]
async fn falha_suave_na_auditoria_nao_afeta_o_membro() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    mock.fail_insert_on(Table::FollowUps);

    let member = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await
        .expect("auditoria é melhor esforço");

    assert_eq!(stored_lead(&mock, lead.id)["status"], json!("converted"));
    assert!(mock.rows(Table::FollowUps).is_empty());
    assert_eq!(member.membership_status, MembershipStatus::Active);
}

#[tokio::test]
async fn dupla_conversao_gera_duas_contas() {
    // Limitação documentada: não há chave de idempotência nem checagem
    // de status na entrada. Este teste fixa o comportamento atual.
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);

    let first = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await
        .expect("primeira conversão");
    let second = service
        .convert_lead_to_member(lead.id, member_data(None), "alguem")
        .await
        .expect("segunda conversão também passa");

    assert_ne!(first.id, second.id);
    assert_eq!(mock.accounts.lock().unwrap().len(), 2);
    assert_eq!(mock.rows(Table::Members).len(), 2);
}

// =========================================================================
//  ESTÁGIO DO FUNIL
// =========================================================================

#[tokio::test]
async fn estagio_won_deriva_status_won() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);

    let updated = service
        .update_lead_stage(lead.id, FunnelStage::Won, None)
        .await
        .unwrap();

    assert_eq!(updated.funnel_stage, FunnelStage::Won);
    assert_eq!(updated.status, LeadStatus::Won);
}

#[tokio::test]
async fn estagio_lost_deriva_status_lost() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);

    let updated = service
        .update_lead_stage(lead.id, FunnelStage::Lost, None)
        .await
        .unwrap();

    assert_eq!(updated.status, LeadStatus::Lost);
}

#[tokio::test]
async fn estagio_cold_deriva_status_contacted_e_anexa_nota() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);

    let updated = service
        .update_lead_stage(lead.id, FunnelStage::Cold, Some("Esfriou depois da visita"))
        .await
        .unwrap();

    assert_eq!(updated.funnel_stage, FunnelStage::Cold);
    assert_eq!(updated.status, LeadStatus::Contacted);

    let notes = updated.notes.unwrap();
    assert!(notes.contains("Veio por indicação"));
    assert!(notes.contains("Esfriou depois da visita"));
}

// =========================================================================
//  FOLLOW-UPS
// =========================================================================

fn follow_up(sent_by: &str) -> NewFollowUp {
    NewFollowUp {
        follow_up_type: FollowUpType::Whatsapp,
        content: "Oferecer plano anual".into(),
        sent_by: sent_by.into(),
        due_date: Some(Utc::now() + chrono::Duration::days(2)),
    }
}

#[tokio::test]
async fn agendar_follow_up_grava_registro_e_datas() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);

    let record = service
        .schedule_follow_up(lead.id, follow_up("recepcao@academia.com"))
        .await
        .unwrap();

    assert_eq!(record.lead_id, lead.id);
    assert_eq!(record.sent_by, "recepcao@academia.com");
    assert_eq!(mock.rows(Table::Tasks).len(), 1);

    let row = stored_lead(&mock, lead.id);
    assert!(!row["follow_up_date"].is_null());
    assert!(!row["last_contact_date"].is_null());
}

#[tokio::test]
async fn tarefa_satelite_e_melhor_esforco() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());
    let lead = seed_lead(&mock);
    mock.fail_insert_on(Table::Tasks);
    mock.fail_update_on(Table::Leads);

    // O sucesso é definido pelo insert do follow-up; o resto é
    // fire-and-forget.
    let record = service
        .schedule_follow_up(lead.id, follow_up("alguem"))
        .await
        .expect("tarefa e datas são melhor esforço");

    assert_eq!(mock.rows(Table::FollowUps).len(), 1);
    assert_eq!(record.content, "Oferecer plano anual");
    assert!(mock.rows(Table::Tasks).is_empty());
}

#[tokio::test]
async fn follow_up_de_lead_inexistente_aborta() {
    let mock = Arc::new(MockRemote::default());
    let service = CrmService::new(mock.clone());

    let result = service
        .schedule_follow_up(Uuid::new_v4(), follow_up("alguem"))
        .await;

    assert!(matches!(result, Err(AppError::LeadNotFound)));
    assert!(mock.rows(Table::FollowUps).is_empty());
}
