// src/db/remote.rs
//
// O colaborador de persistência visto pelos serviços: um contrato estreito
// (fetch/insert/update + criação de conta), com linhas atravessando a
// fronteira como JSON e virando DTOs tipados logo na entrada.

use anyhow::anyhow;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::common::error::AppError;

// =========================================================================
//  TABELAS E FILTROS
// =========================================================================

// Conjunto fechado de tabelas. Nenhum identificador de SQL vem de fora
// deste enum (ou da lista de colunas abaixo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Leads,
    Members,
    FollowUps,
    Tasks,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Leads => "leads",
            Table::Members => "members",
            Table::FollowUps => "follow_ups",
            Table::Tasks => "tasks",
        }
    }

    // Colunas graváveis de cada tabela. Insert/update só aceitam chaves
    // presentes aqui.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Leads => &[
                "id",
                "branch_id",
                "name",
                "email",
                "phone",
                "status",
                "funnel_stage",
                "notes",
                "follow_up_date",
                "last_contact_date",
                "conversion_date",
                "conversion_value",
                "created_at",
                "updated_at",
            ],
            Table::Members => &[
                "id",
                "branch_id",
                "lead_id",
                "full_name",
                "email",
                "phone",
                "membership_plan_id",
                "membership_start",
                "membership_end",
                "membership_status",
                "address",
                "emergency_contact",
                "notes",
                "status",
                "created_at",
                "updated_at",
            ],
            Table::FollowUps => &[
                "id",
                "lead_id",
                "follow_up_type",
                "content",
                "sent_by",
                "sent_at",
                "status",
                "response",
            ],
            Table::Tasks => &[
                "id",
                "lead_id",
                "title",
                "due_date",
                "assigned_to",
                "done",
                "created_at",
            ],
        }
    }
}

// Conjunção de igualdades. É tudo que os fluxos em escopo precisam.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<(&'static str, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: Value) -> Self {
        self.conds.push((column, value));
        self
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("id", Value::String(id.to_string()))
    }

    pub fn conds(&self) -> &[(&'static str, Value)] {
        &self.conds
    }
}

// Converte um DTO (ou linha JSON) para o tipo de domínio na fronteira.
pub fn decode_row<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(value)?)
}

// =========================================================================
//  O CONTRATO
// =========================================================================

#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn fetch_one(&self, table: Table, filter: &Filter) -> Result<Option<Value>, AppError>;

    async fn fetch_all(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, AppError>;

    // Devolve a linha inserida.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, AppError>;

    // Devolve as linhas afetadas, já atualizadas.
    async fn update(
        &self,
        table: Table,
        patch: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, AppError>;

    // Cria uma conta de acesso e devolve o id novo.
    // `metadata` carrega papel e filial (role, branch_id).
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<Uuid, AppError>;
}

// =========================================================================
//  IMPLEMENTAÇÃO POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgRemoteDataService {
    pool: PgPool,
}

impl PgRemoteDataService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Comparação via ::text: os filtros usados aqui são sempre por id,
    // e-mail ou chave estrangeira, todos estáveis nessa representação.
    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, filter: &Filter) {
        for (i, (column, value)) in filter.conds().iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(alias);
            qb.push(".");
            qb.push(*column);
            qb.push("::text = ");
            qb.push_bind(value_as_text(value));
        }
    }

    // Garante que toda chave do JSON é uma coluna conhecida da tabela.
    fn checked_columns(table: Table, row: &Value) -> Result<Vec<&'static str>, AppError> {
        let obj = row
            .as_object()
            .ok_or_else(|| anyhow!("linha para '{}' não é um objeto JSON", table.name()))?;

        let mut columns = Vec::with_capacity(obj.len());
        for key in obj.keys() {
            match table.columns().iter().find(|c| **c == key.as_str()) {
                Some(column) => columns.push(*column),
                None => {
                    return Err(AppError::InternalServerError(anyhow!(
                        "coluna desconhecida '{}' para a tabela '{}'",
                        key,
                        table.name()
                    )));
                }
            }
        }
        Ok(columns)
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteDataService for PgRemoteDataService {
    async fn fetch_one(&self, table: Table, filter: &Filter) -> Result<Option<Value>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT row_to_json(t) AS row FROM ");
        qb.push(table.name());
        qb.push(" t");
        Self::push_filter(&mut qb, "t", filter);
        qb.push(" LIMIT 1");

        let row = qb.build().fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get::<Value, _>("row")))
    }

    async fn fetch_all(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT row_to_json(t) AS row FROM ");
        qb.push(table.name());
        qb.push(" t");
        Self::push_filter(&mut qb, "t", filter);

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|r| r.get::<Value, _>("row")).collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, AppError> {
        let columns = Self::checked_columns(table, &row)?;

        // jsonb_populate_record faz o cast de cada campo do JSON para o
        // tipo da coluna; só listamos as colunas presentes para não
        // atropelar os DEFAULTs do banco.
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(table.name());
        qb.push(" (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
        }
        qb.push(") SELECT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push("r.");
            qb.push(*column);
        }
        qb.push(" FROM jsonb_populate_record(NULL::");
        qb.push(table.name());
        qb.push(", ");
        qb.push_bind(row);
        qb.push(") r RETURNING row_to_json(");
        qb.push(table.name());
        qb.push(") AS row");

        let inserted = qb.build().fetch_one(&self.pool).await?;
        Ok(inserted.get::<Value, _>("row"))
    }

    async fn update(
        &self,
        table: Table,
        patch: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, AppError> {
        let columns = Self::checked_columns(table, &patch)?;
        if columns.is_empty() {
            return Err(AppError::InternalServerError(anyhow!(
                "patch vazio para a tabela '{}'",
                table.name()
            )));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(table.name());
        qb.push(" SET ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
            qb.push(" = r.");
            qb.push(*column);
        }
        qb.push(" FROM jsonb_populate_record(NULL::");
        qb.push(table.name());
        qb.push(", ");
        qb.push_bind(patch);
        qb.push(") r");
        Self::push_filter(&mut qb, table.name(), filter);
        qb.push(" RETURNING row_to_json(");
        qb.push(table.name());
        qb.push(") AS row");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|r| r.get::<Value, _>("row")).collect())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<Uuid, AppError> {
        // Hashing fora do runtime, como no registro normal.
        let password_owned = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || {
            bcrypt::hash(&password_owned, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow!("Falha na task de hashing: {}", e))??;

        let role = metadata
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("member")
            .to_owned();
        let branch_id = metadata
            .get("branch_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());

        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, role, branch_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .bind(&role)
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })?;

        Ok(row.get::<Uuid, _>("id"))
    }
}
