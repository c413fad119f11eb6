// src/models/authz.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- PAPÉIS ---

// O papel de um ator do sistema. Não existe ordem total entre eles: quem
// manda é a tabela de alcance do AccessPolicy (services/authz_service.rs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Trainer,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Trainer => "trainer",
            Role::Member => "member",
        }
    }

    // Papel desconhecido vira `None` — e `None` nunca ganha permissão.
    pub fn from_str(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            "trainer" => Some(Role::Trainer),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

// --- PERMISSÕES ---

// Conjunto fechado de capacidades, conhecido em tempo de compilação.
// Cada permissão corresponde a uma ação que a camada de apresentação
// pode querer liberar ou bloquear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageMembers,
    ViewMemberProfiles,
    ManageClasses,
    ViewClassSchedule,
    ManageLeads,
    ConvertLeads,
    ManageFinances,
    ViewOwnInvoices,
    ManageStaff,
    ManageInventory,
    ManageSettings,
    ViewReports,
    LogOwnWorkouts,
}

impl Permission {
    pub fn slug(&self) -> &'static str {
        match self {
            Permission::ManageMembers => "manage_members",
            Permission::ViewMemberProfiles => "view_member_profiles",
            Permission::ManageClasses => "manage_classes",
            Permission::ViewClassSchedule => "view_class_schedule",
            Permission::ManageLeads => "manage_leads",
            Permission::ConvertLeads => "convert_leads",
            Permission::ManageFinances => "manage_finances",
            Permission::ViewOwnInvoices => "view_own_invoices",
            Permission::ManageStaff => "manage_staff",
            Permission::ManageInventory => "manage_inventory",
            Permission::ManageSettings => "manage_settings",
            Permission::ViewReports => "view_reports",
            Permission::LogOwnWorkouts => "log_own_workouts",
        }
    }
}
