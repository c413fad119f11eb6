// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- CRM ---
        handlers::crm::create_lead,
        handlers::crm::list_leads,
        handlers::crm::convert_lead,
        handlers::crm::schedule_follow_up,
        handlers::crm::update_lead_stage,

        // --- Members ---
        handlers::members::list_members,
        handlers::members::get_member,
    ),
    components(
        schemas(
            handlers::auth::RegisterPayload,
            handlers::auth::LoginPayload,
            handlers::crm::CreateLeadPayload,
            handlers::crm::ConvertLeadPayload,
            handlers::crm::ScheduleFollowUpPayload,
            handlers::crm::UpdateStagePayload,

            models::auth::UserResponse,
            models::authz::Role,
            models::authz::Permission,
            models::crm::Lead,
            models::crm::LeadStatus,
            models::crm::FunnelStage,
            models::crm::FollowUpRecord,
            models::crm::FollowUpType,
            models::crm::FollowUpStatus,
            models::members::Member,
            models::members::MembershipStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registro e login"),
        (name = "CRM", description = "Leads, conversão e follow-ups"),
        (name = "Members", description = "Perfis de membros"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
