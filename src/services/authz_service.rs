// src/services/authz_service.rs
//
// O motor de autorização: decide se um papel pode exercer uma permissão,
// respeitando a tabela de alcance entre papéis e a restrição de posse
// para atores `member`. Puro, síncrono, sem I/O — ausência de dado
// sempre resolve para `false`, nunca para erro.

use std::collections::{HashMap, HashSet};

use crate::models::authz::{Permission, Role};

// Regra de uma permissão na matriz.
#[derive(Debug, Clone)]
pub struct PermissionRule {
    // Papéis explicitamente liberados. O fechamento por herança acontece
    // na avaliação, não aqui.
    pub roles: &'static [Role],
    // Quando true, um ator `member` só exerce a permissão sobre recurso
    // próprio. Não afeta staff/admin/trainer.
    pub member_self_only: bool,
}

// Configuração imutável, construída uma vez no boot e injetada via
// AppState. Não há singleton; o tempo de vida é o do processo.
pub struct AccessPolicy {
    reach: HashMap<Role, HashSet<Role>>,
    matrix: HashMap<Permission, PermissionRule>,
    routes: Vec<(&'static str, &'static [Role])>,
}

impl AccessPolicy {
    pub fn new(
        reach: HashMap<Role, HashSet<Role>>,
        matrix: HashMap<Permission, PermissionRule>,
        routes: Vec<(&'static str, &'static [Role])>,
    ) -> Self {
        Self { reach, matrix, routes }
    }

    // A política padrão do produto. A tabela de alcance é declarada por
    // extenso (não é um fecho transitivo calculado): se staff alcança
    // trainer e trainer alcança member, a lista de staff precisa conter
    // member explicitamente.
    pub fn builtin() -> Self {
        use Permission::*;
        use Role::*;

        let reach = HashMap::from([
            (Admin, HashSet::from([Admin, Staff, Trainer, Member])),
            (Staff, HashSet::from([Staff, Trainer, Member])),
            (Trainer, HashSet::from([Trainer, Member])),
            (Member, HashSet::from([Member])),
        ]);

        let matrix = HashMap::from([
            (ManageMembers, rule(&[Staff], false)),
            (ViewMemberProfiles, rule(&[Trainer, Member], true)),
            (ManageClasses, rule(&[Staff], false)),
            (ViewClassSchedule, rule(&[Member], false)),
            (ManageLeads, rule(&[Staff], false)),
            (ConvertLeads, rule(&[Staff], false)),
            (ManageFinances, rule(&[Admin], false)),
            (ViewOwnInvoices, rule(&[Member], true)),
            (ManageStaff, rule(&[Admin], false)),
            (ManageInventory, rule(&[Staff], false)),
            (ManageSettings, rule(&[Admin], false)),
            (ViewReports, rule(&[Admin], false)),
            (LogOwnWorkouts, rule(&[Member], true)),
        ]);

        // Prefixo de rota -> papéis aceitos. Admin nem consulta a tabela.
        let routes: Vec<(&'static str, &'static [Role])> = vec![
            ("/api/crm", &[Staff]),
            ("/api/members", &[Staff, Trainer, Member]),
            ("/api/users", &[Staff, Trainer, Member]),
        ];

        Self::new(reach, matrix, routes)
    }

    // Avaliação de permissão, na ordem:
    // 1. sem papel -> nega;
    // 2. permissão fora da matriz -> nega (fail-closed, nunca fail-open);
    // 3. concede se QUALQUER papel do alcance do ator está na regra;
    // 4. não concedido -> nega;
    // 5. regra member_self_only e ator literalmente `member` -> is_owner;
    // 6. senão -> permite.
    pub fn has_permission(
        &self,
        role: Option<Role>,
        permission: Permission,
        is_owner: bool,
    ) -> bool {
        let Some(role) = role else {
            return false;
        };

        let Some(rule) = self.matrix.get(&permission) else {
            return false;
        };

        let granted = match self.reach.get(&role) {
            Some(reachable) => rule.roles.iter().any(|r| reachable.contains(r)),
            None => false,
        };
        if !granted {
            return false;
        }

        if rule.member_self_only && role == Role::Member {
            return is_owner;
        }

        true
    }

    // Acesso por rota: admin sempre passa; senão vale a tabela de
    // prefixos — concede se alguma entrada cujo prefixo casa com o
    // caminho aceita o papel. Nenhuma entrada casando -> nega.
    pub fn has_route_access(&self, role: Option<Role>, path: &str) -> bool {
        let Some(role) = role else {
            return false;
        };

        if role == Role::Admin {
            return true;
        }

        self.routes
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix))
            .any(|(_, allowed)| allowed.contains(&role))
    }
}

fn rule(roles: &'static [Role], member_self_only: bool) -> PermissionRule {
    PermissionRule { roles, member_self_only }
}

// =========================================================================
//  TESTES
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use Permission::*;
    use Role::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::builtin()
    }

    #[test]
    fn sem_papel_nega_sempre() {
        let p = policy();
        assert!(!p.has_permission(None, ManageFinances, false));
        assert!(!p.has_permission(None, ViewClassSchedule, true));
        assert!(!p.has_route_access(None, "/api/crm/leads"));
    }

    #[test]
    fn permissao_fora_da_matriz_nega_para_todos() {
        // Matriz deliberadamente vazia: tudo que for consultado está
        // "não mapeado" e precisa cair no default negado.
        let vazio = AccessPolicy::new(
            HashMap::from([(Admin, HashSet::from([Admin, Staff, Trainer, Member]))]),
            HashMap::new(),
            vec![],
        );
        assert!(!vazio.has_permission(Some(Admin), ManageFinances, false));
        assert!(!vazio.has_permission(Some(Staff), ManageLeads, true));
        assert!(!vazio.has_permission(Some(Member), ViewOwnInvoices, true));
    }

    #[test]
    fn member_self_only_depende_da_posse() {
        let p = policy();
        for perm in [ViewMemberProfiles, ViewOwnInvoices, LogOwnWorkouts] {
            assert!(!p.has_permission(Some(Member), perm, false), "{:?}", perm);
            assert!(p.has_permission(Some(Member), perm, true), "{:?}", perm);
        }
    }

    #[test]
    fn self_only_nao_restringe_papeis_superiores() {
        // Staff enxerga a fatura de qualquer membro; o membro, só a sua.
        let p = policy();
        assert!(p.has_permission(Some(Admin), ViewOwnInvoices, false));
        assert!(p.has_permission(Some(Staff), ViewOwnInvoices, false));
        assert!(p.has_permission(Some(Trainer), ViewMemberProfiles, false));
    }

    #[test]
    fn heranca_cobre_permissoes_de_member() {
        // Toda permissão liberada para member (sem self-only) vale para
        // quem alcança member.
        let p = policy();
        for role in [Admin, Staff, Trainer, Member] {
            assert!(p.has_permission(Some(role), ViewClassSchedule, false), "{:?}", role);
        }
    }

    #[test]
    fn heranca_nao_sobe() {
        let p = policy();
        assert!(!p.has_permission(Some(Member), ManageLeads, true));
        assert!(!p.has_permission(Some(Trainer), ManageLeads, false));
        assert!(!p.has_permission(Some(Staff), ManageFinances, false));
    }

    #[test]
    fn tabela_de_alcance_e_internamente_consistente() {
        // Se A alcança B, A também alcança tudo que B lista — declarado
        // por extenso, mas não pode estar furado.
        let p = policy();
        for (role, reachable) in &p.reach {
            for other in reachable {
                let indirect = &p.reach[other];
                assert!(
                    indirect.is_subset(reachable),
                    "{:?} alcança {:?} mas não herda sua lista",
                    role,
                    other
                );
            }
        }
    }

    #[test]
    fn admin_passa_em_qualquer_rota() {
        let p = policy();
        for path in ["/api/crm/leads", "/api/members/abc", "/qualquer/coisa"] {
            assert!(p.has_route_access(Some(Admin), path));
        }
    }

    #[test]
    fn rota_sem_entrada_nega() {
        let p = policy();
        assert!(!p.has_route_access(Some(Staff), "/api/finance/summary"));
        assert!(!p.has_route_access(Some(Member), "/api/crm/leads"));
    }

    #[test]
    fn rota_com_prefixo_casando_respeita_os_papeis() {
        let p = policy();
        assert!(p.has_route_access(Some(Staff), "/api/crm/leads/123/convert"));
        assert!(p.has_route_access(Some(Member), "/api/members/eu"));
        assert!(p.has_route_access(Some(Trainer), "/api/members"));
    }
}
