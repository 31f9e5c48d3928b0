use crate::source::policy::RbacExtension;
use crate::target::policy::{JwtPrincipal, RbacPermissions, RbacPolicy, RbacPrincipal, RbacRule};

use super::{pascal_case, Findings, Mapped};

/// Map RBAC policies of JWT principals. Principals of any other kind are
/// dropped with a finding.
pub fn rbac(source: &RbacExtension) -> Mapped<Option<RbacPolicy>> {
    let mut findings = Findings::new();
    let mut out = RbacPolicy {
        disable: source.disable.then_some(true),
        ..RbacPolicy::default()
    };
    for (name, policy) in &source.policies {
        let mut principals = Vec::new();
        for principal in &policy.principals {
            findings.overflow(&format!("rbac.policies.{name}.principals"), &principal.other);
            if let Some(jwt) = &principal.jwt_principal {
                principals.push(RbacPrincipal {
                    jwt_principal: JwtPrincipal {
                        claims: jwt.claims.clone(),
                        provider: jwt.provider.clone(),
                        matcher: jwt.matcher.as_deref().map(pascal_case),
                    },
                });
            }
        }
        let rule = RbacRule {
            principals,
            permissions: policy.permissions.as_ref().map(|p| RbacPermissions {
                path_prefix: p.path_prefix.clone(),
                methods: p.methods.clone(),
            }),
            nested_claim_delimiter: policy.nested_claim_delimiter.clone(),
        };
        out.policies.insert(name.clone(), rule);
    }
    let empty = out == RbacPolicy::default();
    Mapped::new((!empty).then_some(out), findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::rbac;
    use crate::source::policy::RbacExtension;

    #[test]
    fn jwt_principals_and_permissions_are_kept() {
        let source: RbacExtension = serde_json::from_value(json!({
            "policies": {
                "admins": {
                    "principals": [
                        {"jwtPrincipal": {"claims": {"role": "admin"}, "provider": "auth0", "matcher": "LIST_CONTAINS"}},
                        {"sourceIp": {"addressPrefix": "10.0.0.0"}}
                    ],
                    "permissions": {"pathPrefix": "/admin", "methods": ["GET"]}
                }
            }
        }))
        .expect("rbac decodes");
        let mapped = rbac(&source);
        let policy = mapped.value.expect("policy");
        let rule = &policy.policies["admins"];
        assert_eq!(rule.principals.len(), 1);
        assert_eq!(rule.principals[0].jwt_principal.matcher.as_deref(), Some("ListContains"));
        assert_eq!(rule.permissions.as_ref().and_then(|p| p.path_prefix.as_deref()), Some("/admin"));
        assert_eq!(
            mapped.findings.messages(),
            vec!["rbac.policies.admins.principals.sourceIp is not supported"]
        );
    }
}
