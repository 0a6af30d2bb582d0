//! Identity service client: token issuance plus the admin tenant/user CRUD
//! the credential broker uses to mint isolated accounts.

use serde::Deserialize;
use serde_json::json;

use super::RestClient;
use crate::config::WireFormat;
use crate::errors::{Error, Result};
use crate::resources::{Tenant, Token, User};

#[derive(Debug, Clone)]
pub struct IdentityClient {
    rest: RestClient,
}

#[derive(Debug, Deserialize)]
struct AccessEnvelope {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
}

#[derive(Debug, Deserialize)]
struct TenantEnvelope {
    tenant: Tenant,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

impl IdentityClient {
    pub fn new(auth_url: &str, wire_format: WireFormat) -> Result<Self> {
        Ok(Self { rest: RestClient::new(auth_url, wire_format)? })
    }

    /// Attach an admin token for the tenant/user management calls
    pub fn with_token(self, token: &str) -> Self {
        Self { rest: self.rest.with_token(token) }
    }

    /// Exchange username/password/tenant for a scoped token. Bad credentials
    /// surface as `Unauthorized`.
    pub async fn issue_token(
        &self,
        username: &str,
        password: &str,
        tenant_name: &str,
    ) -> Result<Token> {
        let body = json!({
            "auth": {
                "passwordCredentials": {
                    "username": username,
                    "password": password,
                },
                "tenantName": tenant_name,
            }
        });
        let (_, envelope): (_, AccessEnvelope) = self.rest.post("tokens", &body).await?;
        Ok(envelope.access.token)
    }

    pub async fn create_tenant(&self, name: &str) -> Result<Tenant> {
        let body = json!({"tenant": {"name": name, "enabled": true}});
        let (_, envelope): (_, TenantEnvelope) = self.rest.post("tenants", &body).await?;
        Ok(envelope.tenant)
    }

    pub async fn create_user(&self, name: &str, password: &str, tenant_id: &str) -> Result<User> {
        let body = json!({
            "user": {"name": name, "password": password, "tenantId": tenant_id, "enabled": true}
        });
        let (_, envelope): (_, UserEnvelope) = self.rest.post("users", &body).await?;
        Ok(envelope.user)
    }

    /// Grant `role` to `user_id` on `tenant_id`.
    pub async fn assign_role(&self, tenant_id: &str, user_id: &str, role: &str) -> Result<()> {
        self.rest
            .put_action(
                &format!("tenants/{tenant_id}/users/{user_id}/roles/{role}"),
                &json!({}),
            )
            .await
            .map_err(|e| e.locate("role", role))?;
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.rest
            .delete(&format!("users/{user_id}"))
            .await
            .map_err(|e: Error| e.locate("user", user_id))?;
        Ok(())
    }

    pub async fn delete_tenant(&self, tenant_id: &str) -> Result<()> {
        self.rest
            .delete(&format!("tenants/{tenant_id}"))
            .await
            .map_err(|e: Error| e.locate("tenant", tenant_id))?;
        Ok(())
    }
}
