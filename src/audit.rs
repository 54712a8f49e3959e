use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs::ActiveModel as AuditActive, error::AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserSignIn,
    ReviewCreate,
    Checkout,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserSignIn => "user_signin",
            AuditAction::ReviewCreate => "review_create",
            AuditAction::Checkout => "checkout",
        }
    }

    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister | AuditAction::UserSignIn => "users",
            AuditAction::ReviewCreate => "reviews",
            AuditAction::Checkout => "orders",
        }
    }
}

pub async fn log_audit<C>(
    db: &C,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.as_str().to_string()),
        resource: Set(Some(action.resource().to_string())),
        metadata: Set(metadata),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Best-effort audit entry: failures are logged, never propagated.
pub async fn record_audit<C>(
    db: &C,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) where
    C: ConnectionTrait,
{
    if let Err(err) = log_audit(db, user_id, action, metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}
