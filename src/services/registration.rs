//! Owner and consignor sign-up, platform approval, and credential checks.

use crate::{
    auth::password::{hash_password, verify_password},
    db::DbPool,
    entities::{
        consignor::{self, ConsignorStatus},
        organization::{self, SubscriptionStatus},
        user::{self, UserRole},
        ApprovalStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::consignors;

/// Store code characters; no 0/O or 1/I.
pub const STORE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const STORE_CODE_ATTEMPTS: usize = 20;

pub fn generate_store_code(length: usize) -> String {
    super::random_code(STORE_CODE_ALPHABET, length)
}

/// Lowercase, dash separated form of a shop name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_reason: Option<String>,
    pub consignor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            email: model.email,
            full_name: model.full_name,
            role: model.role,
            approval_status: model.approval_status,
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            rejected_reason: model.rejected_reason,
            consignor_id: model.consignor_id,
            created_at: model.created_at,
        }
    }
}

/// An owner waiting for platform approval.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingOwner {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerApproval {
    pub user: UserView,
    pub store_code: String,
}

#[derive(Debug, Clone)]
pub struct RegisterOwnerInput {
    pub organization_name: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterConsignorInput {
    pub store_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsignorRegistration {
    pub user: UserView,
    pub consignor_id: Uuid,
    pub consignor_number: String,
    pub organization_name: String,
    /// False when the shop reviews new consignors before they can log in
    pub approved: bool,
}

async fn ensure_email_free<C>(conn: &C, email: &str) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(conn)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RegistrationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_split: Decimal,
    store_code_length: usize,
}

impl RegistrationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        default_split: Decimal,
        store_code_length: usize,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_split,
            store_code_length,
        }
    }

    /// Creates a shop and its owner; both wait for platform approval.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_owner(&self, input: RegisterOwnerInput) -> Result<UserView, ServiceError> {
        let email = normalize_email(&input.email);
        let name = input.organization_name.trim().to_string();
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Organization name must contain letters or digits".to_string(),
            ));
        }
        let password_hash = hash_password(&input.password)?;

        let txn = self.db_pool.begin().await?;
        ensure_email_free(&txn, &email).await?;
        let slug_taken = organization::Entity::find()
            .filter(organization::Column::Slug.eq(slug.as_str()))
            .count(&txn)
            .await?;
        if slug_taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "An organization named '{}' already exists",
                name
            )));
        }

        let organization = organization::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            store_code: Set(None),
            default_split_percentage: Set(self.default_split),
            auto_approve_consignors: Set(false),
            is_active: Set(false),
            subscription_status: Set(SubscriptionStatus::None),
            stripe_customer_id: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let owner = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(Some(organization.id)),
            email: Set(email),
            full_name: Set(input.full_name.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Owner),
            approval_status: Set(ApprovalStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_reason: Set(None),
            consignor_id: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        counter!("consignment.registrations.owner", 1);
        info!(user_id = %owner.id, organization_id = %organization.id, "owner registered");
        self.event_sender
            .send_or_log(Event::OwnerRegistered {
                organization_id: organization.id,
                user_id: owner.id,
            })
            .await;
        Ok(owner.into())
    }

    #[instrument(skip(self))]
    pub async fn pending_owners(&self) -> Result<Vec<PendingOwner>, ServiceError> {
        let owners = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Owner))
            .filter(user::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .order_by_asc(user::Column::CreatedAt)
            .find_also_related(organization::Entity)
            .all(&*self.db_pool)
            .await?;

        Ok(owners
            .into_iter()
            .map(|(owner, organization)| PendingOwner {
                user_id: owner.id,
                email: owner.email,
                full_name: owner.full_name,
                organization_id: owner.organization_id,
                organization_name: organization.map(|o| o.name),
                registered_at: owner.created_at,
            })
            .collect())
    }

    /// Approves a pending owner, activating the shop under a fresh store code.
    #[instrument(skip(self))]
    pub async fn approve_owner(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
    ) -> Result<OwnerApproval, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let owner = find_owner(&txn, user_id).await?;
        if owner.approval_status == ApprovalStatus::Approved {
            return Err(ServiceError::InvalidOperation(
                "Owner is already approved".to_string(),
            ));
        }
        let organization_id = owner.organization_id.ok_or_else(|| {
            ServiceError::InvalidOperation("Owner has no organization".to_string())
        })?;
        let organization = organization::Entity::find_by_id(organization_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Organization not found".to_string()))?;

        let store_code = match organization.store_code.clone() {
            Some(code) => code,
            None => self.unused_store_code(&txn).await?,
        };

        let mut org_model = organization.into_active_model();
        org_model.store_code = Set(Some(store_code.clone()));
        org_model.is_active = Set(true);
        org_model.update(&txn).await?;

        let mut owner_model = owner.into_active_model();
        owner_model.approval_status = Set(ApprovalStatus::Approved);
        owner_model.approved_by = Set(Some(admin_id));
        owner_model.approved_at = Set(Some(Utc::now()));
        owner_model.rejected_reason = Set(None);
        let approved = owner_model.update(&txn).await?;
        txn.commit().await?;

        info!(user_id = %user_id, %store_code, "owner approved");
        self.event_sender
            .send_or_log(Event::OwnerApproved {
                organization_id,
                user_id,
                store_code: store_code.clone(),
            })
            .await;

        Ok(OwnerApproval {
            user: approved.into(),
            store_code,
        })
    }

    #[instrument(skip(self, reason))]
    pub async fn reject_owner(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        reason: Option<String>,
    ) -> Result<UserView, ServiceError> {
        let owner = find_owner(&*self.db_pool, user_id).await?;
        if owner.approval_status != ApprovalStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Owner is already {}",
                owner.approval_status
            )));
        }

        let mut model = owner.into_active_model();
        model.approval_status = Set(ApprovalStatus::Rejected);
        model.approved_by = Set(Some(admin_id));
        model.rejected_reason = Set(reason);
        let rejected = model.update(&*self.db_pool).await?;

        info!(user_id = %user_id, "owner rejected");
        self.event_sender
            .send_or_log(Event::OwnerRejected { user_id })
            .await;
        Ok(rejected.into())
    }

    /// Consignor self-registration into the shop behind `store_code`.
    #[instrument(skip(self, input), fields(store_code = %input.store_code))]
    pub async fn register_consignor(
        &self,
        input: RegisterConsignorInput,
    ) -> Result<ConsignorRegistration, ServiceError> {
        let email = normalize_email(&input.email);
        let store_code = input.store_code.trim().to_uppercase();
        let password_hash = hash_password(&input.password)?;

        let txn = self.db_pool.begin().await?;
        let organization = organization::Entity::find()
            .filter(organization::Column::StoreCode.eq(store_code.as_str()))
            .filter(organization::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", store_code)))?;
        ensure_email_free(&txn, &email).await?;

        let approval = if organization.auto_approve_consignors {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        };
        let consignor_number = consignors::next_consignor_number(&txn, organization.id).await?;
        let consignor = consignor::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization.id),
            consignor_number: Set(consignor_number),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            email: Set(Some(email.clone())),
            phone: Set(input.phone),
            split_percentage: Set(None),
            status: Set(ConsignorStatus::Active),
            approval_status: Set(approval),
            notes: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let portal_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(Some(organization.id)),
            email: Set(email),
            full_name: Set(consignor.display_name()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Consignor),
            approval_status: Set(approval),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_reason: Set(None),
            consignor_id: Set(Some(consignor.id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        let approved = approval == ApprovalStatus::Approved;
        counter!("consignment.registrations.consignor", 1);
        info!(consignor_id = %consignor.id, approved, "consignor registered");
        self.event_sender
            .send_or_log(Event::ConsignorRegistered {
                organization_id: organization.id,
                consignor_id: consignor.id,
                auto_approved: approved,
            })
            .await;

        Ok(ConsignorRegistration {
            user: portal_user.into(),
            consignor_id: consignor.id,
            consignor_number: consignor.consignor_number,
            organization_name: organization.name,
            approved,
        })
    }

    /// Checks credentials; only approved accounts may sign in.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<user::Model, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());
        let account = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &account.password_hash) {
            warn!(user_id = %account.id, "failed login");
            return Err(invalid());
        }
        match account.approval_status {
            ApprovalStatus::Approved => Ok(account),
            ApprovalStatus::Pending => Err(ServiceError::Forbidden(
                "Account is awaiting approval".to_string(),
            )),
            ApprovalStatus::Rejected => Err(ServiceError::Forbidden(
                "Account registration was rejected".to_string(),
            )),
        }
    }

    /// Creates an approved platform administrator.
    #[instrument(skip(self, password))]
    pub async fn create_admin(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<UserView, ServiceError> {
        let email = normalize_email(email);
        ensure_email_free(&*self.db_pool, &email).await?;
        let admin = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(None),
            email: Set(email),
            full_name: Set(full_name.trim().to_string()),
            password_hash: Set(hash_password(password)?),
            role: Set(UserRole::Admin),
            approval_status: Set(ApprovalStatus::Approved),
            approved_by: Set(None),
            approved_at: Set(Some(Utc::now())),
            rejected_reason: Set(None),
            consignor_id: Set(None),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(user_id = %admin.id, "admin created");
        Ok(admin.into())
    }

    async fn unused_store_code<C>(&self, conn: &C) -> Result<String, ServiceError>
    where
        C: ConnectionTrait,
    {
        for _ in 0..STORE_CODE_ATTEMPTS {
            let code = generate_store_code(self.store_code_length);
            let taken = organization::Entity::find()
                .filter(organization::Column::StoreCode.eq(code.as_str()))
                .count(conn)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
        }
        Err(ServiceError::InternalError(
            "Could not allocate a unique store code".to_string(),
        ))
    }
}

async fn find_owner<C>(conn: &C, user_id: Uuid) -> Result<user::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let account = user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;
    if account.role != UserRole::Owner {
        return Err(ServiceError::ValidationError("User is not an owner".to_string()));
    }
    Ok(account)
}
