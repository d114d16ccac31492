use crate::{
    db::DbPool,
    entities::{
        consignor::{self, ConsignorStatus, Entity as ConsignorEntity},
        item::{self, ItemStatus},
        transaction::{self, PayoutStatus},
        user, ApprovalStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsignorView {
    pub id: Uuid,
    pub consignor_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Consignor share in percent; `null` means the shop default applies
    pub split_percentage: Option<Decimal>,
    pub status: ConsignorStatus,
    pub approval_status: ApprovalStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<consignor::Model> for ConsignorView {
    fn from(model: consignor::Model) -> Self {
        Self {
            id: model.id,
            consignor_number: model.consignor_number,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            split_percentage: model.split_percentage,
            status: model.status,
            approval_status: model.approval_status,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Running totals for one consignor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsignorBalance {
    pub consignor_id: Uuid,
    pub items_available: u64,
    pub items_sold: u64,
    pub total_sales: Decimal,
    pub total_earnings: Decimal,
    pub pending_amount: Decimal,
    pub paid_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateConsignorInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub split_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateConsignorInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub split_percentage: Option<Decimal>,
    pub clear_split_percentage: bool,
    pub status: Option<ConsignorStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsignorFilter {
    pub status: Option<ConsignorStatus>,
    pub approval_status: Option<ApprovalStatus>,
    pub search: Option<String>,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConsignorRemoval {
    Deleted,
    /// Kept for history because items or sales reference it
    Deactivated,
}

/// Sequence part of a `C-0001` style number.
fn consignor_sequence(number: &str) -> Option<u64> {
    number.strip_prefix("C-")?.parse().ok()
}

/// Next per-organization number, rendered `C-0001`. Follows the highest
/// number in use so deleted consignors never free a number for reuse.
pub(crate) async fn next_consignor_number<C>(
    conn: &C,
    organization_id: Uuid,
) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    let numbers: Vec<String> = ConsignorEntity::find()
        .select_only()
        .column(consignor::Column::ConsignorNumber)
        .filter(consignor::Column::OrganizationId.eq(organization_id))
        .into_tuple()
        .all(conn)
        .await?;
    let highest = numbers
        .iter()
        .filter_map(|n| consignor_sequence(n))
        .max()
        .unwrap_or(0);
    Ok(format!("C-{:04}", highest + 1))
}

/// Loads a consignor belonging to `organization_id`.
pub(crate) async fn find_in_organization<C>(
    conn: &C,
    organization_id: Uuid,
    consignor_id: Uuid,
) -> Result<consignor::Model, ServiceError>
where
    C: ConnectionTrait,
{
    ConsignorEntity::find_by_id(consignor_id)
        .filter(consignor::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Consignor {} not found", consignor_id)))
}

fn required(field: &str, value: String) -> Result<String, ServiceError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!("{} is required", field)));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct ConsignorService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ConsignorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Consignors added by shop staff start out approved.
    #[instrument(skip(self, input))]
    pub async fn create_consignor(
        &self,
        organization_id: Uuid,
        input: CreateConsignorInput,
    ) -> Result<ConsignorView, ServiceError> {
        if let Some(split) = input.split_percentage {
            super::validate_split(split)?;
        }
        let first_name = required("First name", input.first_name)?;
        let last_name = required("Last name", input.last_name)?;

        let txn = self.db_pool.begin().await?;
        let consignor_number = next_consignor_number(&txn, organization_id).await?;
        let model = consignor::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            consignor_number: Set(consignor_number),
            first_name: Set(first_name),
            last_name: Set(last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            split_percentage: Set(input.split_percentage),
            status: Set(ConsignorStatus::Active),
            approval_status: Set(ApprovalStatus::Approved),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(consignor_id = %model.id, number = %model.consignor_number, "consignor created");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_consignors(
        &self,
        organization_id: Uuid,
        filter: ConsignorFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ConsignorView>, u64), ServiceError> {
        let (page, limit) = super::page_window(page, limit);
        let mut query =
            ConsignorEntity::find().filter(consignor::Column::OrganizationId.eq(organization_id));

        if let Some(status) = filter.status {
            query = query.filter(consignor::Column::Status.eq(status));
        }
        if let Some(approval) = filter.approval_status {
            query = query.filter(consignor::Column::ApprovalStatus.eq(approval));
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let search = search.trim().to_string();
            query = query.filter(
                Condition::any()
                    .add(consignor::Column::FirstName.contains(&search))
                    .add(consignor::Column::LastName.contains(&search))
                    .add(consignor::Column::Email.contains(&search))
                    .add(consignor::Column::ConsignorNumber.contains(&search)),
            );
        }

        let paginator = query
            .order_by_asc(consignor::Column::ConsignorNumber)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_consignor(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
    ) -> Result<ConsignorView, ServiceError> {
        find_in_organization(&*self.db_pool, organization_id, consignor_id)
            .await
            .map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_consignor(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
        input: UpdateConsignorInput,
    ) -> Result<ConsignorView, ServiceError> {
        let mut model = find_in_organization(&*self.db_pool, organization_id, consignor_id)
            .await?
            .into_active_model();

        if let Some(first_name) = input.first_name {
            model.first_name = Set(required("First name", first_name)?);
        }
        if let Some(last_name) = input.last_name {
            model.last_name = Set(required("Last name", last_name)?);
        }
        if let Some(email) = input.email {
            model.email = Set(Some(email).filter(|e| !e.is_empty()));
        }
        if let Some(phone) = input.phone {
            model.phone = Set(Some(phone).filter(|p| !p.is_empty()));
        }
        if input.clear_split_percentage {
            model.split_percentage = Set(None);
        } else if let Some(split) = input.split_percentage {
            super::validate_split(split)?;
            model.split_percentage = Set(Some(split));
        }
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(notes) = input.notes {
            model.notes = Set(Some(notes));
        }

        Ok(model.update(&*self.db_pool).await?.into())
    }

    /// Approves a self-registered consignor and their portal login.
    #[instrument(skip(self))]
    pub async fn approve_consignor(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
    ) -> Result<ConsignorView, ServiceError> {
        let updated = self
            .set_approval(organization_id, consignor_id, ApprovalStatus::Approved)
            .await?;
        self.event_sender
            .send_or_log(Event::ConsignorApproved {
                organization_id,
                consignor_id,
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn reject_consignor(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
    ) -> Result<ConsignorView, ServiceError> {
        self.set_approval(organization_id, consignor_id, ApprovalStatus::Rejected)
            .await
    }

    async fn set_approval(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<ConsignorView, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_in_organization(&txn, organization_id, consignor_id).await?;
        if existing.approval_status != ApprovalStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Consignor is already {}",
                existing.approval_status
            )));
        }

        let mut model = existing.into_active_model();
        model.approval_status = Set(status);
        let updated = model.update(&txn).await?;

        user::Entity::update_many()
            .col_expr(user::Column::ApprovalStatus, status.into())
            .col_expr(user::Column::UpdatedAt, Utc::now().into())
            .filter(user::Column::ConsignorId.eq(consignor_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(consignor_id = %consignor_id, status = %status, "consignor approval updated");
        Ok(updated.into())
    }

    /// Deletes a consignor with no history, otherwise marks it inactive.
    #[instrument(skip(self))]
    pub async fn delete_consignor(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
    ) -> Result<ConsignorRemoval, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_in_organization(&txn, organization_id, consignor_id).await?;

        let item_count = item::Entity::find()
            .filter(item::Column::ConsignorId.eq(consignor_id))
            .count(&txn)
            .await?;
        let sale_count = transaction::Entity::find()
            .filter(transaction::Column::ConsignorId.eq(consignor_id))
            .count(&txn)
            .await?;

        let removal = if item_count > 0 || sale_count > 0 {
            let mut model = existing.into_active_model();
            model.status = Set(ConsignorStatus::Inactive);
            model.update(&txn).await?;
            ConsignorRemoval::Deactivated
        } else {
            user::Entity::delete_many()
                .filter(user::Column::ConsignorId.eq(consignor_id))
                .exec(&txn)
                .await?;
            ConsignorEntity::delete_by_id(consignor_id).exec(&txn).await?;
            ConsignorRemoval::Deleted
        };
        txn.commit().await?;

        info!(consignor_id = %consignor_id, removal = ?removal, "consignor removed");
        Ok(removal)
    }

    /// Item counts and money owed or paid to a consignor.
    #[instrument(skip(self))]
    pub async fn balance(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
    ) -> Result<ConsignorBalance, ServiceError> {
        let db = &*self.db_pool;
        find_in_organization(db, organization_id, consignor_id).await?;

        let items_available = item::Entity::find()
            .filter(item::Column::ConsignorId.eq(consignor_id))
            .filter(item::Column::Status.eq(ItemStatus::Available))
            .count(db)
            .await?;

        let sales = transaction::Entity::find()
            .filter(transaction::Column::ConsignorId.eq(consignor_id))
            .filter(transaction::Column::IsVoided.eq(false))
            .all(db)
            .await?;

        let mut balance = ConsignorBalance {
            consignor_id,
            items_available,
            items_sold: sales.len() as u64,
            total_sales: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
            pending_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
        };
        for sale in &sales {
            balance.total_sales += sale.sale_price;
            balance.total_earnings += sale.consignor_amount;
            match sale.payout_status {
                PayoutStatus::Paid => balance.paid_amount += sale.consignor_amount,
                PayoutStatus::Pending => balance.pending_amount += sale.consignor_amount,
            }
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn input(first: &str) -> CreateConsignorInput {
        CreateConsignorInput {
            first_name: first.to_string(),
            last_name: "Lovelace".to_string(),
            email: Some(format!("{}@example.com", first.to_lowercase())),
            phone: None,
            split_percentage: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn consignor_numbers_increase_per_organization() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let other = test_support::organization(&t.db, dec!(50)).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        let first = service.create_consignor(org.id, input("Ada")).await.unwrap();
        let second = service.create_consignor(org.id, input("Grace")).await.unwrap();
        let elsewhere = service.create_consignor(other.id, input("Alan")).await.unwrap();

        assert_eq!(first.consignor_number, "C-0001");
        assert_eq!(second.consignor_number, "C-0002");
        assert_eq!(elsewhere.consignor_number, "C-0001");
        assert_eq!(first.approval_status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn deleting_a_consignor_does_not_free_its_number() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        let first = service.create_consignor(org.id, input("Ada")).await.unwrap();
        let second = service.create_consignor(org.id, input("Grace")).await.unwrap();
        assert_eq!(
            service.delete_consignor(org.id, first.id).await.unwrap(),
            ConsignorRemoval::Deleted
        );

        let third = service.create_consignor(org.id, input("Alan")).await.unwrap();
        assert_eq!(second.consignor_number, "C-0002");
        assert_eq!(third.consignor_number, "C-0003");
    }

    #[test]
    fn sequence_is_parsed_from_consignor_numbers() {
        assert_eq!(consignor_sequence("C-0042"), Some(42));
        assert_eq!(consignor_sequence("C-12345"), Some(12345));
        assert_eq!(consignor_sequence("X-0001"), None);
    }

    #[tokio::test]
    async fn split_outside_range_is_rejected() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        let mut bad = input("Ada");
        bad.split_percentage = Some(dec!(120));
        assert_matches!(
            service.create_consignor(org.id, bad).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn consignor_from_other_organization_is_not_found() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let other = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, other.id, 1, None).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        assert_matches!(
            service.get_consignor(org.id, c.id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn delete_deactivates_when_items_exist() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let with_items = test_support::consignor(&t.db, org.id, 1, None).await;
        let without = test_support::consignor(&t.db, org.id, 2, None).await;
        test_support::item(&t.db, org.id, with_items.id, None, dec!(10)).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        assert_eq!(
            service.delete_consignor(org.id, with_items.id).await.unwrap(),
            ConsignorRemoval::Deactivated
        );
        assert_eq!(
            service.delete_consignor(org.id, without.id).await.unwrap(),
            ConsignorRemoval::Deleted
        );
        let kept = service.get_consignor(org.id, with_items.id).await.unwrap();
        assert_eq!(kept.status, ConsignorStatus::Inactive);
    }

    #[tokio::test]
    async fn balance_splits_pending_and_paid() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        test_support::sale(&t.db, org.id, c.id, dec!(100), dec!(60), Utc::now()).await;
        test_support::sale(&t.db, org.id, c.id, dec!(40), dec!(24), Utc::now()).await;
        let service = ConsignorService::new(t.db.clone(), t.events.clone());

        let balance = service.balance(org.id, c.id).await.unwrap();
        assert_eq!(balance.items_sold, 2);
        assert_eq!(balance.total_sales, dec!(140));
        assert_eq!(balance.pending_amount, dec!(84));
        assert_eq!(balance.paid_amount, Decimal::ZERO);
    }
}
