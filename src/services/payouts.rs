use crate::{
    db::DbPool,
    entities::{
        consignor,
        payout::{self, Entity as PayoutEntity},
        transaction::{self, PayoutStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{consignors, transactions::TransactionView};

const PAYOUT_SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone)]
pub struct CreatePayoutInput {
    pub consignor_id: Uuid,
    pub transaction_ids: Vec<Uuid>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayoutView {
    pub id: Uuid,
    pub consignor_id: Uuid,
    pub payout_number: String,
    pub amount: Decimal,
    pub transaction_count: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<payout::Model> for PayoutView {
    fn from(model: payout::Model) -> Self {
        Self {
            id: model.id,
            consignor_id: model.consignor_id,
            payout_number: model.payout_number,
            amount: model.amount,
            transaction_count: model.transaction_count,
            period_start: model.period_start,
            period_end: model.period_end,
            payment_method: model.payment_method,
            payment_reference: model.payment_reference,
            notes: model.notes,
            paid_at: model.paid_at,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

/// A payout together with the sales it settled.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayoutDetail {
    pub payout: PayoutView,
    pub transactions: Vec<TransactionView>,
}

/// What the shop currently owes one consignor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingPayoutSummary {
    pub consignor_id: Uuid,
    pub consignor_number: String,
    pub consignor_name: String,
    pub transaction_count: u64,
    pub amount: Decimal,
    pub earliest_sale: DateTime<Utc>,
    pub latest_sale: DateTime<Utc>,
}

/// `PAY-YYYYMMDD-XXXXXX`
pub fn payout_number(date: NaiveDate) -> String {
    format!(
        "PAY-{}-{}",
        date.format("%Y%m%d"),
        super::random_code(PAYOUT_SUFFIX_ALPHABET, 6)
    )
}

fn check_ids(ids: &[Uuid]) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Err(ServiceError::ValidationError(
            "At least one transaction is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let duplicates: Vec<String> = ids
        .iter()
        .filter(|id| !seen.insert(**id))
        .map(|id| id.to_string())
        .collect();
    if !duplicates.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "Duplicate transaction ids: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

/// Explains why each requested id cannot be paid; empty when all can.
fn unpayable(requested: &[Uuid], found: &[transaction::Model]) -> Vec<String> {
    let by_id: HashMap<Uuid, &transaction::Model> = found.iter().map(|t| (t.id, t)).collect();
    requested
        .iter()
        .filter_map(|id| match by_id.get(id) {
            None => Some(format!("transaction {} not found for this consignor", id)),
            Some(t) if t.is_voided => Some(format!("transaction {} is voided", id)),
            Some(t) if !t.is_payable() => Some(format!("transaction {} is already paid out", id)),
            Some(_) => None,
        })
        .collect()
}

#[derive(Clone)]
pub struct PayoutService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PayoutService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Pays a consignor for the given sales and links them to the new payout.
    ///
    /// Everything happens in one database transaction: either every sale is
    /// flipped to paid and linked, or nothing changes.
    #[instrument(skip(self, input), fields(consignor_id = %input.consignor_id, count = input.transaction_ids.len()))]
    pub async fn create_payout(
        &self,
        organization_id: Uuid,
        created_by: Option<Uuid>,
        input: CreatePayoutInput,
    ) -> Result<PayoutDetail, ServiceError> {
        check_ids(&input.transaction_ids)?;
        let payment_method = input.payment_method.trim().to_lowercase();
        if payment_method.is_empty() {
            return Err(ServiceError::ValidationError(
                "Payment method is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let consignor = consignors::find_in_organization(&txn, organization_id, input.consignor_id)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(msg) => ServiceError::ValidationError(msg),
                other => other,
            })?;

        let sales = transaction::Entity::find()
            .filter(transaction::Column::Id.is_in(input.transaction_ids.clone()))
            .filter(transaction::Column::OrganizationId.eq(organization_id))
            .filter(transaction::Column::ConsignorId.eq(consignor.id))
            .order_by_asc(transaction::Column::SoldAt)
            .all(&txn)
            .await?;

        let problems = unpayable(&input.transaction_ids, &sales);
        if !problems.is_empty() {
            warn!(problems = ?problems, "payout rejected");
            return Err(ServiceError::ValidationError(format!(
                "Transactions cannot be paid out: {}",
                problems.join("; ")
            )));
        }

        let amount = super::round_money(sales.iter().map(|t| t.consignor_amount).sum());
        let period_start = sales
            .iter()
            .map(|t| t.sold_at.date_naive())
            .min()
            .ok_or_else(|| ServiceError::InternalError("payout without sales".to_string()))?;
        let period_end = sales
            .iter()
            .map(|t| t.sold_at.date_naive())
            .max()
            .unwrap_or(period_start);

        let overlapping = PayoutEntity::find()
            .filter(payout::Column::OrganizationId.eq(organization_id))
            .filter(payout::Column::ConsignorId.eq(consignor.id))
            .filter(payout::Column::PeriodStart.eq(period_start))
            .filter(payout::Column::PeriodEnd.eq(period_end))
            .count(&txn)
            .await?;
        if overlapping > 0 {
            warn!(
                consignor_id = %consignor.id,
                %period_start,
                %period_end,
                "consignor already has a payout for this period"
            );
        }

        let paid_at = input.paid_at.unwrap_or_else(Utc::now);
        let payout_id = Uuid::new_v4();
        let created = payout::ActiveModel {
            id: Set(payout_id),
            organization_id: Set(organization_id),
            consignor_id: Set(consignor.id),
            payout_number: Set(payout_number(paid_at.date_naive())),
            amount: Set(amount),
            transaction_count: Set(sales.len() as i32),
            period_start: Set(period_start),
            period_end: Set(period_end),
            payment_method: Set(payment_method),
            payment_reference: Set(input.payment_reference),
            notes: Set(input.notes),
            paid_at: Set(paid_at),
            created_by: Set(created_by),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let result = transaction::Entity::update_many()
            .col_expr(transaction::Column::PayoutStatus, PayoutStatus::Paid.into())
            .col_expr(transaction::Column::PayoutId, Some(payout_id).into())
            .col_expr(transaction::Column::ConsignorPaidOut, true.into())
            .col_expr(transaction::Column::UpdatedAt, Utc::now().into())
            .filter(transaction::Column::Id.is_in(input.transaction_ids.clone()))
            .filter(transaction::Column::PayoutId.is_null())
            .filter(transaction::Column::IsVoided.eq(false))
            .exec(&txn)
            .await?;
        if result.rows_affected != sales.len() as u64 {
            return Err(ServiceError::Conflict(
                "Transactions changed while the payout was being created".to_string(),
            ));
        }

        let linked = transaction::Entity::find()
            .filter(transaction::Column::PayoutId.eq(payout_id))
            .order_by_asc(transaction::Column::SoldAt)
            .all(&txn)
            .await?;

        txn.commit().await?;

        counter!("consignment.payouts.created", 1);
        info!(
            payout_id = %created.id,
            payout_number = %created.payout_number,
            amount = %created.amount,
            "payout created"
        );
        self.event_sender
            .send_or_log(Event::PayoutCreated {
                organization_id,
                consignor_id: created.consignor_id,
                payout_id: created.id,
                amount: created.amount,
            })
            .await;

        Ok(PayoutDetail {
            payout: created.into(),
            transactions: linked.into_iter().map(Into::into).collect(),
        })
    }

    /// Unpaid earnings grouped by consignor, largest first.
    #[instrument(skip(self))]
    pub async fn pending_payouts(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<PendingPayoutSummary>, ServiceError> {
        let db = &*self.db_pool;
        let pending = transaction::Entity::find()
            .filter(transaction::Column::OrganizationId.eq(organization_id))
            .filter(transaction::Column::PayoutStatus.eq(PayoutStatus::Pending))
            .filter(transaction::Column::IsVoided.eq(false))
            .all(db)
            .await?;

        let mut grouped: BTreeMap<Uuid, Vec<transaction::Model>> = BTreeMap::new();
        for sale in pending {
            grouped.entry(sale.consignor_id).or_default().push(sale);
        }
        if grouped.is_empty() {
            return Ok(Vec::new());
        }

        let names: HashMap<Uuid, consignor::Model> = consignor::Entity::find()
            .filter(consignor::Column::Id.is_in(grouped.keys().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut summaries: Vec<PendingPayoutSummary> = grouped
            .into_iter()
            .filter_map(|(consignor_id, sales)| {
                let consignor = names.get(&consignor_id)?;
                let earliest_sale = sales.iter().map(|t| t.sold_at).min()?;
                let latest_sale = sales.iter().map(|t| t.sold_at).max()?;
                Some(PendingPayoutSummary {
                    consignor_id,
                    consignor_number: consignor.consignor_number.clone(),
                    consignor_name: consignor.display_name(),
                    transaction_count: sales.len() as u64,
                    amount: super::round_money(sales.iter().map(|t| t.consignor_amount).sum()),
                    earliest_sale,
                    latest_sale,
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.amount.cmp(&a.amount));
        Ok(summaries)
    }

    #[instrument(skip(self))]
    pub async fn list_payouts(
        &self,
        organization_id: Uuid,
        consignor_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<PayoutView>, u64), ServiceError> {
        let (page, limit) = super::page_window(page, limit);
        let mut query =
            PayoutEntity::find().filter(payout::Column::OrganizationId.eq(organization_id));
        if let Some(consignor_id) = consignor_id {
            query = query.filter(payout::Column::ConsignorId.eq(consignor_id));
        }

        let paginator = query
            .order_by_desc(payout::Column::PaidAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;
        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_payout(
        &self,
        organization_id: Uuid,
        payout_id: Uuid,
    ) -> Result<PayoutDetail, ServiceError> {
        let db = &*self.db_pool;
        let payout = PayoutEntity::find_by_id(payout_id)
            .filter(payout::Column::OrganizationId.eq(organization_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payout {} not found", payout_id)))?;

        let transactions = transaction::Entity::find()
            .filter(transaction::Column::PayoutId.eq(payout_id))
            .order_by_asc(transaction::Column::SoldAt)
            .all(db)
            .await?;

        Ok(PayoutDetail {
            payout: payout.into(),
            transactions: transactions.into_iter().map(Into::into).collect(),
        })
    }
}
