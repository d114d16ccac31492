use crate::{
    db::DbPool,
    entities::{
        item::{self, ItemStatus},
        organization,
        transaction::{self, Entity as TransactionEntity, PayoutStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{consignors, items};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub consignor_id: Uuid,
    pub sale_price: Decimal,
    pub split_percentage: Decimal,
    pub consignor_amount: Decimal,
    pub shop_amount: Decimal,
    pub payment_method: String,
    pub payout_status: PayoutStatus,
    pub payout_id: Option<Uuid>,
    pub consignor_paid_out: bool,
    pub is_voided: bool,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub sold_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction::Model> for TransactionView {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            consignor_id: model.consignor_id,
            sale_price: model.sale_price,
            split_percentage: model.split_percentage,
            consignor_amount: model.consignor_amount,
            shop_amount: model.shop_amount,
            payment_method: model.payment_method,
            payout_status: model.payout_status,
            payout_id: model.payout_id,
            consignor_paid_out: model.consignor_paid_out,
            is_voided: model.is_voided,
            voided_at: model.voided_at,
            void_reason: model.void_reason,
            sold_at: model.sold_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordSaleInput {
    pub item_id: Uuid,
    /// Defaults to the item's tag price
    pub sale_price: Option<Decimal>,
    pub payment_method: String,
    /// Defaults to now; set when entering sales after the fact
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub consignor_id: Option<Uuid>,
    pub payout_status: Option<PayoutStatus>,
    pub include_voided: bool,
    pub sold_from: Option<NaiveDate>,
    pub sold_to: Option<NaiveDate>,
}

/// Splits a sale into (consignor_amount, shop_amount); the two always sum to
/// `sale_price`.
pub fn split_sale(sale_price: Decimal, split_percentage: Decimal) -> (Decimal, Decimal) {
    let consignor_amount =
        super::round_money(sale_price * split_percentage / Decimal::ONE_HUNDRED);
    (consignor_amount, sale_price - consignor_amount)
}

/// First instant of `date` in UTC.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// First instant after `date` in UTC.
pub(crate) fn end_of_day_exclusive(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date.succ_opt().unwrap_or(NaiveDate::MAX))
}

pub(crate) async fn find_in_organization<C>(
    conn: &C,
    organization_id: Uuid,
    transaction_id: Uuid,
) -> Result<transaction::Model, ServiceError>
where
    C: ConnectionTrait,
{
    TransactionEntity::find_by_id(transaction_id)
        .filter(transaction::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", transaction_id)))
}

#[derive(Clone)]
pub struct TransactionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl TransactionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Sells an available item, freezing the split in effect at sale time.
    #[instrument(skip(self, input), fields(item_id = %input.item_id))]
    pub async fn record_sale(
        &self,
        organization_id: Uuid,
        input: RecordSaleInput,
    ) -> Result<TransactionView, ServiceError> {
        let payment_method = input.payment_method.trim().to_lowercase();
        if payment_method.is_empty() {
            return Err(ServiceError::ValidationError(
                "Payment method is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let item = items::find_in_organization(&txn, organization_id, input.item_id).await?;
        if item.status != ItemStatus::Available {
            return Err(ServiceError::InvalidOperation(format!(
                "Item {} is {} and cannot be sold",
                item.sku, item.status
            )));
        }

        let sale_price = super::round_money(input.sale_price.unwrap_or(item.price));
        if sale_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Sale price cannot be negative".to_string(),
            ));
        }

        let organization = organization::Entity::find_by_id(organization_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Organization not found".to_string()))?;
        let consignor =
            consignors::find_in_organization(&txn, organization_id, item.consignor_id).await?;

        let split = consignor.effective_split(organization.default_split_percentage);
        let (consignor_amount, shop_amount) = split_sale(sale_price, split);
        let sold_at = input.sold_at.unwrap_or_else(Utc::now);

        let sale = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            item_id: Set(item.id),
            consignor_id: Set(consignor.id),
            sale_price: Set(sale_price),
            split_percentage: Set(split),
            consignor_amount: Set(consignor_amount),
            shop_amount: Set(shop_amount),
            payment_method: Set(payment_method),
            payout_status: Set(PayoutStatus::Pending),
            payout_id: Set(None),
            consignor_paid_out: Set(false),
            is_voided: Set(false),
            voided_at: Set(None),
            void_reason: Set(None),
            sold_at: Set(sold_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut sold_item = item.into_active_model();
        sold_item.status = Set(ItemStatus::Sold);
        sold_item.sold_at = Set(Some(sold_at));
        sold_item.update(&txn).await?;

        txn.commit().await?;

        counter!("consignment.sales.recorded", 1);
        info!(
            transaction_id = %sale.id,
            sale_price = %sale.sale_price,
            consignor_amount = %sale.consignor_amount,
            "sale recorded"
        );
        self.event_sender
            .send_or_log(Event::ItemSold {
                organization_id,
                item_id: sale.item_id,
                transaction_id: sale.id,
                sale_price: sale.sale_price,
            })
            .await;

        Ok(sale.into())
    }

    /// Voids an unpaid sale and puts the item back on the floor.
    #[instrument(skip(self, reason))]
    pub async fn void_transaction(
        &self,
        organization_id: Uuid,
        transaction_id: Uuid,
        reason: Option<String>,
    ) -> Result<TransactionView, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let sale = find_in_organization(&txn, organization_id, transaction_id).await?;

        if sale.is_voided {
            return Err(ServiceError::InvalidOperation(
                "Transaction is already voided".to_string(),
            ));
        }
        if sale.consignor_paid_out || sale.payout_status == PayoutStatus::Paid {
            return Err(ServiceError::InvalidOperation(
                "Transaction has been paid out and cannot be voided".to_string(),
            ));
        }

        let item_id = sale.item_id;
        let mut model = sale.into_active_model();
        model.is_voided = Set(true);
        model.voided_at = Set(Some(Utc::now()));
        model.void_reason = Set(reason);
        let voided = model.update(&txn).await?;

        if let Some(item) = item::Entity::find_by_id(item_id).one(&txn).await? {
            if item.status == ItemStatus::Sold {
                let mut restocked = item.into_active_model();
                restocked.status = Set(ItemStatus::Available);
                restocked.sold_at = Set(None);
                restocked.update(&txn).await?;
            }
        }

        txn.commit().await?;

        counter!("consignment.sales.voided", 1);
        info!(transaction_id = %transaction_id, "transaction voided");
        self.event_sender
            .send_or_log(Event::TransactionVoided {
                organization_id,
                transaction_id,
            })
            .await;

        Ok(voided.into())
    }

    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        organization_id: Uuid,
        filter: TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<TransactionView>, u64), ServiceError> {
        let (page, limit) = super::page_window(page, limit);
        let mut query = TransactionEntity::find()
            .filter(transaction::Column::OrganizationId.eq(organization_id));

        if let Some(consignor_id) = filter.consignor_id {
            query = query.filter(transaction::Column::ConsignorId.eq(consignor_id));
        }
        if let Some(status) = filter.payout_status {
            query = query.filter(transaction::Column::PayoutStatus.eq(status));
        }
        if !filter.include_voided {
            query = query.filter(transaction::Column::IsVoided.eq(false));
        }
        if let Some(from) = filter.sold_from {
            query = query.filter(transaction::Column::SoldAt.gte(start_of_day(from)));
        }
        if let Some(to) = filter.sold_to {
            query = query.filter(transaction::Column::SoldAt.lt(end_of_day_exclusive(to)));
        }

        let paginator = query
            .order_by_desc(transaction::Column::SoldAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        organization_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<TransactionView, ServiceError> {
        find_in_organization(&*self.db_pool, organization_id, transaction_id)
            .await
            .map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn split_sale_rounds_consignor_share() {
        assert_eq!(split_sale(dec!(100), dec!(60)), (dec!(60), dec!(40)));
        assert_eq!(split_sale(dec!(19.99), dec!(50)), (dec!(10.00), dec!(9.99)));
        assert_eq!(split_sale(dec!(0.05), dec!(50)), (dec!(0.03), dec!(0.02)));
    }

    proptest! {
        #[test]
        fn split_parts_sum_to_sale_price(cents in 0i64..10_000_000, split in 0u32..=100) {
            let price = Decimal::new(cents, 2);
            let (consignor, shop) = split_sale(price, Decimal::from(split));
            prop_assert_eq!(consignor + shop, price);
            prop_assert!(consignor >= Decimal::ZERO && shop >= Decimal::ZERO);
            prop_assert!(consignor.scale() <= 2);
        }
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(start_of_day(day).to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(
            end_of_day_exclusive(day).to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn record_sale_uses_consignor_split_and_marks_item_sold() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, Some(dec!(60))).await;
        let item = test_support::item(&t.db, org.id, c.id, None, dec!(80)).await;
        let service = TransactionService::new(t.db.clone(), t.events.clone());

        let sale = service
            .record_sale(
                org.id,
                RecordSaleInput {
                    item_id: item.id,
                    sale_price: Some(dec!(75)),
                    payment_method: "Card".to_string(),
                    sold_at: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(sale.split_percentage, dec!(60));
        assert_eq!(sale.consignor_amount, dec!(45));
        assert_eq!(sale.shop_amount, dec!(30));
        assert_eq!(sale.payment_method, "card");
        assert_eq!(sale.payout_status, PayoutStatus::Pending);

        let reloaded = items::find_in_organization(&*t.db, org.id, item.id).await.unwrap();
        assert_eq!(reloaded.status, ItemStatus::Sold);

        assert_matches!(
            service
                .record_sale(
                    org.id,
                    RecordSaleInput {
                        item_id: item.id,
                        sale_price: None,
                        payment_method: "cash".to_string(),
                        sold_at: None,
                    },
                )
                .await,
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[tokio::test]
    async fn record_sale_falls_back_to_shop_default() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(40)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let item = test_support::item(&t.db, org.id, c.id, None, dec!(50)).await;
        let service = TransactionService::new(t.db.clone(), t.events.clone());

        let sale = service
            .record_sale(
                org.id,
                RecordSaleInput {
                    item_id: item.id,
                    sale_price: None,
                    payment_method: "cash".to_string(),
                    sold_at: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sale.consignor_amount, dec!(20));
        assert_eq!(sale.shop_amount, dec!(30));
    }

    #[tokio::test]
    async fn void_restocks_item_but_refuses_paid_sales() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let unpaid = test_support::sale(&t.db, org.id, c.id, dec!(20), dec!(10), Utc::now()).await;
        let paid = test_support::sale(&t.db, org.id, c.id, dec!(30), dec!(15), Utc::now()).await;
        let mut paid_model = paid.clone().into_active_model();
        paid_model.payout_status = Set(PayoutStatus::Paid);
        paid_model.consignor_paid_out = Set(true);
        paid_model.update(&*t.db).await.unwrap();
        let service = TransactionService::new(t.db.clone(), t.events.clone());

        let voided = service
            .void_transaction(org.id, unpaid.id, Some("returned".to_string()))
            .await
            .unwrap();
        assert!(voided.is_voided);
        let item = items::find_in_organization(&*t.db, org.id, unpaid.item_id)
            .await
            .unwrap();
        assert_eq!(item.status, ItemStatus::Available);

        assert_matches!(
            service.void_transaction(org.id, paid.id, None).await,
            Err(ServiceError::InvalidOperation(_))
        );

        let (visible, total) = service
            .list_transactions(org.id, TransactionFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(visible[0].id, paid.id);
    }
}
