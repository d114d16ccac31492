use crate::{
    db::DbPool,
    entities::{
        consignor, payout,
        statement::{self, Entity as StatementEntity},
        transaction, ApprovalStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{consignors, payouts::PayoutView, round_money, transactions::TransactionView};

/// Figures that make up one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementTotals {
    pub opening_balance: Decimal,
    pub total_sales: Decimal,
    pub total_earnings: Decimal,
    pub total_payouts: Decimal,
    pub closing_balance: Decimal,
    pub items_sold: i32,
    pub payout_count: i32,
}

/// Folds a consignor's history into statement totals for an inclusive period.
///
/// Voided sales are ignored. Anything dated before `period_start` feeds the
/// opening balance; anything after `period_end` is left out.
pub fn compute_statement(
    period_start: NaiveDate,
    period_end: NaiveDate,
    sales: &[transaction::Model],
    payouts: &[payout::Model],
) -> StatementTotals {
    let mut totals = StatementTotals::default();
    let mut earned_before = Decimal::ZERO;
    let mut paid_before = Decimal::ZERO;

    for sale in sales.iter().filter(|t| !t.is_voided) {
        let day = sale.sold_at.date_naive();
        if day < period_start {
            earned_before += sale.consignor_amount;
        } else if day <= period_end {
            totals.total_sales += sale.sale_price;
            totals.total_earnings += sale.consignor_amount;
            totals.items_sold += 1;
        }
    }

    for payout in payouts {
        let day = payout.paid_at.date_naive();
        if day < period_start {
            paid_before += payout.amount;
        } else if day <= period_end {
            totals.total_payouts += payout.amount;
            totals.payout_count += 1;
        }
    }

    totals.opening_balance = round_money(earned_before - paid_before);
    totals.total_sales = round_money(totals.total_sales);
    totals.total_earnings = round_money(totals.total_earnings);
    totals.total_payouts = round_money(totals.total_payouts);
    totals.closing_balance =
        totals.opening_balance + totals.total_earnings - totals.total_payouts;
    totals
}

/// `STMT-YYYYMM-C-0001`
pub fn statement_number(period_start: NaiveDate, consignor_number: &str) -> String {
    format!("STMT-{}-{}", period_start.format("%Y%m"), consignor_number)
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let invalid = || ServiceError::ValidationError(format!("Invalid month {}-{}", year, month));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let end = next.pred_opt().ok_or_else(invalid)?;
    Ok((start, end))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatementView {
    pub id: Uuid,
    pub consignor_id: Uuid,
    pub statement_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub opening_balance: Decimal,
    pub total_sales: Decimal,
    pub total_earnings: Decimal,
    pub total_payouts: Decimal,
    pub closing_balance: Decimal,
    pub items_sold: i32,
    pub payout_count: i32,
    pub generated_at: DateTime<Utc>,
    pub generated_by: Option<Uuid>,
}

impl From<statement::Model> for StatementView {
    fn from(model: statement::Model) -> Self {
        Self {
            id: model.id,
            consignor_id: model.consignor_id,
            statement_number: model.statement_number,
            period_start: model.period_start,
            period_end: model.period_end,
            opening_balance: model.opening_balance,
            total_sales: model.total_sales,
            total_earnings: model.total_earnings,
            total_payouts: model.total_payouts,
            closing_balance: model.closing_balance,
            items_sold: model.items_sold,
            payout_count: model.payout_count,
            generated_at: model.generated_at,
            generated_by: model.generated_by,
        }
    }
}

/// A statement with the activity it summarizes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatementDetail {
    pub statement: StatementView,
    pub transactions: Vec<TransactionView>,
    pub payouts: Vec<PayoutView>,
}

async fn consignor_history<C>(
    conn: &C,
    organization_id: Uuid,
    consignor_id: Uuid,
) -> Result<(Vec<transaction::Model>, Vec<payout::Model>), ServiceError>
where
    C: ConnectionTrait,
{
    let sales = transaction::Entity::find()
        .filter(transaction::Column::OrganizationId.eq(organization_id))
        .filter(transaction::Column::ConsignorId.eq(consignor_id))
        .filter(transaction::Column::IsVoided.eq(false))
        .order_by_asc(transaction::Column::SoldAt)
        .all(conn)
        .await?;
    let payouts = payout::Entity::find()
        .filter(payout::Column::OrganizationId.eq(organization_id))
        .filter(payout::Column::ConsignorId.eq(consignor_id))
        .order_by_asc(payout::Column::PaidAt)
        .all(conn)
        .await?;
    Ok((sales, payouts))
}

#[derive(Clone)]
pub struct StatementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StatementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Generates (or regenerates) a consignor's statement for a period.
    ///
    /// A statement already starting on `period_start` is replaced by the new
    /// one in the same database transaction.
    #[instrument(skip(self))]
    pub async fn generate_statement(
        &self,
        organization_id: Uuid,
        consignor_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        generated_by: Option<Uuid>,
    ) -> Result<StatementView, ServiceError> {
        if period_end < period_start {
            return Err(ServiceError::ValidationError(
                "Period end must not be before period start".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let consignor = consignors::find_in_organization(&txn, organization_id, consignor_id).await?;
        let (sales, payouts) = consignor_history(&txn, organization_id, consignor_id).await?;
        let totals = compute_statement(period_start, period_end, &sales, &payouts);

        let replaced = StatementEntity::delete_many()
            .filter(statement::Column::OrganizationId.eq(organization_id))
            .filter(statement::Column::ConsignorId.eq(consignor_id))
            .filter(statement::Column::PeriodStart.eq(period_start))
            .exec(&txn)
            .await?
            .rows_affected;

        let created = statement::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            consignor_id: Set(consignor_id),
            statement_number: Set(statement_number(period_start, &consignor.consignor_number)),
            period_start: Set(period_start),
            period_end: Set(period_end),
            opening_balance: Set(totals.opening_balance),
            total_sales: Set(totals.total_sales),
            total_earnings: Set(totals.total_earnings),
            total_payouts: Set(totals.total_payouts),
            closing_balance: Set(totals.closing_balance),
            items_sold: Set(totals.items_sold),
            payout_count: Set(totals.payout_count),
            generated_at: Set(Utc::now()),
            generated_by: Set(generated_by),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        counter!("consignment.statements.generated", 1);
        info!(
            statement_id = %created.id,
            statement_number = %created.statement_number,
            closing_balance = %created.closing_balance,
            replaced,
            "statement generated"
        );
        self.event_sender
            .send_or_log(Event::StatementGenerated {
                organization_id,
                consignor_id,
                statement_id: created.id,
                period_start,
            })
            .await;

        Ok(created.into())
    }

    /// Statements for every approved consignor for one calendar month.
    #[instrument(skip(self))]
    pub async fn generate_monthly(
        &self,
        organization_id: Uuid,
        year: i32,
        month: u32,
        generated_by: Option<Uuid>,
    ) -> Result<Vec<StatementView>, ServiceError> {
        let (period_start, period_end) = month_bounds(year, month)?;
        let consignors = consignor::Entity::find()
            .filter(consignor::Column::OrganizationId.eq(organization_id))
            .filter(consignor::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .order_by_asc(consignor::Column::ConsignorNumber)
            .all(&*self.db_pool)
            .await?;

        let mut generated = Vec::with_capacity(consignors.len());
        for consignor in consignors {
            generated.push(
                self.generate_statement(
                    organization_id,
                    consignor.id,
                    period_start,
                    period_end,
                    generated_by,
                )
                .await?,
            );
        }
        info!(
            month = %format!("{}-{:02}", period_start.year(), period_start.month()),
            count = generated.len(),
            "monthly statements generated"
        );
        Ok(generated)
    }

    #[instrument(skip(self))]
    pub async fn list_statements(
        &self,
        organization_id: Uuid,
        consignor_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<StatementView>, u64), ServiceError> {
        let (page, limit) = super::page_window(page, limit);
        let mut query =
            StatementEntity::find().filter(statement::Column::OrganizationId.eq(organization_id));
        if let Some(consignor_id) = consignor_id {
            query = query.filter(statement::Column::ConsignorId.eq(consignor_id));
        }

        let paginator = query
            .order_by_desc(statement::Column::PeriodStart)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;
        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_statement(
        &self,
        organization_id: Uuid,
        statement_id: Uuid,
    ) -> Result<StatementDetail, ServiceError> {
        let db = &*self.db_pool;
        let statement = StatementEntity::find_by_id(statement_id)
            .filter(statement::Column::OrganizationId.eq(organization_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Statement {} not found", statement_id))
            })?;

        let (sales, payouts) =
            consignor_history(db, organization_id, statement.consignor_id).await?;
        let in_period = |day: NaiveDate| day >= statement.period_start && day <= statement.period_end;

        let transactions = sales
            .into_iter()
            .filter(|t| in_period(t.sold_at.date_naive()))
            .map(Into::into)
            .collect();
        let payouts = payouts
            .into_iter()
            .filter(|p| in_period(p.paid_at.date_naive()))
            .map(Into::into)
            .collect();

        Ok(StatementDetail {
            statement: statement.into(),
            transactions,
            payouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transaction::PayoutStatus;
    use crate::test_support;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sale(sold_at: DateTime<Utc>, price: Decimal, earned: Decimal, voided: bool) -> transaction::Model {
        transaction::Model {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            item_id: Uuid::new_v4(),
            consignor_id: Uuid::nil(),
            sale_price: price,
            split_percentage: dec!(50),
            consignor_amount: earned,
            shop_amount: price - earned,
            payment_method: "cash".to_string(),
            payout_status: PayoutStatus::Pending,
            payout_id: None,
            consignor_paid_out: false,
            is_voided: voided,
            voided_at: None,
            void_reason: None,
            sold_at,
            created_at: sold_at,
            updated_at: sold_at,
        }
    }

    fn paid(paid_at: DateTime<Utc>, amount: Decimal) -> payout::Model {
        payout::Model {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            consignor_id: Uuid::nil(),
            payout_number: "PAY-20240101-AAAAAA".to_string(),
            amount,
            transaction_count: 1,
            period_start: paid_at.date_naive(),
            period_end: paid_at.date_naive(),
            payment_method: "check".to_string(),
            payment_reference: None,
            notes: None,
            paid_at,
            created_by: None,
            created_at: paid_at,
        }
    }

    #[test]
    fn totals_split_history_around_the_period() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let sales = vec![
            sale(at(2024, 2, 10), dec!(100), dec!(50), false),
            sale(at(2024, 3, 1), dec!(40), dec!(20), false),
            sale(at(2024, 3, 31), dec!(60), dec!(30), false),
            sale(at(2024, 3, 15), dec!(999), dec!(500), true),
            sale(at(2024, 4, 1), dec!(10), dec!(5), false),
        ];
        let payouts = vec![paid(at(2024, 2, 20), dec!(30)), paid(at(2024, 3, 5), dec!(20))];

        let totals = compute_statement(start, end, &sales, &payouts);
        assert_eq!(totals.opening_balance, dec!(20));
        assert_eq!(totals.total_sales, dec!(100));
        assert_eq!(totals.total_earnings, dec!(50));
        assert_eq!(totals.items_sold, 2);
        assert_eq!(totals.total_payouts, dec!(20));
        assert_eq!(totals.payout_count, 1);
        assert_eq!(totals.closing_balance, dec!(50));
    }

    #[test]
    fn month_bounds_handle_year_end_and_leap_years() {
        let (s, e) = month_bounds(2024, 2).unwrap();
        assert_eq!((s.day(), e.day()), (1, 29));
        let (_, e) = month_bounds(2023, 12).unwrap();
        assert_eq!(e, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_matches!(month_bounds(2024, 13), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn statement_number_uses_period_month_and_consignor_number() {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(statement_number(start, "C-0007"), "STMT-202407-C-0007");
    }

    #[tokio::test]
    async fn regenerating_replaces_the_previous_statement() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        test_support::sale(&t.db, org.id, c.id, dec!(80), dec!(40), at(2024, 5, 10)).await;
        let service = StatementService::new(t.db.clone(), t.events.clone());
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

        let first = service
            .generate_statement(org.id, c.id, start, end, None)
            .await
            .unwrap();
        assert_eq!(first.total_earnings, dec!(40));
        assert_eq!(first.statement_number, "STMT-202405-C-0001");

        test_support::sale(&t.db, org.id, c.id, dec!(20), dec!(10), at(2024, 5, 20)).await;
        let second = service
            .generate_statement(org.id, c.id, start, end, None)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.total_earnings, dec!(50));
        assert_eq!(second.closing_balance, dec!(50));

        let (all, total) = service.list_statements(org.id, Some(c.id), 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(all[0].id, second.id);

        let detail = service.get_statement(org.id, second.id).await.unwrap();
        assert_eq!(detail.transactions.len(), 2);
        assert!(detail.payouts.is_empty());
    }

    #[tokio::test]
    async fn inverted_period_is_rejected() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let service = StatementService::new(t.db.clone(), t.events.clone());

        assert_matches!(
            service
                .generate_statement(
                    org.id,
                    c.id,
                    NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    None,
                )
                .await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn monthly_run_covers_approved_consignors() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        test_support::consignor(&t.db, org.id, 1, None).await;
        test_support::consignor(&t.db, org.id, 2, None).await;
        let service = StatementService::new(t.db.clone(), t.events.clone());

        let generated = service.generate_monthly(org.id, 2024, 6, None).await.unwrap();
        assert_eq!(generated.len(), 2);
        assert!(generated
            .iter()
            .all(|s| s.period_end == NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
    }
}
