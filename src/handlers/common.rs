use crate::{errors::ServiceError, services::MAX_PAGE_SIZE, ApiResponse, PaginatedResponse};
use axum::{http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Validate request input; failures carry one message per field.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// 201 with the standard envelope
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Pagination parameters for list operations
#[derive(Debug, Clone, Copy, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page, at most 100
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    /// Page and limit as the services clamp them.
    pub fn normalized(&self) -> (u64, u64) {
        (self.page.max(1), self.limit.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn respond<T>(&self, items: Vec<T>, total: u64) -> PaginatedResponse<T> {
        let (page, limit) = self.normalized();
        PaginatedResponse::new(items, total, page, limit)
    }
}

/// Money amounts must be non-negative with at most two decimals.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || value.normalize().scale() > 2 {
        let mut error = ValidationError::new("money");
        error.message = Some("must be a non-negative amount with at most two decimals".into());
        return Err(error);
    }
    Ok(())
}

/// Split percentages are 0..=100.
pub fn validate_split(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut error = ValidationError::new("split_percentage");
        error.message = Some("must be between 0 and 100".into());
        return Err(error);
    }
    Ok(())
}

/// Rejects blank or whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pagination_is_clamped() {
        let params = PaginationParams { page: 0, limit: 500 };
        assert_eq!(params.normalized(), (1, MAX_PAGE_SIZE));

        let response = PaginationParams::default().respond(vec![1, 2, 3], 45);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.limit, 20);
    }

    #[test]
    fn money_validation() {
        assert!(validate_money(&dec!(10.50)).is_ok());
        assert!(validate_money(&dec!(10.500)).is_ok());
        assert!(validate_money(&dec!(10.505)).is_err());
        assert!(validate_money(&dec!(-1)).is_err());
    }
}
