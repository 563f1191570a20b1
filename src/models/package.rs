//! Subscription package models.
//!
//! Individual and organisation packages live in separate tables but share
//! one shape, so one row type and one set of request types serve both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Longest coverage a package may grant, about ten years.
pub const MAX_DAYS_COUNT: i32 = 3650;

/// Billing period of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodType {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "payAsYouGo")]
    PayAsYouGo,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Weekly => "weekly",
            PeriodType::PayAsYouGo => "payAsYouGo",
        }
    }

    /// Coverage length implied by the period when a package has no explicit day count.
    pub fn default_days(&self) -> Option<i32> {
        match self {
            PeriodType::Monthly => Some(30),
            PeriodType::Weekly => Some(7),
            PeriodType::PayAsYouGo => None,
        }
    }
}

/// Package record from `individual_packages` or `organisation_packages`.
///
/// `amount_paise` is the price per vehicle for one period.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub period_type: String,
    pub days_count: Option<i32>,
    pub amount_paise: i64,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// Days one purchase of this package covers.
    pub fn coverage_days(&self) -> Option<i32> {
        self.days_count.or_else(|| match self.period_type.as_str() {
            "monthly" => PeriodType::Monthly.default_days(),
            "weekly" => PeriodType::Weekly.default_days(),
            _ => None,
        })
    }
}

/// Request body for creating a package.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub period_type: Option<PeriodType>,
    pub days_count: Option<i32>,
    pub amount_paise: Option<i64>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Validated package fields ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    pub name: String,
    pub description: Option<String>,
    pub period_type: PeriodType,
    pub days_count: Option<i32>,
    pub amount_paise: i64,
    pub features: Vec<String>,
}

impl CreatePackageRequest {
    pub fn validate(self) -> Result<NewPackage, AppError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::invalid("Package name is required"))?;
        let period_type = self
            .period_type
            .ok_or_else(|| AppError::invalid("periodType is required"))?;
        let amount_paise = self
            .amount_paise
            .ok_or_else(|| AppError::invalid("amountPaise is required"))?;

        validate_amount(amount_paise)?;
        validate_days(self.days_count)?;
        if period_type == PeriodType::PayAsYouGo && self.days_count.is_none() {
            return Err(AppError::invalid(
                "For 'payAsYouGo' packages, 'daysCount' is required.",
            ));
        }

        Ok(NewPackage {
            name,
            description: self.description.map(|d| d.trim().to_string()),
            period_type,
            days_count: self.days_count,
            amount_paise,
            features: self.features,
        })
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub period_type: Option<PeriodType>,
    pub days_count: Option<i32>,
    pub amount_paise: Option<i64>,
    pub features: Option<Vec<String>>,
}

impl UpdatePackageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::invalid("Package name cannot be empty"));
            }
        }
        if let Some(amount) = self.amount_paise {
            validate_amount(amount)?;
        }
        validate_days(self.days_count)
    }
}

fn validate_amount(amount_paise: i64) -> Result<(), AppError> {
    if amount_paise < 0 {
        return Err(AppError::invalid("Amount cannot be negative"));
    }
    Ok(())
}

fn validate_days(days_count: Option<i32>) -> Result<(), AppError> {
    match days_count {
        Some(days) if days < 1 => Err(AppError::invalid("Days count must be at least 1")),
        Some(days) if days > MAX_DAYS_COUNT => Err(AppError::invalid(format!(
            "Days count cannot exceed {}",
            MAX_DAYS_COUNT
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct PackageListResponse {
    pub message: String,
    pub packages: Vec<Package>,
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub message: String,
    pub package: Package,
}
