//! Package catalogue queries.
//!
//! Individual and organisation packages are separate tables with one shape;
//! every operation takes the catalogue it works on.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::package::{NewPackage, Package, PeriodType, UpdatePackageRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalogue {
    Individual,
    Organisation,
}

impl Catalogue {
    fn table(&self) -> &'static str {
        match self {
            Catalogue::Individual => "individual_packages",
            Catalogue::Organisation => "organisation_packages",
        }
    }
}

fn duplicate_name(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("A package with this name already exists".to_string())
        }
        other => other.into(),
    }
}

pub async fn list(pool: &DbPool, catalogue: Catalogue) -> Result<Vec<Package>, AppError> {
    let sql = format!("SELECT * FROM {} ORDER BY created_at", catalogue.table());
    let packages = sqlx::query_as::<_, Package>(&sql).fetch_all(pool).await?;
    Ok(packages)
}

pub async fn create(
    pool: &DbPool,
    catalogue: Catalogue,
    package: NewPackage,
) -> Result<Package, AppError> {
    let sql = format!(
        r#"
        INSERT INTO {} (name, description, period_type, days_count, amount_paise, features)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
        catalogue.table()
    );
    let created = sqlx::query_as::<_, Package>(&sql)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.period_type.as_str())
        .bind(package.days_count)
        .bind(package.amount_paise)
        .bind(&package.features)
        .fetch_one(pool)
        .await
        .map_err(duplicate_name)?;

    tracing::info!(catalogue = catalogue.table(), package_id = %created.id, "Package created");
    Ok(created)
}

/// Apply a partial update; absent fields keep their stored value.
///
/// # Errors
///
/// - `InvalidRequest`: a supplied field fails validation, or the result
///   would be a pay-as-you-go package without a day count
/// - `NotFound`: no package with this id in the catalogue
/// - `Conflict`: the new name is taken
pub async fn update(
    pool: &DbPool,
    catalogue: Catalogue,
    package_id: Uuid,
    request: UpdatePackageRequest,
) -> Result<Package, AppError> {
    request.validate()?;

    let select = format!("SELECT * FROM {} WHERE id = $1", catalogue.table());
    let existing = sqlx::query_as::<_, Package>(&select)
        .bind(package_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Package not found"))?;

    let pay_as_you_go = match request.period_type {
        Some(period) => period == PeriodType::PayAsYouGo,
        None => existing.period_type == PeriodType::PayAsYouGo.as_str(),
    };
    if pay_as_you_go && request.days_count.or(existing.days_count).is_none() {
        return Err(AppError::invalid(
            "For 'payAsYouGo' packages, 'daysCount' is required.",
        ));
    }

    let sql = format!(
        r#"
        UPDATE {}
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            period_type = COALESCE($3, period_type),
            days_count = COALESCE($4, days_count),
            amount_paise = COALESCE($5, amount_paise),
            features = COALESCE($6, features),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
        catalogue.table()
    );
    let updated = sqlx::query_as::<_, Package>(&sql)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.description.as_deref().map(str::trim))
        .bind(request.period_type.map(|p| p.as_str()))
        .bind(request.days_count)
        .bind(request.amount_paise)
        .bind(&request.features)
        .bind(package_id)
        .fetch_optional(pool)
        .await
        .map_err(duplicate_name)?
        .ok_or_else(|| AppError::not_found("Package not found"))?;

    tracing::info!(catalogue = catalogue.table(), %package_id, "Package updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogues_use_separate_tables() {
        assert_eq!(Catalogue::Individual.table(), "individual_packages");
        assert_eq!(Catalogue::Organisation.table(), "organisation_packages");
    }
}
