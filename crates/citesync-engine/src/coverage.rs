//! Read-only coverage projection: where does one domain stand across the
//! enabled directory catalog?

use serde::Serialize;
use sqlx::PgPool;

use crate::error::EngineError;

/// Per-provider line of the coverage report.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCoverage {
    pub slug: String,
    pub display_name: String,
    pub tier: i16,
    pub status: String,
    pub external_url: Option<String>,
}

/// Aggregate view of a domain's submissions against enabled tier ≤ 2
/// providers. Providers with no submission yet count as pending.
#[derive(Debug, Serialize)]
pub struct CoverageSummary {
    pub host: String,
    pub submitted: usize,
    pub verified: usize,
    pub pending: usize,
    pub error: usize,
    pub providers: Vec<ProviderCoverage>,
}

/// Builds the coverage summary for a host. Pure read, no side effects.
///
/// # Errors
///
/// Returns [`EngineError::DomainNotFound`] for unknown hosts or a wrapped
/// [`EngineError::Db`] on store failures.
pub async fn coverage_summary(pool: &PgPool, host: &str) -> Result<CoverageSummary, EngineError> {
    let domain = citesync_db::get_domain_by_host(pool, host)
        .await?
        .ok_or_else(|| EngineError::DomainNotFound {
            host: host.to_string(),
        })?;

    let providers = citesync_db::list_providers(pool).await?;
    let submissions = citesync_db::list_submissions_for_domain(pool, domain.id).await?;

    let mut summary = CoverageSummary {
        host: domain.host,
        submitted: 0,
        verified: 0,
        pending: 0,
        error: 0,
        providers: Vec::new(),
    };

    for provider in providers
        .into_iter()
        .filter(|p| p.enabled && p.tier <= 2)
    {
        let submission = submissions
            .iter()
            .find(|s| s.provider_slug == provider.slug);

        let status = submission
            .map_or_else(|| "pending".to_string(), |s| s.status.clone());

        match status.as_str() {
            "verified" => summary.verified += 1,
            "submitted" => summary.submitted += 1,
            "error" => summary.error += 1,
            _ => summary.pending += 1,
        }

        summary.providers.push(ProviderCoverage {
            slug: provider.slug,
            display_name: provider.display_name,
            tier: provider.tier,
            status,
            external_url: submission.and_then(|s| s.external_url.clone()),
        });
    }

    Ok(summary)
}
